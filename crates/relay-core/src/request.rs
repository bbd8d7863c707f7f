//! Raw HTTP request types.
//!
//! [`HttpRequestBuilder`] is the mutable accumulator that the inward
//! transform creates and the inner middleware stages fill in. It is owned by
//! one invocation and consumed by the transport.

use crate::error::{ClientError, ClientResult};
use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Method, Uri};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// URL scheme used to reach the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Plain-text HTTP.
    Http,
    /// HTTP over TLS.
    #[default]
    Https,
}

impl Scheme {
    /// Returns the scheme as it appears in a URL.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    /// Returns the well-known port for this scheme.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(ClientError::invalid_request(format!(
                "unsupported scheme: {other}"
            ))),
        }
    }
}

/// A per-call endpoint override.
///
/// Any component that is set wins over the client-level configuration.
///
/// # Example
///
/// ```
/// use relay_core::{EndpointOverride, Scheme};
///
/// let over = EndpointOverride::parse("http://localhost:8000").unwrap();
/// assert_eq!(over.host_name(), Some("localhost"));
/// assert_eq!(over.port(), Some(8000));
/// assert_eq!(over.scheme(), Some(Scheme::Http));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointOverride {
    scheme: Option<Scheme>,
    host: Option<String>,
    port: Option<u16>,
}

impl EndpointOverride {
    /// Creates an override for the host only.
    #[must_use]
    pub fn host(host: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            ..Self::default()
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the scheme.
    #[must_use]
    pub const fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = Some(scheme);
        self
    }

    /// Parses an override from a URL such as `https://host:8443`.
    pub fn parse(url: &str) -> ClientResult<Self> {
        let uri: Uri = url
            .parse()
            .map_err(|e| ClientError::invalid_request(format!("invalid endpoint {url}: {e}")))?;
        Self::from_uri(&uri)
    }

    /// Builds an override from an already-parsed URI.
    pub fn from_uri(uri: &Uri) -> ClientResult<Self> {
        let scheme = uri.scheme_str().map(str::parse).transpose()?;
        Ok(Self {
            scheme,
            host: uri.host().map(ToString::to_string),
            port: uri.port_u16(),
        })
    }

    /// Returns the overriding host, if any.
    #[must_use]
    pub fn host_name(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Returns the overriding port, if any.
    #[must_use]
    pub const fn port(&self) -> Option<u16> {
        self.port
    }

    /// Returns the overriding scheme, if any.
    #[must_use]
    pub const fn scheme(&self) -> Option<Scheme> {
        self.scheme
    }
}

/// Mutable accumulator for an outgoing HTTP request.
///
/// The path is stored already percent-encoded; query pairs are stored raw and
/// encoded when the URL is rendered.
///
/// # Example
///
/// ```
/// use relay_core::HttpRequestBuilder;
/// use http::Method;
///
/// let mut request = HttpRequestBuilder::new("/items");
/// request.set_method(Method::POST);
/// request.set_host("example.amazonaws.com");
/// request.set_port(443);
/// request.append_query("limit", "10");
///
/// assert_eq!(request.url(), "https://example.amazonaws.com:443/items?limit=10");
/// ```
#[derive(Debug, Clone, Default)]
pub struct HttpRequestBuilder {
    scheme: Scheme,
    method: Method,
    host: String,
    port: Option<u16>,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
}

impl HttpRequestBuilder {
    /// Creates a builder for the given (already encoded) path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Returns the scheme.
    #[must_use]
    pub const fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Sets the scheme.
    pub fn set_scheme(&mut self, scheme: Scheme) {
        self.scheme = scheme;
    }

    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Sets the HTTP method.
    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    /// Returns the host name (empty until the host stage has run).
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Sets the host name.
    pub fn set_host(&mut self, host: impl Into<String>) {
        self.host = host.into();
    }

    /// Returns the explicitly set port, if any.
    #[must_use]
    pub const fn port(&self) -> Option<u16> {
        self.port
    }

    /// Returns the port the request will be sent to.
    #[must_use]
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.scheme.default_port())
    }

    /// Sets the port.
    pub fn set_port(&mut self, port: u16) {
        self.port = Some(port);
    }

    /// Returns the encoded path.
    #[must_use]
    pub fn path(&self) -> &str {
        if self.path.is_empty() {
            "/"
        } else {
            &self.path
        }
    }

    /// Sets the encoded path.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    /// Returns the raw query pairs in insertion order.
    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Appends a raw query pair.
    pub fn append_query(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.query.push((name.into(), value.into()));
    }

    /// Appends several raw query pairs.
    pub fn extend_query<I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.query.extend(pairs);
    }

    /// Renders the query string, RFC 3986 encoded, without a leading `?`.
    #[must_use]
    pub fn query_string(&self) -> String {
        self.query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Returns the request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the request headers mutably.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Inserts a header, replacing any previous value.
    pub fn insert_header(&mut self, name: &str, value: &str) -> ClientResult<()> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ClientError::invalid_request(format!("invalid header name {name}: {e}")))?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            ClientError::invalid_request(format!("invalid value for header {name}: {e}"))
        })?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the body bytes.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Sets the body bytes.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    /// Returns the value of the `Host` header for this request.
    ///
    /// The port is omitted when it is the scheme's well-known port.
    #[must_use]
    pub fn host_header(&self) -> String {
        match self.port {
            Some(port) if port != self.scheme.default_port() => format!("{}:{port}", self.host),
            _ => self.host.clone(),
        }
    }

    /// Renders the full request URL.
    #[must_use]
    pub fn url(&self) -> String {
        let mut url = format!(
            "{}://{}:{}{}",
            self.scheme,
            self.host,
            self.effective_port(),
            self.path()
        );
        if !self.query.is_empty() {
            url.push('?');
            url.push_str(&self.query_string());
        }
        url
    }

    /// Converts the builder into an `http::Request`.
    pub fn into_http_request(self) -> ClientResult<http::Request<Bytes>> {
        let url = self.url();
        let mut request = http::Request::builder()
            .method(self.method)
            .uri(&url)
            .body(self.body)
            .map_err(|e| ClientError::invalid_request(format!("invalid request for {url}: {e}")))?;
        *request.headers_mut() = self.headers;
        Ok(request)
    }
}
