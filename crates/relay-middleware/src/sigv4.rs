//! AWS Signature Version 4.
//!
//! Computes the canonical request, the string to sign and the
//! `authorization` header for an [`HttpRequestBuilder`]. The signing stage
//! calls [`SigV4Signer::sign`] after the host, port and method are known and
//! before content headers are attached.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use relay_core::{ClientError, ClientResult, Credentials, HttpRequestBuilder, Region};
use sha2::{Digest, Sha256};
use std::borrow::Cow;

type HmacSha256 = Hmac<Sha256>;

/// The signing algorithm identifier.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Header carrying the signing timestamp.
pub const X_AMZ_DATE: &str = "x-amz-date";

/// Header carrying the session token of temporary credentials.
pub const X_AMZ_SECURITY_TOKEN: &str = "x-amz-security-token";

/// Header carrying the operation target of JSON-RPC style services.
pub const X_AMZ_TARGET: &str = "x-amz-target";

const AUTHORIZATION: &str = "authorization";
const HOST: &str = "host";
const TERMINATOR: &str = "aws4_request";
const S3: &str = "s3";

/// Which headers take part in the signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignedHeaders {
    /// `host`, `x-amz-date`, and `x-amz-target` / `x-amz-security-token` when present.
    #[default]
    Minimal,
    /// Every header present on the request at signing time.
    All,
}

/// Signs requests for one region and service.
#[derive(Debug, Clone)]
pub struct SigV4Signer {
    region: Region,
    service: String,
    signed_headers: SignedHeaders,
}

/// The intermediate values of one signature, exposed for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// The canonical request.
    pub canonical_request: String,
    /// The string that was signed.
    pub string_to_sign: String,
    /// Semicolon-separated names of the signed headers.
    pub signed_headers: String,
    /// Hex-encoded signature.
    pub signature: String,
    /// The full `authorization` header value.
    pub authorization: String,
}

impl SigV4Signer {
    /// Creates a signer.
    #[must_use]
    pub fn new(region: Region, service: impl Into<String>, signed_headers: SignedHeaders) -> Self {
        Self {
            region,
            service: service.into(),
            signed_headers,
        }
    }

    /// Returns a signer that signs the given header set.
    #[must_use]
    pub const fn with_signed_headers(mut self, signed_headers: SignedHeaders) -> Self {
        self.signed_headers = signed_headers;
        self
    }

    /// Signs `request` in place.
    ///
    /// Attaches `x-amz-date`, `x-amz-security-token` (when the credentials
    /// carry a session token) and `authorization`.
    pub fn sign(
        &self,
        request: &mut HttpRequestBuilder,
        credentials: &Credentials,
        time: DateTime<Utc>,
    ) -> ClientResult<Signature> {
        let amz_date = time.format("%Y%m%dT%H%M%SZ").to_string();
        request.insert_header(X_AMZ_DATE, &amz_date)?;
        if let Some(token) = credentials.session_token() {
            request.insert_header(X_AMZ_SECURITY_TOKEN, token)?;
        }

        let signature = self.compute(request, credentials, time)?;
        request.insert_header(AUTHORIZATION, &signature.authorization)?;
        Ok(signature)
    }

    /// Computes the signature without modifying the request.
    ///
    /// The request must already carry the `x-amz-date` header.
    pub fn compute(
        &self,
        request: &HttpRequestBuilder,
        credentials: &Credentials,
        time: DateTime<Utc>,
    ) -> ClientResult<Signature> {
        let date = time.format("%Y%m%d").to_string();
        let amz_date = time.format("%Y%m%dT%H%M%SZ").to_string();
        let scope = format!("{date}/{}/{}/{TERMINATOR}", self.region, self.service);

        let headers = self.canonical_headers(request)?;
        let signed_headers = headers
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(";");
        let canonical_headers: String = headers
            .iter()
            .map(|(name, value)| format!("{name}:{value}\n"))
            .collect();

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            request.method().as_str(),
            self.canonical_uri(request.path()),
            canonical_query(request),
            canonical_headers,
            signed_headers,
            hex::encode(Sha256::digest(request.body()))
        );

        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let key = signing_key(
            credentials.secret_access_key(),
            &date,
            self.region.as_str(),
            &self.service,
        )?;
        let signature = hex::encode(hmac(&key, string_to_sign.as_bytes())?);

        let authorization = format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            credentials.access_key_id()
        );

        Ok(Signature {
            canonical_request,
            string_to_sign,
            signed_headers,
            signature,
            authorization,
        })
    }

    /// Encodes each segment of the already-encoded request path once more.
    ///
    /// S3 signs the path exactly as sent.
    fn canonical_uri<'p>(&self, path: &'p str) -> Cow<'p, str> {
        if self.service == S3 {
            return Cow::Borrowed(path);
        }
        Cow::Owned(
            path.split('/')
                .map(urlencoding::encode)
                .collect::<Vec<_>>()
                .join("/"),
        )
    }

    /// Returns the lower-cased, sorted headers that take part in the signature.
    fn canonical_headers(
        &self,
        request: &HttpRequestBuilder,
    ) -> ClientResult<Vec<(String, String)>> {
        let mut headers = vec![(HOST.to_string(), request.host_header())];

        for name in request.headers().keys() {
            let name_str = name.as_str();
            if name_str == HOST || name_str == AUTHORIZATION {
                continue;
            }
            let included = match self.signed_headers {
                SignedHeaders::All => true,
                SignedHeaders::Minimal => {
                    matches!(name_str, X_AMZ_DATE | X_AMZ_TARGET | X_AMZ_SECURITY_TOKEN)
                }
            };
            if !included {
                continue;
            }

            let values = request
                .headers()
                .get_all(name)
                .iter()
                .map(|v| {
                    v.to_str().map(normalize_value).map_err(|e| {
                        ClientError::signing_with_source(
                            format!("header {name_str} is not valid text"),
                            e,
                        )
                    })
                })
                .collect::<ClientResult<Vec<_>>>()?;
            headers.push((name_str.to_string(), values.join(",")));
        }

        headers.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(headers)
    }
}

/// Renders the query pairs sorted by encoded name, then encoded value.
fn canonical_query(request: &HttpRequestBuilder) -> String {
    let mut pairs: Vec<(String, String)> = request
        .query()
        .iter()
        .map(|(k, v)| {
            (
                urlencoding::encode(k).into_owned(),
                urlencoding::encode(v).into_owned(),
            )
        })
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Trims the value and collapses inner runs of whitespace.
fn normalize_value(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn hmac(key: &[u8], data: &[u8]) -> ClientResult<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|_| ClientError::signing("invalid signing key length"))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Derives the per-day signing key.
pub fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> ClientResult<Vec<u8>> {
    let k_date = hmac(format!("AWS4{secret}").as_bytes(), date.as_bytes())?;
    let k_region = hmac(&k_date, region.as_bytes())?;
    let k_service = hmac(&k_region, service.as_bytes())?;
    hmac(&k_service, TERMINATOR.as_bytes())
}
