//! How a typed input describes its HTTP layout.

use serde::Serialize;

/// A typed operation input that can be laid out as an HTTP request.
///
/// The inward transforms read the body, query, path parameters and extra
/// headers through this trait; the wire format itself is chosen by the
/// transform, not by the input.
///
/// # Example
///
/// ```
/// use relay_core::HttpRequestInput;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct CreateItem {
///     id: String,
/// }
///
/// impl HttpRequestInput for CreateItem {
///     type Body = Self;
///     type Query = ();
///
///     fn body(&self) -> Option<&Self> {
///         Some(self)
///     }
/// }
///
/// let input = CreateItem { id: "abc".to_string() };
/// assert!(input.body().is_some());
/// assert!(input.query().is_none());
/// ```
pub trait HttpRequestInput: Send + 'static {
    /// The value serialized as the request body.
    type Body: Serialize;

    /// The value flattened into query string entries.
    type Query: Serialize;

    /// Returns the body value, or `None` for an empty body.
    fn body(&self) -> Option<&Self::Body>;

    /// Returns the query value, if the operation has one.
    fn query(&self) -> Option<&Self::Query> {
        None
    }

    /// Returns values for the `{name}` tokens of the path template.
    fn path_params(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Returns extra headers to attach to the request.
    fn additional_headers(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

impl HttpRequestInput for () {
    type Body = ();
    type Query = ();

    fn body(&self) -> Option<&()> {
        None
    }
}
