//! Format-independent parts of the inward transforms.

use crate::path::PathTemplate;
use crate::query::QueryEncoder;
use relay_core::{ClientResult, HttpRequestBuilder, HttpRequestInput};

/// Builds the request for `input` with the given body.
///
/// Renders the path template, appends the template's literal query followed
/// by the encoded query value, and attaches the input's additional headers.
pub(crate) fn lay_out<I: HttpRequestInput>(
    input: &I,
    path: &str,
    encoder: &QueryEncoder,
    body: Option<Vec<u8>>,
) -> ClientResult<HttpRequestBuilder> {
    let template = PathTemplate::parse(path)?;
    let mut request = HttpRequestBuilder::new(template.render(&input.path_params())?);

    request.extend_query(template.literal_query().iter().cloned());
    if let Some(query) = input.query() {
        request.extend_query(encoder.encode(query)?);
    }

    for (name, value) in input.additional_headers() {
        request.insert_header(name, &value)?;
    }

    if let Some(body) = body {
        request.set_body(body);
    }
    Ok(request)
}
