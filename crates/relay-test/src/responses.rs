//! Canned responses.

use http::StatusCode;
use relay_core::HttpResponse;

/// A response with a JSON body and `content-type: application/json`.
#[must_use]
pub fn json_response(status: StatusCode, body: &serde_json::Value) -> HttpResponse {
    HttpResponse::new(status, body.to_string()).with_header("content-type", "application/json")
}

/// A response with an XML body and `content-type: text/xml`.
#[must_use]
pub fn xml_response(status: StatusCode, body: impl Into<String>) -> HttpResponse {
    HttpResponse::new(status, body.into()).with_header("content-type", "text/xml")
}

/// A response without a body.
#[must_use]
pub fn empty_response(status: StatusCode) -> HttpResponse {
    HttpResponse::new(status, Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_response() {
        let response = json_response(StatusCode::OK, &json!({"status": "ok"}));
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.body().as_ref(), br#"{"status":"ok"}"#);
    }

    #[test]
    fn test_xml_response() {
        let response = xml_response(StatusCode::BAD_REQUEST, "<Error/>");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.header("content-type"), Some("text/xml"));
    }

    #[test]
    fn test_empty_response() {
        let response = empty_response(StatusCode::NO_CONTENT);
        assert!(response.body().is_empty());
        assert!(response.is_success());
    }
}
