//! Request ID middleware for request tracing and correlation.
//!
//! An upstream proxy's `x-request-id` is reused when it looks like an ID:
//! at most 128 characters of ASCII letters, digits, `-`, `_`, `.` or `:`.
//! Any other value is replaced with a fresh UUID v4. The ID is recorded on
//! the request span, tagged on the Sentry scope and returned in the response
//! headers.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest inbound request ID that is reused.
const MAX_INBOUND_ID_LEN: usize = 128;

/// The inbound request ID, if present and well formed.
fn inbound_request_id(headers: &HeaderMap) -> Option<&str> {
    let id = headers.get(REQUEST_ID_HEADER)?.to_str().ok()?;

    let well_formed = !id.is_empty()
        && id.len() <= MAX_INBOUND_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':'));

    well_formed.then_some(id)
}

/// Middleware that gives every request an ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = inbound_request_id(request.headers())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    Span::current().record("request_id", &request_id);
    sentry::configure_scope(|scope| scope.set_tag("request_id", &request_id));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn headers(id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(id).unwrap());
        headers
    }

    #[test]
    fn test_reuses_proxy_style_ids() {
        for id in ["edge-123", "Root=1-67891233-abcdef012345678912345678", "a.b_c:d"] {
            assert_eq!(inbound_request_id(&headers(id)), Some(id));
        }
    }

    #[test]
    fn test_missing_or_empty_id_is_replaced() {
        assert_eq!(inbound_request_id(&HeaderMap::new()), None);
        assert_eq!(inbound_request_id(&headers("")), None);
    }

    #[test]
    fn test_length_limit_is_inclusive() {
        let longest = "a".repeat(MAX_INBOUND_ID_LEN);
        assert_eq!(inbound_request_id(&headers(&longest)), Some(longest.as_str()));

        let too_long = "a".repeat(MAX_INBOUND_ID_LEN + 1);
        assert_eq!(inbound_request_id(&headers(&too_long)), None);
    }

    #[test]
    fn test_free_text_is_rejected() {
        for id in ["two words", "<script>", "id\twith-tab", "quote\"d"] {
            assert_eq!(inbound_request_id(&headers(id)), None, "{id:?}");
        }
    }
}
