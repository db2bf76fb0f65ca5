//! Request correlation IDs.
//!
//! Every request carries an `x-request-id`. A well-formed ID forwarded by the
//! gateway is reused, anything else is replaced with a fresh UUID v4. The ID
//! is stored in the request extensions, tagged on the tracing span and Sentry
//! scope, and echoed back in the response.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_FORWARDED_LEN: usize = 128;

/// Correlation ID of the current request, available as an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Reuse a forwarded ID only if it is short printable ASCII.
fn forwarded_id(value: &HeaderValue) -> Option<String> {
    let value = value.to_str().ok()?.trim();
    let usable = !value.is_empty()
        && value.len() <= MAX_FORWARDED_LEN
        && value.bytes().all(|b| b.is_ascii_graphic());
    usable.then(|| value.to_owned())
}

/// Middleware that ensures every request has a request ID.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(forwarded_id)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    Span::current().record("request_id", request_id.as_str());
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));
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

    #[test]
    fn test_forwarded_id_accepted() {
        let value = HeaderValue::from_static("gw-4f1c2a");
        assert_eq!(forwarded_id(&value).as_deref(), Some("gw-4f1c2a"));
    }

    #[test]
    fn test_forwarded_id_rejected() {
        assert!(forwarded_id(&HeaderValue::from_static("")).is_none());
        assert!(forwarded_id(&HeaderValue::from_static("has space")).is_none());
        let long = HeaderValue::from_str(&"a".repeat(MAX_FORWARDED_LEN + 1)).unwrap();
        assert!(forwarded_id(&long).is_none());
    }
}
