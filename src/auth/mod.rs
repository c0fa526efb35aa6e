//! Gateway authentication and caller identity.
//!
//! The identity provider sits in front of this service and forwards the
//! authenticated caller as headers. Requests are trusted only when they carry
//! the gateway's pre-shared key, compared in constant time.

use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;

use crate::errors::{codes, AppError, ErrorResponse};

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";
/// Stable identifier of the authenticated caller.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Email of the authenticated caller.
pub const USER_EMAIL_HEADER: &str = "x-user-email";
/// Whether the caller's plan is unlimited.
pub const USER_SUBSCRIBED_HEADER: &str = "x-user-subscribed";

/// PSK authentication layer function that takes the expected PSK as a parameter.
pub async fn psk_auth_layer(
    expected_psk: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    // If no PSK is configured, allow all requests (dev mode)
    let Some(expected) = expected_psk else {
        return next.run(request).await;
    };

    // Accept the key as x-api-key or as a bearer token
    let accepted = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
        .map(|key| constant_time_compare(key, &expected));

    match accepted {
        Some(true) => next.run(request).await,
        Some(false) => unauthorized_response("Invalid API key"),
        None => unauthorized_response("Missing or invalid API key"),
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Create an unauthorized response.
fn unauthorized_response(message: &str) -> Response {
    let body = ErrorResponse::new(codes::UNAUTHORIZED, message);
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

/// The authenticated identity making the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: String,
    /// Normalized (trimmed, lowercase) email
    pub email: String,
    /// Billing capability flag: unlimited plan
    pub subscribed: bool,
}

impl Caller {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let id = header_value(headers, USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("Missing caller identity".to_string()))?;
        let email = header_value(headers, USER_EMAIL_HEADER)
            .map(normalize_email)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Missing caller email".to_string()))?;
        let subscribed = header_value(headers, USER_SUBSCRIBED_HEADER)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            id: id.to_string(),
            email,
            subscribed,
        })
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Caller::from_headers(&parts.headers)
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Emails are the identity key of an invitation; compare them case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_constant_time_compare_equal() {
        assert!(constant_time_compare("test-key-123", "test-key-123"));
    }

    #[test]
    fn test_constant_time_compare_not_equal() {
        assert!(!constant_time_compare("test-key-123", "test-key-124"));
    }

    #[test]
    fn test_constant_time_compare_different_lengths() {
        assert!(!constant_time_compare("short", "much-longer-key"));
    }

    #[test]
    fn test_caller_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("u1"));
        headers.insert(USER_EMAIL_HEADER, HeaderValue::from_static("  Alice@Example.COM "));
        headers.insert(USER_SUBSCRIBED_HEADER, HeaderValue::from_static("true"));

        let caller = Caller::from_headers(&headers).unwrap();
        assert_eq!(caller.id, "u1");
        assert_eq!(caller.email, "alice@example.com");
        assert!(caller.subscribed);
    }

    #[test]
    fn test_caller_defaults_to_free_plan() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("u1"));
        headers.insert(USER_EMAIL_HEADER, HeaderValue::from_static("a@x.com"));

        let caller = Caller::from_headers(&headers).unwrap();
        assert!(!caller.subscribed);
    }

    #[test]
    fn test_caller_requires_identity() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_EMAIL_HEADER, HeaderValue::from_static("a@x.com"));
        assert!(matches!(
            Caller::from_headers(&headers),
            Err(AppError::Unauthorized(_))
        ));

        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("u1"));
        assert!(matches!(
            Caller::from_headers(&headers),
            Err(AppError::Unauthorized(_))
        ));
    }
}
