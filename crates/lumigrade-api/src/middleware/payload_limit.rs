use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use lumigrade_core::AppError;

use crate::error::HttpAppError;

/// Re-renders a 413 produced by the body-limit layer as an `ErrorResponse`.
/// Responses that are already JSON pass through untouched.
pub async fn payload_limit_response(response: Response) -> Response {
    if response.status() != StatusCode::PAYLOAD_TOO_LARGE {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));
    if is_json {
        return response;
    }

    HttpAppError::from(AppError::PayloadTooLarge(
        "Request body exceeds the upload limit".to_string(),
    ))
    .into_response()
}
