//! HTTP handlers.

pub mod health;
pub mod pro;
pub mod process;
pub mod tones;

use std::sync::Arc;
use std::time::Duration;

use axum::http::header;
use axum::response::{IntoResponse, Response};
use lumigrade_core::AppError;
use lumigrade_processing::{Orchestrator, ProcessedImage, ProcessingError};

use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::upload::TempUpload;

/// Run a grading job on the blocking pool, bounded by the request timeout.
///
/// The upload stays owned by the caller, so its temp file is removed when the
/// handler returns, whether the job finished, failed or timed out.
pub(crate) async fn run_grading<F>(
    state: &AppState,
    upload: &TempUpload,
    job: F,
) -> Result<ProcessedImage, HttpAppError>
where
    F: FnOnce(&Orchestrator<'_>, &[u8]) -> Result<ProcessedImage, ProcessingError>
        + Send
        + 'static,
{
    let data = tokio::fs::read(upload.path()).await.map_err(AppError::from)?;
    let grading = Arc::clone(&state.grading);
    let after = Duration::from_millis(state.config.request_timeout_ms);

    let task =
        tokio::task::spawn_blocking(move || job(&Orchestrator::new(&grading), data.as_slice()));

    match tokio::time::timeout(after, task).await {
        Ok(Ok(result)) => result.map_err(HttpAppError::from),
        Ok(Err(join_err)) => {
            Err(AppError::Internal(format!("Grading task failed: {}", join_err)).into())
        }
        Err(_) => Err(AppError::Timeout { after }.into()),
    }
}

/// Deliver a graded image as `image/jpeg`
pub(crate) fn jpeg_response(processed: ProcessedImage) -> Response {
    ([(header::CONTENT_TYPE, "image/jpeg")], processed.jpeg).into_response()
}
