use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Query, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use lumigrade_core::AppError;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::{jpeg_response, run_grading};
use crate::middleware::RequestId;
use crate::models::DebugResponse;
use crate::state::AppState;
use crate::utils::upload::{read_upload_form, TempUpload};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ProcessQuery {
    /// `1` returns JSON metadata instead of the JPEG
    pub debug: Option<String>,
}

impl ProcessQuery {
    fn is_debug(&self) -> bool {
        matches!(self.debug.as_deref().map(str::trim), Some("1") | Some("true"))
    }
}

/// Grade an uploaded photo with a tone preset
///
/// Multipart fields: `image` (required) and `tone` (optional; unknown tones
/// use the default preset).
#[utoipa::path(
    post,
    path = "/api/images/process",
    tag = "images",
    params(ProcessQuery),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Graded JPEG, or DebugResponse JSON when debug=1", content_type = "image/jpeg"),
        (status = 400, description = "Missing image or unreadable form", body = ErrorResponse),
        (status = 413, description = "Upload too large", body = ErrorResponse),
        (status = 500, description = "Processing failed", body = ErrorResponse),
        (status = 504, description = "Processing timed out", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request_id, query, multipart),
    fields(request_id = %request_id.0, operation = "process_image")
)]
pub async fn process_image(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<ProcessQuery>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, HttpAppError> {
    let started = Instant::now();

    let mut form = read_upload_form(multipart).await?;
    let image = form.require_image()?;
    let tone = form.field("tone").map(str::to_string);

    let upload = TempUpload::persist(state.config.upload_dir.clone(), image).await?;

    let processed = run_grading(&state, &upload, move |orchestrator, data| {
        orchestrator.process_simple(data, tone.as_deref())
    })
    .await?;

    tracing::info!(
        tone = %processed.tone,
        width = processed.dimensions.width(),
        height = processed.dimensions.height(),
        upload_bytes = upload.size_bytes(),
        output_bytes = processed.jpeg.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Image graded"
    );

    if query.is_debug() {
        let body = DebugResponse::try_from(processed.debug_metadata()).map_err(AppError::from)?;
        return Ok(Json(body).into_response());
    }

    Ok(jpeg_response(processed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_flag() {
        let query = |v: Option<&str>| ProcessQuery {
            debug: v.map(str::to_string),
        };
        assert!(query(Some("1")).is_debug());
        assert!(query(Some("true")).is_debug());
        assert!(!query(Some("0")).is_debug());
        assert!(!query(None).is_debug());
    }
}
