use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    response::Response,
    Extension,
};

use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::{jpeg_response, run_grading};
use crate::middleware::RequestId;
use crate::state::AppState;
use crate::utils::upload::{read_upload_form, TempUpload};

/// Grade with geometric corrections and an aspect-ratio crop
///
/// Multipart fields: `image` (required), `tone`, `maxDim` (default 2560),
/// `straighten` (degrees, default -0.4, or `auto`), `vertical` (shear,
/// default 0.03) and `aspect` (`W:H`, default `4:3`). Values that do not
/// parse fall back to their defaults; a malformed aspect disables the crop.
#[utoipa::path(
    post,
    path = "/api/images/pro",
    tag = "images",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Graded JPEG", content_type = "image/jpeg"),
        (status = 400, description = "Missing image or unreadable form", body = ErrorResponse),
        (status = 413, description = "Upload too large", body = ErrorResponse),
        (status = 500, description = "Processing failed", body = ErrorResponse),
        (status = 504, description = "Processing timed out", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request_id, multipart),
    fields(request_id = %request_id.0, operation = "pro_image")
)]
pub async fn pro_image(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, HttpAppError> {
    let started = Instant::now();

    let mut form = read_upload_form(multipart).await?;
    let image = form.require_image()?;
    let request = form.pro_request(&state.grading);
    tracing::debug!(?request, "Parsed pro options");

    let upload = TempUpload::persist(state.config.upload_dir.clone(), image).await?;

    let processed = run_grading(&state, &upload, move |orchestrator, data| {
        orchestrator.process_pro(data, &request)
    })
    .await?;

    tracing::info!(
        tone = %processed.tone,
        width = processed.dimensions.width(),
        height = processed.dimensions.height(),
        upload_bytes = upload.size_bytes(),
        output_bytes = processed.jpeg.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Image graded (pro)"
    );

    Ok(jpeg_response(processed))
}
