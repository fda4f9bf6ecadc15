//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lumigrade API",
        version = "0.1.0",
        description = "Tonal grading of real-estate photos. Upload a photo, pick a tone preset and receive a graded JPEG; the pro endpoint adds straightening, vertical correction and aspect-ratio cropping."
    ),
    paths(
        handlers::health::health_check,
        handlers::tones::list_tones,
        handlers::process::process_image,
        handlers::pro::pro_image,
    ),
    components(schemas(
        error::ErrorResponse,
        models::HealthResponse,
        models::ToneResponse,
        models::DebugResponse,
    )),
    tags(
        (name = "images", description = "Photo grading"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
