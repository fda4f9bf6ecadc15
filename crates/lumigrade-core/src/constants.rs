//! Shared constants

/// Default bounding box side for graded output.
pub const DEFAULT_MAX_DIM: u32 = 2560;

/// Upper bound for a client-requested bounding box.
pub const DEFAULT_MAX_DIM_LIMIT: u32 = 8192;

/// Final output JPEG quality.
pub const DEFAULT_JPEG_QUALITY: u8 = 88;

/// Quality of the intermediate encode taken before the pro-mode crop.
pub const INTERMEDIATE_JPEG_QUALITY: u8 = 92;

/// Multipart field carrying the uploaded photo.
pub const IMAGE_FIELD: &str = "image";

/// Error message returned when the upload field is absent.
pub const MISSING_IMAGE_MESSAGE: &str = "Missing image file (field name: image)";
