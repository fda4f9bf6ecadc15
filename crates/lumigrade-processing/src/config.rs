use lumigrade_core::constants::{
    DEFAULT_JPEG_QUALITY, DEFAULT_MAX_DIM, DEFAULT_MAX_DIM_LIMIT, INTERMEDIATE_JPEG_QUALITY,
};
use lumigrade_core::Config;

use crate::codec::JpegOptions;
use crate::presets::PresetRegistry;

/// Immutable grading settings built once at startup and shared by all requests
#[derive(Debug, Clone)]
pub struct GradingConfig {
    pub registry: PresetRegistry,
    /// Bounding box used when a request does not ask for one
    pub default_max_dim: u32,
    /// Largest bounding box a request may ask for
    pub max_dim_limit: u32,
    pub output_quality: u8,
    pub intermediate_quality: u8,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            registry: PresetRegistry::builtin(),
            default_max_dim: DEFAULT_MAX_DIM,
            max_dim_limit: DEFAULT_MAX_DIM_LIMIT,
            output_quality: DEFAULT_JPEG_QUALITY,
            intermediate_quality: INTERMEDIATE_JPEG_QUALITY,
        }
    }
}

impl GradingConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            registry: PresetRegistry::builtin(),
            default_max_dim: config.max_dim,
            max_dim_limit: config.max_dim_limit,
            output_quality: config.jpeg_quality,
            intermediate_quality: INTERMEDIATE_JPEG_QUALITY,
        }
    }

    /// Effective bounding box for a requested `maxDim`.
    ///
    /// Absent or zero requests use the default; larger ones are capped at the limit.
    pub fn effective_max_dim(&self, requested: Option<u32>) -> u32 {
        match requested {
            Some(dim) if dim > 0 => dim.min(self.max_dim_limit),
            _ => self.default_max_dim,
        }
    }

    /// Encoder settings for the delivered JPEG
    pub fn output_jpeg(&self) -> JpegOptions {
        JpegOptions::progressive(self.output_quality)
    }

    /// Encoder settings for the pre-crop base buffer in pro mode
    pub fn intermediate_jpeg(&self) -> JpegOptions {
        JpegOptions::progressive(self.intermediate_quality)
    }
}
