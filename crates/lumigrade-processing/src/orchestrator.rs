//! Request-level sequencing of the grading stages.
//!
//! Simple mode grades, composites and encodes. Pro mode additionally applies
//! the geometric corrections, re-encodes a base buffer, crops it to the
//! requested aspect ratio and composites at the size that survives the crop.

use bytes::Bytes;
use serde::Serialize;

use crate::codec::{self, decode, encode_jpeg};
use crate::composite::{Compositor, FinalDimensions};
use crate::config::GradingConfig;
use crate::error::Result;
use crate::geometry::{crop_to_aspect, GeometryParams};
use crate::grading::{GradeOptions, GradingPipeline};
use crate::presets::{GradingPreset, RequestMode};

/// Options of a pro request
#[derive(Debug, Clone, PartialEq)]
pub struct ProRequest {
    pub tone: Option<String>,
    pub geometry: GeometryParams,
}

/// A finished JPEG and what produced it
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub tone: String,
    pub preset: GradingPreset,
    pub dimensions: FinalDimensions,
    pub jpeg: Bytes,
}

/// JSON body returned instead of the JPEG in debug mode
#[derive(Debug, Clone, Serialize)]
pub struct DebugMetadata {
    pub tone: String,
    pub width: u32,
    pub height: u32,
    pub preset: GradingPreset,
    pub bytes: usize,
}

impl ProcessedImage {
    pub fn debug_metadata(&self) -> DebugMetadata {
        DebugMetadata {
            tone: self.tone.clone(),
            width: self.dimensions.width(),
            height: self.dimensions.height(),
            preset: self.preset.clone(),
            bytes: self.jpeg.len(),
        }
    }
}

pub struct Orchestrator<'a> {
    config: &'a GradingConfig,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a GradingConfig) -> Self {
        Self { config }
    }

    /// Grade an uploaded image with the tone's preset at the default size.
    pub fn process_simple(&self, data: &[u8], tone: Option<&str>) -> Result<ProcessedImage> {
        let resolved = self.config.registry.resolve(tone, RequestMode::Simple);
        tracing::debug!(tone = resolved.id, "Resolved tone");

        let img = codec::decode_oriented(data)?;
        let options = GradeOptions::simple(self.config.default_max_dim);
        let graded = GradingPipeline::grade(img, resolved.preset, &options)?;

        let dims = graded.dimensions;
        let composited = Compositor::composite(graded.image, resolved.preset, dims)?;
        let jpeg = encode_jpeg(&composited, &self.config.output_jpeg())?;

        Ok(ProcessedImage {
            tone: resolved.id.to_string(),
            preset: resolved.preset.clone(),
            dimensions: dims,
            jpeg,
        })
    }

    /// Grade, correct geometry, crop to aspect and composite at the cropped size.
    pub fn process_pro(&self, data: &[u8], request: &ProRequest) -> Result<ProcessedImage> {
        let resolved = self
            .config
            .registry
            .resolve(request.tone.as_deref(), RequestMode::Pro);
        tracing::debug!(tone = resolved.id, geometry = ?request.geometry, "Resolved tone");

        let img = codec::decode_oriented(data)?;
        let options = GradeOptions::pro(&request.geometry);
        let graded = GradingPipeline::grade(img, resolved.preset, &options)?;

        // Base buffer: what the crop operates on
        let intermediate = self.config.intermediate_jpeg();
        let base = decode(&encode_jpeg(&graded.image, &intermediate)?)?;

        let cropped = crop_to_aspect(base, request.geometry.aspect).into_rgb8();
        let materialized = codec::materialize(&cropped, &intermediate)?;
        let dims = FinalDimensions::measure(&materialized);

        let composited = Compositor::composite(materialized, resolved.preset, dims)?;
        let jpeg = encode_jpeg(&composited, &self.config.output_jpeg())?;

        Ok(ProcessedImage {
            tone: resolved.id.to_string(),
            preset: resolved.preset.clone(),
            dimensions: dims,
            jpeg,
        })
    }
}
