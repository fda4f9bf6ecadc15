//! Lumigrade processing library
//!
//! Tone presets, the grading pipeline, overlay compositing, aspect cropping
//! and JPEG encoding. Everything here is synchronous and CPU-bound; callers
//! run it on a blocking thread.

pub mod codec;
pub mod composite;
pub mod config;
pub mod error;
pub mod geometry;
pub mod grading;
pub mod image;
pub mod orchestrator;
pub mod presets;

pub use composite::{CompositeLayer, Compositor, FinalDimensions};
pub use config::GradingConfig;
pub use error::ProcessingError;
pub use geometry::{parse_aspect, GeometryParams, Straighten};
pub use grading::{GradeOptions, GradedImage, GradingPipeline};
pub use orchestrator::{DebugMetadata, Orchestrator, ProRequest, ProcessedImage};
pub use presets::{BlendMode, GradingPreset, PresetRegistry, RequestMode, ToneInfo};
