//! Response bodies of the public API.

use lumigrade_processing::{DebugMetadata, ToneInfo};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub ok: bool,
}

/// One selectable tone
#[derive(Debug, Serialize, ToSchema)]
pub struct ToneResponse {
    #[schema(example = "bright-fresh")]
    pub id: String,
    #[schema(example = "Bright & Fresh")]
    pub label: String,
}

impl From<ToneInfo> for ToneResponse {
    fn from(info: ToneInfo) -> Self {
        Self {
            id: info.id,
            label: info.label,
        }
    }
}

/// Metadata returned instead of the JPEG when `debug=1`
#[derive(Debug, Serialize, ToSchema)]
pub struct DebugResponse {
    pub tone: String,
    pub width: u32,
    pub height: u32,
    /// Parameters of the preset that was applied
    #[schema(value_type = Object)]
    pub preset: serde_json::Value,
    /// Size of the encoded JPEG
    pub bytes: usize,
}

impl TryFrom<DebugMetadata> for DebugResponse {
    type Error = serde_json::Error;

    fn try_from(meta: DebugMetadata) -> Result<Self, Self::Error> {
        Ok(Self {
            preset: serde_json::to_value(&meta.preset)?,
            tone: meta.tone,
            width: meta.width,
            height: meta.height,
            bytes: meta.bytes,
        })
    }
}
