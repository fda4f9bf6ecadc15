//! Grading presets and tone resolution
//!
//! The registry maps canonical tone identifiers to their grading parameters.
//! Client input goes through the alias table first and anything unknown
//! falls back to `light-filled`; resolution never fails.

use std::collections::HashMap;

use serde::Serialize;

pub const BRIGHT_FRESH: &str = "bright-fresh";
pub const WARM_SUNSET: &str = "warm-sunset";
pub const MOODY: &str = "moody";
pub const LIGHT_FILLED: &str = "light-filled";
pub const NATURAL: &str = "natural";

/// Blend mode used to composite a layer onto the graded image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    Over,
    Multiply,
    Screen,
    Overlay,
    SoftLight,
    Darken,
    Lighten,
}

impl BlendMode {
    /// Parse a blend mode name. Unknown names composite as `over`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "multiply" => BlendMode::Multiply,
            "screen" => BlendMode::Screen,
            "overlay" => BlendMode::Overlay,
            "soft-light" | "soft_light" | "softlight" => BlendMode::SoftLight,
            "darken" => BlendMode::Darken,
            "lighten" => BlendMode::Lighten,
            _ => BlendMode::Over,
        }
    }
}

/// Solid colour tint laid over the whole image
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TintSpec {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Layer opacity in [0, 1]
    pub alpha: f32,
    pub blend: BlendMode,
}

/// Tonal parameters for one grading look
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradingPreset {
    pub label: String,
    pub brightness: f32,
    pub saturation: f32,
    pub contrast: f32,
    /// Clamped to at least 1.0 when applied
    pub gamma: f32,
    /// Per-channel white balance multipliers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgb: Option<[f32; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay: Option<TintSpec>,
    /// Vignette darkness at the corners, [0, 1]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vignette: Option<f32>,
}

/// Which endpoint variant is resolving a tone; decides the default for absent input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    Simple,
    Pro,
}

/// A tone resolved against the registry
#[derive(Debug, Clone, Copy)]
pub struct ResolvedPreset<'a> {
    pub id: &'a str,
    pub preset: &'a GradingPreset,
}

/// Entry of the public tone listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToneInfo {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct PresetRegistry {
    /// Kept in listing order
    presets: Vec<(String, GradingPreset)>,
    aliases: HashMap<String, String>,
    fallback: String,
    pro_default: String,
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PresetRegistry {
    /// Registry with the production looks and aliases
    pub fn builtin() -> Self {
        let mut registry = Self {
            presets: Vec::with_capacity(BUILTIN_LOOKS.len()),
            aliases: HashMap::with_capacity(BUILTIN_ALIASES.len()),
            fallback: LIGHT_FILLED.to_string(),
            pro_default: BRIGHT_FRESH.to_string(),
        };

        for look in BUILTIN_LOOKS {
            registry.insert(look.id, look.to_preset());
        }
        for (alias, id) in BUILTIN_ALIASES {
            registry.add_alias(*alias, *id);
        }

        registry
    }

    /// Add or replace a preset, keeping listing order for existing ids
    pub fn insert(&mut self, id: impl Into<String>, preset: GradingPreset) {
        let id = id.into();
        match self.presets.iter().position(|(existing, _)| *existing == id) {
            Some(pos) => self.presets[pos].1 = preset,
            None => self.presets.push((id, preset)),
        }
    }

    pub fn add_alias(&mut self, alias: impl Into<String>, id: impl Into<String>) {
        self.aliases
            .insert(alias.into().to_lowercase(), id.into().to_lowercase());
    }

    pub fn get(&self, id: &str) -> Option<&GradingPreset> {
        self.presets
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, preset)| preset)
    }

    /// Resolve a client-supplied tone to a preset.
    ///
    /// Input is trimmed and lower-cased, then mapped through the alias table
    /// before the registry lookup. Absent or empty input takes the mode
    /// default (`bright-fresh` for pro, `light-filled` for simple); unknown
    /// input always takes `light-filled`.
    pub fn resolve(&self, raw_tone: Option<&str>, mode: RequestMode) -> ResolvedPreset<'_> {
        let normalized = raw_tone.map(|t| t.trim().to_lowercase()).unwrap_or_default();

        let wanted: &str = if normalized.is_empty() {
            match mode {
                RequestMode::Pro => self.pro_default.as_str(),
                RequestMode::Simple => self.fallback.as_str(),
            }
        } else {
            self.aliases
                .get(&normalized)
                .map(String::as_str)
                .unwrap_or(normalized.as_str())
        };

        self.lookup(wanted)
            .or_else(|| self.lookup(&self.fallback))
            .or_else(|| self.presets.first().map(|(id, p)| (id.as_str(), p)))
            .map(|(id, preset)| ResolvedPreset { id, preset })
            .unwrap_or_else(|| ResolvedPreset {
                id: LIGHT_FILLED,
                preset: &NEUTRAL,
            })
    }

    /// Tones in listing order
    pub fn tones(&self) -> Vec<ToneInfo> {
        self.presets
            .iter()
            .map(|(id, preset)| ToneInfo {
                id: id.clone(),
                label: preset.label.clone(),
            })
            .collect()
    }

    fn lookup(&self, id: &str) -> Option<(&str, &GradingPreset)> {
        self.presets
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(id, preset)| (id.as_str(), preset))
    }
}

/// Row of the built-in look table; tint is `(r, g, b, alpha, blend)`
struct LookRow {
    id: &'static str,
    label: &'static str,
    brightness: f32,
    saturation: f32,
    contrast: f32,
    gamma: f32,
    rgb: [f32; 3],
    tint: Option<(u8, u8, u8, f32, &'static str)>,
    vignette: Option<f32>,
}

impl LookRow {
    fn to_preset(&self) -> GradingPreset {
        GradingPreset {
            label: self.label.to_string(),
            brightness: self.brightness,
            saturation: self.saturation,
            contrast: self.contrast,
            gamma: self.gamma,
            rgb: Some(self.rgb),
            overlay: self.tint.map(|(r, g, b, alpha, blend)| TintSpec {
                r,
                g,
                b,
                alpha,
                blend: BlendMode::parse(blend),
            }),
            vignette: self.vignette,
        }
    }
}

/// Listing order is table order
const BUILTIN_LOOKS: &[LookRow] = &[
    LookRow {
        id: BRIGHT_FRESH,
        label: "Bright & Fresh",
        brightness: 1.16,
        saturation: 1.02,
        contrast: 1.04,
        gamma: 1.0,
        rgb: [0.985, 1.0, 1.045],
        tint: Some((245, 250, 255, 0.20, "screen")),
        vignette: None,
    },
    LookRow {
        id: WARM_SUNSET,
        label: "Warm Sunset",
        brightness: 1.07,
        saturation: 1.04,
        contrast: 1.06,
        gamma: 1.0,
        rgb: [1.05, 1.02, 0.96],
        tint: Some((255, 205, 140, 0.22, "soft-light")),
        vignette: Some(0.08),
    },
    LookRow {
        id: MOODY,
        label: "Moody Dusk",
        brightness: 0.97,
        saturation: 0.98,
        contrast: 1.12,
        gamma: 1.02,
        rgb: [1.02, 1.0, 0.98],
        tint: Some((25, 35, 60, 0.16, "multiply")),
        vignette: Some(0.18),
    },
    LookRow {
        id: LIGHT_FILLED,
        label: "Light Filled",
        brightness: 1.06,
        saturation: 1.03,
        contrast: 1.06,
        gamma: 1.0,
        rgb: [1.0, 1.0, 1.0],
        tint: None,
        vignette: None,
    },
    LookRow {
        id: NATURAL,
        label: "Natural",
        brightness: 1.0,
        saturation: 1.0,
        contrast: 1.0,
        gamma: 1.0,
        rgb: [1.0, 1.0, 1.0],
        tint: None,
        vignette: None,
    },
];

const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("bright", BRIGHT_FRESH),
    ("fresh", BRIGHT_FRESH),
    ("dusk", MOODY),
    ("moody-dusk", MOODY),
    ("sunset", WARM_SUNSET),
    ("warm", WARM_SUNSET),
    ("light", LIGHT_FILLED),
];

/// Identity look, used only if a registry was emptied of all presets
static NEUTRAL: GradingPreset = GradingPreset {
    label: String::new(),
    brightness: 1.0,
    saturation: 1.0,
    contrast: 1.0,
    gamma: 1.0,
    rgb: None,
    overlay: None,
    vignette: None,
};
