//! Tint and vignette layers composited at the final output size.
//!
//! Layers are synthesized for a [`FinalDimensions`], which can only be
//! obtained by measuring a real buffer. The compositor refuses to blend a
//! layer whose size differs from the image it is applied to.

use image::{GenericImageView, Rgba, RgbaImage, RgbImage};

use crate::error::{ProcessingError, Result};
use crate::presets::{BlendMode, GradingPreset, TintSpec};

/// Gradient radius as a fraction of each axis
const VIGNETTE_RADIUS: f32 = 0.65;
/// Gradient stop inside which the vignette is fully transparent
const VIGNETTE_INNER_STOP: f32 = 0.55;

/// Pixel size of a materialized image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalDimensions {
    width: u32,
    height: u32,
}

impl FinalDimensions {
    /// Capture the size of an actual buffer
    pub fn measure<I: GenericImageView>(img: &I) -> Self {
        let (width, height) = img.dimensions();
        Self { width, height }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_tuple(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn ensure_matches<I: GenericImageView>(&self, img: &I) -> Result<()> {
        let (actual_width, actual_height) = img.dimensions();
        if (actual_width, actual_height) != (self.width, self.height) {
            return Err(ProcessingError::DimensionMismatch {
                expected_width: self.width,
                expected_height: self.height,
                actual_width,
                actual_height,
            });
        }
        Ok(())
    }
}

/// RGBA layer and the mode it blends with
#[derive(Debug, Clone)]
pub struct CompositeLayer {
    pub pixels: RgbaImage,
    pub blend: BlendMode,
}

impl CompositeLayer {
    /// Solid tint covering the whole canvas
    pub fn tint(spec: &TintSpec, dims: FinalDimensions) -> Self {
        let alpha = (spec.alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self {
            pixels: RgbaImage::from_pixel(
                dims.width,
                dims.height,
                Rgba([spec.r, spec.g, spec.b, alpha]),
            ),
            blend: spec.blend,
        }
    }

    /// Black radial gradient darkening towards the corners, blended with multiply.
    ///
    /// The gradient is elliptical on non-square canvases: its radius is 65%
    /// of each axis. Opacity is zero up to 55% of the radius, ramps linearly
    /// to `strength` at the radius and stays there beyond it.
    pub fn vignette(strength: f32, dims: FinalDimensions) -> Self {
        let strength = strength.clamp(0.0, 1.0);
        let (w, h) = (dims.width as f32, dims.height as f32);
        let (cx, cy) = (w / 2.0, h / 2.0);

        let pixels = RgbaImage::from_fn(dims.width, dims.height, |x, y| {
            let nx = (x as f32 + 0.5 - cx) / w;
            let ny = (y as f32 + 0.5 - cy) / h;
            let d = (nx * nx + ny * ny).sqrt() / VIGNETTE_RADIUS;
            let t = ((d - VIGNETTE_INNER_STOP) / (1.0 - VIGNETTE_INNER_STOP)).clamp(0.0, 1.0);
            let alpha = (t * strength * 255.0).round() as u8;
            Rgba([0, 0, 0, alpha])
        });

        Self {
            pixels,
            blend: BlendMode::Multiply,
        }
    }
}

/// Separable blend function on normalized channels (backdrop, source)
fn blend_channel(mode: BlendMode, b: f32, s: f32) -> f32 {
    match mode {
        BlendMode::Over => s,
        BlendMode::Multiply => b * s,
        BlendMode::Screen => b + s - b * s,
        BlendMode::Overlay => {
            if b <= 0.5 {
                2.0 * b * s
            } else {
                1.0 - 2.0 * (1.0 - b) * (1.0 - s)
            }
        }
        BlendMode::SoftLight => {
            if s <= 0.5 {
                b - (1.0 - 2.0 * s) * b * (1.0 - b)
            } else {
                let d = if b <= 0.25 {
                    ((16.0 * b - 12.0) * b + 4.0) * b
                } else {
                    b.sqrt()
                };
                b + (2.0 * s - 1.0) * (d - b)
            }
        }
        BlendMode::Darken => b.min(s),
        BlendMode::Lighten => b.max(s),
    }
}

pub struct Compositor;

impl Compositor {
    /// Layers a preset asks for, in blend order: tint, then vignette
    pub fn layers(preset: &GradingPreset, dims: FinalDimensions) -> Vec<CompositeLayer> {
        let mut layers = Vec::with_capacity(2);
        if let Some(tint) = &preset.overlay {
            layers.push(CompositeLayer::tint(tint, dims));
        }
        if let Some(strength) = preset.vignette {
            layers.push(CompositeLayer::vignette(strength, dims));
        }
        layers
    }

    /// Composite the preset's layers onto `img`, which must measure `dims`.
    pub fn composite(
        mut img: RgbImage,
        preset: &GradingPreset,
        dims: FinalDimensions,
    ) -> Result<RgbImage> {
        dims.ensure_matches(&img)?;

        let layers = Self::layers(preset, dims);
        for layer in &layers {
            Self::apply_layer(&mut img, layer)?;
        }

        tracing::debug!(
            width = dims.width,
            height = dims.height,
            layers = layers.len(),
            "Composited overlays"
        );
        Ok(img)
    }

    /// Blend one layer onto an opaque backdrop
    pub fn apply_layer(img: &mut RgbImage, layer: &CompositeLayer) -> Result<()> {
        FinalDimensions::measure(&*img).ensure_matches(&layer.pixels)?;

        for (dst, src) in img.pixels_mut().zip(layer.pixels.pixels()) {
            let alpha = src[3] as f32 / 255.0;
            if alpha == 0.0 {
                continue;
            }
            for c in 0..3 {
                let b = dst[c] as f32 / 255.0;
                let s = src[c] as f32 / 255.0;
                let mixed = (1.0 - alpha) * b + alpha * blend_channel(layer.blend, b, s);
                dst[c] = (mixed * 255.0).round().clamp(0.0, 255.0) as u8;
            }
        }
        Ok(())
    }
}
