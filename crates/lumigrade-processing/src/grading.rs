//! The ordered tonal and geometric grading pipeline.

use image::{DynamicImage, GenericImageView, RgbImage};

use crate::composite::FinalDimensions;
use crate::error::{ProcessingError, Result};
use crate::geometry::{straighten_angle, vertical_shear, GeometryParams, Straighten};
use crate::image::{estimate_tilt, ops, ImageResize};
use crate::presets::GradingPreset;

/// Per-request pipeline options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeOptions {
    pub max_dim: u32,
    /// Rotation applied after the tonal stages (pro mode only)
    pub straighten: Option<Straighten>,
    /// Vertical shear applied after rotation (pro mode only)
    pub vertical: Option<f64>,
}

impl GradeOptions {
    /// Tonal grading only
    pub fn simple(max_dim: u32) -> Self {
        Self {
            max_dim,
            straighten: None,
            vertical: None,
        }
    }

    /// Tonal grading followed by the geometric corrections
    pub fn pro(params: &GeometryParams) -> Self {
        Self {
            max_dim: params.max_dim,
            straighten: Some(params.straighten),
            vertical: Some(params.vertical),
        }
    }
}

/// Output of the pipeline with its measured size
#[derive(Debug, Clone)]
pub struct GradedImage {
    pub image: RgbImage,
    pub dimensions: FinalDimensions,
}

pub struct GradingPipeline;

impl GradingPipeline {
    /// Grade an upright (EXIF-corrected) image.
    ///
    /// Stages run in a fixed order: 8-bit RGB, bounding-box resize,
    /// normalise, white balance, brightness/saturation, gamma, contrast,
    /// sharpen, then the optional rotation and shear.
    pub fn grade(
        img: DynamicImage,
        preset: &GradingPreset,
        options: &GradeOptions,
    ) -> Result<GradedImage> {
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(ProcessingError::EmptyImage { width, height });
        }

        let rgb = DynamicImage::ImageRgb8(img.into_rgb8());
        let mut rgb = ImageResize::resize_to_fit(rgb, options.max_dim).into_rgb8();

        let normalised = ops::normalise(&mut rgb);
        if let Some(factors) = preset.rgb {
            ops::linear_rgb(&mut rgb, factors);
        }
        ops::modulate(&mut rgb, preset.brightness, preset.saturation);
        ops::gamma(&mut rgb, preset.gamma);
        ops::contrast(&mut rgb, preset.contrast);
        let mut rgb = ops::sharpen(&rgb);

        tracing::debug!(
            width = rgb.width(),
            height = rgb.height(),
            normalised,
            "Applied tonal grading"
        );

        if let Some(straighten) = options.straighten {
            let requested = match straighten {
                Straighten::Degrees(degrees) => degrees,
                Straighten::Auto => estimate_tilt(&rgb),
            };
            if let Some(angle) = straighten_angle(requested) {
                tracing::debug!(angle, "Straightening");
                rgb = ops::rotate(&rgb, angle);
            }
        }

        if let Some(v) = options.vertical.and_then(vertical_shear) {
            tracing::debug!(shear = v, "Correcting verticals");
            rgb = ops::shear(&rgb, v);
        }

        let dimensions = FinalDimensions::measure(&rgb);
        Ok(GradedImage {
            image: rgb,
            dimensions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::{PresetRegistry, MOODY, NATURAL};
    use image::Rgb;

    fn gray_image(w: u32, h: u32, v: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([v, v, v])))
    }

    fn pro_options(straighten: f64, vertical: f64) -> GradeOptions {
        GradeOptions {
            max_dim: 2560,
            straighten: Some(Straighten::Degrees(straighten)),
            vertical: Some(vertical),
        }
    }

    #[test]
    fn test_natural_keeps_mid_gray() {
        let registry = PresetRegistry::builtin();
        let preset = registry.get(NATURAL).unwrap();
        let graded =
            GradingPipeline::grade(gray_image(64, 48, 128), preset, &GradeOptions::simple(2560))
                .unwrap();
        assert_eq!(graded.dimensions.as_tuple(), (64, 48));
        assert!(graded
            .image
            .pixels()
            .all(|p| p.0.iter().all(|&c| (127..=129).contains(&c))));
    }

    #[test]
    fn test_resize_preserves_ratio() {
        let registry = PresetRegistry::builtin();
        let preset = registry.get(MOODY).unwrap();
        let graded =
            GradingPipeline::grade(gray_image(400, 200, 90), preset, &GradeOptions::simple(100))
                .unwrap();
        assert_eq!(graded.dimensions.as_tuple(), (100, 50));
        assert_eq!(graded.image.dimensions(), (100, 50));
    }

    #[test]
    fn test_gamma_below_one_matches_gamma_one() {
        let registry = PresetRegistry::builtin();
        let mut low = registry.get(NATURAL).unwrap().clone();
        low.gamma = 0.8;
        let one = registry.get(NATURAL).unwrap();

        let source = DynamicImage::ImageRgb8(RgbImage::from_fn(32, 32, |x, y| {
            Rgb([(x * 8) as u8, (y * 8) as u8, 100])
        }));
        let options = GradeOptions::simple(2560);
        let a = GradingPipeline::grade(source.clone(), &low, &options).unwrap();
        let b = GradingPipeline::grade(source, one, &options).unwrap();
        assert_eq!(a.image, b.image);
    }

    #[test]
    fn test_negligible_straighten_is_skipped() {
        let registry = PresetRegistry::builtin();
        let preset = registry.get(MOODY).unwrap();
        let source = DynamicImage::ImageRgb8(RgbImage::from_fn(40, 30, |x, y| {
            Rgb([(x * 6) as u8, (y * 8) as u8, 60])
        }));

        let tiny = GradingPipeline::grade(source.clone(), preset, &pro_options(0.0005, 0.0))
            .unwrap();
        let zero = GradingPipeline::grade(source, preset, &pro_options(0.0, 0.0)).unwrap();
        assert_eq!(tiny.image, zero.image);
        assert_eq!(tiny.dimensions.as_tuple(), (40, 30));
    }

    #[test]
    fn test_straighten_and_shear_expand_canvas() {
        let registry = PresetRegistry::builtin();
        let preset = registry.get(NATURAL).unwrap();
        let graded =
            GradingPipeline::grade(gray_image(200, 100, 128), preset, &pro_options(3.0, 0.1))
                .unwrap();
        let (rotated_w, rotated_h) = ops::rotated_bounds(200, 100, 3.0);
        let extra = (0.1 * rotated_h as f64).round() as u32;
        assert_eq!(graded.dimensions.as_tuple(), (rotated_w + extra, rotated_h));
        assert_eq!(graded.image.get_pixel(0, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_straighten_is_clamped() {
        let registry = PresetRegistry::builtin();
        let preset = registry.get(NATURAL).unwrap();
        let graded =
            GradingPipeline::grade(gray_image(200, 100, 128), preset, &pro_options(30.0, 0.0))
                .unwrap();
        assert_eq!(
            graded.dimensions.as_tuple(),
            ops::rotated_bounds(200, 100, 5.0)
        );
    }

    #[test]
    fn test_auto_straighten_on_featureless_image_is_noop() {
        let registry = PresetRegistry::builtin();
        let preset = registry.get(NATURAL).unwrap();
        let options = GradeOptions {
            max_dim: 2560,
            straighten: Some(Straighten::Auto),
            vertical: None,
        };
        let graded = GradingPipeline::grade(gray_image(80, 60, 128), preset, &options).unwrap();
        assert_eq!(graded.dimensions.as_tuple(), (80, 60));
    }
}
