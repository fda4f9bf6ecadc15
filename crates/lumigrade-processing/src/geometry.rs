//! Aspect-ratio crop planning and geometric-correction parameters.
//!
//! Everything here is pure arithmetic over dimensions; the pixel work for
//! rotation and shear lives in [`crate::image::ops`].

use image::{DynamicImage, GenericImageView};

/// Largest straighten angle accepted, in degrees
pub const STRAIGHTEN_LIMIT_DEG: f64 = 5.0;
/// Largest vertical shear coefficient accepted
pub const VERTICAL_LIMIT: f64 = 0.25;
/// Straighten angles below this magnitude are skipped
pub const STRAIGHTEN_EPSILON: f64 = 0.001;
/// Shear coefficients below this magnitude are skipped
pub const VERTICAL_EPSILON: f64 = 0.0001;

pub const DEFAULT_STRAIGHTEN_DEG: f64 = -0.4;
pub const DEFAULT_VERTICAL: f64 = 0.03;
pub const DEFAULT_ASPECT: &str = "4:3";

/// Parse an aspect ratio written as `"W:H"`.
///
/// Both parts must be finite positive numbers. Anything else means "no crop".
pub fn parse_aspect(s: Option<&str>) -> Option<f64> {
    let (w, h) = s?.trim().split_once(':')?;
    let w: f64 = w.trim().parse().ok()?;
    let h: f64 = h.trim().parse().ok()?;

    if !w.is_finite() || !h.is_finite() || w <= 0.0 || h <= 0.0 {
        return None;
    }

    let ratio = w / h;
    ratio.is_finite().then_some(ratio)
}

/// Region to extract from an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// Plan the largest centered crop of `width`×`height` with the given ratio.
///
/// Returns `None` when there is nothing to do: no ratio, an empty image or an
/// image that already has the target ratio.
pub fn plan_center_crop(width: u32, height: u32, ratio: Option<f64>) -> Option<CropRect> {
    let target = ratio?;
    if width == 0 || height == 0 || !target.is_finite() || target <= 0.0 {
        return None;
    }

    let current = width as f64 / height as f64;

    let (new_width, new_height) = if current > target {
        let w = (height as f64 * target).round() as u32;
        (w.clamp(1, width), height)
    } else if current < target {
        let h = (width as f64 / target).round() as u32;
        (width, h.clamp(1, height))
    } else {
        return None;
    };

    if new_width == width && new_height == height {
        return None;
    }

    Some(CropRect {
        left: (width - new_width) / 2,
        top: (height - new_height) / 2,
        width: new_width,
        height: new_height,
    })
}

/// Center-crop an image to the given ratio; unchanged when no crop is planned.
pub fn crop_to_aspect(img: DynamicImage, ratio: Option<f64>) -> DynamicImage {
    let (width, height) = img.dimensions();
    match plan_center_crop(width, height, ratio) {
        Some(rect) => {
            tracing::debug!(
                from_width = width,
                from_height = height,
                left = rect.left,
                top = rect.top,
                width = rect.width,
                height = rect.height,
                "Cropping to aspect ratio"
            );
            img.crop_imm(rect.left, rect.top, rect.width, rect.height)
        }
        None => img,
    }
}

/// Clamp a straighten angle and drop it when negligible.
pub fn straighten_angle(degrees: f64) -> Option<f64> {
    if !degrees.is_finite() {
        return None;
    }
    let clamped = degrees.clamp(-STRAIGHTEN_LIMIT_DEG, STRAIGHTEN_LIMIT_DEG);
    (clamped.abs() >= STRAIGHTEN_EPSILON).then_some(clamped)
}

/// Clamp a vertical shear coefficient and drop it when negligible.
pub fn vertical_shear(coefficient: f64) -> Option<f64> {
    if !coefficient.is_finite() {
        return None;
    }
    let clamped = coefficient.clamp(-VERTICAL_LIMIT, VERTICAL_LIMIT);
    (clamped.abs() >= VERTICAL_EPSILON).then_some(clamped)
}

/// How the pro pipeline should level the image
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Straighten {
    /// Rotate by a fixed angle in degrees, positive is clockwise
    Degrees(f64),
    /// Estimate the tilt from near-vertical edges
    Auto,
}

impl Straighten {
    /// Parse a form value: `auto` or a number of degrees. Anything else is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("auto") {
            return Some(Straighten::Auto);
        }
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Straighten::Degrees)
    }
}

/// Geometric options of a pro request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryParams {
    pub max_dim: u32,
    pub straighten: Straighten,
    pub vertical: f64,
    /// Target width/height ratio; `None` keeps the graded framing
    pub aspect: Option<f64>,
}

impl GeometryParams {
    pub fn new(max_dim: u32) -> Self {
        Self {
            max_dim,
            straighten: Straighten::Degrees(DEFAULT_STRAIGHTEN_DEG),
            vertical: DEFAULT_VERTICAL,
            aspect: parse_aspect(Some(DEFAULT_ASPECT)),
        }
    }

    /// Shear coefficient to apply, if any
    pub fn vertical_shear(&self) -> Option<f64> {
        vertical_shear(self.vertical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_parse_aspect_valid() {
        let ratio = parse_aspect(Some("4:3")).unwrap();
        assert!((ratio - 4.0 / 3.0).abs() < 1e-12);
        assert_eq!(parse_aspect(Some("1:1")), Some(1.0));
        assert_eq!(parse_aspect(Some(" 16 : 9 ")), Some(16.0 / 9.0));
        assert_eq!(parse_aspect(Some("1.5:1")), Some(1.5));
    }

    #[test]
    fn test_parse_aspect_invalid() {
        assert_eq!(parse_aspect(None), None);
        assert_eq!(parse_aspect(Some("")), None);
        assert_eq!(parse_aspect(Some("bad")), None);
        assert_eq!(parse_aspect(Some("0:3")), None);
        assert_eq!(parse_aspect(Some("3:0")), None);
        assert_eq!(parse_aspect(Some("-4:3")), None);
        assert_eq!(parse_aspect(Some("4:x")), None);
        assert_eq!(parse_aspect(Some("inf:1")), None);
        assert_eq!(parse_aspect(Some("NaN:1")), None);
    }

    #[test]
    fn test_plan_center_crop_wide_to_square() {
        let rect = plan_center_crop(1000, 500, Some(1.0)).unwrap();
        assert_eq!(
            rect,
            CropRect {
                left: 250,
                top: 0,
                width: 500,
                height: 500
            }
        );
    }

    #[test]
    fn test_plan_center_crop_tall_to_landscape() {
        let rect = plan_center_crop(600, 900, Some(4.0 / 3.0)).unwrap();
        assert_eq!(rect.width, 600);
        assert_eq!(rect.height, 450);
        assert_eq!(rect.left, 0);
        assert_eq!(rect.top, 225);
    }

    #[test]
    fn test_plan_center_crop_offsets_floor() {
        // 1001 - 500 = 501, offset floors to 250
        let rect = plan_center_crop(1001, 500, Some(1.0)).unwrap();
        assert_eq!(rect.left, 250);
        assert_eq!(rect.width, 500);
    }

    #[test]
    fn test_plan_center_crop_noop_cases() {
        assert_eq!(plan_center_crop(800, 600, Some(4.0 / 3.0)), None);
        assert_eq!(plan_center_crop(800, 600, None), None);
        assert_eq!(plan_center_crop(0, 600, Some(1.0)), None);
        assert_eq!(plan_center_crop(800, 0, Some(1.0)), None);
    }

    #[test]
    fn test_crop_to_aspect() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(1000, 500, Rgb([10, 20, 30])));
        let cropped = crop_to_aspect(img.clone(), Some(1.0));
        assert_eq!(cropped.dimensions(), (500, 500));

        let untouched = crop_to_aspect(img, parse_aspect(Some("bad")));
        assert_eq!(untouched.dimensions(), (1000, 500));
    }

    #[test]
    fn test_straighten_clamp_and_epsilon() {
        assert_eq!(straighten_angle(12.0), Some(5.0));
        assert_eq!(straighten_angle(-9.0), Some(-5.0));
        assert_eq!(straighten_angle(-0.4), Some(-0.4));
        assert_eq!(straighten_angle(0.0005), None);
        assert_eq!(straighten_angle(0.0), None);
        assert_eq!(straighten_angle(f64::NAN), None);
    }

    #[test]
    fn test_vertical_clamp_and_epsilon() {
        assert_eq!(vertical_shear(1.0), Some(0.25));
        assert_eq!(vertical_shear(-0.3), Some(-0.25));
        assert_eq!(vertical_shear(0.03), Some(0.03));
        assert_eq!(vertical_shear(0.00005), None);
    }

    #[test]
    fn test_straighten_parse() {
        assert_eq!(Straighten::parse("auto"), Some(Straighten::Auto));
        assert_eq!(Straighten::parse(" AUTO "), Some(Straighten::Auto));
        assert_eq!(Straighten::parse("1.5"), Some(Straighten::Degrees(1.5)));
        assert_eq!(Straighten::parse("level"), None);
    }

    #[test]
    fn test_geometry_defaults() {
        let params = GeometryParams::new(2560);
        assert_eq!(params.straighten, Straighten::Degrees(-0.4));
        assert_eq!(params.vertical_shear(), Some(0.03));
        assert!((params.aspect.unwrap() - 4.0 / 3.0).abs() < 1e-12);
    }
}
