use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

/// Bounding-box resize that never enlarges
pub struct ImageResize;

impl ImageResize {
    /// Dimensions that fit inside `max_dim`×`max_dim`, preserving aspect ratio.
    ///
    /// Images already inside the box keep their size.
    pub fn fit_within(orig_width: u32, orig_height: u32, max_dim: u32) -> (u32, u32) {
        if orig_width <= max_dim && orig_height <= max_dim {
            return (orig_width, orig_height);
        }

        let scale = (max_dim as f64 / orig_width as f64).min(max_dim as f64 / orig_height as f64);
        let w = (orig_width as f64 * scale).round() as u32;
        let h = (orig_height as f64 * scale).round() as u32;
        (w.clamp(1, max_dim), h.clamp(1, max_dim))
    }

    /// Select appropriate filter type based on resize ratio
    pub fn select_filter(
        orig_width: u32,
        orig_height: u32,
        new_width: u32,
        new_height: u32,
    ) -> FilterType {
        let width_ratio = orig_width as f32 / new_width as f32;
        let height_ratio = orig_height as f32 / new_height as f32;
        let max_ratio = width_ratio.max(height_ratio);

        if max_ratio > 2.0 {
            FilterType::Triangle
        } else if max_ratio > 1.5 {
            FilterType::CatmullRom
        } else {
            FilterType::Lanczos3
        }
    }

    /// Shrink an image to fit inside the bounding box
    pub fn resize_to_fit(img: DynamicImage, max_dim: u32) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        if orig_width == 0 || orig_height == 0 || max_dim == 0 {
            return img;
        }

        let (width, height) = Self::fit_within(orig_width, orig_height, max_dim);
        if (width, height) == (orig_width, orig_height) {
            return img;
        }

        let filter = Self::select_filter(orig_width, orig_height, width, height);
        tracing::debug!(
            orig_width,
            orig_height,
            width,
            height,
            filter = ?filter,
            "Resizing to fit bounding box"
        );
        img.resize_exact(width, height, filter)
    }
}
