//! Tilt estimation from near-vertical edges.
//!
//! Architectural photos are dominated by walls, door frames and windows that
//! should be vertical. Each strong edge pixel votes with the deviation of its
//! edge from vertical; the median vote is the tilt.

use image::{imageops, RgbImage};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

use crate::geometry::STRAIGHTEN_LIMIT_DEG;

/// Sobel magnitude an edge pixel needs to vote
const MIN_EDGE_MAGNITUDE: f64 = 150.0;
/// Edges leaning further than this are not treated as verticals
const MAX_DEVIATION_DEG: f64 = 15.0;
/// Fewer votes than this means no reliable estimate
const MIN_VOTES: usize = 64;

/// Clockwise rotation in degrees that levels the dominant verticals.
///
/// Returns 0.0 when the image has too few near-vertical edges. The result is
/// clamped to the straighten limit.
pub fn estimate_tilt(img: &RgbImage) -> f64 {
    let (width, height) = img.dimensions();
    if width < 3 || height < 3 {
        return 0.0;
    }

    let gray = imageops::grayscale(img);
    let gx = horizontal_sobel(&gray);
    let gy = vertical_sobel(&gray);

    let mut votes: Vec<f64> = Vec::new();
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let dx = gx.get_pixel(x, y)[0] as f64;
            let dy = gy.get_pixel(x, y)[0] as f64;
            if dx == 0.0 || dx.hypot(dy) < MIN_EDGE_MAGNITUDE {
                continue;
            }
            // A vertical edge has a purely horizontal gradient; the gradient's
            // angle from horizontal is the edge's lean from vertical.
            let deviation = (-dy / dx).atan().to_degrees();
            if deviation.abs() <= MAX_DEVIATION_DEG {
                votes.push(deviation);
            }
        }
    }

    if votes.len() < MIN_VOTES {
        tracing::debug!(votes = votes.len(), "Too few vertical edges to estimate tilt");
        return 0.0;
    }

    votes.sort_by(|a, b| a.total_cmp(b));
    let mid = votes.len() / 2;
    let median = if votes.len() % 2 == 0 {
        (votes[mid - 1] + votes[mid]) / 2.0
    } else {
        votes[mid]
    };

    let tilt = median.clamp(-STRAIGHTEN_LIMIT_DEG, STRAIGHTEN_LIMIT_DEG);
    tracing::debug!(votes = votes.len(), tilt, "Estimated tilt");
    tilt
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// Dark-to-bright vertical edge through the center, leaning by `lean_deg`
    /// (positive: the bottom end is further right).
    fn leaning_edge(size: u32, lean_deg: f64) -> RgbImage {
        let center = size as f64 / 2.0;
        let slope = lean_deg.to_radians().tan();
        let ramp = 4.0;
        RgbImage::from_fn(size, size, |x, y| {
            let edge_x = center + (y as f64 - center) * slope;
            let t = (0.5 + (x as f64 - edge_x) / ramp).clamp(0.0, 1.0);
            let v = (255.0 * t).round() as u8;
            Rgb([v, v, v])
        })
    }

    #[test]
    fn test_uniform_image_has_no_tilt() {
        let img = RgbImage::from_pixel(120, 120, Rgb([128, 128, 128]));
        assert_eq!(estimate_tilt(&img), 0.0);
    }

    #[test]
    fn test_tiny_image_has_no_tilt() {
        let img = RgbImage::from_pixel(2, 2, Rgb([0, 0, 0]));
        assert_eq!(estimate_tilt(&img), 0.0);
    }

    #[test]
    fn test_detects_clockwise_correction() {
        let tilt = estimate_tilt(&leaning_edge(200, 3.0));
        assert!((tilt - 3.0).abs() < 0.5, "tilt was {tilt}");
    }

    #[test]
    fn test_detects_counter_clockwise_correction() {
        let tilt = estimate_tilt(&leaning_edge(200, -2.0));
        assert!((tilt + 2.0).abs() < 0.5, "tilt was {tilt}");
    }

    #[test]
    fn test_upright_edge_has_no_tilt() {
        let tilt = estimate_tilt(&leaning_edge(200, 0.0));
        assert!(tilt.abs() < 0.01, "tilt was {tilt}");
    }

    #[test]
    fn test_steep_lean_is_clamped() {
        let tilt = estimate_tilt(&leaning_edge(200, 12.0));
        assert_eq!(tilt, 5.0);
    }
}
