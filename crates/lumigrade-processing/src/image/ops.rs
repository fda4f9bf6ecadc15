//! Per-pixel tonal operations and geometric warps on 8-bit RGB buffers.

use image::{imageops, Rgb, RgbImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};

/// Rec.601 luma weights
const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

const NORMALISE_LOW_PERCENTILE: f64 = 0.01;
const NORMALISE_HIGH_PERCENTILE: f64 = 0.99;

const SHARPEN_SIGMA: f32 = 1.0;
const FILL: Rgb<u8> = Rgb([0, 0, 0]);

#[inline]
fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[inline]
fn luma(r: f32, g: f32, b: f32) -> f32 {
    LUMA_R * r + LUMA_G * g + LUMA_B * b
}

fn apply_lut(img: &mut RgbImage, lut: &[u8; 256]) {
    for p in img.pixels_mut() {
        p.0 = [lut[p[0] as usize], lut[p[1] as usize], lut[p[2] as usize]];
    }
}

fn build_lut(f: impl Fn(f32) -> f32) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (i, slot) in lut.iter_mut().enumerate() {
        *slot = clamp_u8(f(i as f32));
    }
    lut
}

/// Luminance level at which the cumulative histogram passes `fraction`
fn percentile(histogram: &[u64; 256], total: u64, fraction: f64) -> u8 {
    let threshold = (total as f64 * fraction).max(1.0);
    let mut cumulative = 0u64;
    for (level, count) in histogram.iter().enumerate() {
        cumulative += count;
        if cumulative as f64 >= threshold {
            return level as u8;
        }
    }
    255
}

/// Stretch luminance between its 1st and 99th percentile to the full range.
///
/// Returns false (and leaves the image alone) for flat images.
pub fn normalise(img: &mut RgbImage) -> bool {
    let total = img.width() as u64 * img.height() as u64;
    if total == 0 {
        return false;
    }

    let mut histogram = [0u64; 256];
    for p in img.pixels() {
        let y = clamp_u8(luma(p[0] as f32, p[1] as f32, p[2] as f32));
        histogram[y as usize] += 1;
    }

    let low = percentile(&histogram, total, NORMALISE_LOW_PERCENTILE);
    let high = percentile(&histogram, total, NORMALISE_HIGH_PERCENTILE);
    if high <= low {
        return false;
    }

    let (low, high) = (low as f32, high as f32);
    let scale = 255.0 / (high - low);
    let lut = build_lut(|v| (v - low) * scale);
    apply_lut(img, &lut);
    true
}

/// Multiply each channel by its own factor, zero offset.
pub fn linear_rgb(img: &mut RgbImage, factors: [f32; 3]) {
    if factors == [1.0, 1.0, 1.0] {
        return;
    }
    let luts = factors.map(|f| build_lut(|v| v * f));
    for p in img.pixels_mut() {
        p.0 = [
            luts[0][p[0] as usize],
            luts[1][p[1] as usize],
            luts[2][p[2] as usize],
        ];
    }
}

/// Scale brightness, then scale chroma about the pixel's luma.
pub fn modulate(img: &mut RgbImage, brightness: f32, saturation: f32) {
    if brightness == 1.0 && saturation == 1.0 {
        return;
    }
    for p in img.pixels_mut() {
        let r = p[0] as f32 * brightness;
        let g = p[1] as f32 * brightness;
        let b = p[2] as f32 * brightness;
        let y = luma(r, g, b);
        p.0 = [
            clamp_u8(y + (r - y) * saturation),
            clamp_u8(y + (g - y) * saturation),
            clamp_u8(y + (b - y) * saturation),
        ];
    }
}

/// Gamma correction `out = in^(1/γ)` with γ floored at 1.0.
///
/// Values at or below 1.0 are the identity.
pub fn gamma(img: &mut RgbImage, gamma: f32) {
    let gamma = gamma.max(1.0);
    if gamma == 1.0 || !gamma.is_finite() {
        return;
    }
    let exponent = 1.0 / gamma;
    let lut = build_lut(|v| 255.0 * (v / 255.0).powf(exponent));
    apply_lut(img, &lut);
}

/// Linear contrast: scale by `factor`, zero offset.
pub fn contrast(img: &mut RgbImage, factor: f32) {
    if factor == 1.0 {
        return;
    }
    let lut = build_lut(|v| v * factor);
    apply_lut(img, &lut);
}

/// Unsharp mask with the fixed sigma used for every look.
pub fn sharpen(img: &RgbImage) -> RgbImage {
    imageops::unsharpen(img, SHARPEN_SIGMA, 0)
}

/// Canvas size of a `width`×`height` image rotated by `degrees`.
pub fn rotated_bounds(width: u32, height: u32, degrees: f64) -> (u32, u32) {
    let theta = degrees.to_radians();
    let cos = theta.cos().abs();
    let sin = theta.sin().abs();
    let w = width as f64;
    let h = height as f64;

    let new_w = (w * cos + h * sin).round() as u32;
    let new_h = (w * sin + h * cos).round() as u32;
    (new_w.max(1), new_h.max(1))
}

/// Rotate clockwise by `degrees` about the center.
///
/// The canvas grows to hold the whole rotated image; uncovered corners are black.
pub fn rotate(img: &RgbImage, degrees: f64) -> RgbImage {
    let (width, height) = img.dimensions();
    let (out_w, out_h) = rotated_bounds(width, height, degrees);

    let projection = Projection::translate(out_w as f32 / 2.0, out_h as f32 / 2.0)
        * Projection::rotate(degrees.to_radians() as f32)
        * Projection::translate(-(width as f32) / 2.0, -(height as f32) / 2.0);

    let mut out = RgbImage::from_pixel(out_w, out_h, FILL);
    warp_into(img, &projection, Interpolation::Bilinear, FILL, &mut out);
    out
}

/// Horizontal shear `x' = x + v·y`, the affine `[[1, v], [0, 1]]`.
///
/// The canvas widens by `|v|·height`; uncovered areas are black. Rows only
/// move sideways, so each one is resampled linearly on its own.
pub fn shear(img: &RgbImage, v: f64) -> RgbImage {
    let (width, height) = img.dimensions();
    let extra = (v.abs() * height as f64).round() as u32;
    let out_w = width + extra;
    let mut out = RgbImage::from_pixel(out_w, height, FILL);
    if width == 0 {
        return out;
    }

    // Negative shear moves the bottom rows left; shift everything back in view.
    let origin = if v < 0.0 { extra as f64 } else { 0.0 };
    let last = (width - 1) as f64;

    for y in 0..height {
        let shift = origin + v * y as f64;
        for x in 0..out_w {
            let sx = x as f64 - shift;
            if sx < -0.5 || sx > last + 0.5 {
                continue;
            }
            let sx = sx.clamp(0.0, last);
            let x0 = sx.floor() as u32;
            let x1 = (x0 + 1).min(width - 1);
            let t = (sx - x0 as f64) as f32;
            let a = img.get_pixel(x0, y);
            let b = img.get_pixel(x1, y);
            out.put_pixel(
                x,
                y,
                Rgb([
                    clamp_u8(a[0] as f32 + (b[0] as f32 - a[0] as f32) * t),
                    clamp_u8(a[1] as f32 + (b[1] as f32 - a[1] as f32) * t),
                    clamp_u8(a[2] as f32 + (b[2] as f32 - a[2] as f32) * t),
                ]),
            );
        }
    }
    out
}
