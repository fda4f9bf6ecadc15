//! Decoding uploads and encoding JPEG output.

use std::io::Cursor;

use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageReader, RgbImage};

use crate::error::{ProcessingError, Result};
use crate::image::ImageOrientation;

/// JPEG encoder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegOptions {
    pub quality: u8,
    pub progressive: bool,
    pub optimize_coding: bool,
}

impl JpegOptions {
    /// Progressive scan with optimized Huffman tables
    pub fn progressive(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            progressive: true,
            optimize_coding: true,
        }
    }
}

/// Decode an uploaded image, guessing its format from the content.
pub fn decode(data: &[u8]) -> Result<DynamicImage> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .decode()?;

    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(ProcessingError::EmptyImage { width, height });
    }
    Ok(img)
}

/// Decode and turn upright according to the EXIF orientation tag.
pub fn decode_oriented(data: &[u8]) -> Result<DynamicImage> {
    let img = decode(data)?;
    Ok(ImageOrientation::apply_exif_orientation(img, data))
}

/// Encode an RGB buffer as JPEG using mozjpeg
pub fn encode_jpeg(img: &RgbImage, options: &JpegOptions) -> Result<Bytes> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(ProcessingError::EmptyImage { width, height });
    }

    let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
    comp.set_size(width as usize, height as usize);
    comp.set_quality(options.quality as f32);
    if options.progressive {
        comp.set_progressive_mode();
    }
    comp.set_optimize_coding(options.optimize_coding);

    let encode_err = |e: std::io::Error| ProcessingError::Encode(e.to_string());
    let mut comp = comp.start_compress(Vec::new()).map_err(encode_err)?;
    comp.write_scanlines(img.as_raw()).map_err(encode_err)?;
    let jpeg_data = comp.finish().map_err(encode_err)?;

    tracing::debug!(
        width,
        height,
        quality = options.quality,
        bytes = jpeg_data.len(),
        "Encoded JPEG"
    );

    Ok(Bytes::from(jpeg_data))
}

/// Round-trip through the encoder so the buffer holds exactly what a client
/// would decode from the delivered bytes.
pub fn materialize(img: &RgbImage, options: &JpegOptions) -> Result<RgbImage> {
    let encoded = encode_jpeg(img, options)?;
    Ok(decode(&encoded)?.to_rgb8())
}
