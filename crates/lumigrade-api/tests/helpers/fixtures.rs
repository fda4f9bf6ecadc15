//! Test fixtures: photos generated in memory.

use std::io::Cursor;

use axum_test::multipart::{MultipartForm, Part};
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};

/// JPEG with a colour gradient so grading has something to work on.
pub fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        Rgb([r, g, 128])
    });
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
        .expect("Failed to encode test JPEG");
    buffer
}

/// Multipart form carrying `data` in the `image` field.
pub fn image_form(data: Vec<u8>) -> MultipartForm {
    MultipartForm::new().add_part(
        "image",
        Part::bytes(data)
            .file_name("photo.jpg")
            .mime_type("image/jpeg"),
    )
}

/// Pixel size of an encoded image.
pub fn decoded_dimensions(data: &[u8]) -> (u32, u32) {
    image::load_from_memory(data)
        .expect("Response is not a decodable image")
        .dimensions()
}
