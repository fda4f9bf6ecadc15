use std::io::Cursor;

use image::DynamicImage;

/// Image orientation operations (rotation and flipping)
pub struct ImageOrientation;

impl ImageOrientation {
    /// Read the EXIF orientation tag, 1 (normal) when absent or unreadable
    pub fn read_exif_orientation(data: &[u8]) -> u8 {
        let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(data)) {
            Ok(exif) => exif,
            Err(_) => return 1,
        };

        exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .and_then(|v| u8::try_from(v).ok())
            .filter(|v| (1..=8).contains(v))
            .unwrap_or(1)
    }

    /// Map an EXIF orientation to (clockwise rotation, flip horizontal, flip vertical).
    ///
    /// Flips are applied before the rotation.
    pub fn get_orientation_transforms(orientation: u8) -> (Option<u16>, bool, bool) {
        match orientation {
            1 => (None, false, false),      // Normal
            2 => (None, true, false),       // Mirror horizontal
            3 => (Some(180), false, false), // Rotate 180
            4 => (None, false, true),       // Mirror vertical
            5 => (Some(270), true, false),  // Mirror horizontal + Rotate 270 CW
            6 => (Some(90), false, false),  // Rotate 90 CW
            7 => (Some(90), true, false),   // Mirror horizontal + Rotate 90 CW
            8 => (Some(270), false, false), // Rotate 270 CW
            _ => (None, false, false),
        }
    }

    /// Apply EXIF orientation correction to an image decoded from `data`
    pub fn apply_exif_orientation(img: DynamicImage, data: &[u8]) -> DynamicImage {
        let orientation = Self::read_exif_orientation(data);
        Self::apply_orientation(img, orientation)
    }

    pub fn apply_orientation(mut img: DynamicImage, orientation: u8) -> DynamicImage {
        let (rotate, flip_h, flip_v) = Self::get_orientation_transforms(orientation);
        if orientation != 1 {
            tracing::debug!(
                orientation = orientation,
                rotate = ?rotate,
                flip_horizontal = flip_h,
                flip_vertical = flip_v,
                "Applying EXIF orientation"
            );
        }

        if flip_h {
            img = img.fliph();
        }
        if flip_v {
            img = img.flipv();
        }

        match rotate {
            Some(90) => img.rotate90(),
            Some(180) => img.rotate180(),
            Some(270) => img.rotate270(),
            _ => img,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    /// 3x2 image with a red marker in the top-left corner
    fn marked() -> DynamicImage {
        let mut img = RgbImage::from_pixel(3, 2, Rgb([0, 0, 0]));
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        DynamicImage::ImageRgb8(img)
    }

    fn marker_position(img: &DynamicImage) -> (u32, u32) {
        let rgb = img.to_rgb8();
        let (x, y, _) = rgb
            .enumerate_pixels()
            .find(|(_, _, p)| p[0] == 255)
            .unwrap();
        (x, y)
    }

    #[test]
    fn test_read_exif_orientation_no_exif() {
        assert_eq!(ImageOrientation::read_exif_orientation(b""), 1);
        assert_eq!(ImageOrientation::read_exif_orientation(b"not an image"), 1);
    }

    #[test]
    fn test_get_orientation_transforms_invalid() {
        assert_eq!(ImageOrientation::get_orientation_transforms(0), (None, false, false));
        assert_eq!(ImageOrientation::get_orientation_transforms(9), (None, false, false));
    }

    #[test]
    fn test_rotation_dimension_changes() {
        for orientation in [5, 6, 7, 8] {
            let oriented = ImageOrientation::apply_orientation(marked(), orientation);
            assert_eq!(oriented.dimensions(), (2, 3), "orientation {orientation}");
        }
        for orientation in [1, 2, 3, 4] {
            let oriented = ImageOrientation::apply_orientation(marked(), orientation);
            assert_eq!(oriented.dimensions(), (3, 2), "orientation {orientation}");
        }
    }

    #[test]
    fn test_orientation_marker_positions() {
        // Where the stored top-left pixel ends up once displayed upright
        let expected = [
            (1, (0, 0)),
            (2, (2, 0)),
            (3, (2, 1)),
            (4, (0, 1)),
            (5, (0, 0)),
            (6, (1, 0)),
            (7, (1, 2)),
            (8, (0, 2)),
        ];
        for (orientation, position) in expected {
            let oriented = ImageOrientation::apply_orientation(marked(), orientation);
            assert_eq!(marker_position(&oriented), position, "orientation {orientation}");
        }
    }

    #[test]
    fn test_apply_exif_orientation_without_metadata() {
        let oriented = ImageOrientation::apply_exif_orientation(marked(), b"");
        assert_eq!(oriented.dimensions(), (3, 2));
        assert_eq!(marker_position(&oriented), (0, 0));
    }
}
