//! Image processing module
//!
//! Pixel-level building blocks of the grading pipeline:
//! - EXIF orientation (orientation)
//! - Bounding-box resize (resize)
//! - Tonal operations, rotation and shear (ops)
//! - Tilt estimation for auto-straighten (straighten)

pub mod ops;
pub mod orientation;
pub mod resize;
pub mod straighten;

pub use orientation::ImageOrientation;
pub use resize::ImageResize;
pub use straighten::estimate_tilt;
