//! Overlay a scaled, semi-transparent watermark image onto photos.
//!
//! The watermark is shrunk (never enlarged) to fit within 20% of the photo's
//! width and height, its alpha is halved, and it is alpha-composited over the
//! photo at a caller-chosen offset. Output format follows the destination's
//! file extension; formats without alpha (JPEG) are flattened to RGB.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use photo_watermark::{watermark_file, Placement, WatermarkOptions};
//!
//! watermark_file(
//!     Path::new("photo.jpg"),
//!     Path::new("logo.png"),
//!     Path::new("photo_watermarked.jpg"),
//!     Placement::new(20, 20),
//!     WatermarkOptions::default(),
//! )
//! .expect("failed to watermark photo");
//! ```
//!
//! # Reusing a watermark
//!
//! [`Watermarker`] decodes the watermark once and applies it to any number of
//! photos, in memory or on disk.
//!
//! ```no_run
//! use std::path::Path;
//! use photo_watermark::{Placement, WatermarkOptions, Watermarker};
//!
//! let marker = Watermarker::open(Path::new("logo.png"), WatermarkOptions::default()).unwrap();
//! let photo = image::open("photo.png").unwrap();
//! let result = marker.apply(&photo, Placement::new(0, 0));
//! println!("watermark drawn at {} as {:?}", result.placement, result.watermark_size);
//! result.image.save("out.png").unwrap();
//! ```

#![deny(missing_docs)]

pub mod blending;
pub mod compositor;
mod engine;
pub mod error;

pub use compositor::{apply_watermark, Composited, Placement, WatermarkOptions};
pub use engine::{
    default_output_path, is_supported_image, save_image, watermark_file, ProcessResult,
    Watermarker,
};
pub use error::{Error, Result};
