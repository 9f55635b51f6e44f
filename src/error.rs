//! Error types for the photo-watermark crate.

use std::path::PathBuf;

/// Errors that can occur while compositing and saving a watermarked photo.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required file path or parameter was not supplied.
    #[error("missing input: {0}")]
    MissingInput(&'static str),

    /// A parameter could not be parsed or is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// An input file could not be decoded as an image.
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        /// Path of the file that failed to decode.
        path: PathBuf,
        /// Underlying decoder error.
        source: image::ImageError,
    },

    /// An I/O error occurred while writing the output file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The output path's extension does not name a known image format.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred during image processing (encode, convert).
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
