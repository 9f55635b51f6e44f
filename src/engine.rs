//! File-level watermarking driver.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use image::buffer::ConvertBuffer;
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};

use crate::compositor::{self, Composited, Placement, WatermarkOptions};
use crate::error::{Error, Result};

/// Result of processing a single photo file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed photo.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Watermark size after fitting, if compositing ran.
    pub watermark_size: Option<(u32, u32)>,
    /// Placement after clamping, if compositing ran.
    pub placement: Option<Placement>,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn failed(path: &Path, message: String) -> Self {
        Self {
            path: path.to_path_buf(),
            success: false,
            watermark_size: None,
            placement: None,
            message,
        }
    }
}

/// A decoded watermark ready to be applied to any number of photos.
///
/// Create once with [`Watermarker::open()`] and reuse it across photos; the
/// watermark is decoded and converted to RGBA a single time.
pub struct Watermarker {
    watermark: RgbaImage,
    options: WatermarkOptions,
}

impl Watermarker {
    /// Wrap an already-decoded watermark.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `options` fail validation.
    pub fn new(watermark: &DynamicImage, options: WatermarkOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            watermark: watermark.to_rgba8(),
            options,
        })
    }

    /// Decode the watermark image at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for bad options and
    /// [`Error::Decode`] if the file cannot be read as an image.
    pub fn open(path: &Path, options: WatermarkOptions) -> Result<Self> {
        options.validate()?;
        let watermark = decode(path)?;
        log::debug!(
            "loaded watermark {} ({}x{})",
            path.display(),
            watermark.width(),
            watermark.height()
        );
        Self::new(&watermark, options)
    }

    /// Dimensions of the watermark before any fitting.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.watermark.dimensions()
    }

    /// Options this watermarker was built with.
    #[must_use]
    pub fn options(&self) -> &WatermarkOptions {
        &self.options
    }

    /// Composite the watermark over `photo` at `placement`.
    #[must_use]
    pub fn apply(&self, photo: &DynamicImage, placement: Placement) -> Composited {
        compositor::apply_watermark(&photo.to_rgba8(), &self.watermark, placement, &self.options)
    }

    /// Load, watermark and save a single photo.
    ///
    /// Errors are reported through the returned [`ProcessResult`]; nothing is
    /// written to `output` unless the whole pipeline succeeds.
    #[must_use]
    pub fn process_file(&self, input: &Path, output: &Path, placement: Placement) -> ProcessResult {
        match self.try_process_file(input, output, placement) {
            Ok(composited) => ProcessResult {
                path: input.to_path_buf(),
                success: true,
                watermark_size: Some(composited.watermark_size),
                placement: Some(composited.placement),
                message: format!(
                    "Watermark applied ({}x{} at {})",
                    composited.watermark_size.0,
                    composited.watermark_size.1,
                    composited.placement
                ),
            },
            Err(e) => ProcessResult::failed(input, e.to_string()),
        }
    }

    fn try_process_file(
        &self,
        input: &Path,
        output: &Path,
        placement: Placement,
    ) -> Result<Composited> {
        let photo = decode(input)?;
        let composited = self.apply(&photo, placement);

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        save_image(&composited.image, output)?;

        Ok(composited)
    }

    /// Watermark every supported photo in a directory.
    ///
    /// Outputs keep their file names under `output_dir`. Uses parallel
    /// iteration when the `cli` feature is enabled (via rayon).
    #[must_use]
    pub fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        placement: Placement,
    ) -> Vec<ProcessResult> {
        let entries: Vec<(PathBuf, PathBuf)> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .map(|e| e.path())
                .filter(|p| is_supported_image(p))
                .filter_map(|p| {
                    let out = output_dir.join(p.file_name()?);
                    Some((p, out))
                })
                .collect(),
            Err(e) => {
                return vec![ProcessResult::failed(
                    input_dir,
                    format!("Failed to read directory: {e}"),
                )];
            }
        };

        if !output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(output_dir) {
                return vec![ProcessResult::failed(
                    output_dir,
                    format!("Failed to create output directory: {e}"),
                )];
            }
        }

        log::debug!(
            "watermarking {} photos from {} into {}",
            entries.len(),
            input_dir.display(),
            output_dir.display()
        );

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            entries
                .par_iter()
                .map(|(input, output)| self.process_file(input, output, placement))
                .collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            entries
                .iter()
                .map(|(input, output)| self.process_file(input, output, placement))
                .collect()
        }
    }
}

/// Watermark a single photo and write the result to `output`.
///
/// Every path must be non-empty. The output format follows the extension of
/// `output`.
///
/// # Errors
///
/// - [`Error::MissingInput`] if any path is empty.
/// - [`Error::InvalidParameter`] if `options` fail validation.
/// - [`Error::Decode`] if either input cannot be decoded.
/// - [`Error::UnsupportedFormat`], [`Error::Image`] or [`Error::Io`] if saving fails.
pub fn watermark_file(
    photo: &Path,
    watermark: &Path,
    output: &Path,
    placement: Placement,
    options: WatermarkOptions,
) -> Result<()> {
    for (path, what) in [
        (photo, "photo path"),
        (watermark, "watermark path"),
        (output, "output path"),
    ] {
        if path.as_os_str().is_empty() {
            return Err(Error::MissingInput(what));
        }
    }

    let marker = Watermarker::open(watermark, options)?;
    marker.try_process_file(photo, output, placement).map(|_| ())
}

fn decode(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|source| Error::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Save a composited image, choosing the format from the file extension.
///
/// JPEG cannot store alpha, so the image is flattened to RGB (alpha dropped)
/// and encoded at quality 100. Every other format receives the RGBA canvas;
/// if its encoder cannot represent RGBA8 the encode fails with
/// [`Error::Image`]. The image is encoded in memory and written through a
/// temporary file in the destination directory that is renamed into place,
/// so a failed encode or write leaves no file behind.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] if the extension names no known
/// format, [`Error::Image`] if encoding fails and [`Error::Io`] if writing fails.
pub fn save_image(img: &RgbaImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    let mut buf = Cursor::new(Vec::new());

    if format == ImageFormat::Jpeg {
        let rgb: RgbImage = img.convert();
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, 100);
        encoder.encode_image(&rgb)?;
    } else {
        img.write_to(&mut buf, format)?;
    }

    log::debug!("writing {format:?} output to {}", path.display());

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(buf.get_ref())?;
    tmp.as_file().sync_all()?;
    // Named temp files are created owner-only; outputs should be world-readable.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` becomes `"photo_watermarked.jpg"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let ext = input.extension().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_watermarked.{ext}"))
}
