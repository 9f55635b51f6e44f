//! Watermark compositing: fit, position, fade and overlay.
//!
//! The watermark is never allowed to cover more than a fixed fraction of the
//! photo in either dimension. Oversized watermarks are scaled down uniformly,
//! faded by the configured opacity and blended over the photo.

use std::fmt;
use std::str::FromStr;

use image::imageops::FilterType;
use image::RgbaImage;

use crate::blending;
use crate::error::{Error, Result};

/// Default maximum watermark footprint, as a fraction of the photo size.
pub const DEFAULT_MAX_FRACTION: f64 = 0.2;

/// Default alpha multiplier applied to the watermark.
pub const DEFAULT_OPACITY: f32 = 0.5;

/// Top-left offset of the watermark in photo coordinates.
///
/// Values may be negative or exceed the photo; see [`clamp_placement`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Placement {
    /// Horizontal offset in pixels.
    pub x: i64,
    /// Vertical offset in pixels.
    pub y: i64,
}

impl Placement {
    /// Create a placement at `(x, y)`.
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl FromStr for Placement {
    type Err = Error;

    /// Parse `"x,y"`, allowing whitespace around either component.
    fn from_str(s: &str) -> Result<Self> {
        let (x, y) = s.split_once(',').ok_or_else(|| {
            Error::InvalidParameter(format!("position must be given as x,y (got {s:?})"))
        })?;

        let parse = |axis: &str, value: &str| {
            value.trim().parse::<i64>().map_err(|_| {
                Error::InvalidParameter(format!(
                    "position {axis} must be an integer (got {:?})",
                    value.trim()
                ))
            })
        };

        Ok(Self::new(parse("x", x)?, parse("y", y)?))
    }
}

/// Options controlling how the watermark is scaled and blended.
#[derive(Debug, Clone)]
pub struct WatermarkOptions {
    /// Maximum watermark width and height as a fraction of the photo's, in `(0, 1]`.
    pub max_fraction: f64,
    /// Alpha multiplier applied to the watermark, in `[0, 1]`.
    pub opacity: f32,
    /// Resampling filter used when the watermark is scaled down.
    pub filter: FilterType,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            max_fraction: DEFAULT_MAX_FRACTION,
            opacity: DEFAULT_OPACITY,
            filter: FilterType::Lanczos3,
        }
    }
}

impl WatermarkOptions {
    /// Check that every option lies in its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] naming the first out-of-range option.
    pub fn validate(&self) -> Result<()> {
        if self.max_fraction.is_nan() || self.max_fraction <= 0.0 || self.max_fraction > 1.0 {
            return Err(Error::InvalidParameter(format!(
                "max fraction must be in (0, 1] (got {})",
                self.max_fraction
            )));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(Error::InvalidParameter(format!(
                "opacity must be in [0, 1] (got {})",
                self.opacity
            )));
        }
        Ok(())
    }
}

/// A composited photo together with the geometry that produced it.
#[derive(Debug, Clone)]
pub struct Composited {
    /// The blended image, same dimensions as the photo.
    pub image: RgbaImage,
    /// Watermark size after any downscaling.
    pub watermark_size: (u32, u32),
    /// Placement after clamping.
    pub placement: Placement,
}

/// Compute the size a watermark must be scaled to so it fits the footprint.
///
/// The footprint is `floor(base * max_fraction)` in each dimension. Returns
/// `None` when the watermark already fits; watermarks are never upscaled.
/// Aspect ratio is preserved by scaling both sides with the smaller of the two
/// per-axis factors. A side that would floor to zero is kept at one pixel.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::similar_names
)]
pub fn fit_watermark_size(
    base: (u32, u32),
    watermark: (u32, u32),
    max_fraction: f64,
) -> Option<(u32, u32)> {
    let (base_w, base_h) = base;
    let (wm_w, wm_h) = watermark;

    let max_w = (f64::from(base_w) * max_fraction) as u32;
    let max_h = (f64::from(base_h) * max_fraction) as u32;

    if wm_w == 0 || wm_h == 0 || (wm_w <= max_w && wm_h <= max_h) {
        return None;
    }

    let scale_x = f64::from(max_w) / f64::from(wm_w);
    let scale_y = f64::from(max_h) / f64::from(wm_h);

    // The limiting side lands exactly on the footprint edge.
    let (new_w, new_h) = if scale_x <= scale_y {
        (max_w, (f64::from(wm_h) * scale_x) as u32)
    } else {
        ((f64::from(wm_w) * scale_y) as u32, max_h)
    };

    Some((new_w.max(1), new_h.max(1)))
}

/// Clamp a placement so the watermark does not extend past the photo's right
/// or bottom edge.
///
/// Only the upper bound is enforced: `x' = min(x, base_w - wm_w)` and likewise
/// for `y`. Negative offsets are returned unchanged and leave part of the
/// watermark off-canvas.
#[must_use]
pub fn clamp_placement(placement: Placement, base: (u32, u32), watermark: (u32, u32)) -> Placement {
    let max_x = i64::from(base.0) - i64::from(watermark.0);
    let max_y = i64::from(base.1) - i64::from(watermark.1);
    Placement::new(placement.x.min(max_x), placement.y.min(max_y))
}

/// Overlay `watermark` onto `base` at `placement`.
///
/// Steps: fit the watermark to the footprint, clamp the placement, scale the
/// watermark's alpha by `opts.opacity`, paint it onto a transparent canvas the
/// size of `base`, then composite the canvas over `base`.
///
/// Options are expected to have passed [`WatermarkOptions::validate`]; an
/// out-of-range opacity is clamped to `[0, 1]`.
#[must_use]
pub fn apply_watermark(
    base: &RgbaImage,
    watermark: &RgbaImage,
    placement: Placement,
    opts: &WatermarkOptions,
) -> Composited {
    let base_dims = base.dimensions();

    let mut mark = match fit_watermark_size(base_dims, watermark.dimensions(), opts.max_fraction)
    {
        Some((w, h)) => {
            log::debug!(
                "scaling watermark {}x{} -> {w}x{h} to fit {}x{} photo",
                watermark.width(),
                watermark.height(),
                base_dims.0,
                base_dims.1,
            );
            blending::resize_premultiplied(watermark, w, h, opts.filter)
        }
        None => watermark.clone(),
    };

    let clamped = clamp_placement(placement, base_dims, mark.dimensions());
    if clamped != placement {
        log::debug!("placement {placement} clamped to {clamped}");
    }
    if clamped.x < 0 || clamped.y < 0 {
        log::warn!("negative placement {clamped} leaves part of the watermark off-canvas");
    }

    blending::scale_alpha(&mut mark, opts.opacity);

    let mut canvas = RgbaImage::new(base_dims.0, base_dims.1);
    blending::alpha_composite(&mut canvas, &mark, clamped.x, clamped.y);

    let mut image = base.clone();
    blending::alpha_composite(&mut image, &canvas, 0, 0);

    Composited {
        image,
        watermark_size: mark.dimensions(),
        placement: clamped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn small_watermark_is_not_resized() {
        assert_eq!(fit_watermark_size((800, 600), (100, 100), 0.2), None);
        assert_eq!(fit_watermark_size((800, 600), (160, 120), 0.2), None);
    }

    #[test]
    fn oversized_watermark_scaled_by_limiting_axis() {
        // 800x600 photo -> 160x120 footprint; height limits at scale 0.3.
        assert_eq!(
            fit_watermark_size((800, 600), (400, 400), 0.2),
            Some((120, 120))
        );
        // Width limits: 1000x1000 -> 200x200 footprint, 400x100 at scale 0.5.
        assert_eq!(
            fit_watermark_size((1000, 1000), (400, 100), 0.2),
            Some((200, 50))
        );
    }

    #[test]
    fn exceeding_one_axis_triggers_resize() {
        // Only width exceeds: 170 > 160.
        assert_eq!(
            fit_watermark_size((800, 600), (170, 50), 0.2),
            Some((160, 47))
        );
    }

    #[test]
    fn resize_preserves_aspect_ratio() {
        let cases = [((1920, 1080), (1000, 300)), ((640, 480), (333, 777))];
        for (base, wm) in cases {
            let (w, h) = fit_watermark_size(base, wm, 0.2).unwrap();
            let orig = f64::from(wm.0) / f64::from(wm.1);
            let scaled = f64::from(w) / f64::from(h);
            // One pixel of flooring on the short side bounds the error.
            let tolerance = orig / f64::from(h.min(w));
            assert!(
                (orig - scaled).abs() <= tolerance.max(0.01),
                "{base:?} {wm:?}: {orig} vs {scaled}"
            );
        }
    }

    #[test]
    fn tiny_photo_keeps_one_pixel_watermark() {
        assert_eq!(fit_watermark_size((3, 3), (10, 10), 0.2), Some((1, 1)));
    }

    #[test]
    fn clamp_limits_only_upper_bound() {
        let base = (800, 600);
        let wm = (120, 120);
        assert_eq!(
            clamp_placement(Placement::new(10, 20), base, wm),
            Placement::new(10, 20)
        );
        assert_eq!(
            clamp_placement(Placement::new(9999, 9999), base, wm),
            Placement::new(680, 480)
        );
        assert_eq!(
            clamp_placement(Placement::new(-50, -7), base, wm),
            Placement::new(-50, -7)
        );
    }

    #[test]
    fn placement_parses_comma_separated_integers() {
        assert_eq!("10,20".parse::<Placement>().unwrap(), Placement::new(10, 20));
        assert_eq!(
            " -5 , 7 ".parse::<Placement>().unwrap(),
            Placement::new(-5, 7)
        );
        assert_eq!(Placement::new(3, -4).to_string(), "3,-4");
    }

    #[test]
    fn placement_rejects_non_integers() {
        for bad in ["", "10", "a,1", "1,b", "1.5,2", "1,2,3"] {
            let err = bad.parse::<Placement>().unwrap_err();
            assert!(
                matches!(err, Error::InvalidParameter(_)),
                "{bad:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn options_validation() {
        assert!(WatermarkOptions::default().validate().is_ok());

        let opts = WatermarkOptions {
            opacity: 1.5,
            ..WatermarkOptions::default()
        };
        assert!(matches!(opts.validate(), Err(Error::InvalidParameter(_))));

        let opts = WatermarkOptions {
            max_fraction: 0.0,
            ..WatermarkOptions::default()
        };
        assert!(matches!(opts.validate(), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn output_matches_base_dimensions() {
        let base = RgbaImage::from_pixel(800, 600, Rgba([255, 255, 255, 255]));
        let wm = RgbaImage::from_pixel(400, 400, Rgba([0, 0, 0, 255]));
        let out = apply_watermark(&base, &wm, Placement::new(700, 700), &WatermarkOptions::default());

        assert_eq!(out.image.dimensions(), (800, 600));
        assert_eq!(out.watermark_size, (120, 120));
        assert_eq!(out.placement, Placement::new(680, 480));
    }

    #[test]
    fn opaque_watermark_blends_halfway() {
        let base = RgbaImage::from_pixel(500, 500, Rgba([200, 0, 0, 255]));
        let wm = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 200, 255]));
        let out = apply_watermark(&base, &wm, Placement::default(), &WatermarkOptions::default());

        assert_eq!(out.watermark_size, (100, 100));
        for y in 0..500 {
            for x in 0..500 {
                let px = out.image.get_pixel(x, y);
                assert_eq!(px[3], 255);
                if x < 100 && y < 100 {
                    assert!((i32::from(px[0]) - 100).abs() <= 2, "({x},{y}) {px:?}");
                    assert!((i32::from(px[2]) - 100).abs() <= 2, "({x},{y}) {px:?}");
                } else {
                    assert_eq!(*px, Rgba([200, 0, 0, 255]), "({x},{y})");
                }
            }
        }
    }

    #[test]
    fn transparent_watermark_pixels_leave_base_untouched() {
        let base = RgbaImage::from_pixel(100, 100, Rgba([10, 20, 30, 255]));
        let wm = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 0]));
        let out = apply_watermark(&base, &wm, Placement::new(5, 5), &WatermarkOptions::default());
        assert_eq!(out.image, base);
    }

    #[test]
    fn negative_placement_clips_watermark() {
        let base = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255]));
        let wm = RgbaImage::from_pixel(20, 20, Rgba([255, 255, 255, 255]));
        let out = apply_watermark(&base, &wm, Placement::new(-10, -10), &WatermarkOptions::default());

        assert_eq!(out.placement, Placement::new(-10, -10));
        assert!(out.image.get_pixel(9, 9)[0] > 100);
        assert_eq!(out.image.get_pixel(10, 10)[0], 0);
    }
}
