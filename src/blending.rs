//! Alpha blending math for watermark overlay.
//!
//! Compositing uses the Porter-Duff "over" operator on straight (non
//! premultiplied) RGBA:
//!
//! `out_a = src_a + dst_a * (1 - src_a)`
//! `out_c = (src_c * src_a + dst_c * dst_a * (1 - src_a)) / out_a`

use image::imageops::{self, FilterType};
use image::{Rgba, Rgba32FImage, RgbaImage};

/// Multiply every pixel's alpha channel by `opacity`.
///
/// The existing alpha is scaled, not replaced, so fully transparent pixels
/// stay transparent. Results are truncated toward zero.
pub fn scale_alpha(image: &mut RgbaImage, opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    for px in image.pixels_mut() {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            px[3] = (f32::from(px[3]) * opacity) as u8;
        }
    }
}

/// Resize straight RGBA through premultiplied alpha.
///
/// Colour is weighted by alpha before resampling and divided back out
/// afterwards, so the colour of fully transparent pixels never bleeds into
/// visible edges. Work is done in `f32` to keep low-alpha colour intact.
#[must_use]
pub fn resize_premultiplied(
    image: &RgbaImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> RgbaImage {
    let mut premul = Rgba32FImage::new(image.width(), image.height());
    for (src, dst) in image.pixels().zip(premul.pixels_mut()) {
        let a = f32::from(src[3]) / 255.0;
        let c = |v: u8| f32::from(v) / 255.0 * a;
        *dst = Rgba([c(src[0]), c(src[1]), c(src[2]), a]);
    }

    let resized = imageops::resize(&premul, width, height, filter);

    let mut out = RgbaImage::new(width, height);
    for (src, dst) in resized.pixels().zip(out.pixels_mut()) {
        let a = src[3];
        // Negative lobes of the filter can push coverage below zero.
        if a <= 0.0 {
            continue;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let to_u8 = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        let c = |v: f32| to_u8(v / a);
        *dst = Rgba([c(src[0]), c(src[1]), c(src[2]), to_u8(a)]);
    }
    out
}

/// Blend a single `src` pixel over `dst`.
fn over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let src_a = f32::from(src[3]) / 255.0;
    let dst_a = f32::from(dst[3]) / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);

    if out_a <= f32::EPSILON {
        return Rgba([0, 0, 0, 0]);
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let to_u8 = |v: f32| v.round().clamp(0.0, 255.0) as u8;
    let channel = |s: u8, d: u8| {
        to_u8((f32::from(s) * src_a + f32::from(d) * dst_a * (1.0 - src_a)) / out_a)
    };

    Rgba([
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        to_u8(out_a * 255.0),
    ])
}

/// Composite `src` over `dst` with its top-left corner at `(pos_x, pos_y)`.
///
/// The position may be negative or lie beyond `dst`; the overlapping region
/// is clipped on all four edges and anything outside it is ignored.
///
/// # Arguments
///
/// * `dst` - The image to modify in-place.
/// * `src` - The image blended on top.
/// * `pos_x` - X coordinate of `src`'s top-left corner in `dst` space.
/// * `pos_y` - Y coordinate of `src`'s top-left corner in `dst` space.
pub fn alpha_composite(dst: &mut RgbaImage, src: &RgbaImage, pos_x: i64, pos_y: i64) {
    let dst_w = i64::from(dst.width());
    let dst_h = i64::from(dst.height());

    // Clip to destination bounds
    let x1 = pos_x.max(0);
    let y1 = pos_y.max(0);
    let x2 = (pos_x + i64::from(src.width())).min(dst_w);
    let y2 = (pos_y + i64::from(src.height())).min(dst_h);

    if x1 >= x2 || y1 >= y2 {
        return;
    }

    for y in y1..y2 {
        for x in x1..x2 {
            // Clipping above keeps every coordinate inside both images.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let (sx, sy, dx, dy) = ((x - pos_x) as u32, (y - pos_y) as u32, x as u32, y as u32);

            let src_px = *src.get_pixel(sx, sy);
            if src_px[3] == 0 {
                continue;
            }
            let dst_px = dst.get_pixel_mut(dx, dy);
            *dst_px = over(*dst_px, src_px);
        }
    }
}
