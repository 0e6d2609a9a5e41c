use image::{Rgb, RgbImage, imageops};

use crate::assets::decode::SourceImage;
use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};
use crate::frame::RESAMPLE_FILTER;

/// The source image fitted to exactly the output canvas: RGB, opaque black padding.
///
/// Produced once per render, read by every frame sample, dropped when the render ends.
#[derive(Clone, Debug, PartialEq)]
pub struct BaseFrame {
    image: RgbImage,
}

impl BaseFrame {
    /// Wrap an RGB image that already has the output size.
    pub fn from_rgb(image: RgbImage) -> ReelResult<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ReelError::validation("base frame must be non-empty"));
        }
        Ok(Self { image })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the pixels.
    pub fn as_image(&self) -> &RgbImage {
        &self.image
    }

    /// Take the pixels.
    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

/// Size the source is rescaled to before centering on the canvas.
///
/// A source relatively wider than the canvas is scaled to the canvas height (its width
/// overflows); otherwise it is scaled to the canvas width. The overflowing side is truncated to
/// whole pixels and never drops below 1. It can exceed `u32` for extreme aspect ratios, so the
/// size is reported in `u64` and never allocated as such.
pub fn scaled_dimensions(src_width: u32, src_height: u32, canvas: Canvas) -> (u64, u64) {
    let src_ratio = f64::from(src_width) / f64::from(src_height);
    if src_ratio > canvas.aspect() {
        let w = (f64::from(canvas.height) * src_ratio) as u64;
        (w.max(1), u64::from(canvas.height))
    } else {
        let h = (f64::from(canvas.width) / src_ratio) as u64;
        (u64::from(canvas.width), h.max(1))
    }
}

/// Offset that centers a `scaled` span on a `canvas` span, flooring toward negative infinity
/// when the scaled span overflows.
pub(crate) fn center_offset(canvas: u32, scaled: u64) -> i64 {
    let scaled = i64::try_from(scaled).unwrap_or(i64::MAX);
    (i64::from(canvas) - scaled).div_euclid(2)
}

/// One axis of a fit: the source pixels that end up on the canvas and where they land.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct AxisFit {
    pub(crate) src_start: u32,
    pub(crate) src_len: u32,
    pub(crate) dst_start: u32,
    pub(crate) dst_len: u32,
}

/// Map one axis of a `src`-pixel span scaled to `scaled` pixels onto a `canvas` span.
///
/// When the scaled span overflows, only the source pixels covering the visible window are kept,
/// widened outward to whole pixels.
pub(crate) fn fit_axis(src: u32, scaled: u64, canvas: u32) -> AxisFit {
    let offset = center_offset(canvas, scaled);
    if offset >= 0 {
        return AxisFit {
            src_start: 0,
            src_len: src,
            dst_start: offset as u32,
            dst_len: scaled.min(u64::from(canvas)) as u32,
        };
    }

    let hidden = offset.unsigned_abs() as f64;
    let src_per_px = f64::from(src) / scaled as f64;
    let lo = ((hidden * src_per_px).floor() as u32).min(src - 1);
    let hi = (((hidden + f64::from(canvas)) * src_per_px).ceil() as u32).clamp(lo + 1, src);
    AxisFit {
        src_start: lo,
        src_len: hi - lo,
        dst_start: 0,
        dst_len: canvas,
    }
}

/// Fit `source` into a `canvas`-sized RGB frame.
///
/// The result is exactly `canvas.width x canvas.height` whatever the source aspect ratio. The
/// source is cropped to its visible part before resampling; the resampled image is never larger
/// than the canvas.
pub fn fit_to_frame(source: &SourceImage, canvas: Canvas) -> ReelResult<BaseFrame> {
    if canvas.width == 0 || canvas.height == 0 {
        return Err(ReelError::validation("canvas width/height must be non-zero"));
    }
    if source.width() == 0 || source.height() == 0 {
        return Err(ReelError::unsupported_format(format!(
            "image '{}' has zero width or height",
            source.path.display()
        )));
    }

    let rgb = source.image.to_rgb8();
    let (scaled_w, scaled_h) = scaled_dimensions(rgb.width(), rgb.height(), canvas);
    let fx = fit_axis(rgb.width(), scaled_w, canvas.width);
    let fy = fit_axis(rgb.height(), scaled_h, canvas.height);

    let visible = if (fx.src_len, fy.src_len) == rgb.dimensions() {
        rgb
    } else {
        imageops::crop_imm(&rgb, fx.src_start, fy.src_start, fx.src_len, fy.src_len).to_image()
    };
    let placed = if visible.dimensions() == (fx.dst_len, fy.dst_len) {
        visible
    } else {
        imageops::resize(&visible, fx.dst_len, fy.dst_len, RESAMPLE_FILTER)
    };

    let mut frame = RgbImage::from_pixel(canvas.width, canvas.height, Rgb([0, 0, 0]));
    imageops::replace(
        &mut frame,
        &placed,
        i64::from(fx.dst_start),
        i64::from(fy.dst_start),
    );

    tracing::debug!(
        src_w = source.width(),
        src_h = source.height(),
        scaled_w,
        scaled_h,
        crop_w = fx.src_len,
        crop_h = fy.src_len,
        "fitted source image to canvas"
    );

    BaseFrame::from_rgb(frame)
}

#[cfg(test)]
#[path = "../../tests/unit/frame/fit.rs"]
mod tests;
