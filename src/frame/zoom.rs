use image::{RgbImage, imageops};

use crate::foundation::error::{ReelError, ReelResult};
use crate::frame::RESAMPLE_FILTER;
use crate::frame::fit::BaseFrame;

/// Centered crop rectangle in base-frame pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropWindow {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width, `1..=frame width` for a non-empty frame.
    pub width: u32,
    /// Height, `1..=frame height` for a non-empty frame.
    pub height: u32,
}

impl CropWindow {
    /// `true` when the window covers the whole `width x height` frame.
    pub fn is_full_frame(&self, width: u32, height: u32) -> bool {
        self.x == 0 && self.y == 0 && self.width == width && self.height == height
    }
}

/// Magnification at time `t` of a clip lasting `duration` seconds.
///
/// Linear from exactly `1.0` at `t = 0` to exactly `zoom_factor` at `t = duration`. `t` slightly
/// outside `[0, duration]` (float drift from frame timestamps) is clamped.
pub fn zoom_at(t: f64, duration: f64, zoom_factor: f64) -> ReelResult<f64> {
    check_params(duration, zoom_factor)?;
    if !t.is_finite() {
        return Err(ReelError::validation(format!("sample time must be finite, got {t}")));
    }
    let progress = (t / duration).clamp(0.0, 1.0);
    Ok(1.0 + (zoom_factor - 1.0) * progress)
}

/// Crop window that shows a `zoom`-times magnified view of a `width x height` frame.
///
/// An empty frame yields the (empty) full-frame window.
pub fn crop_window(width: u32, height: u32, zoom: f64) -> CropWindow {
    if width == 0 || height == 0 {
        return CropWindow {
            x: 0,
            y: 0,
            width,
            height,
        };
    }
    let zoom = if zoom.is_finite() { zoom.max(1.0) } else { 1.0 };
    let crop_w = ((f64::from(width) / zoom).floor() as u32).clamp(1, width);
    let crop_h = ((f64::from(height) / zoom).floor() as u32).clamp(1, height);
    CropWindow {
        x: (width - crop_w) / 2,
        y: (height - crop_h) / 2,
        width: crop_w,
        height: crop_h,
    }
}

/// Sample the progressive zoom at time `t`.
///
/// Pure: the output depends only on the arguments, so the same `(base, t, duration,
/// zoom_factor)` always yields byte-identical pixels. The crop is rescaled back to the full base
/// frame size.
pub fn sample_zoom(
    base: &BaseFrame,
    t: f64,
    duration: f64,
    zoom_factor: f64,
) -> ReelResult<RgbImage> {
    let zoom = zoom_at(t, duration, zoom_factor)?;
    let (w, h) = (base.width(), base.height());
    let win = crop_window(w, h, zoom);

    if win.is_full_frame(w, h) {
        return Ok(base.as_image().clone());
    }

    let cropped = imageops::crop_imm(base.as_image(), win.x, win.y, win.width, win.height).to_image();
    Ok(imageops::resize(&cropped, w, h, RESAMPLE_FILTER))
}

fn check_params(duration: f64, zoom_factor: f64) -> ReelResult<()> {
    // A zero-length clip has no frames to sample; callers reject it before this point.
    if !duration.is_finite() || duration <= 0.0 {
        return Err(ReelError::invalid_duration(format!(
            "zoom duration must be finite and > 0, got {duration}"
        )));
    }
    if !zoom_factor.is_finite() || zoom_factor < 1.0 {
        return Err(ReelError::validation(format!(
            "zoom_factor must be finite and >= 1.0, got {zoom_factor}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/frame/zoom.rs"]
mod tests;
