use image::RgbImage;

use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255_u16;
use crate::overlay::banner::OverlayBanner;

/// Top-left corner of the banner on the output frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BannerPlacement {
    /// Column of the banner's left edge.
    pub x: u32,
    /// Row of the banner's top edge.
    pub y: u32,
}

impl BannerPlacement {
    /// Full-width banner whose bottom edge sits `margin_bottom` pixels above the frame bottom.
    pub fn lower_third(
        frame_height: u32,
        banner_height: u32,
        margin_bottom: u32,
    ) -> ReelResult<Self> {
        let y = frame_height
            .checked_sub(banner_height)
            .and_then(|v| v.checked_sub(margin_bottom))
            .ok_or_else(|| {
                ReelError::validation(format!(
                    "banner ({banner_height}px + {margin_bottom}px margin) does not fit in a {frame_height}px frame"
                ))
            })?;
        Ok(Self { x: 0, y })
    }
}

/// Source-over blend of a premultiplied RGBA8 pixel onto an opaque RGB8 pixel.
fn over_opaque(dst: &mut [u8], src: &[u8]) {
    let a = u16::from(src[3]);
    if a == 0 {
        return;
    }
    if a == 255 {
        dst.copy_from_slice(&src[..3]);
        return;
    }
    let inv = 255 - a;
    for (d, s) in dst.iter_mut().zip(&src[..3]) {
        *d = (u16::from(*s) + mul_div255_u16(u16::from(*d), inv)).min(255) as u8;
    }
}

/// Composite `banner` onto `frame` in place at `at`.
///
/// The banner must lie entirely inside the frame.
pub fn composite_banner(
    frame: &mut RgbImage,
    banner: &OverlayBanner,
    at: BannerPlacement,
) -> ReelResult<()> {
    let (fw, fh) = frame.dimensions();
    let fits_x = u64::from(at.x) + u64::from(banner.width()) <= u64::from(fw);
    let fits_y = u64::from(at.y) + u64::from(banner.height()) <= u64::from(fh);
    if !fits_x || !fits_y {
        return Err(ReelError::validation(format!(
            "banner {}x{} at ({}, {}) exceeds frame {fw}x{fh}",
            banner.width(),
            banner.height(),
            at.x,
            at.y
        )));
    }

    let src_stride = banner.width() as usize * 4;
    let dst_stride = fw as usize * 3;
    let row_len = banner.width() as usize;
    let dst: &mut [u8] = &mut *frame;
    for (row, src_row) in banner.rgba8_premul().chunks_exact(src_stride).enumerate() {
        let dst_start = (at.y as usize + row) * dst_stride + at.x as usize * 3;
        let dst_row = &mut dst[dst_start..dst_start + row_len * 3];
        for (d, s) in dst_row.chunks_exact_mut(3).zip(src_row.chunks_exact(4)) {
            over_opaque(d, s);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
