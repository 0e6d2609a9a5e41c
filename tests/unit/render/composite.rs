use image::Rgb;

use super::*;
use crate::config::BannerConfig;
use crate::overlay::banner::render_banner;
use crate::overlay::fonts::FontLibrary;

fn fill_banner(width: u32, height: u32, alpha: u8) -> OverlayBanner {
    let cfg = BannerConfig {
        height,
        fill_alpha: alpha,
        ..BannerConfig::default()
    };
    render_banner("", width, &cfg, &FontLibrary::builtin_only()).unwrap()
}

#[test]
fn lower_third_sits_above_the_margin() {
    let at = BannerPlacement::lower_third(1920, 150, 50).unwrap();
    assert_eq!(at, BannerPlacement { x: 0, y: 1720 });
}

#[test]
fn lower_third_rejects_oversized_banner() {
    assert!(BannerPlacement::lower_third(100, 80, 30).is_err());
    assert!(BannerPlacement::lower_third(100, 120, 0).is_err());
}

#[test]
fn translucent_black_darkens_only_the_banner_rows() {
    let mut frame = RgbImage::from_pixel(4, 10, Rgb([200, 100, 50]));
    let banner = fill_banner(4, 3, 180);
    composite_banner(&mut frame, &banner, BannerPlacement { x: 0, y: 5 }).unwrap();

    // 200 * 75 / 255 = 58.8, 100 * 75 / 255 = 29.4, 50 * 75 / 255 = 14.7
    for y in 5..8 {
        assert_eq!(frame.get_pixel(0, y).0, [59, 29, 15], "row {y}");
        assert_eq!(frame.get_pixel(3, y).0, [59, 29, 15], "row {y}");
    }
    for y in (0..5).chain(8..10) {
        assert_eq!(frame.get_pixel(2, y).0, [200, 100, 50], "row {y}");
    }
}

#[test]
fn transparent_banner_is_a_no_op() {
    let mut frame = RgbImage::from_pixel(6, 6, Rgb([10, 20, 30]));
    let before = frame.clone();
    composite_banner(&mut frame, &fill_banner(6, 2, 0), BannerPlacement { x: 0, y: 4 }).unwrap();
    assert_eq!(frame, before);
}

#[test]
fn opaque_banner_replaces_pixels() {
    let mut frame = RgbImage::from_pixel(6, 6, Rgb([10, 20, 30]));
    composite_banner(&mut frame, &fill_banner(6, 2, 255), BannerPlacement { x: 0, y: 0 }).unwrap();
    assert_eq!(frame.get_pixel(5, 1).0, [0, 0, 0]);
    assert_eq!(frame.get_pixel(5, 2).0, [10, 20, 30]);
}

#[test]
fn banner_outside_the_frame_is_rejected() {
    let mut frame = RgbImage::new(6, 6);
    let banner = fill_banner(6, 2, 180);
    let err = composite_banner(&mut frame, &banner, BannerPlacement { x: 0, y: 5 }).unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
    let wide = fill_banner(8, 2, 180);
    assert!(composite_banner(&mut frame, &wide, BannerPlacement { x: 0, y: 0 }).is_err());
}
