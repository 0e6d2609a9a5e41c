use super::*;

fn cfg() -> BannerConfig {
    BannerConfig::default()
}

fn pixel(b: &OverlayBanner, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * b.width() + x) * 4) as usize;
    let p = &b.rgba8_premul()[i..i + 4];
    [p[0], p[1], p[2], p[3]]
}

/// Bounding box `(x0, y0, x1, y1)` of pixels whose red channel reaches 128.
fn bright_bbox(b: &OverlayBanner) -> Option<(u32, u32, u32, u32)> {
    let mut acc: Option<(u32, u32, u32, u32)> = None;
    for y in 0..b.height() {
        for x in 0..b.width() {
            if pixel(b, x, y)[0] < 128 {
                continue;
            }
            acc = Some(match acc {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
    }
    acc
}

fn assert_centered(b: &OverlayBanner) {
    let bounds = b.text_bounds().expect("caption drawn");
    let (cx, cy) = bounds.center();
    assert!((cx - b.width() as f32 / 2.0).abs() <= 2.0, "cx={cx}");
    assert!((cy - b.height() as f32 / 2.0).abs() <= 2.0, "cy={cy}");

    let (x0, y0, x1, y1) = bright_bbox(b).expect("bright pixels");
    let px = (x0 + x1 + 1) as f32 / 2.0;
    let py = (y0 + y1 + 1) as f32 / 2.0;
    assert!((px - b.width() as f32 / 2.0).abs() <= 2.0, "pixel cx={px}");
    assert!((py - b.height() as f32 / 2.0).abs() <= 2.0, "pixel cy={py}");
}

#[test]
fn banner_spans_frame_width_at_configured_height() {
    let b = render_banner("Hello", 1080, &cfg(), &FontLibrary::builtin_only()).unwrap();
    assert_eq!(b.width(), 1080);
    assert_eq!(b.height(), 150);
    assert_eq!(b.rgba8_premul().len(), 1080 * 150 * 4);
}

#[test]
fn background_is_translucent_black() {
    let b = render_banner("Hello", 1080, &cfg(), &FontLibrary::builtin_only()).unwrap();
    for (x, y) in [(0, 0), (1079, 0), (0, 149), (1079, 149)] {
        assert_eq!(pixel(&b, x, y), [0, 0, 0, 180], "corner ({x},{y})");
    }
}

#[test]
fn builtin_caption_is_centered() {
    let b = render_banner("HELLO 2024", 1080, &cfg(), &FontLibrary::builtin_only()).unwrap();
    assert_eq!(b.font_source(), Some(&FontSource::BuiltIn));
    assert_centered(&b);
}

#[test]
fn arabic_caption_is_centered_with_system_fonts() {
    let fonts = FontLibrary::load(None);
    let b = render_banner("منتج تجريبي", 1080, &cfg(), &fonts).unwrap();
    assert!(b.font_source().is_some());
    assert_centered(&b);
}

#[test]
fn shadow_sits_below_and_right_of_the_foreground() {
    // "-" is a single 25x5 bar in the built-in face at font size 48.
    let b = render_banner("-", 1080, &cfg(), &FontLibrary::builtin_only()).unwrap();
    let bounds = b.text_bounds().unwrap();
    assert!((bounds.x - 527.5).abs() < 1e-3, "{bounds:?}");
    assert!((bounds.y - 72.5).abs() < 1e-3, "{bounds:?}");

    let fg = pixel(&b, 540, 74);
    assert!(fg.iter().all(|c| *c >= 250), "foreground {fg:?}");

    // Covered by the shadow only: 3px right and down of the bar's bottom-right corner.
    let shadow = pixel(&b, 554, 79);
    assert!(shadow[..3].iter().all(|c| *c <= 5), "shadow {shadow:?}");
    assert!(shadow[3] >= 250, "shadow {shadow:?}");
}

#[test]
fn blank_caption_renders_fill_only() {
    let b = render_banner("  \n\t ", 640, &cfg(), &FontLibrary::builtin_only()).unwrap();
    assert_eq!(b.text_bounds(), None);
    assert_eq!(b.font_source(), None);
    assert!(b.rgba8_premul().chunks_exact(4).all(|p| p == [0, 0, 0, 180]));
}

#[test]
fn long_caption_is_scaled_to_fit() {
    let caption = "THE BEST PRODUCT OF THE YEAR NOW WITH FREE DELIVERY EVERYWHERE";
    let b = render_banner(caption, 720, &cfg(), &FontLibrary::builtin_only()).unwrap();
    let bounds = b.text_bounds().unwrap();
    assert!(bounds.x >= SIDE_PADDING_PX - 0.5, "{bounds:?}");
    assert!(bounds.x + bounds.width <= 720.0 - SIDE_PADDING_PX + 0.5, "{bounds:?}");
    assert!(bounds.height <= 150.0 * MAX_TEXT_HEIGHT_FRACTION, "{bounds:?}");
    assert_centered(&b);
}

#[test]
fn markup_in_caption_is_escaped() {
    let fonts = FontLibrary::load(None);
    let b = render_banner(r#"Fish & Chips <"50% off"> it's"#, 1080, &cfg(), &fonts).unwrap();
    assert!(b.text_bounds().is_some());
}

#[test]
fn zero_width_is_rejected() {
    let err = render_banner("x", 0, &cfg(), &FontLibrary::builtin_only()).unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
}

#[test]
fn straight_alpha_copy_unpremultiplies() {
    let mut c = cfg();
    c.fill_alpha = 128;
    let b = render_banner("", 8, &c, &FontLibrary::builtin_only()).unwrap();
    let img = b.to_rgba_image();
    assert_eq!(img.dimensions(), (8, 150));
    assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 128]);
}

#[test]
fn escape_xml_covers_reserved_characters() {
    assert_eq!(escape_xml(r#"a&b<c>d"e'f"#), "a&amp;b&lt;c&gt;d&quot;e&apos;f");
}

#[test]
fn control_characters_become_spaces() {
    assert_eq!(clean_caption("  a\tb\u{7}c  "), "a b c");
}
