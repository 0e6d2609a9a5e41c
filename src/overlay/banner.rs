use resvg::tiny_skia;

use crate::config::BannerConfig;
use crate::foundation::error::{ReelError, ReelResult};
use crate::overlay::builtin;
use crate::overlay::fonts::{FontLibrary, FontSource};

/// Horizontal breathing room kept between caption and banner edges, in pixels.
const SIDE_PADDING_PX: f32 = 24.0;
/// Share of the banner height the caption may occupy.
const MAX_TEXT_HEIGHT_FRACTION: f32 = 0.9;

/// Axis-aligned caption ink bounds in banner pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextBounds {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl TextBounds {
    /// Geometric center `(x, y)`.
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// The lower-third overlay: a dark translucent strip with a shadowed, centered caption.
///
/// Rendered once per video and composited unchanged onto every frame.
#[derive(Clone, Debug)]
pub struct OverlayBanner {
    width: u32,
    height: u32,
    rgba8_premul: Vec<u8>,
    text_bounds: Option<TextBounds>,
    font_source: Option<FontSource>,
}

impl OverlayBanner {
    /// Width in pixels (always the frame width).
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major premultiplied RGBA8 pixels.
    pub fn rgba8_premul(&self) -> &[u8] {
        &self.rgba8_premul
    }

    /// Where the foreground caption landed; `None` for a blank caption.
    pub fn text_bounds(&self) -> Option<TextBounds> {
        self.text_bounds
    }

    /// Face that drew the caption; `None` for a blank caption.
    pub fn font_source(&self) -> Option<&FontSource> {
        self.font_source.as_ref()
    }

    /// Straight-alpha copy, e.g. for writing a PNG preview.
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        let mut out = self.rgba8_premul.clone();
        for px in out.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            if a == 0 || a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        // Length is width * height * 4 by construction.
        image::RgbaImage::from_raw(self.width, self.height, out).unwrap_or_default()
    }
}

/// Rasterize the banner for `caption` at `frame_width x cfg.height`.
///
/// The caption is drawn twice from the same outlines: first in black offset by
/// `cfg.shadow_offset` on both axes, then in white on top. Its ink bounds are centered on both
/// axes; captions wider than the banner are scaled down uniformly to fit.
pub fn render_banner(
    caption: &str,
    frame_width: u32,
    cfg: &BannerConfig,
    fonts: &FontLibrary,
) -> ReelResult<OverlayBanner> {
    if frame_width == 0 || cfg.height == 0 {
        return Err(ReelError::validation("banner width/height must be non-zero"));
    }
    if !cfg.font_size.is_finite() || cfg.font_size <= 0.0 {
        return Err(ReelError::validation("banner font_size must be finite and > 0"));
    }

    let mut pixmap = tiny_skia::Pixmap::new(frame_width, cfg.height)
        .ok_or_else(|| ReelError::validation("failed to allocate banner pixmap"))?;
    pixmap.fill(tiny_skia::Color::from_rgba8(0, 0, 0, cfg.fill_alpha));

    let caption = clean_caption(caption);
    let Some(measured) = measure_caption(&caption, cfg, fonts)? else {
        return Ok(OverlayBanner {
            width: frame_width,
            height: cfg.height,
            rgba8_premul: pixmap.take(),
            text_bounds: None,
            font_source: None,
        });
    };

    let (w, h) = (frame_width as f32, cfg.height as f32);
    let ink = measured.ink;
    let max_w = (w - 2.0 * SIDE_PADDING_PX).max(1.0);
    let max_h = h * MAX_TEXT_HEIGHT_FRACTION;
    let scale = 1.0f32.min(max_w / ink.width).min(max_h / ink.height);

    let (text_w, text_h) = (ink.width * scale, ink.height * scale);
    let left = (w - text_w) / 2.0;
    let top = (h - text_h) / 2.0;
    let tx = left - ink.x * scale;
    let ty = top - ink.y * scale;
    let shadow = cfg.shadow_offset as f32;

    let doc = format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            r##"<g fill="#000000" transform="translate({sx} {sy}) scale({s})">{content}</g>"##,
            r##"<g fill="#FFFFFF" transform="translate({tx} {ty}) scale({s})">{content}</g>"##,
            "</svg>"
        ),
        w = frame_width,
        h = cfg.height,
        sx = tx + shadow,
        sy = ty + shadow,
        tx = tx,
        ty = ty,
        s = scale,
        content = measured.content,
    );
    let tree = parse_svg(&doc, fonts)?;
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());

    if scale < 1.0 {
        tracing::debug!(scale, "caption scaled down to fit banner");
    }

    Ok(OverlayBanner {
        width: frame_width,
        height: cfg.height,
        rgba8_premul: pixmap.take(),
        text_bounds: Some(TextBounds {
            x: left,
            y: top,
            width: text_w,
            height: text_h,
        }),
        font_source: Some(measured.source),
    })
}

struct MeasuredCaption {
    /// SVG fragment drawing the caption at its natural origin, without fill.
    content: String,
    ink: TextBounds,
    source: FontSource,
}

fn measure_caption(
    caption: &str,
    cfg: &BannerConfig,
    fonts: &FontLibrary,
) -> ReelResult<Option<MeasuredCaption>> {
    if caption.trim().is_empty() {
        return Ok(None);
    }

    if fonts.face_count() > 0 {
        let content = format!(
            r#"<text x="0" y="0" font-family="{family}" font-size="{size}" font-weight="bold">{text}</text>"#,
            family = fonts.family_list(),
            size = cfg.font_size,
            text = escape_xml(caption),
        );
        let tree = parse_svg(&measure_doc(&content), fonts)?;
        if let Some(ink) = ink_bounds(tree.root()) {
            return Ok(Some(MeasuredCaption {
                content,
                ink,
                source: fonts.source(),
            }));
        }
    }

    tracing::warn!(
        faces = fonts.face_count(),
        "no installed font could draw the caption, using the built-in face"
    );
    let Some(d) = builtin::text_path_data(caption, builtin::cell_size(cfg.font_size)) else {
        return Ok(None);
    };
    let content = format!(r#"<path d="{d}"/>"#);
    let tree = parse_svg(&measure_doc(&content), fonts)?;
    Ok(ink_bounds(tree.root()).map(|ink| MeasuredCaption {
        content,
        ink,
        source: FontSource::BuiltIn,
    }))
}

fn measure_doc(content: &str) -> String {
    // Never rasterized; only outlines are inspected, so the viewport size does not matter.
    format!(r#"<svg xmlns="http://www.w3.org/2000/svg" width="1" height="1">{content}</svg>"#)
}

fn parse_svg(doc: &str, fonts: &FontLibrary) -> ReelResult<usvg::Tree> {
    let opts = fonts.svg_options();
    usvg::Tree::from_str(doc, &opts)
        .map_err(|e| ReelError::validation(format!("banner svg is invalid: {e}")))
}

/// Union of the filled outlines under `group`, text included via its flattened paths.
fn ink_bounds(group: &usvg::Group) -> Option<TextBounds> {
    fn visit(group: &usvg::Group, acc: &mut Option<(f32, f32, f32, f32)>) {
        for node in group.children() {
            match node {
                usvg::Node::Group(g) => visit(g, acc),
                usvg::Node::Text(t) => visit(t.flattened(), acc),
                usvg::Node::Path(p) => {
                    let r = p.abs_bounding_box();
                    let (l, t, rr, b) = (r.left(), r.top(), r.right(), r.bottom());
                    *acc = Some(match *acc {
                        None => (l, t, rr, b),
                        Some((al, at, ar, ab)) => (al.min(l), at.min(t), ar.max(rr), ab.max(b)),
                    });
                }
                usvg::Node::Image(_) => {}
            }
        }
    }

    let mut acc = None;
    visit(group, &mut acc);
    let (l, t, r, b) = acc?;
    let (width, height) = (r - l, b - t);
    (width > 0.0 && height > 0.0).then_some(TextBounds {
        x: l,
        y: t,
        width,
        height,
    })
}

fn clean_caption(caption: &str) -> String {
    caption
        .trim()
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/banner.rs"]
mod tests;
