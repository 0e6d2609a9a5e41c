use std::path::Path;
use std::sync::Arc;

use usvg::fontdb;

/// Families tried after the preferred font, ahead of the generic `sans-serif`.
const FALLBACK_FAMILIES: &[&str] = &["Noto Sans Arabic", "Noto Sans", "DejaVu Sans", "Arial"];

/// Which face ended up drawing a caption.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontSource {
    /// The configured font file (family name as reported by the file).
    Preferred(String),
    /// A face from the system font database.
    System,
    /// The built-in bitmap face; used when no installed face can draw the caption.
    BuiltIn,
}

/// Font database used for banner text.
///
/// Loading system fonts is slow, so a library is built once per pipeline and shared by reference.
#[derive(Clone)]
pub struct FontLibrary {
    fontdb: Arc<fontdb::Database>,
    preferred_family: Option<String>,
}

impl std::fmt::Debug for FontLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontLibrary")
            .field("faces", &self.fontdb.len())
            .field("preferred_family", &self.preferred_family)
            .finish()
    }
}

impl FontLibrary {
    /// Load `preferred` (if given and readable) plus every system font.
    pub fn load(preferred: Option<&Path>) -> Self {
        let mut db = fontdb::Database::new();
        let preferred_family = preferred.and_then(|path| load_preferred(&mut db, path));
        db.load_system_fonts();
        tracing::debug!(
            faces = db.len(),
            preferred = preferred_family.as_deref().unwrap_or("<none>"),
            "font library loaded"
        );
        Self {
            fontdb: Arc::new(db),
            preferred_family,
        }
    }

    /// Only the given font file, without system fonts.
    pub fn from_font_file(path: &Path) -> Self {
        let mut db = fontdb::Database::new();
        let preferred_family = load_preferred(&mut db, path);
        Self {
            fontdb: Arc::new(db),
            preferred_family,
        }
    }

    /// A library with no faces at all; every caption uses the built-in face.
    pub fn builtin_only() -> Self {
        Self {
            fontdb: Arc::new(fontdb::Database::new()),
            preferred_family: None,
        }
    }

    /// Number of loaded faces.
    pub fn face_count(&self) -> usize {
        self.fontdb.len()
    }

    /// Family name of the preferred font, when it loaded.
    pub fn preferred_family(&self) -> Option<&str> {
        self.preferred_family.as_deref()
    }

    /// Source label for text drawn from this database.
    pub(crate) fn source(&self) -> FontSource {
        match &self.preferred_family {
            Some(family) => FontSource::Preferred(family.clone()),
            None => FontSource::System,
        }
    }

    /// Value for an SVG `font-family` attribute.
    pub(crate) fn family_list(&self) -> String {
        let mut families: Vec<String> = Vec::new();
        if let Some(family) = &self.preferred_family {
            families.push(format!("'{}'", sanitize_family(family)));
        }
        families.extend(FALLBACK_FAMILIES.iter().map(|f| format!("'{f}'")));
        families.push("sans-serif".to_string());
        families.join(", ")
    }

    pub(crate) fn svg_options(&self) -> usvg::Options<'static> {
        usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            font_resolver: make_svg_font_resolver(),
            ..Default::default()
        }
    }
}

fn load_preferred(db: &mut fontdb::Database, path: &Path) -> Option<String> {
    let before = db.len();
    if let Err(e) = db.load_font_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "preferred font unavailable, using fallback fonts");
        return None;
    }
    let family = db
        .faces()
        .skip(before)
        .find_map(|face| face.families.first().map(|(name, _)| name.clone()));
    if family.is_none() {
        tracing::warn!(path = %path.display(), "preferred font has no usable face, using fallback fonts");
    }
    family
}

fn sanitize_family(name: &str) -> String {
    name.chars().filter(|c| !matches!(c, '\'' | '"' | '<' | '>' | '&')).collect()
}

fn make_svg_font_resolver() -> usvg::FontResolver<'static> {
    use usvg::FontResolver;

    FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families = Vec::<fontdb::Family<'_>>::new();
            for family in font.families() {
                families.push(match family {
                    usvg::FontFamily::Serif => fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => fontdb::Family::Name(s),
                });
            }
            families.push(fontdb::Family::SansSerif);

            let style = match font.style() {
                usvg::FontStyle::Normal => fontdb::Style::Normal,
                usvg::FontStyle::Italic => fontdb::Style::Italic,
                usvg::FontStyle::Oblique => fontdb::Style::Oblique,
            };

            let query = fontdb::Query {
                families: &families,
                weight: fontdb::Weight(font.weight()),
                stretch: fontdb::Stretch::Normal,
                style,
            };

            if let Some(id) = fontdb.query(&query) {
                return Some(id);
            }
            // Any face beats no text; the fallback selector still fills in missing glyphs.
            fontdb.faces().next().map(|f| f.id)
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/fonts.rs"]
mod tests;
