use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageError, ImageReader};

use crate::foundation::error::{ReelError, ReelResult};

/// A decoded still image of arbitrary size and color mode.
///
/// Input only: the frame fitter reads it and never mutates it.
#[derive(Clone, Debug)]
pub struct SourceImage {
    /// Where the image was read from.
    pub path: PathBuf,
    /// Decoded pixels in their original color type.
    pub image: DynamicImage,
}

impl SourceImage {
    /// Wrap an already decoded image (tests, in-memory callers).
    pub fn from_image(path: impl Into<PathBuf>, image: DynamicImage) -> Self {
        Self {
            path: path.into(),
            image,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Decode the image at `path`.
///
/// The format is sniffed from content first and from the extension second, so a PNG saved as
/// `.jpg` still decodes. Errors map onto [`ReelError::NotFound`] for a missing path and
/// [`ReelError::UnsupportedFormat`] for anything `image` cannot read.
pub fn load_source_image(path: &Path) -> ReelResult<SourceImage> {
    if !path.is_file() {
        return Err(ReelError::not_found("image", path));
    }

    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ReelError::not_found("image", path),
            _ => ReelError::unsupported_format(format!(
                "cannot read image '{}': {e}",
                path.display()
            )),
        })?;

    if reader.format().is_none() {
        return Err(ReelError::unsupported_format(format!(
            "unrecognised image format for '{}'",
            path.display()
        )));
    }

    let image = reader.decode().map_err(|e| match e {
        ImageError::IoError(io) if io.kind() == std::io::ErrorKind::NotFound => {
            ReelError::not_found("image", path)
        }
        other => ReelError::unsupported_format(format!(
            "cannot decode image '{}': {other}",
            path.display()
        )),
    })?;

    if image.width() == 0 || image.height() == 0 {
        return Err(ReelError::unsupported_format(format!(
            "image '{}' has zero width or height",
            path.display()
        )));
    }

    tracing::debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        color = ?image.color(),
        "decoded source image"
    );

    Ok(SourceImage {
        path: path.to_path_buf(),
        image,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
