use std::path::{Path, PathBuf};

/// Convenience result type used across promo-reel.
pub type ReelResult<T> = Result<T, ReelError>;

/// Boxed underlying cause carried by [`ReelError::RenderFailed`].
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error taxonomy returned by every pipeline entry point.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// A referenced input asset does not exist at call time.
    #[error("not found: {what} '{}'", path.display())]
    NotFound {
        /// Which input was missing (`"image"`, `"audio"`, ...).
        what: &'static str,
        /// The path as given by the caller.
        path: PathBuf,
    },

    /// Input content or extension could not be decoded.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The effective clip duration is not a positive, finite number of seconds.
    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    /// Invalid configuration or caller-provided parameters.
    #[error("validation error: {0}")]
    Validation(String),

    /// Failure while encoding or writing the output; wraps the underlying cause.
    #[error("render failed: {message}")]
    RenderFailed {
        /// Short description of the failing stage.
        message: String,
        /// Original error.
        #[source]
        source: BoxedCause,
    },

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::NotFound`] value.
    pub fn not_found(what: &'static str, path: impl AsRef<Path>) -> Self {
        Self::NotFound {
            what,
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Build a [`ReelError::UnsupportedFormat`] value.
    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    /// Build a [`ReelError::InvalidDuration`] value.
    pub fn invalid_duration(msg: impl Into<String>) -> Self {
        Self::InvalidDuration(msg.into())
    }

    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::RenderFailed`] value around `source`.
    pub fn render_failed(message: impl Into<String>, source: impl Into<BoxedCause>) -> Self {
        Self::RenderFailed {
            message: message.into(),
            source: source.into(),
        }
    }

    /// Wrap `self` as the cause of a [`ReelError::RenderFailed`].
    ///
    /// Errors that already are `RenderFailed` are returned unchanged.
    pub fn into_render_failed(self, message: impl Into<String>) -> Self {
        match self {
            Self::RenderFailed { .. } => self,
            other => Self::RenderFailed {
                message: message.into(),
                source: Box::new(other),
            },
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
