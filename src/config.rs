use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};

/// Immutable render configuration.
///
/// Built once at startup (JSON file, environment overrides, CLI flags) and handed to
/// [`crate::ReelPipeline::new`], which validates it and keeps it read-only for its lifetime.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VideoConfig {
    /// Output frame width in pixels.
    pub frame_width: u32,
    /// Output frame height in pixels.
    pub frame_height: u32,
    /// Output frames per second.
    pub fps: u32,
    /// Upper bound on clip length; the narration is cut at this point.
    pub max_duration_seconds: f64,
    /// Magnification at the end of the clip relative to the start (`>= 1.0`).
    pub zoom_factor: f64,
    /// Directory for derived outputs and other temporary artifacts.
    pub temp_dir: PathBuf,
    /// Lower-third banner geometry and typography.
    pub banner: BannerConfig,
    /// Encoder selection and quality settings.
    pub encode: EncodeParams,
    /// Verbosity of the ffmpeg child process.
    pub log_level: EncoderLogLevel,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            frame_width: 1080,
            frame_height: 1920,
            fps: 30,
            max_duration_seconds: 15.0,
            zoom_factor: 1.15,
            temp_dir: default_temp_dir(),
            banner: BannerConfig::default(),
            encode: EncodeParams::default(),
            log_level: EncoderLogLevel::default(),
        }
    }
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("promo-reel")
}

/// Lower-third banner settings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BannerConfig {
    /// Banner height in pixels; the width always equals the frame width.
    pub height: u32,
    /// Gap between the banner's bottom edge and the frame's bottom edge.
    pub margin_bottom: u32,
    /// Preferred bold font file. System fonts are used when it cannot be loaded.
    pub font_path: Option<PathBuf>,
    /// Font size in pixels.
    pub font_size: f32,
    /// Alpha of the dark banner fill.
    pub fill_alpha: u8,
    /// Drop-shadow offset in pixels, applied on both axes.
    pub shadow_offset: u32,
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            height: 150,
            margin_bottom: 50,
            font_path: Some(PathBuf::from(
                "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
            )),
            font_size: 48.0,
            fill_alpha: 180,
            shadow_offset: 3,
        }
    }
}

/// Codec and container parameters passed to ffmpeg.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodeParams {
    /// ffmpeg video encoder name.
    pub video_codec: String,
    /// ffmpeg audio encoder name.
    pub audio_codec: String,
    /// x264 speed/quality preset.
    pub preset: String,
    /// H.264 profile.
    pub profile: String,
    /// H.264 level.
    pub level: String,
    /// Output pixel format.
    pub pixel_format: String,
    /// Constant rate factor; encoder default when `None`.
    pub crf: Option<u8>,
    /// Audio bitrate such as `"128k"`; encoder default when `None`.
    pub audio_bitrate: Option<String>,
    /// Move the `moov` atom to the front for progressive playback.
    pub faststart: bool,
}

impl Default for EncodeParams {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            preset: "medium".to_string(),
            profile: "high".to_string(),
            level: "4.0".to_string(),
            pixel_format: "yuv420p".to_string(),
            crf: None,
            audio_bitrate: None,
            faststart: true,
        }
    }
}

/// ffmpeg `-loglevel` values exposed to callers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderLogLevel {
    /// Print nothing.
    Quiet,
    /// Errors only.
    #[default]
    Error,
    /// Errors and warnings.
    Warning,
    /// Informational output including encoder statistics.
    Info,
}

impl EncoderLogLevel {
    /// The value passed to ffmpeg's `-loglevel`.
    pub fn as_ffmpeg_arg(self) -> &'static str {
        match self {
            Self::Quiet => "quiet",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl VideoConfig {
    /// Parse a config from a JSON reader. Missing fields take their defaults.
    pub fn from_reader<R: std::io::Read>(r: R) -> ReelResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| ReelError::validation(format!("parse config JSON: {e}")))
    }

    /// Parse a config from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ReelError::not_found("config", path)
            } else {
                ReelError::validation(format!("open config JSON '{}': {e}", path.display()))
            }
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Apply overrides using the service's environment variable names.
    ///
    /// `lookup` returns the raw value for a name, or `None` when unset. Recognised names are
    /// `VIDEO_WIDTH`, `VIDEO_HEIGHT`, `VIDEO_FPS`, `VIDEO_DURATION`, `ZOOM_FACTOR` and `TEMP_DIR`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ReelResult<()> {
        if let Some(v) = lookup("VIDEO_WIDTH") {
            self.frame_width = parse_override("VIDEO_WIDTH", &v)?;
        }
        if let Some(v) = lookup("VIDEO_HEIGHT") {
            self.frame_height = parse_override("VIDEO_HEIGHT", &v)?;
        }
        if let Some(v) = lookup("VIDEO_FPS") {
            self.fps = parse_override("VIDEO_FPS", &v)?;
        }
        if let Some(v) = lookup("VIDEO_DURATION") {
            self.max_duration_seconds = parse_override("VIDEO_DURATION", &v)?;
        }
        if let Some(v) = lookup("ZOOM_FACTOR") {
            self.zoom_factor = parse_override("ZOOM_FACTOR", &v)?;
        }
        if let Some(v) = lookup("TEMP_DIR") {
            self.temp_dir = PathBuf::from(v);
        }
        Ok(())
    }

    /// [`Self::apply_overrides`] fed from the process environment.
    pub fn apply_env_overrides(&mut self) -> ReelResult<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Output canvas.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.frame_width,
            height: self.frame_height,
        }
    }

    /// Check every field for values the pipeline cannot honour.
    pub fn validate(&self) -> ReelResult<()> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(ReelError::validation("frame width/height must be non-zero"));
        }
        if !self.frame_width.is_multiple_of(2) || !self.frame_height.is_multiple_of(2) {
            return Err(ReelError::validation(
                "frame width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if self.fps == 0 {
            return Err(ReelError::validation("fps must be non-zero"));
        }
        if !self.max_duration_seconds.is_finite() || self.max_duration_seconds <= 0.0 {
            return Err(ReelError::validation(
                "max_duration_seconds must be finite and > 0",
            ));
        }
        // Factors below 1.0 would need a crop window larger than the frame.
        if !self.zoom_factor.is_finite() || self.zoom_factor < 1.0 {
            return Err(ReelError::validation(format!(
                "zoom_factor must be finite and >= 1.0, got {}",
                self.zoom_factor
            )));
        }

        let b = &self.banner;
        if b.height == 0 {
            return Err(ReelError::validation("banner height must be non-zero"));
        }
        if u64::from(b.height) + u64::from(b.margin_bottom) > u64::from(self.frame_height) {
            return Err(ReelError::validation(format!(
                "banner ({}px + {}px margin) does not fit in a {}px frame",
                b.height, b.margin_bottom, self.frame_height
            )));
        }
        if !b.font_size.is_finite() || b.font_size <= 0.0 {
            return Err(ReelError::validation(
                "banner font_size must be finite and > 0",
            ));
        }

        let e = &self.encode;
        for (name, value) in [
            ("video_codec", &e.video_codec),
            ("audio_codec", &e.audio_codec),
            ("preset", &e.preset),
            ("profile", &e.profile),
            ("level", &e.level),
            ("pixel_format", &e.pixel_format),
        ] {
            if value.trim().is_empty() {
                return Err(ReelError::validation(format!(
                    "encode.{name} must be non-empty"
                )));
            }
        }
        if let Some(crf) = e.crf
            && crf > 51
        {
            return Err(ReelError::validation("encode.crf must be in 0..=51"));
        }
        Ok(())
    }
}

fn parse_override<T: std::str::FromStr>(name: &str, raw: &str) -> ReelResult<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| ReelError::validation(format!("invalid {name} '{raw}': {e}")))
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
