use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::foundation::error::{ReelError, ReelResult};

/// A narration track on local storage and its playable duration.
///
/// The duration is the single timing authority for the clip: the visual track length is
/// derived from it, never the other way round.
#[derive(Clone, Debug, PartialEq)]
pub struct NarrationAudio {
    /// Path handed to the muxer.
    pub path: PathBuf,
    /// Playable duration in seconds as reported by the container.
    pub duration_secs: f64,
}

impl NarrationAudio {
    /// Use a duration the caller already knows (e.g. reported by the synthesis service).
    pub fn with_duration(path: impl Into<PathBuf>, duration_secs: f64) -> Self {
        Self {
            path: path.into(),
            duration_secs,
        }
    }

    /// Probe `path` with `ffprobe` for its duration.
    pub fn probe(path: &Path) -> ReelResult<Self> {
        let duration_secs = probe_audio_duration(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            duration_secs,
        })
    }
}

/// Read the container duration of an audio file through `ffprobe`.
///
/// Falls back to the longest audio stream duration when the container reports none.
pub fn probe_audio_duration(path: &Path) -> ReelResult<f64> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        #[serde(default)]
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    if !path.is_file() {
        return Err(ReelError::not_found("audio", path));
    }

    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            ReelError::render_failed(
                "failed to run ffprobe (is it installed and on PATH?)",
                e,
            )
        })?;
    if !out.status.success() {
        return Err(ReelError::unsupported_format(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout).map_err(|e| {
        ReelError::unsupported_format(format!("ffprobe json parse failed: {e}"))
    })?;

    let audio_streams: Vec<&ProbeStream> = parsed
        .streams
        .iter()
        .filter(|s| s.codec_type.as_deref() == Some("audio"))
        .collect();
    if audio_streams.is_empty() {
        return Err(ReelError::unsupported_format(format!(
            "no audio stream found in '{}'",
            path.display()
        )));
    }

    let from_format = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(parse_seconds);
    let from_streams = audio_streams
        .iter()
        .filter_map(|s| s.duration.as_deref().and_then(parse_seconds))
        .reduce(f64::max);

    let duration = from_format.or(from_streams).ok_or_else(|| {
        ReelError::invalid_duration(format!(
            "ffprobe reported no duration for '{}'",
            path.display()
        ))
    })?;

    tracing::debug!(path = %path.display(), duration, "probed narration audio");
    Ok(duration)
}

fn parse_seconds(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Return `true` when `ffprobe` can be invoked from `PATH`.
pub fn is_ffprobe_on_path() -> bool {
    Command::new("ffprobe")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;
