use crate::foundation::core::{FrameIndex, FrameRange};
use crate::foundation::error::{ReelError, ReelResult};

/// Tolerance absorbing float error in `duration * fps` (e.g. `0.1 * 30 = 2.9999999999999996`).
const FRAME_COUNT_EPSILON: f64 = 1e-9;

/// Clip length: the narration duration capped at `max_duration_secs`.
///
/// Fails with [`ReelError::InvalidDuration`] unless the result is finite and strictly positive.
pub fn effective_duration(audio_secs: f64, max_duration_secs: f64) -> ReelResult<f64> {
    if !audio_secs.is_finite() || audio_secs <= 0.0 {
        return Err(ReelError::invalid_duration(format!(
            "narration duration must be finite and > 0, got {audio_secs}"
        )));
    }
    if !max_duration_secs.is_finite() || max_duration_secs <= 0.0 {
        return Err(ReelError::invalid_duration(format!(
            "max duration must be finite and > 0, got {max_duration_secs}"
        )));
    }
    Ok(audio_secs.min(max_duration_secs))
}

/// Frame schedule derived from the effective duration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipTiming {
    /// Effective duration in seconds; the zoom runs from 1.0 at `0` to its maximum here.
    pub duration_secs: f64,
    /// Output frame rate.
    pub fps: u32,
    /// `floor(duration_secs * fps)`, always at least 1.
    pub frame_count: u64,
}

impl ClipTiming {
    /// Build the schedule for `duration_secs` at `fps`.
    ///
    /// A duration shorter than one frame interval yields no frames and is rejected as an
    /// invalid duration.
    pub fn new(duration_secs: f64, fps: u32) -> ReelResult<Self> {
        if fps == 0 {
            return Err(ReelError::validation("fps must be non-zero"));
        }
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(ReelError::invalid_duration(format!(
                "clip duration must be finite and > 0, got {duration_secs}"
            )));
        }
        let frame_count = (duration_secs * f64::from(fps) + FRAME_COUNT_EPSILON).floor() as u64;
        if frame_count == 0 {
            return Err(ReelError::invalid_duration(format!(
                "clip of {duration_secs}s is shorter than one frame at {fps} fps"
            )));
        }
        Ok(Self {
            duration_secs,
            fps,
            frame_count,
        })
    }

    /// Frames `[0, frame_count)`.
    pub fn frames(&self) -> FrameRange {
        FrameRange {
            start: FrameIndex(0),
            end: FrameIndex(self.frame_count),
        }
    }

    /// Timestamp of `frame` in seconds.
    pub fn time_of(&self, frame: FrameIndex) -> f64 {
        frame.to_secs(self.fps)
    }

    /// Length of the visual track: `frame_count / fps`.
    ///
    /// The audio is cut at the same point so both streams end together.
    pub fn visual_duration_secs(&self) -> f64 {
        self.frame_count as f64 / f64::from(self.fps)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/timing.rs"]
mod tests;
