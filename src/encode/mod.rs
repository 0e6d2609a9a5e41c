//! Encoding sinks.
//!
//! Sinks consume composited frames in timeline order and are driven by
//! [`crate::ReelPipeline`].

/// `ffmpeg`-based sink (H.264/AAC MP4 via the system `ffmpeg`).
pub mod ffmpeg;
/// Generic frame sink trait and the in-memory sink.
pub mod sink;
