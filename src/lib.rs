//! promo-reel assembles a short vertical promo video from one still image, a caption and a
//! narration track.
//!
//! The pipeline is CPU-only and deterministic up to the encoder:
//!
//! - Fit the image into the output canvas ([`fit_to_frame`])
//! - Sample a progressive center zoom for each frame ([`sample_zoom`])
//! - Composite a lower-third caption banner ([`render_banner`], [`composite_banner`])
//! - Stream the frames and the narration into `ffmpeg` ([`FfmpegSink`])
//!
//! [`ReelPipeline`] ties the stages together; the narration duration, capped by
//! [`VideoConfig::max_duration_seconds`], decides how many frames are rendered.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod config;
mod foundation;
mod frame;
mod overlay;

/// Encoding sinks.
pub mod encode;
/// Timing, compositing and the render driver.
pub mod render;

pub use crate::foundation::core::{Canvas, FrameIndex, FrameRange};
pub use crate::foundation::error::{BoxedCause, ReelError, ReelResult};

pub use crate::assets::decode::{SourceImage, load_source_image};
pub use crate::assets::media::{NarrationAudio, is_ffprobe_on_path, probe_audio_duration};
pub use crate::config::{BannerConfig, EncodeParams, EncoderLogLevel, VideoConfig};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};
pub use crate::frame::fit::{BaseFrame, fit_to_frame, scaled_dimensions};
pub use crate::frame::zoom::{CropWindow, crop_window, sample_zoom, zoom_at};
pub use crate::overlay::banner::{OverlayBanner, TextBounds, render_banner};
pub use crate::overlay::fonts::{FontLibrary, FontSource};
pub use crate::render::composite::{BannerPlacement, composite_banner};
pub use crate::render::pipeline::{
    ReelPipeline, ReelRequest, RenderProgress, RenderStats, RenderedVideo, derive_output_path,
};
pub use crate::render::timing::{ClipTiming, effective_duration};
