use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::assets::decode::load_source_image;
use crate::assets::media::NarrationAudio;
use crate::config::VideoConfig;
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, ensure_parent_dir};
use crate::encode::sink::{AudioInputConfig, FrameSink, SinkConfig};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::Fnv1a64;
use crate::frame::fit::{BaseFrame, fit_to_frame};
use crate::frame::zoom::sample_zoom;
use crate::overlay::banner::{OverlayBanner, render_banner};
use crate::overlay::fonts::FontLibrary;
use crate::render::composite::{BannerPlacement, composite_banner};
use crate::render::timing::{ClipTiming, effective_duration};

/// Caption characters kept in a derived output file name.
const SLUG_MAX_CHARS: usize = 20;

/// One video to assemble.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReelRequest {
    /// Still product image (JPEG, PNG, GIF, WebP, ...).
    pub image_path: PathBuf,
    /// Narration track; its duration drives the clip length.
    pub audio_path: PathBuf,
    /// Banner text, usually the product name.
    pub caption: String,
    /// Where to write the MP4; derived from the caption and image path when `None`.
    pub output_path: Option<PathBuf>,
}

/// The finished, muxed MP4. Ownership of the file passes to the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedVideo {
    /// Final output path.
    pub path: PathBuf,
    /// Length of the visual track in seconds.
    pub duration_secs: f64,
    /// Number of frames encoded.
    pub frame_count: u64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

/// Counters for a frame loop driven into a [`FrameSink`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderStats {
    /// Frames pushed to the sink.
    pub frames: u64,
    /// Effective clip duration in seconds.
    pub duration_secs: f64,
    /// Visual track length in seconds (`frames / fps`).
    pub visual_duration_secs: f64,
}

/// Progress report delivered after each frame is handed to the encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderProgress {
    /// Frames completed so far (1-based).
    pub frame: u64,
    /// Frames in the whole clip.
    pub total_frames: u64,
}

/// Video assembly pipeline: fit, zoom, banner, mux.
///
/// Holds the validated configuration and the font library; construct once and reuse for many
/// renders. Each render owns its own base frame, banner and output file, so `&self` calls are
/// independent of one another.
#[derive(Clone, Debug)]
pub struct ReelPipeline {
    cfg: VideoConfig,
    fonts: FontLibrary,
}

/// Everything prepared before the first frame: no encoder work has happened yet.
struct PreparedClip {
    base: BaseFrame,
    banner: OverlayBanner,
    placement: BannerPlacement,
    timing: ClipTiming,
}

impl ReelPipeline {
    /// Validate `cfg` and load fonts (the configured banner font plus system fonts).
    pub fn new(cfg: VideoConfig) -> ReelResult<Self> {
        cfg.validate()?;
        let fonts = FontLibrary::load(cfg.banner.font_path.as_deref());
        Ok(Self { cfg, fonts })
    }

    /// Like [`Self::new`] with an explicit font library.
    pub fn with_fonts(cfg: VideoConfig, fonts: FontLibrary) -> ReelResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg, fonts })
    }

    /// The validated configuration.
    pub fn config(&self) -> &VideoConfig {
        &self.cfg
    }

    /// Render `req` to an MP4 with the system `ffmpeg`.
    pub fn render(&self, req: &ReelRequest) -> ReelResult<RenderedVideo> {
        self.render_with_progress(req, &mut |_| {})
    }

    /// [`Self::render`], calling `progress` after every frame.
    ///
    /// Both inputs are checked before any work starts. The MP4 is written to `<output>.partial`
    /// and renamed into place only after ffmpeg exits cleanly; on any failure the partial file is
    /// removed and nothing is left at the output path.
    #[tracing::instrument(
        skip(self, req, progress),
        fields(image = %req.image_path.display(), audio = %req.audio_path.display())
    )]
    pub fn render_with_progress(
        &self,
        req: &ReelRequest,
        progress: &mut dyn FnMut(RenderProgress),
    ) -> ReelResult<RenderedVideo> {
        check_inputs(&req.image_path, &req.audio_path)?;

        let audio = NarrationAudio::probe(&req.audio_path)?;
        let out_path = match &req.output_path {
            Some(p) => p.clone(),
            None => derive_output_path(&self.cfg.temp_dir, &req.caption, &req.image_path),
        };
        let clip = self.prepare(&req.image_path, audio.duration_secs, &req.caption)?;

        ensure_parent_dir(&out_path)?;
        let partial = partial_path(&out_path);
        let mut partial_guard = TempFileGuard(Some(partial.clone()));

        let mut sink = FfmpegSink::new(FfmpegSinkOpts {
            out_path: partial.clone(),
            overwrite: true,
            encode: self.cfg.encode.clone(),
            log_level: self.cfg.log_level,
        });
        let stats = self.drive(&clip, Some(&audio), &mut sink, progress)?;
        drop(sink);

        std::fs::rename(&partial, &out_path).map_err(|e| {
            ReelError::render_failed(
                format!(
                    "failed to move '{}' to '{}'",
                    partial.display(),
                    out_path.display()
                ),
                e,
            )
        })?;
        partial_guard.0 = None;

        tracing::info!(
            out = %out_path.display(),
            frames = stats.frames,
            duration_secs = stats.visual_duration_secs,
            "rendered video"
        );
        Ok(RenderedVideo {
            path: out_path,
            duration_secs: stats.visual_duration_secs,
            frame_count: stats.frames,
            width: self.cfg.frame_width,
            height: self.cfg.frame_height,
        })
    }

    /// Run the frame loop for `image` and `audio` into any sink.
    ///
    /// The image must exist; the audio duration is taken from `audio` as given (no probing).
    pub fn render_into(
        &self,
        image: &Path,
        audio: &NarrationAudio,
        caption: &str,
        sink: &mut dyn FrameSink,
    ) -> ReelResult<RenderStats> {
        if !image.exists() {
            return Err(ReelError::not_found("image", image));
        }
        let clip = self.prepare(image, audio.duration_secs, caption)?;
        self.drive(&clip, Some(audio), sink, &mut |_| {})
    }

    /// One composited frame at time `t` of a clip lasting `duration_secs`.
    pub fn render_still(
        &self,
        image: &Path,
        caption: &str,
        t: f64,
        duration_secs: f64,
    ) -> ReelResult<RgbImage> {
        let clip = self.prepare(image, duration_secs, caption)?;
        self.compose_frame(&clip, t)
    }

    fn prepare(&self, image: &Path, audio_secs: f64, caption: &str) -> ReelResult<PreparedClip> {
        let duration = effective_duration(audio_secs, self.cfg.max_duration_seconds)?;
        let timing = ClipTiming::new(duration, self.cfg.fps)?;
        tracing::debug!(
            audio_secs,
            duration_secs = timing.duration_secs,
            frames = timing.frame_count,
            "clip timing"
        );

        let source = load_source_image(image)?;
        let base = fit_to_frame(&source, self.cfg.canvas())?;
        drop(source);

        let banner = render_banner(caption, self.cfg.frame_width, &self.cfg.banner, &self.fonts)?;
        let placement = BannerPlacement::lower_third(
            self.cfg.frame_height,
            banner.height(),
            self.cfg.banner.margin_bottom,
        )?;

        Ok(PreparedClip {
            base,
            banner,
            placement,
            timing,
        })
    }

    fn compose_frame(&self, clip: &PreparedClip, t: f64) -> ReelResult<RgbImage> {
        let mut frame = sample_zoom(
            &clip.base,
            t,
            clip.timing.duration_secs,
            self.cfg.zoom_factor,
        )?;
        composite_banner(&mut frame, &clip.banner, clip.placement)?;
        Ok(frame)
    }

    /// Push every frame of `clip` in order. Failures after `begin` become `RenderFailed`.
    fn drive(
        &self,
        clip: &PreparedClip,
        audio: Option<&NarrationAudio>,
        sink: &mut dyn FrameSink,
        progress: &mut dyn FnMut(RenderProgress),
    ) -> ReelResult<RenderStats> {
        let timing = clip.timing;
        sink.begin(SinkConfig {
            width: self.cfg.frame_width,
            height: self.cfg.frame_height,
            fps: timing.fps,
            duration_secs: timing.visual_duration_secs(),
            audio: audio.map(|a| AudioInputConfig {
                path: a.path.clone(),
            }),
        })
        .map_err(|e| e.into_render_failed("failed to start encoder"))?;

        let total_frames = timing.frame_count;
        for idx in timing.frames().iter() {
            let frame = self
                .compose_frame(clip, timing.time_of(idx))
                .map_err(|e| e.into_render_failed(format!("failed to compose frame {}", idx.0)))?;
            sink.push_frame(idx, &frame)
                .map_err(|e| e.into_render_failed(format!("failed to encode frame {}", idx.0)))?;

            let done = idx.0 + 1;
            progress(RenderProgress {
                frame: done,
                total_frames,
            });
            if done.is_multiple_of(u64::from(timing.fps)) {
                tracing::debug!(frame = done, total_frames, "render progress");
            }
        }

        sink.end()
            .map_err(|e| e.into_render_failed("failed to finalize encoder"))?;

        Ok(RenderStats {
            frames: total_frames,
            duration_secs: timing.duration_secs,
            visual_duration_secs: timing.visual_duration_secs(),
        })
    }
}

fn check_inputs(image: &Path, audio: &Path) -> ReelResult<()> {
    if !image.exists() {
        return Err(ReelError::not_found("image", image));
    }
    if !audio.exists() {
        return Err(ReelError::not_found("audio", audio));
    }
    Ok(())
}

/// Default output location: `<temp_dir>/video_<slug>_<hash>.mp4`.
///
/// `slug` is the first 20 characters of the caption with everything but letters and digits
/// replaced by `_` (`untitled` when the caption is empty); `hash` is the FNV-1a digest of the
/// image path, so the same inputs always map to the same file.
pub fn derive_output_path(temp_dir: &Path, caption: &str, image_path: &Path) -> PathBuf {
    let slug: String = caption
        .trim()
        .chars()
        .take(SLUG_MAX_CHARS)
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let slug = if slug.is_empty() { "untitled".to_string() } else { slug };

    let mut hasher = Fnv1a64::new_default();
    hasher.write_bytes(image_path.as_os_str().as_encoded_bytes());
    temp_dir.join(format!("video_{slug}_{:016x}.mp4", hasher.finish()))
}

fn partial_path(out: &Path) -> PathBuf {
    let mut name = out.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

/// Removes the file on drop unless disarmed by clearing the path.
struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
