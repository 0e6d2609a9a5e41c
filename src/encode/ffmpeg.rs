use std::ffi::OsString;
use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use image::RgbImage;

use crate::config::{EncodeParams, EncoderLogLevel};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ReelError, ReelResult};

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output file path; written as MP4 regardless of extension.
    pub out_path: PathBuf,
    /// Overwrite the output file if it already exists.
    pub overwrite: bool,
    /// Codec and container settings.
    pub encode: EncodeParams,
    /// ffmpeg's own log verbosity.
    pub log_level: EncoderLogLevel,
}

impl FfmpegSinkOpts {
    /// Options with default encode settings for `out_path`.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            encode: EncodeParams::default(),
            log_level: EncoderLogLevel::default(),
        }
    }
}

/// Sink that spawns the system `ffmpeg`, streams raw RGB frames to its stdin and muxes the
/// narration from a second input.
///
/// Dropping a sink whose `end` was never reached kills and reaps the child process.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    cfg: Option<SinkConfig>,
    frame_bytes: usize,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    /// Create a sink; nothing is spawned until `begin`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            cfg: None,
            frame_bytes: 0,
            last_idx: None,
        }
    }

    /// Kill the child and turn `cause` into a render failure carrying ffmpeg's stderr.
    fn abort(&mut self, message: &str, cause: std::io::Error) -> ReelError {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let stderr = self.take_stderr().unwrap_or_default();
        let stderr = String::from_utf8_lossy(&stderr);
        let stderr = stderr.trim();
        if stderr.is_empty() {
            ReelError::render_failed(message, cause)
        } else {
            ReelError::render_failed(format!("{message}: {stderr}"), cause)
        }
    }

    fn take_stderr(&mut self) -> ReelResult<Vec<u8>> {
        match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| {
                    ReelError::render_failed("ffmpeg stderr drain", "drain thread panicked")
                })?
                .map_err(|e| ReelError::render_failed("ffmpeg stderr read failed", e)),
            None => Ok(Vec::new()),
        }
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        if self.child.is_some() {
            return Err(ReelError::validation("ffmpeg sink already started"));
        }
        let args = build_ffmpeg_args(&self.opts, &cfg)?;

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(ReelError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }

        tracing::debug!(
            out = %self.opts.out_path.display(),
            width = cfg.width,
            height = cfg.height,
            fps = cfg.fps,
            duration_secs = cfg.duration_secs,
            "spawning ffmpeg"
        );

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ReelError::render_failed("failed to spawn ffmpeg (is it installed and on PATH?)", e)
            })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            ReelError::render_failed("ffmpeg stdin", "failed to open ffmpeg stdin (unexpected)")
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| {
            ReelError::render_failed("ffmpeg stderr", "failed to open ffmpeg stderr (unexpected)")
        })?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.frame_bytes = cfg.width as usize * cfg.height as usize * 3;
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &RgbImage) -> ReelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ReelError::validation("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(ReelError::validation(format!(
                "ffmpeg sink received out-of-order frame {} after {}",
                idx.0, last.0
            )));
        }
        if frame.dimensions() != (cfg.width, cfg.height) {
            return Err(ReelError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                cfg.width,
                cfg.height
            )));
        }
        if frame.as_raw().len() != self.frame_bytes {
            return Err(ReelError::validation("frame data size mismatch with width*height*3"));
        }
        self.last_idx = Some(idx);

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ReelError::validation("ffmpeg sink is already finalized"));
        };
        if let Err(e) = stdin.write_all(frame.as_raw()) {
            return Err(self.abort("failed to write frame to ffmpeg stdin", e));
        }
        Ok(())
    }

    fn end(&mut self) -> ReelResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| ReelError::validation("ffmpeg sink not started"))?;

        let status = child
            .wait()
            .map_err(|e| ReelError::render_failed("failed to wait for ffmpeg to finish", e))?;
        let stderr_bytes = self.take_stderr()?;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(ReelError::render_failed(
                format!("ffmpeg exited with status {status}"),
                stderr.trim().to_string(),
            ));
        }

        self.cfg = None;
        Ok(())
    }
}

/// Full ffmpeg argument list for `opts` and `cfg`, output path last.
///
/// Video arrives as `rgb24` rawvideo on stdin; the narration is the second input. Both are cut
/// at `cfg.duration_secs` so the streams end together.
pub fn build_ffmpeg_args(opts: &FfmpegSinkOpts, cfg: &SinkConfig) -> ReelResult<Vec<OsString>> {
    if cfg.fps == 0 {
        return Err(ReelError::validation("fps must be non-zero"));
    }
    if cfg.width == 0 || cfg.height == 0 {
        return Err(ReelError::validation(
            "ffmpeg sink width/height must be non-zero",
        ));
    }
    if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
        return Err(ReelError::validation(
            "ffmpeg sink width/height must be even (required for yuv420p mp4 output)",
        ));
    }
    if !cfg.duration_secs.is_finite() || cfg.duration_secs <= 0.0 {
        return Err(ReelError::invalid_duration(format!(
            "ffmpeg sink duration must be finite and > 0, got {}",
            cfg.duration_secs
        )));
    }

    let enc = &opts.encode;
    let mut args: Vec<OsString> = Vec::with_capacity(48);

    push_args(&mut args, &[if opts.overwrite { "-y" } else { "-n" }]);
    push_args(&mut args, &["-hide_banner", "-loglevel", opts.log_level.as_ffmpeg_arg()]);
    push_args(
        &mut args,
        &[
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
        ],
    );
    if let Some(audio) = &cfg.audio {
        args.push("-i".into());
        args.push(audio.path.as_os_str().to_owned());
        push_args(&mut args, &["-map", "0:v:0", "-map", "1:a:0"]);
    }

    push_args(
        &mut args,
        &[
            "-c:v",
            &enc.video_codec,
            "-preset",
            &enc.preset,
            "-profile:v",
            &enc.profile,
            "-level",
            &enc.level,
            "-pix_fmt",
            &enc.pixel_format,
        ],
    );
    if let Some(crf) = enc.crf {
        push_args(&mut args, &["-crf", &crf.to_string()]);
    }
    if cfg.audio.is_some() {
        push_args(&mut args, &["-c:a", &enc.audio_codec]);
        if let Some(bitrate) = &enc.audio_bitrate {
            push_args(&mut args, &["-b:a", bitrate]);
        }
    } else {
        args.push("-an".into());
    }

    push_args(&mut args, &["-t", &format!("{:.6}", cfg.duration_secs)]);
    if enc.faststart {
        push_args(&mut args, &["-movflags", "+faststart"]);
    }
    push_args(&mut args, &["-f", "mp4"]);
    args.push(opts.out_path.as_os_str().to_owned());
    Ok(args)
}

fn push_args(args: &mut Vec<OsString>, items: &[&str]) {
    args.extend(items.iter().map(OsString::from));
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
