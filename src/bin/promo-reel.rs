use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "promo-reel", version, about = "Assemble vertical promo videos")]
struct Cli {
    /// JSON config file; missing fields take their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format (stderr).
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render an MP4 (requires `ffmpeg` and `ffprobe` on PATH).
    Render(RenderArgs),
    /// Render one composited frame as a PNG.
    Frame(FrameArgs),
    /// Report the narration duration and the resulting clip timing.
    Probe(ProbeArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

/// Overrides applied on top of the config file and environment.
#[derive(Args, Debug)]
struct Overrides {
    /// Output frame width.
    #[arg(long)]
    width: Option<u32>,
    /// Output frame height.
    #[arg(long)]
    height: Option<u32>,
    /// Output frames per second.
    #[arg(long)]
    fps: Option<u32>,
    /// Maximum clip length in seconds.
    #[arg(long)]
    max_duration: Option<f64>,
    /// End-of-clip magnification (>= 1.0).
    #[arg(long)]
    zoom_factor: Option<f64>,
    /// Directory for derived outputs.
    #[arg(long)]
    temp_dir: Option<PathBuf>,
    /// Preferred banner font file.
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Product image.
    #[arg(long)]
    image: PathBuf,
    /// Narration audio.
    #[arg(long)]
    audio: PathBuf,
    /// Banner caption.
    #[arg(long, default_value = "")]
    caption: String,
    /// Output MP4 path; derived from the caption when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
    #[command(flatten)]
    overrides: Overrides,
}

#[derive(Args, Debug)]
struct FrameArgs {
    /// Product image.
    #[arg(long)]
    image: PathBuf,
    /// Banner caption.
    #[arg(long, default_value = "")]
    caption: String,
    /// Sample time in seconds.
    #[arg(long, default_value_t = 0.0)]
    t: f64,
    /// Clip duration in seconds; defaults to the configured maximum.
    #[arg(long)]
    duration: Option<f64>,
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
    #[command(flatten)]
    overrides: Overrides,
}

#[derive(Args, Debug)]
struct ProbeArgs {
    /// Narration audio.
    #[arg(long)]
    audio: PathBuf,
    #[command(flatten)]
    overrides: Overrides,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.cmd {
        Command::Render(args) => cmd_render(cli.config.as_deref(), args),
        Command::Frame(args) => cmd_frame(cli.config.as_deref(), args),
        Command::Probe(args) => cmd_probe(cli.config.as_deref(), args),
    }
}

fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .init(),
    }
}

fn load_config(path: Option<&Path>, overrides: Overrides) -> anyhow::Result<promo_reel::VideoConfig> {
    let mut cfg = match path {
        Some(p) => promo_reel::VideoConfig::from_path(p)
            .with_context(|| format!("load config '{}'", p.display()))?,
        None => promo_reel::VideoConfig::default(),
    };
    cfg.apply_env_overrides()
        .context("apply environment overrides")?;

    if let Some(v) = overrides.width {
        cfg.frame_width = v;
    }
    if let Some(v) = overrides.height {
        cfg.frame_height = v;
    }
    if let Some(v) = overrides.fps {
        cfg.fps = v;
    }
    if let Some(v) = overrides.max_duration {
        cfg.max_duration_seconds = v;
    }
    if let Some(v) = overrides.zoom_factor {
        cfg.zoom_factor = v;
    }
    if let Some(v) = overrides.temp_dir {
        cfg.temp_dir = v;
    }
    if let Some(v) = overrides.font {
        cfg.banner.font_path = Some(v);
    }
    Ok(cfg)
}

fn cmd_render(config: Option<&Path>, args: RenderArgs) -> anyhow::Result<()> {
    let cfg = load_config(config, args.overrides)?;
    let fps = u64::from(cfg.fps);
    let pipeline = promo_reel::ReelPipeline::new(cfg)?;

    let req = promo_reel::ReelRequest {
        image_path: args.image,
        audio_path: args.audio,
        caption: args.caption,
        output_path: args.out,
    };
    let video = pipeline.render_with_progress(&req, &mut |p| {
        if p.frame.is_multiple_of(fps) || p.frame == p.total_frames {
            tracing::info!(frame = p.frame, total = p.total_frames, "encoding");
        }
    })?;

    println!("{}", video.path.display());
    Ok(())
}

fn cmd_frame(config: Option<&Path>, args: FrameArgs) -> anyhow::Result<()> {
    let cfg = load_config(config, args.overrides)?;
    let duration = args.duration.unwrap_or(cfg.max_duration_seconds);
    let pipeline = promo_reel::ReelPipeline::new(cfg)?;

    let frame = pipeline.render_still(&args.image, &args.caption, args.t, duration)?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    frame
        .save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_probe(config: Option<&Path>, args: ProbeArgs) -> anyhow::Result<()> {
    let cfg = load_config(config, args.overrides)?;
    cfg.validate()?;

    let audio = promo_reel::NarrationAudio::probe(&args.audio)?;
    let duration = promo_reel::effective_duration(audio.duration_secs, cfg.max_duration_seconds)?;
    let timing = promo_reel::ClipTiming::new(duration, cfg.fps)?;

    println!("audio_duration_secs: {:.3}", audio.duration_secs);
    println!("effective_duration_secs: {:.3}", timing.duration_secs);
    println!("frames: {}", timing.frame_count);
    println!("visual_duration_secs: {:.3}", timing.visual_duration_secs());
    Ok(())
}
