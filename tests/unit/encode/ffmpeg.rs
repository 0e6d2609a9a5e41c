use super::*;
use crate::encode::sink::AudioInputConfig;

fn cfg_with_audio() -> SinkConfig {
    SinkConfig {
        width: 1080,
        height: 1920,
        fps: 30,
        duration_secs: 12.0,
        audio: Some(AudioInputConfig {
            path: PathBuf::from("/tmp/voice.mp3"),
        }),
    }
}

fn args_of(opts: &FfmpegSinkOpts, cfg: &SinkConfig) -> Vec<String> {
    build_ffmpeg_args(opts, cfg)
        .unwrap()
        .into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

fn value_after(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1).cloned())
}

#[test]
fn default_args_select_high_profile_h264_and_aac() {
    let args = args_of(&FfmpegSinkOpts::new("/out/clip.mp4.partial"), &cfg_with_audio());
    assert_eq!(value_after(&args, "-c:v").as_deref(), Some("libx264"));
    assert_eq!(value_after(&args, "-profile:v").as_deref(), Some("high"));
    assert_eq!(value_after(&args, "-level").as_deref(), Some("4.0"));
    assert_eq!(value_after(&args, "-preset").as_deref(), Some("medium"));
    assert_eq!(value_after(&args, "-c:a").as_deref(), Some("aac"));
    assert_eq!(value_after(&args, "-movflags").as_deref(), Some("+faststart"));
    assert_eq!(value_after(&args, "-t").as_deref(), Some("12.000000"));
    assert_eq!(value_after(&args, "-loglevel").as_deref(), Some("error"));
    assert!(!args.iter().any(|a| a == "-crf" || a == "-b:a"));
}

#[test]
fn raw_input_describes_rgb24_frames() {
    let args = args_of(&FfmpegSinkOpts::new("out.mp4"), &cfg_with_audio());
    let input = args.iter().position(|a| a == "pipe:0").unwrap();
    let head = &args[..input];
    assert_eq!(value_after(head, "-pix_fmt").as_deref(), Some("rgb24"));
    assert_eq!(value_after(head, "-s").as_deref(), Some("1080x1920"));
    assert_eq!(value_after(head, "-r").as_deref(), Some("30"));
    // Output pixel format comes after the inputs.
    assert_eq!(value_after(&args[input..], "-pix_fmt").as_deref(), Some("yuv420p"));
}

#[test]
fn audio_is_second_input_and_mapped() {
    let args = args_of(&FfmpegSinkOpts::new("out.mp4"), &cfg_with_audio());
    let inputs: Vec<&String> = args
        .iter()
        .enumerate()
        .filter(|(i, _)| *i > 0 && args[i - 1] == "-i")
        .map(|(_, a)| a)
        .collect();
    assert_eq!(inputs, vec!["pipe:0", "/tmp/voice.mp3"]);
    let joined = args.join(" ");
    assert!(joined.contains("-map 0:v:0 -map 1:a:0"), "{joined}");
}

#[test]
fn output_path_is_last_and_container_is_forced() {
    let args = args_of(&FfmpegSinkOpts::new("/out/clip.mp4.partial"), &cfg_with_audio());
    assert_eq!(args.last().map(String::as_str), Some("/out/clip.mp4.partial"));
    assert_eq!(args[args.len() - 3..args.len() - 1], ["-f", "mp4"]);
}

#[test]
fn optional_quality_settings_are_passed_through() {
    let mut opts = FfmpegSinkOpts::new("out.mp4");
    opts.encode.crf = Some(20);
    opts.encode.audio_bitrate = Some("128k".to_string());
    opts.encode.faststart = false;
    opts.overwrite = false;
    opts.log_level = EncoderLogLevel::Info;
    let args = args_of(&opts, &cfg_with_audio());
    assert_eq!(args[0], "-n");
    assert_eq!(value_after(&args, "-crf").as_deref(), Some("20"));
    assert_eq!(value_after(&args, "-b:a").as_deref(), Some("128k"));
    assert_eq!(value_after(&args, "-loglevel").as_deref(), Some("info"));
    assert!(!args.iter().any(|a| a == "-movflags"));
}

#[test]
fn silent_video_disables_audio() {
    let mut cfg = cfg_with_audio();
    cfg.audio = None;
    let args = args_of(&FfmpegSinkOpts::new("out.mp4"), &cfg);
    assert!(args.iter().any(|a| a == "-an"));
    assert!(!args.iter().any(|a| a == "-map" || a == "-c:a"));
}

#[test]
fn odd_or_empty_sizes_are_rejected() {
    let opts = FfmpegSinkOpts::new("out.mp4");
    for (w, h) in [(1081, 1920), (1080, 1919), (0, 1920)] {
        let mut cfg = cfg_with_audio();
        cfg.width = w;
        cfg.height = h;
        assert!(matches!(
            build_ffmpeg_args(&opts, &cfg),
            Err(ReelError::Validation(_))
        ));
    }
}

#[test]
fn non_positive_duration_is_rejected() {
    let mut cfg = cfg_with_audio();
    cfg.duration_secs = 0.0;
    assert!(matches!(
        build_ffmpeg_args(&FfmpegSinkOpts::new("out.mp4"), &cfg),
        Err(ReelError::InvalidDuration(_))
    ));
}

#[test]
fn push_before_begin_is_rejected() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("target/never-written.mp4"));
    let err = sink.push_frame(FrameIndex(0), &RgbImage::new(2, 2)).unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
    assert!(sink.end().is_err());
}

#[test]
fn ensure_parent_dir_creates_missing_directories() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("target/unit-ensure-parent");
    let _ = std::fs::remove_dir_all(&root);
    let dir = root.join("a/b");
    ensure_parent_dir(&dir.join("clip.mp4")).unwrap();
    assert!(dir.is_dir());
    ensure_parent_dir(Path::new("bare.mp4")).unwrap();
}

#[test]
fn out_of_order_frames_are_rejected() {
    if !is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg not on PATH");
        return;
    }
    let out = Path::new(env!("CARGO_MANIFEST_DIR")).join("target/unit-ffmpeg/out_of_order.mp4");
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&out));
    sink.begin(SinkConfig {
        width: 16,
        height: 16,
        fps: 10,
        duration_secs: 0.3,
        audio: None,
    })
    .unwrap();
    let frame = RgbImage::new(16, 16);
    sink.push_frame(FrameIndex(1), &frame).unwrap();
    assert!(sink.push_frame(FrameIndex(1), &frame).is_err());
    assert!(sink.push_frame(FrameIndex(0), &frame).is_err());
    assert!(sink.push_frame(FrameIndex(2), &RgbImage::new(8, 8)).is_err());
    // Dropped without `end`: the child is killed and reaped.
}
