use super::*;

#[test]
fn missing_audio_is_not_found() {
    let err = probe_audio_duration(Path::new("target/no/such/voice.mp3")).unwrap_err();
    assert!(matches!(err, ReelError::NotFound { what: "audio", .. }));
}

#[test]
fn with_duration_keeps_caller_value() {
    let a = NarrationAudio::with_duration("voice.mp3", 12.5);
    assert_eq!(a.path, PathBuf::from("voice.mp3"));
    assert_eq!(a.duration_secs, 12.5);
}

#[test]
fn parse_seconds_rejects_garbage() {
    assert_eq!(parse_seconds(" 12.040000 "), Some(12.04));
    assert_eq!(parse_seconds("N/A"), None);
    assert_eq!(parse_seconds("inf"), None);
}

// Probing real files shells out to `ffprobe`; that path is covered by `tests/render_mp4.rs`.
