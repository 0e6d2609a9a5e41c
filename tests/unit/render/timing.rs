use super::*;

#[test]
fn long_narration_is_capped_at_max_duration() {
    assert_eq!(effective_duration(20.0, 15.0).unwrap(), 15.0);
}

#[test]
fn short_narration_sets_the_duration() {
    assert_eq!(effective_duration(10.0, 15.0).unwrap(), 10.0);
}

#[test]
fn non_positive_narration_is_invalid() {
    for secs in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let err = effective_duration(secs, 15.0).unwrap_err();
        assert!(matches!(err, ReelError::InvalidDuration(_)), "{secs}: {err}");
    }
}

#[test]
fn non_positive_max_is_invalid() {
    let err = effective_duration(10.0, 0.0).unwrap_err();
    assert!(matches!(err, ReelError::InvalidDuration(_)));
}

#[test]
fn frame_count_floors_duration_times_fps() {
    assert_eq!(ClipTiming::new(15.0, 30).unwrap().frame_count, 450);
    assert_eq!(ClipTiming::new(12.0, 30).unwrap().frame_count, 360);
    assert_eq!(ClipTiming::new(1.99, 30).unwrap().frame_count, 59);
}

#[test]
fn frame_count_tolerates_float_error() {
    // 0.1 * 30 is 2.9999999999999996 in f64.
    assert_eq!(ClipTiming::new(0.1, 30).unwrap().frame_count, 3);
}

#[test]
fn sub_frame_duration_is_invalid() {
    let err = ClipTiming::new(0.01, 30).unwrap_err();
    assert!(matches!(err, ReelError::InvalidDuration(_)), "{err}");
}

#[test]
fn zero_fps_is_a_validation_error() {
    assert!(matches!(
        ClipTiming::new(1.0, 0).unwrap_err(),
        ReelError::Validation(_)
    ));
}

#[test]
fn frames_cover_zero_to_frame_count() {
    let t = ClipTiming::new(2.0, 5).unwrap();
    let frames: Vec<u64> = t.frames().iter().map(|f| f.0).collect();
    assert_eq!(frames, (0..10).collect::<Vec<_>>());
    assert_eq!(t.time_of(FrameIndex(5)), 1.0);
}

#[test]
fn visual_duration_is_whole_frames() {
    let t = ClipTiming::new(1.99, 30).unwrap();
    assert!((t.visual_duration_secs() - 59.0 / 30.0).abs() < 1e-12);
    assert!(t.visual_duration_secs() <= t.duration_secs);
}
