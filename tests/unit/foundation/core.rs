use super::*;

#[test]
fn frame_range_rejects_inverted_bounds() {
    assert!(FrameRange::new(FrameIndex(3), FrameIndex(2)).is_err());
    let r = FrameRange::new(FrameIndex(2), FrameIndex(2)).unwrap();
    assert!(r.is_empty());
    assert_eq!(r.len_frames(), 0);
}

#[test]
fn frame_range_iterates_in_order() {
    let r = FrameRange::new(FrameIndex(1), FrameIndex(4)).unwrap();
    let got: Vec<u64> = r.iter().map(|f| f.0).collect();
    assert_eq!(got, vec![1, 2, 3]);
    assert_eq!(r.len_frames(), 3);
}

#[test]
fn frame_index_to_secs_uses_fps() {
    assert_eq!(FrameIndex(0).to_secs(30), 0.0);
    assert_eq!(FrameIndex(45).to_secs(30), 1.5);
}

#[test]
fn canvas_aspect_is_width_over_height() {
    let c = Canvas {
        width: 1080,
        height: 1920,
    };
    assert!((c.aspect() - 0.5625).abs() < 1e-12);
}
