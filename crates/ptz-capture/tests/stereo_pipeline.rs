//! 双目采集流水线集成测试（合成图像流）

use ptz_capture::{
    CaptureConfig, CaptureError, ImageFormat, PairWriter, PixelFormat, StereoCapture,
    SyntheticStream, TriggerMode,
};
use std::time::Duration;

fn fast_config(trigger_mode: TriggerMode) -> CaptureConfig {
    CaptureConfig {
        fetch_timeout_ms: 500,
        poll_interval_ms: 5,
        trigger_mode,
        image_format: ImageFormat::Jpeg { quality: 90 },
    }
}

#[test]
fn test_pairs_are_persisted_with_shared_stem() {
    let dir = tempfile::tempdir().unwrap();
    let (left, right) = SyntheticStream::synced_pair(16, 12, PixelFormat::Rgb8Planar);
    let config = fast_config(TriggerMode::default());
    let writer = PairWriter::new(dir.path(), config.image_format);
    let capture = StereoCapture::new(left, right, config, Some(writer)).unwrap();

    let mut stems = Vec::new();
    for id in 1..=3 {
        let pair = capture.capture(id, Duration::from_secs(2)).unwrap();
        let files = pair.files.expect("pair should be persisted");
        let left_name = files.left.file_name().unwrap().to_string_lossy().into_owned();
        let right_name = files.right.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(left_name, format!("A_{}.jpg", files.stem));
        assert_eq!(right_name, format!("D_{}.jpg", files.stem));
        stems.push(files.stem);
    }

    assert!(stems.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 6);
}

#[test]
fn test_late_frame_never_pairs_with_next_trigger() {
    let left = SyntheticStream::new("left", 4, 4, PixelFormat::Rgb8);
    let right = SyntheticStream::new("right", 4, 4, PixelFormat::Rgb8);
    left.control().set_latency(Duration::from_millis(150));
    let capture = StereoCapture::new(left, right, fast_config(TriggerMode::Software), None).unwrap();

    // 左路出图慢于配对超时
    let first = capture.capture(1, Duration::from_millis(50));
    assert!(matches!(first, Err(CaptureError::PairTimeout { trigger_id: 1 })));

    // 左路仍在处理触发 1，本次只有右路被触发
    assert!(!capture.begin(2));
    let second = capture.await_pair(2, Duration::from_millis(300));
    assert!(matches!(second, Err(CaptureError::PairTimeout { trigger_id: 2 })));
    assert_eq!(capture.stats().stale_discarded, 1);
    assert_eq!(capture.stats().completed, 0);

    // 恢复后正常配对
    let third = capture.capture(3, Duration::from_secs(2)).unwrap();
    assert_eq!(third.left.trigger_id, 3);
    assert_eq!(third.right.trigger_id, 3);
}
