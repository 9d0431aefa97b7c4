//! 扫描集成测试：模拟云台 + 合成双目流

use crossbeam_channel::unbounded;
use ptz_capture::{CaptureConfig, ImageFormat, PairWriter, PixelFormat, StereoCapture, SyntheticStream};
use ptz_driver::{ArrivalPolicy, ClientConfig, MountClient, VerifierConfig};
use ptz_scan::{
    CaptureOutcome, CapturePolicy, GridConfig, ScanConfig, ScanEvent, ScanOrchestrator,
};
use ptz_serial::{MockTransport, SimulatedMount};

fn scan_config(output_dir: &std::path::Path) -> ScanConfig {
    ScanConfig {
        grid: GridConfig {
            h_count: 2,
            v_count: 2,
            ..Default::default()
        },
        verifier: VerifierConfig {
            settle_delay_ms: 0,
            inter_axis_delay_ms: 0,
            retry_interval_ms: 1,
            timeout_ms: 100,
            ..Default::default()
        },
        capture: CaptureConfig {
            fetch_timeout_ms: 500,
            poll_interval_ms: 5,
            ..Default::default()
        },
        post_move_delay_ms: 0,
        pair_timeout_ms: 1_000,
        output_dir: output_dir.to_path_buf(),
        ..Default::default()
    }
}

fn client(mount: &SimulatedMount) -> MountClient<MockTransport> {
    let (transport, _handle) = mount.transport();
    MountClient::with_config(
        transport,
        ClientConfig {
            command_delay_ms: 0,
            response_delay_ms: 0,
            ..Default::default()
        },
    )
}

fn stereo(config: &ScanConfig, persist: bool) -> (StereoCapture, ptz_capture::SyntheticControl) {
    let (left, right) = SyntheticStream::synced_pair(8, 6, PixelFormat::Rgb8Planar);
    let left_control = left.control();
    let writer = persist.then(|| PairWriter::new(&config.output_dir, config.capture.image_format));
    let capture = StereoCapture::new(left, right, config.capture.clone(), writer).unwrap();
    (capture, left_control)
}

#[test]
fn test_full_scan_saves_one_pair_per_position() {
    let dir = tempfile::tempdir().unwrap();
    let config = scan_config(dir.path());
    let (capture, _) = stereo(&config, true);
    let mount = SimulatedMount::new();
    let (tx, rx) = unbounded();

    let mut orchestrator = ScanOrchestrator::new(client(&mount), capture, config).with_events(tx);
    let session = orchestrator.run();

    assert_eq!(session.positions().len(), 4);
    let trigger_ids: Vec<Option<u64>> = session
        .positions()
        .iter()
        .map(|p| p.capture.trigger_id())
        .collect();
    assert_eq!(trigger_ids, vec![Some(1), Some(2), Some(3), Some(4)]);
    assert!(session.positions().iter().all(|p| p.reached && p.capture.is_paired()));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 8);

    let saved = rx
        .try_iter()
        .filter(|e| matches!(e, ScanEvent::PairSaved { .. }))
        .count();
    assert_eq!(saved, 4);
}

#[test]
fn test_pair_timeout_does_not_stop_scan() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = scan_config(dir.path());
    config.capture.fetch_timeout_ms = 200;
    config.pair_timeout_ms = 300;
    let (capture, left_control) = stereo(&config, false);
    left_control.fail_next_fetches(1);
    let mount = SimulatedMount::new();

    let mut orchestrator = ScanOrchestrator::new(client(&mount), capture, config);
    let session = orchestrator.run();

    let outcomes: Vec<&CaptureOutcome> = session.positions().iter().map(|p| &p.capture).collect();
    assert_eq!(outcomes[0], &CaptureOutcome::PairTimeout { trigger_id: 1 });
    for (i, outcome) in outcomes.iter().enumerate().skip(1) {
        assert_eq!(outcome.trigger_id(), Some(i as u64 + 1));
        assert!(outcome.is_paired(), "position {} should pair", i + 1);
    }
}

#[test]
fn test_capture_policy_controls_unreached_positions() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = scan_config(dir.path());
    config.grid.h_count = 1;
    config.grid.v_count = 1;
    config.verifier.policy = ArrivalPolicy::WithinTolerance;
    config.verifier.timeout_ms = 20;
    let mount = SimulatedMount::new().with_offset(3.0, 0.0);

    // 尽力而为：未到位仍然采集
    let (capture, _) = stereo(&config, false);
    let mut orchestrator = ScanOrchestrator::new(client(&mount), capture, config.clone());
    let session = orchestrator.run();
    assert!(!session.positions()[0].reached);
    assert!(session.positions()[0].capture.is_paired());

    // 严格：未到位跳过采集
    config.capture_policy = CapturePolicy::OnlyWhenReached;
    let (capture, _) = stereo(&config, false);
    let mut orchestrator = ScanOrchestrator::new(client(&mount), capture, config);
    let session = orchestrator.run();
    assert_eq!(session.positions()[0].capture, CaptureOutcome::Skipped);
    assert_eq!(session.trigger_count(), 0);
}

#[test]
fn test_exposure_and_gain_applied_before_scan() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = scan_config(dir.path());
    config.grid.h_count = 1;
    config.grid.v_count = 1;
    config.exposure_us = Some(150_000.0);
    config.capture.image_format = ImageFormat::Png;
    let (capture, left_control) = stereo(&config, false);
    let mount = SimulatedMount::new();

    let mut orchestrator = ScanOrchestrator::new(client(&mount), capture, config);
    orchestrator.run();

    assert_eq!(left_control.exposure_us(), Some(150_000.0));
    assert_eq!(left_control.gain_db(), Some(5.0));
}

#[test]
fn test_cancel_from_another_thread() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = scan_config(dir.path());
    config.grid.h_count = 5;
    config.grid.v_count = 5;
    let (capture, _) = stereo(&config, false);
    let mount = SimulatedMount::new();
    let (tx, rx) = unbounded();

    let mut orchestrator = ScanOrchestrator::new(client(&mount), capture, config).with_events(tx);
    let cancel = orchestrator.cancel_token();
    let watcher = std::thread::spawn(move || {
        for event in rx.iter() {
            if let ScanEvent::PositionRecorded(position) = event
                && position.index == 3
            {
                cancel.cancel();
            }
        }
    });

    let session = orchestrator.run();
    drop(orchestrator);
    watcher.join().unwrap();

    assert!(session.is_cancelled());
    let recorded = session.positions().len();
    assert!((3..25).contains(&recorded), "recorded {}", recorded);
    assert_eq!(mount.move_count(), recorded * 2);
}
