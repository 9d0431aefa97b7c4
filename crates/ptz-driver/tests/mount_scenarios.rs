//! 云台驱动端到端场景测试（模拟云台）

use ptz_driver::{
    ArrivalPolicy, ClientConfig, DriverError, MountBuilder, MountClient, Pose, VerifierConfig,
};
use ptz_protocol::{Axis, ProtocolError};
use ptz_serial::{MockTransport, SimulatedMount};

fn no_delay() -> ClientConfig {
    ClientConfig {
        address: 1,
        command_delay_ms: 0,
        response_delay_ms: 0,
    }
}

#[test]
fn test_out_of_range_pan_sends_nothing() {
    let (transport, handle) = MockTransport::new();
    let mut client = MountClient::with_config(transport, no_delay());

    let result = client.set_axis(Axis::Pan, 400.0);
    assert!(matches!(
        result,
        Err(DriverError::Protocol(ProtocolError::OutOfRange { .. }))
    ));
    assert!(handle.writes().is_empty());
}

#[test]
fn test_malformed_and_silent_responses_are_distinct() {
    let (transport, handle) = MockTransport::new();
    let mut client = MountClient::with_config(transport, no_delay());

    handle.queue_reply(vec![0xFF, 0x01, 0x00, 0x59, 0x00]);
    let malformed = client.query_axis(Axis::Pan).unwrap_err();
    assert!(malformed.is_malformed());

    handle.queue_reply(Vec::new());
    let silent = client.query_axis(Axis::Pan).unwrap_err();
    assert!(matches!(silent, DriverError::NoResponse { axis: Axis::Pan }));
}

#[test]
fn test_raster_of_moves_with_simulated_mount() {
    let mount = SimulatedMount::new().with_unanswered_queries(2);
    let mut controller = MountBuilder::new()
        .client_config(no_delay())
        .verifier_config(VerifierConfig {
            settle_delay_ms: 0,
            inter_axis_delay_ms: 0,
            retry_interval_ms: 1,
            timeout_ms: 500,
            tolerance_deg: 0.5,
            policy: ArrivalPolicy::WithinTolerance,
        })
        .build_with(mount.transport().0);

    for pose in [
        Pose::new(60.0, 10.0),
        Pose::new(120.0, 10.0),
        Pose::new(60.0, 50.0),
        Pose::new(120.0, 50.0),
    ] {
        let arrival = controller.move_to(pose).unwrap();
        assert!(arrival.reached, "did not reach {}", pose);
        assert_eq!(mount.pose(), pose);
    }
    assert_eq!(mount.move_count(), 8);
}
