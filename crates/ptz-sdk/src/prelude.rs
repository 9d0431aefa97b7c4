//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use ptz_sdk::prelude::*;
//! ```

// 协议与传输
pub use ptz_protocol::{Axis, Pose};
pub use ptz_serial::{Transport, TransportConfig};

// 驱动层
pub use ptz_driver::{
    Arrival, ArrivalPolicy, ClientConfig, MotionController, MountBuilder, MountClient,
    PoseVerifier, VerifierConfig,
};

// 采集层
pub use ptz_capture::{
    CaptureConfig, FramePair, ImageFormat, PairWriter, PixelFormat, SensorStream, StereoCapture,
    StreamId, SyntheticStream, TriggerMode,
};

// 扫描层
pub use ptz_scan::{
    CancelToken, CaptureOutcome, CapturePolicy, Corner, GridConfig, NoCapture, PairSource,
    ScanConfig, ScanEvent, ScanOrchestrator, ScanPosition, ScanSession, generate,
};

// 错误类型
pub use ptz_capture::CaptureError;
pub use ptz_driver::DriverError;
pub use ptz_protocol::ProtocolError;
pub use ptz_scan::ScanError;
pub use ptz_serial::TransportError;
