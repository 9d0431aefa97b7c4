//! PTZ SDK - 云台双目标定采集
//!
//! 驱动串口云台按网格扫描，并在每个位置触发双目同步采集。
//!
//! # 架构设计
//!
//! 从底层到高层：
//!
//! - **协议层** (`protocol`): 命令/应答帧、校验和、角度编码
//! - **传输层** (`transport`): 串口抽象、Mock 与模拟云台
//! - **驱动层** (`driver`): 协议客户端、到位确认、运动控制
//! - **采集层** (`capture`): 采集线程、帧配对、落盘
//! - **扫描层** (`scan`): 网格生成、扫描编排、进度事件
//!
//! # 快速开始
//!
//! ```rust
//! use ptz_sdk::prelude::*;
//!
//! let poses = generate(&GridConfig::default());
//! assert_eq!(poses.len(), 81);
//! ```

pub use ptz_capture as capture;
pub use ptz_driver as driver;
pub use ptz_protocol as protocol;
pub use ptz_scan as scan;
pub use ptz_serial as transport;

pub mod logging;
pub mod prelude;

// 协议层
pub use ptz_protocol::{Axis, Pose, ProtocolError};

// 传输层
pub use ptz_serial::{Transport, TransportConfig, TransportError};

// 驱动层
pub use ptz_driver::{
    Arrival, ArrivalPolicy, DriverError, MotionController, MountBuilder, MountClient,
    VerifierConfig,
};

// 采集层
pub use ptz_capture::{CaptureConfig, CaptureError, FramePair, StereoCapture};

// 扫描层
pub use ptz_scan::{ScanConfig, ScanError, ScanOrchestrator, ScanPosition, ScanSession};

pub use logging::init_logging;
