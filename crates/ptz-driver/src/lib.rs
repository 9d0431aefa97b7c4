//! # PTZ Driver
//!
//! 云台驱动层：
//!
//! - [`MountClient`]: 协议客户端（设置轴、查询轴、取消运动、预置位）
//! - [`PoseVerifier`]: 运动后的到位确认
//! - [`MotionController`]: 组合两者，提供"移动并确认"
//! - [`MountBuilder`]: 打开串口并构造控制器
//!
//! 所有操作都在调用线程中同步执行；传输由客户端独占。

mod builder;
pub mod client;
pub mod controller;
mod error;
pub mod verifier;

pub use builder::MountBuilder;
pub use client::{ClientConfig, MountClient};
pub use controller::MotionController;
pub use error::DriverError;
pub use verifier::{Arrival, ArrivalPolicy, PoseVerifier, VerifierConfig};

pub use ptz_protocol::{Axis, Pose};
