//! # PTZ Capture
//!
//! 双目同步采集：
//!
//! - [`SensorStream`]: 一路硬件图像流（取帧、软触发、曝光/增益）
//! - [`CaptureWorker`]: 每路一个采集线程，触发后取帧并转换为交错 RGB
//! - [`FramePairer`]: 按触发编号配对两路帧，丢弃迟到帧
//! - [`PairWriter`]: 帧对落盘（`A_<stem>` / `D_<stem>`）
//! - [`StereoCapture`]: 组合以上组件
//! - [`SyntheticStream`]: 无硬件时的合成图像流
//!
//! 帧在线程之间通过移动传递，从不共享可变缓冲区。

pub mod config;
mod error;
pub mod frame;
pub mod pairer;
pub mod stereo;
pub mod stream;
pub mod synthetic;
pub mod worker;
pub mod writer;

pub use config::{CaptureConfig, ImageFormat, TriggerMode};
pub use error::CaptureError;
pub use frame::{Frame, FramePair, PairFiles, PixelFormat, RawSensorBuffer, StreamId};
pub use pairer::{FramePairer, PairerStats};
pub use stereo::StereoCapture;
pub use stream::SensorStream;
pub use synthetic::{SyntheticControl, SyntheticStream};
pub use worker::{CaptureWorker, FrameSink};
pub use writer::PairWriter;
