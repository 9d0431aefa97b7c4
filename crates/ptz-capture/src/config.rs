//! 采集配置

use crate::frame::StreamId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 触发方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TriggerMode {
    /// 硬件同步：只对主相机发软触发，从相机由主相机的闪光输出触发
    HardwareSync { master: StreamId },
    /// 两路分别软触发
    Software,
}

impl Default for TriggerMode {
    fn default() -> Self {
        TriggerMode::HardwareSync {
            master: StreamId::Right,
        }
    }
}

impl TriggerMode {
    /// 该流在被触发时是否需要发出软触发
    pub fn fires(self, stream: StreamId) -> bool {
        match self {
            TriggerMode::HardwareSync { master } => master == stream,
            TriggerMode::Software => true,
        }
    }
}

/// 落盘图像格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageFormat {
    Jpeg { quality: u8 },
    Png,
}

impl Default for ImageFormat {
    fn default() -> Self {
        ImageFormat::Jpeg { quality: 90 }
    }
}

impl ImageFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg { .. } => "jpg",
            ImageFormat::Png => "png",
        }
    }
}

/// 采集配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// 单次取帧的最长等待（毫秒）
    pub fetch_timeout_ms: u64,
    /// 空闲时检查命令/退出标志的间隔（毫秒）
    pub poll_interval_ms: u64,
    pub trigger_mode: TriggerMode,
    pub image_format: ImageFormat,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: 10_000,
            poll_interval_ms: 100,
            trigger_mode: TriggerMode::default(),
            image_format: ImageFormat::default(),
        }
    }
}

impl CaptureConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
