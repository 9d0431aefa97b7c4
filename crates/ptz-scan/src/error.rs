//! 扫描层错误类型定义

use ptz_capture::CaptureError;
use ptz_driver::DriverError;
use thiserror::Error;

/// 扫描层错误类型
///
/// 单个位置的失败不会以错误形式返回（见 `ScanPosition`），
/// 这里只包含初始化、配置与手动操作的错误。
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error(
        "pair_timeout_ms ({pair_timeout_ms}) must exceed capture.fetch_timeout_ms ({fetch_timeout_ms})"
    )]
    PairTimeoutTooShort {
        pair_timeout_ms: u64,
        fetch_timeout_ms: u64,
    },

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
