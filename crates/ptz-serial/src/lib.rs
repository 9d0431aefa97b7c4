//! # PTZ Transport Layer
//!
//! 云台字节传输抽象层，屏蔽具体串口实现。
//!
//! - [`Transport`]: 统一的读写接口（写入、带超时读取、清空缓冲区）
//! - [`SerialTransport`]: 基于 `serialport` 的真实串口（feature `serial`）
//! - [`mock`]: 脚本化的 Mock 传输与模拟云台（feature `mock`）
//!
//! 传输对象由协议客户端独占，只在编排线程中访问，因此接口是 `&mut self`，不需要内部加锁。

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[cfg(feature = "serial")]
pub mod serial;

#[cfg(feature = "serial")]
pub use serial::SerialTransport;

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "mock")]
pub use mock::{MockHandle, MockTransport, SimulatedMount};

/// 传输层统一错误类型
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Device Error: {0}")]
    Device(#[from] TransportDeviceError),
    #[error("Write timeout")]
    Timeout,
    #[error("Transport closed")]
    Closed,
}

/// 设备错误的结构化分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportDeviceErrorKind {
    Unknown,
    NotFound,
    AccessDenied,
    Busy,
    UnsupportedConfig,
    Backend,
}

/// 结构化设备错误
#[derive(Error, Debug, Clone)]
#[error("{kind:?}: {message}")]
pub struct TransportDeviceError {
    pub kind: TransportDeviceErrorKind,
    pub message: String,
}

impl TransportDeviceError {
    pub fn new(kind: TransportDeviceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// 是否为不可恢复错误（设备不存在、无权限）
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            TransportDeviceErrorKind::NotFound | TransportDeviceErrorKind::AccessDenied
        )
    }
}

impl From<String> for TransportDeviceError {
    fn from(message: String) -> Self {
        Self::new(TransportDeviceErrorKind::Unknown, message)
    }
}

impl From<&str> for TransportDeviceError {
    fn from(message: &str) -> Self {
        Self::new(TransportDeviceErrorKind::Unknown, message)
    }
}

/// 串口参数
///
/// 帧格式固定为 8-N-1，无流控。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// 串口名称（如 `/dev/ttyUSB0`、`COM4`）
    pub port: String,
    /// 波特率
    pub baud_rate: u32,
    /// 单次读取超时（毫秒）
    pub read_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            port: default_port().to_string(),
            baud_rate: 2400,
            read_timeout_ms: 1000,
        }
    }
}

impl TransportConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// 平台默认串口名
pub fn default_port() -> &'static str {
    if cfg!(windows) { "COM4" } else { "/dev/ttyUSB0" }
}

/// 字节传输接口
///
/// # 语义
///
/// - `read` 在读取超时内没有数据时返回 `Ok(0)`，而不是错误；
///   由上层决定"无响应"与"响应格式错误"的区分。
/// - `clear` 丢弃输入/输出缓冲区中的残留字节，避免上一条命令的应答被误读。
pub trait Transport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    fn clear(&mut self) -> Result<(), TransportError>;

    fn set_read_timeout(&mut self, _timeout: Duration) -> Result<(), TransportError> {
        Ok(())
    }

    /// 读取直到缓冲区填满或超时，返回读取字节数
    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..])? {
                0 => break,
                n => filled += n,
            }
        }
        Ok(filled)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write(bytes)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        (**self).read(buf)
    }

    fn clear(&mut self) -> Result<(), TransportError> {
        (**self).clear()
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), TransportError> {
        (**self).set_read_timeout(timeout)
    }
}
