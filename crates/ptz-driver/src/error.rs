//! 驱动层错误类型定义

use ptz_protocol::{Axis, ProtocolError};
use ptz_serial::TransportError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 协议错误（越界、响应格式错误等）
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 传输层错误
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// 在读取超时内没有收到任何字节
    ///
    /// 与 `Protocol(MalformedResponse)` 区分："云台不可达" vs "云台应答了错误内容"。
    #[error("No response to {axis} query")]
    NoResponse { axis: Axis },
}

impl DriverError {
    /// 是否为输入越界（未发送任何字节）
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, DriverError::Protocol(ProtocolError::OutOfRange { .. }))
    }

    /// 是否为响应格式错误
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            DriverError::Protocol(
                ProtocolError::MalformedResponse { .. } | ProtocolError::InvalidHeader { .. }
            )
        )
    }
}
