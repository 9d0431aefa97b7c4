//! # PTZ Protocol
//!
//! 云台串口协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `types`: 轴与位姿（`Axis`、`Pose`）
//! - `codec`: 角度 ↔ 协议值编解码
//! - `frame`: 命令帧构建、响应帧解析、校验和
//!
//! ## 帧格式
//!
//! ```text
//! byte:   0      1        2         3        4      5      6
//!       +------+--------+---------+--------+------+------+----------+
//!       | 0xFF | 地址   | 保留(0) | 操作码 | MSB  | LSB  | 校验和   |
//!       +------+--------+---------+--------+------+------+----------+
//! checksum = sum(byte[1..=5]) mod 256
//! ```
//!
//! ## 字节序
//!
//! 协议值使用大端字节序（MSB 在前）。

pub mod codec;
pub mod frame;
pub mod types;

// 重新导出常用类型
pub use codec::{decode_degrees, encode_degrees};
pub use frame::{
    CommandFrame, FRAME_HEADER, FRAME_LEN, Opcode, RESPONSE_LEN, ResponseFrame, checksum,
};
pub use types::{Axis, Pose};

use thiserror::Error;

/// 协议层错误类型
///
/// 所有变体都在任何字节写入串口之前（编码）或读取完成之后（解析）产生，
/// 与传输层错误严格区分。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// 角度超出轴的合法范围（发送前拒绝）
    #[error("{axis} angle {degrees}° out of range [{min}, {max}]")]
    OutOfRange {
        axis: Axis,
        degrees: f64,
        min: f64,
        max: f64,
    },

    /// 响应长度不符
    #[error("Malformed response: expected {expected} bytes, got {actual}")]
    MalformedResponse { expected: usize, actual: usize },

    /// 响应帧头不符
    #[error("Invalid response header: expected 0x{expected:02X}, got 0x{actual:02X}")]
    InvalidHeader { expected: u8, actual: u8 },

    /// 未知操作码
    #[error("Unknown opcode: 0x{0:02X}")]
    UnknownOpcode(u8),

    /// 预置位编号超出范围
    #[error("Preset {0} out of range [1, 128]")]
    InvalidPreset(u8),
}

/// 大端字节序转 u16
pub fn bytes_to_u16_be(bytes: [u8; 2]) -> u16 {
    u16::from_be_bytes(bytes)
}

/// u16 转大端字节序
pub fn u16_to_bytes_be(value: u16) -> [u8; 2] {
    value.to_be_bytes()
}
