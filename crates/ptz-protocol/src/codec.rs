//! 角度编解码
//!
//! 协议值 = `trunc(degrees * 100)`，以 u16 大端传输；解码为 `value / 100.0`。

use crate::{Axis, ProtocolError};

/// 角度 → 协议值（截断到 0.01°）
///
/// 越界（含 NaN）返回 [`ProtocolError::OutOfRange`]。
pub fn encode_degrees(axis: Axis, degrees: f64) -> Result<u16, ProtocolError> {
    if !axis.contains(degrees) {
        let (min, max) = axis.range();
        return Err(ProtocolError::OutOfRange {
            axis,
            degrees,
            min,
            max,
        });
    }
    // 范围已检查：最大 35900，不会溢出 u16
    Ok((degrees * 100.0) as u16)
}

/// 协议值 → 角度
pub fn decode_degrees(value: u16) -> f64 {
    f64::from(value) / 100.0
}
