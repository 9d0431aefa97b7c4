//! 命令帧 / 响应帧
//!
//! 命令帧构造后即不可变：校验和在构造时计算，字段不对外可变。

use crate::codec::{decode_degrees, encode_degrees};
use crate::{Axis, ProtocolError, bytes_to_u16_be, u16_to_bytes_be};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// 帧头（同步字节）
pub const FRAME_HEADER: u8 = 0xFF;

/// 命令帧长度
pub const FRAME_LEN: usize = 7;

/// 位置查询响应长度
pub const RESPONSE_LEN: usize = 7;

/// 操作码
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Opcode {
    /// 调用预置位
    GotoPreset = 0x07,
    /// 设置水平绝对角度
    SetPan = 0x4B,
    /// 设置俯仰绝对角度
    SetTilt = 0x4D,
    /// 查询水平角度
    QueryPan = 0x51,
    /// 查询俯仰角度
    QueryTilt = 0x53,
    /// 水平角度应答
    PanResponse = 0x59,
    /// 俯仰角度应答
    TiltResponse = 0x5B,
    /// 取消当前运动
    Cancel = 0x80,
}

impl Opcode {
    pub const fn set_for(axis: Axis) -> Self {
        match axis {
            Axis::Pan => Opcode::SetPan,
            Axis::Tilt => Opcode::SetTilt,
        }
    }

    pub const fn query_for(axis: Axis) -> Self {
        match axis {
            Axis::Pan => Opcode::QueryPan,
            Axis::Tilt => Opcode::QueryTilt,
        }
    }

    pub const fn response_for(axis: Axis) -> Self {
        match axis {
            Axis::Pan => Opcode::PanResponse,
            Axis::Tilt => Opcode::TiltResponse,
        }
    }
}

/// 校验和：`sum(bytes[1..6]) mod 256`（不含帧头与校验字节本身）
///
/// `bytes` 至少需要 6 字节，多余字节忽略。
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .take(6)
        .skip(1)
        .fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// 云台命令帧（7 字节）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame {
    address: u8,
    reserved: u8,
    opcode: Opcode,
    data: [u8; 2],
    checksum: u8,
}

impl CommandFrame {
    /// 通用构造器（计算校验和）
    pub fn new(address: u8, opcode: Opcode, data: [u8; 2]) -> Self {
        let mut frame = Self {
            address,
            reserved: 0x00,
            opcode,
            data,
            checksum: 0,
        };
        frame.checksum = checksum(&frame.to_bytes());
        frame
    }

    /// 绝对位置命令
    ///
    /// # 错误
    /// - `ProtocolError::OutOfRange`: 角度越界（不会构造出帧）
    pub fn set_position(address: u8, axis: Axis, degrees: f64) -> Result<Self, ProtocolError> {
        let value = encode_degrees(axis, degrees)?;
        Ok(Self::new(address, Opcode::set_for(axis), u16_to_bytes_be(value)))
    }

    /// 位置查询命令
    pub fn query_position(address: u8, axis: Axis) -> Self {
        Self::new(address, Opcode::query_for(axis), [0x00, 0x00])
    }

    /// 调用预置位（1-128）
    pub fn goto_preset(address: u8, preset: u8) -> Result<Self, ProtocolError> {
        if !(1..=128).contains(&preset) {
            return Err(ProtocolError::InvalidPreset(preset));
        }
        Ok(Self::new(address, Opcode::GotoPreset, [0x00, preset]))
    }

    /// 取消运动
    pub fn cancel(address: u8) -> Self {
        Self::new(address, Opcode::Cancel, [0x00, 0x00])
    }

    /// 从原始字节解析（模拟设备端使用）
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() != FRAME_LEN {
            return Err(ProtocolError::MalformedResponse {
                expected: FRAME_LEN,
                actual: bytes.len(),
            });
        }
        if bytes[0] != FRAME_HEADER {
            return Err(ProtocolError::InvalidHeader {
                expected: FRAME_HEADER,
                actual: bytes[0],
            });
        }
        let opcode = Opcode::try_from(bytes[3]).map_err(|e| ProtocolError::UnknownOpcode(e.number))?;
        Ok(Self {
            address: bytes[1],
            reserved: bytes[2],
            opcode,
            data: [bytes[4], bytes[5]],
            checksum: bytes[6],
        })
    }

    /// 序列化为线上字节
    pub fn to_bytes(&self) -> [u8; FRAME_LEN] {
        [
            FRAME_HEADER,
            self.address,
            self.reserved,
            self.opcode.into(),
            self.data[0],
            self.data[1],
            self.checksum,
        ]
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn data(&self) -> [u8; 2] {
        self.data
    }

    /// 数据字段的大端值
    pub fn value(&self) -> u16 {
        bytes_to_u16_be(self.data)
    }

    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// 校验和是否与内容一致
    pub fn is_valid(&self) -> bool {
        self.checksum == checksum(&self.to_bytes())
    }
}

/// 位置查询响应帧
///
/// 只接受精确 7 字节、以 `0xFF` 开头的响应；位置值位于 `[4, 5]`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseFrame {
    raw: [u8; RESPONSE_LEN],
}

impl ResponseFrame {
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let raw: [u8; RESPONSE_LEN] =
            bytes
                .try_into()
                .map_err(|_| ProtocolError::MalformedResponse {
                    expected: RESPONSE_LEN,
                    actual: bytes.len(),
                })?;
        if raw[0] != FRAME_HEADER {
            return Err(ProtocolError::InvalidHeader {
                expected: FRAME_HEADER,
                actual: raw[0],
            });
        }
        Ok(Self { raw })
    }

    /// 构造位置应答（模拟设备端使用）
    pub fn position(address: u8, axis: Axis, value: u16) -> Self {
        let [msb, lsb] = u16_to_bytes_be(value);
        let mut raw = [
            FRAME_HEADER,
            address,
            0x00,
            Opcode::response_for(axis).into(),
            msb,
            lsb,
            0,
        ];
        raw[6] = checksum(&raw);
        Self { raw }
    }

    pub fn raw(&self) -> &[u8; RESPONSE_LEN] {
        &self.raw
    }

    pub fn address(&self) -> u8 {
        self.raw[1]
    }

    pub fn opcode(&self) -> u8 {
        self.raw[3]
    }

    pub fn value(&self) -> u16 {
        bytes_to_u16_be([self.raw[4], self.raw[5]])
    }

    /// 位置（度）
    pub fn degrees(&self) -> f64 {
        decode_degrees(self.value())
    }

    pub fn checksum_ok(&self) -> bool {
        self.raw[6] == checksum(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_set_pan_frame_layout() {
        let frame = CommandFrame::set_position(0x01, Axis::Pan, 90.0).unwrap();
        // 9000 = 0x2328
        assert_eq!(
            frame.to_bytes(),
            [0xFF, 0x01, 0x00, 0x4B, 0x23, 0x28, 0x01 + 0x4B + 0x23 + 0x28]
        );
        assert!(frame.is_valid());
    }

    #[test]
    fn test_query_frames() {
        let pan = CommandFrame::query_position(0x01, Axis::Pan);
        assert_eq!(pan.to_bytes(), [0xFF, 0x01, 0x00, 0x51, 0x00, 0x00, 0x52]);
        let tilt = CommandFrame::query_position(0x01, Axis::Tilt);
        assert_eq!(tilt.to_bytes(), [0xFF, 0x01, 0x00, 0x53, 0x00, 0x00, 0x54]);
    }

    #[test]
    fn test_checksum_wraps() {
        // 0x01 + 0x00 + 0x4B + 0x8C + 0x3C = 0x114 -> 0x14
        let frame = CommandFrame::set_position(0x01, Axis::Pan, 359.0).unwrap();
        assert_eq!(frame.checksum(), 0x14);
    }

    #[test]
    fn test_preset_range() {
        assert!(CommandFrame::goto_preset(1, 1).is_ok());
        assert!(CommandFrame::goto_preset(1, 128).is_ok());
        assert_eq!(
            CommandFrame::goto_preset(1, 0),
            Err(ProtocolError::InvalidPreset(0))
        );
        assert_eq!(
            CommandFrame::goto_preset(1, 129),
            Err(ProtocolError::InvalidPreset(129))
        );
        let frame = CommandFrame::goto_preset(1, 5).unwrap();
        assert_eq!(frame.opcode(), Opcode::GotoPreset);
        assert_eq!(frame.data(), [0x00, 0x05]);
    }

    #[test]
    fn test_cancel_frame() {
        let frame = CommandFrame::cancel(0x01);
        assert_eq!(frame.to_bytes(), [0xFF, 0x01, 0x00, 0x80, 0x00, 0x00, 0x81]);
    }

    #[test]
    fn test_command_parse_roundtrip_and_errors() {
        let frame = CommandFrame::set_position(0x02, Axis::Tilt, 45.5).unwrap();
        let parsed = CommandFrame::parse(&frame.to_bytes()).unwrap();
        assert_eq!(parsed, frame);
        assert_eq!(parsed.value(), 4550);

        assert!(matches!(
            CommandFrame::parse(&[0xFF, 0x01]),
            Err(ProtocolError::MalformedResponse { actual: 2, .. })
        ));
        assert!(matches!(
            CommandFrame::parse(&[0xFF, 0x01, 0x00, 0x99, 0x00, 0x00, 0x9A]),
            Err(ProtocolError::UnknownOpcode(0x99))
        ));
    }

    #[test]
    fn test_response_parse() {
        let resp = ResponseFrame::parse(&[0xFF, 0x01, 0x00, 0x59, 0x17, 0x70, 0xE1]).unwrap();
        assert_eq!(resp.value(), 6000);
        assert_eq!(resp.degrees(), 60.0);
        assert!(resp.checksum_ok());
    }

    #[test]
    fn test_response_wrong_length() {
        let err = ResponseFrame::parse(&[0xFF, 0x01, 0x00, 0x59, 0x17]).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::MalformedResponse {
                expected: 7,
                actual: 5
            }
        );
        assert!(ResponseFrame::parse(&[]).is_err());
    }

    #[test]
    fn test_response_wrong_header() {
        let err = ResponseFrame::parse(&[0x00, 0x01, 0x00, 0x59, 0x17, 0x70, 0xE1]).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidHeader { actual: 0x00, .. }));
    }

    #[test]
    fn test_position_response_builder() {
        let resp = ResponseFrame::position(0x01, Axis::Tilt, 5000);
        assert_eq!(resp.opcode(), 0x5B);
        assert_eq!(resp.degrees(), 50.0);
        assert!(resp.checksum_ok());
        assert_eq!(ResponseFrame::parse(resp.raw()).unwrap(), resp);
    }

    proptest! {
        #[test]
        fn prop_checksum_matches_sum(address in any::<u8>(), value in 0u16..=35900) {
            let frame = CommandFrame::new(address, Opcode::SetPan, value.to_be_bytes());
            let bytes = frame.to_bytes();
            let expected = bytes[1..6].iter().map(|b| *b as u32).sum::<u32>() % 256;
            prop_assert_eq!(frame.checksum() as u32, expected);
        }

        #[test]
        fn prop_corrupted_payload_changes_checksum(
            value in any::<u16>(),
            index in 4usize..6,
            delta in 1u8..=255,
        ) {
            let frame = CommandFrame::new(0x01, Opcode::SetTilt, value.to_be_bytes());
            let mut bytes = frame.to_bytes();
            bytes[index] = bytes[index].wrapping_add(delta);
            prop_assert_ne!(checksum(&bytes), frame.checksum());
        }
    }
}
