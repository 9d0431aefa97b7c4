//! 帧数据类型
//!
//! - [`RawSensorBuffer`]: 传感器原生布局的字节缓冲区（采集线程独占）
//! - [`Frame`]: 转换为交错 RGB8 的帧，附带触发编号
//! - [`FramePair`]: 同一触发编号的左右两帧

use crate::error::CaptureError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// 采集流标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamId {
    Left,
    Right,
}

impl StreamId {
    pub const ALL: [StreamId; 2] = [StreamId::Left, StreamId::Right];

    /// 文件名前缀：左 `A`，右 `D`
    pub const fn tag(self) -> char {
        match self {
            StreamId::Left => 'A',
            StreamId::Right => 'D',
        }
    }

    pub const fn other(self) -> StreamId {
        match self {
            StreamId::Left => StreamId::Right,
            StreamId::Right => StreamId::Left,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            StreamId::Left => "left",
            StreamId::Right => "right",
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 传感器像素布局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// 交错 RGB（已是目标布局）
    Rgb8,
    /// 交错 BGR
    Bgr8,
    /// 单通道灰度
    Mono8,
    /// 三平面 RGB（先 R 平面，再 G、B）
    Rgb8Planar,
}

impl PixelFormat {
    pub const fn channels(self) -> usize {
        match self {
            PixelFormat::Mono8 => 1,
            PixelFormat::Rgb8 | PixelFormat::Bgr8 | PixelFormat::Rgb8Planar => 3,
        }
    }
}

impl FromStr for PixelFormat {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgb8" => Ok(PixelFormat::Rgb8),
            "bgr8" => Ok(PixelFormat::Bgr8),
            "mono8" => Ok(PixelFormat::Mono8),
            "rgb8_planar" | "rgb8planar" => Ok(PixelFormat::Rgb8Planar),
            _ => Err(CaptureError::UnsupportedPixelFormat(s.to_string())),
        }
    }
}

/// 传感器原始缓冲区
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSensorBuffer {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// 传感器帧序号
    pub frame_number: u64,
}

impl RawSensorBuffer {
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            data,
            width,
            height,
            format,
            frame_number: 0,
        }
    }

    pub fn with_frame_number(mut self, frame_number: u64) -> Self {
        self.frame_number = frame_number;
        self
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn expected_len(&self) -> usize {
        self.pixel_count() * self.format.channels()
    }

    /// 转换为交错 RGB8（消耗缓冲区）
    ///
    /// # 错误
    /// - `CaptureError::BufferSize`: 长度不等于 `width * height * channels`
    pub fn into_rgb(self) -> Result<Vec<u8>, CaptureError> {
        let expected = self.expected_len();
        if self.data.len() != expected {
            return Err(CaptureError::BufferSize {
                expected,
                actual: self.data.len(),
            });
        }

        let n = self.pixel_count();
        let rgb = match self.format {
            PixelFormat::Rgb8 => self.data,
            PixelFormat::Bgr8 => {
                let mut data = self.data;
                for px in data.chunks_exact_mut(3) {
                    px.swap(0, 2);
                }
                data
            },
            PixelFormat::Mono8 => self.data.iter().flat_map(|&v| [v, v, v]).collect(),
            PixelFormat::Rgb8Planar => {
                let (r, rest) = self.data.split_at(n);
                let (g, b) = rest.split_at(n);
                let mut out = Vec::with_capacity(n * 3);
                for i in 0..n {
                    out.extend_from_slice(&[r[i], g[i], b[i]]);
                }
                out
            },
        };
        Ok(rgb)
    }
}

/// 交错 RGB8 帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub stream_id: StreamId,
    /// 采集线程被触发时的触发编号
    pub trigger_id: u64,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub frame_number: u64,
}

impl Frame {
    pub fn from_raw(
        stream_id: StreamId,
        trigger_id: u64,
        raw: RawSensorBuffer,
    ) -> Result<Self, CaptureError> {
        let (width, height, frame_number) = (raw.width, raw.height, raw.frame_number);
        let pixels = raw.into_rgb()?;
        Ok(Self {
            stream_id,
            trigger_id,
            width,
            height,
            pixels,
            frame_number,
        })
    }
}

/// 一对帧落盘后的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairFiles {
    /// 共享文件名主干（自 Unix 纪元起的 100ns 计数）
    pub stem: u64,
    pub left: PathBuf,
    pub right: PathBuf,
}

/// 同一触发的左右帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePair {
    pub trigger_id: u64,
    pub left: Frame,
    pub right: Frame,
    /// 已落盘时的文件路径
    pub files: Option<PairFiles>,
}
