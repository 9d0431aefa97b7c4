//! 云台协议客户端
//!
//! [`MountClient`] 独占一个 [`Transport`]，提供原子的"设置轴"与"查询轴"操作。
//! 传输只在调用线程中访问，因此不需要任何锁。
//!
//! # 时序
//!
//! ```text
//! set_axis:   校验/编码 → 清空缓冲区 → 写入 → 等待 command_delay
//! query_axis: 清空缓冲区 → 写入查询 → 等待 response_delay
//!             → 循环读取直到某次读取没有新增字节 → 校验长度 → 解析 [4,5]
//! ```

use crate::error::DriverError;
use ptz_protocol::{Axis, CommandFrame, Pose, RESPONSE_LEN, ResponseFrame};
use ptz_serial::Transport;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// 单次查询最多累积的字节数（防止设备持续发送垃圾时无限读取）
const MAX_RESPONSE_BYTES: usize = 64;

/// 协议客户端配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// 设备地址
    pub address: u8,
    /// 每条运动命令写入后的等待（毫秒）
    pub command_delay_ms: u64,
    /// 查询命令写入后、开始读取前的等待（毫秒）
    pub response_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: 0x01,
            command_delay_ms: 100,
            response_delay_ms: 100,
        }
    }
}

impl ClientConfig {
    pub fn command_delay(&self) -> Duration {
        Duration::from_millis(self.command_delay_ms)
    }

    pub fn response_delay(&self) -> Duration {
        Duration::from_millis(self.response_delay_ms)
    }
}

/// 云台协议客户端
pub struct MountClient<T: Transport> {
    transport: T,
    config: ClientConfig,
}

impl<T: Transport> MountClient<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ClientConfig::default())
    }

    pub fn with_config(transport: T, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn address(&self) -> u8 {
        self.config.address
    }

    /// 设置单轴绝对角度
    ///
    /// # 错误
    /// - `DriverError::Protocol(OutOfRange)`: 角度越界，不会写入任何字节
    /// - `DriverError::Transport`: 写入失败
    pub fn set_axis(&mut self, axis: Axis, degrees: f64) -> Result<(), DriverError> {
        let frame = CommandFrame::set_position(self.config.address, axis, degrees)?;
        debug!(axis = ?axis, degrees, "Setting axis position");
        self.send_command(&frame)
    }

    /// 查询单轴当前角度
    ///
    /// # 错误
    /// - `DriverError::NoResponse`: 读取超时内没有任何字节
    /// - `DriverError::Protocol(MalformedResponse)`: 响应长度不是 7 字节
    /// - `DriverError::Protocol(InvalidHeader)`: 响应帧头不是 `0xFF`
    pub fn query_axis(&mut self, axis: Axis) -> Result<f64, DriverError> {
        let frame = CommandFrame::query_position(self.config.address, axis);
        self.transport.clear()?;
        self.transport.write(&frame.to_bytes())?;
        spin_sleep::sleep(self.config.response_delay());

        let response = self.read_until_idle()?;
        if response.is_empty() {
            debug!(axis = ?axis, "No response to position query");
            return Err(DriverError::NoResponse { axis });
        }
        if response.len() != RESPONSE_LEN {
            warn!(
                "Malformed {} response ({} bytes): {}",
                axis,
                response.len(),
                hex::encode(&response)
            );
        }

        let parsed = ResponseFrame::parse(&response)?;
        if !parsed.checksum_ok() {
            warn!("{} response checksum mismatch: {}", axis, hex::encode(&response));
        }
        trace!("{} response: {}", axis, hex::encode(&response));
        Ok(parsed.degrees())
    }

    /// 取消当前运动（不清空缓冲区）
    pub fn cancel_motion(&mut self) -> Result<(), DriverError> {
        let frame = CommandFrame::cancel(self.config.address);
        self.transport.write(&frame.to_bytes())?;
        spin_sleep::sleep(self.config.command_delay());
        debug!("Motion cancelled");
        Ok(())
    }

    /// 调用预置位（1-128）
    pub fn go_to_preset(&mut self, preset: u8) -> Result<(), DriverError> {
        let frame = CommandFrame::goto_preset(self.config.address, preset)?;
        debug!(preset, "Going to preset");
        self.send_command(&frame)
    }

    /// 同时设置两轴；`None` 的轴不下发
    ///
    /// 两轴的角度都在写入前校验，任一越界则不写入任何字节。
    pub fn set_pose(&mut self, pan: Option<f64>, tilt: Option<f64>) -> Result<(), DriverError> {
        let frames = [(Axis::Pan, pan), (Axis::Tilt, tilt)]
            .into_iter()
            .filter_map(|(axis, degrees)| degrees.map(|d| (axis, d)))
            .map(|(axis, d)| CommandFrame::set_position(self.config.address, axis, d))
            .collect::<Result<Vec<_>, _>>()?;

        for frame in &frames {
            self.send_command(frame)?;
        }
        Ok(())
    }

    /// 查询当前位姿；每个轴独立失败（失败为 `None`）
    pub fn current_pose(&mut self) -> (Option<f64>, Option<f64>) {
        let pan = self.query_with_pause(Axis::Pan);
        let tilt = self.query_with_pause(Axis::Tilt);
        (pan, tilt)
    }

    /// 两轴都可读时返回完整位姿
    pub fn read_pose(&mut self) -> Option<Pose> {
        match self.current_pose() {
            (Some(pan), Some(tilt)) => Some(Pose::new(pan, tilt)),
            _ => None,
        }
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    fn query_with_pause(&mut self, axis: Axis) -> Option<f64> {
        spin_sleep::sleep(self.config.command_delay());
        match self.query_axis(axis) {
            Ok(degrees) => Some(degrees),
            Err(e) => {
                debug!("{} query failed: {}", axis, e);
                None
            },
        }
    }

    fn send_command(&mut self, frame: &CommandFrame) -> Result<(), DriverError> {
        self.transport.clear()?;
        self.transport.write(&frame.to_bytes())?;
        spin_sleep::sleep(self.config.command_delay());
        Ok(())
    }

    /// 累积读取，直到某次读取没有新增字节（空闲检测）
    fn read_until_idle(&mut self) -> Result<Vec<u8>, DriverError> {
        let mut response = Vec::with_capacity(RESPONSE_LEN);
        let mut buf = [0u8; RESPONSE_LEN];
        while response.len() < MAX_RESPONSE_BYTES {
            let n = self.transport.read(&mut buf)?;
            if n == 0 {
                break;
            }
            response.extend_from_slice(&buf[..n]);
        }
        Ok(response)
    }
}
