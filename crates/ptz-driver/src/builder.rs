//! Builder 模式实现
//!
//! 提供链式构造 [`MotionController`] 的便捷方式。

use crate::client::{ClientConfig, MountClient};
use crate::controller::MotionController;
#[cfg(feature = "serial")]
use crate::error::DriverError;
use crate::verifier::{PoseVerifier, VerifierConfig};
use ptz_serial::{Transport, TransportConfig};
use tracing::info;

/// 云台 Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use ptz_driver::MountBuilder;
///
/// let mut controller = MountBuilder::new()
///     .port("/dev/ttyUSB0")
///     .baud_rate(2400)
///     .build()
///     .unwrap();
/// let (pan, tilt) = controller.current_pose();
/// ```
#[derive(Debug, Clone, Default)]
pub struct MountBuilder {
    transport: TransportConfig,
    client: ClientConfig,
    verifier: VerifierConfig,
}

impl MountBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 串口名称（默认 `/dev/ttyUSB0`，Windows 为 `COM4`）
    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.transport.port = port.into();
        self
    }

    /// 波特率（默认 2400）
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.transport.baud_rate = baud_rate;
        self
    }

    /// 设备地址（默认 0x01）
    pub fn address(mut self, address: u8) -> Self {
        self.client.address = address;
        self
    }

    pub fn transport_config(mut self, config: TransportConfig) -> Self {
        self.transport = config;
        self
    }

    pub fn client_config(mut self, config: ClientConfig) -> Self {
        self.client = config;
        self
    }

    pub fn verifier_config(mut self, config: VerifierConfig) -> Self {
        self.verifier = config;
        self
    }

    /// 打开串口并构造控制器
    ///
    /// # Errors
    /// - `DriverError::Transport`: 串口打开失败（这是唯一允许中止整个运行的初始化错误）
    #[cfg(feature = "serial")]
    pub fn build(self) -> Result<MotionController<ptz_serial::SerialTransport>, DriverError> {
        let transport = ptz_serial::SerialTransport::open(&self.transport)?;
        info!(
            "Mount connected on {} ({} baud, address 0x{:02X})",
            self.transport.port, self.transport.baud_rate, self.client.address
        );
        Ok(self.build_with(transport))
    }

    /// 连接到模拟云台
    #[cfg(feature = "mock")]
    pub fn build_simulated(
        self,
        mount: &ptz_serial::SimulatedMount,
    ) -> MotionController<ptz_serial::MockTransport> {
        let (transport, _handle) = mount.transport();
        info!("Using simulated mount");
        self.build_with(transport)
    }

    /// 使用已有传输构造控制器
    pub fn build_with<T: Transport>(self, transport: T) -> MotionController<T> {
        let client = MountClient::with_config(transport, self.client);
        MotionController::new(client, PoseVerifier::new(self.verifier))
    }
}
