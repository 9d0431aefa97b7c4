//! 云台连接
//!
//! 每个命令独立执行：打开串口（或模拟云台）→ 执行操作 → 退出。

use anyhow::{Context, Result};
use clap::Args;
use ptz_sdk::driver::VerifierConfig;
use ptz_sdk::transport::{SerialTransport, SimulatedMount, Transport, TransportConfig};
use ptz_sdk::{MotionController, MountBuilder};
use tracing::info;

/// 云台控制器（串口或模拟云台）
pub type Mount = MotionController<Box<dyn Transport>>;

/// 全局连接参数
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// 串口名称
    #[arg(long, global = true, default_value_t = ptz_sdk::transport::default_port().to_string())]
    pub port: String,

    /// 波特率
    #[arg(long, global = true, default_value_t = 2400)]
    pub baud: u32,

    /// 云台地址
    #[arg(long, global = true, default_value_t = 1)]
    pub address: u8,

    /// 使用模拟云台（无硬件）
    #[arg(long, global = true)]
    pub simulate: bool,
}

impl ConnectionArgs {
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            port: self.port.clone(),
            baud_rate: self.baud,
            ..Default::default()
        }
    }

    fn open_transport(&self) -> Result<Box<dyn Transport>> {
        if self.simulate {
            let mount = SimulatedMount::new();
            let (transport, _handle) = mount.transport();
            info!("Using simulated mount");
            return Ok(Box::new(transport));
        }

        let config = self.transport_config();
        let transport = SerialTransport::open(&config)
            .with_context(|| format!("无法打开串口 {}", config.port))?;
        info!("Serial port {} opened at {} baud", config.port, config.baud_rate);
        Ok(Box::new(transport))
    }

    /// 连接云台；到位确认使用 `verifier`
    pub fn connect(&self, verifier: VerifierConfig) -> Result<Mount> {
        println!("🔌 连接到云台...");
        let transport = self.open_transport()?;
        Ok(MountBuilder::new()
            .address(self.address)
            .transport_config(self.transport_config())
            .verifier_config(verifier)
            .build_with(transport))
    }
}
