//! 预置位命令

use crate::connection::ConnectionArgs;
use anyhow::Result;
use clap::Args;
use ptz_sdk::driver::VerifierConfig;

/// 预置位命令参数
#[derive(Args, Debug)]
pub struct PresetCommand {
    /// 预置位编号（1-128）
    #[arg(value_parser = clap::value_parser!(u8).range(1..=128))]
    pub preset: u8,
}

impl PresetCommand {
    pub fn execute(&self, connection: &ConnectionArgs) -> Result<()> {
        let mut mount = connection.connect(VerifierConfig::default())?;

        println!("⏳ 调用预置位 {}...", self.preset);
        mount.go_to_preset(self.preset)?;
        println!("✅ 命令已下发");
        Ok(())
    }
}
