//! 停止命令
//!
//! 取消云台当前运动

use crate::connection::ConnectionArgs;
use anyhow::Result;
use clap::Args;
use ptz_sdk::driver::VerifierConfig;

/// 停止命令参数
#[derive(Args, Debug)]
pub struct StopCommand {
    /// 停止后查询一次位姿
    #[arg(long)]
    pub report: bool,
}

impl StopCommand {
    pub fn execute(&self, connection: &ConnectionArgs) -> Result<()> {
        let mut mount = connection.connect(VerifierConfig::default())?;

        println!("🛑 发送停止命令...");
        mount.cancel_motion()?;
        println!("✅ 已停止");

        if self.report
            && let Some(pose) = mount.client_mut().read_pose()
        {
            println!("📊 当前位姿: {}", pose);
        }
        Ok(())
    }
}
