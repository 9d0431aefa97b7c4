//! 四角命令：手动移动到视场角边界

use crate::commands::config::load_scan_config;
use crate::commands::grid::GridOverrides;
use crate::connection::ConnectionArgs;
use anyhow::{Context, Result};
use clap::Args;
use ptz_sdk::scan::Corner;
use std::path::PathBuf;

/// 四角命令参数
#[derive(Args, Debug)]
pub struct CornerCommand {
    /// top-left / top-right / bottom-left / bottom-right
    pub corner: Corner,

    /// 配置文件
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub grid: GridOverrides,
}

impl CornerCommand {
    pub fn execute(&self, connection: &ConnectionArgs) -> Result<()> {
        let mut config = load_scan_config(self.config.as_deref())?;
        self.grid.apply(&mut config.grid);
        let target = config.grid.corner(self.corner);

        let mut mount = connection.connect(config.verifier)?;
        println!("⏳ 移动到 {} {}", self.corner, target);
        let arrival = mount
            .move_to(target)
            .with_context(|| format!("移动到 {} 失败", target))?;

        if arrival.reached {
            println!("✅ 已到位");
        } else {
            println!("⚠️  未确认到位");
        }
        Ok(())
    }
}
