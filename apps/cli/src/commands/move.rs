//! 移动命令
//!
//! 下发目标角度，默认阻塞等待到位

use crate::commands::config::load_scan_config;
use crate::connection::ConnectionArgs;
use crate::validation::validate_angle;
use anyhow::Result;
use clap::Args;
use ptz_sdk::Axis;
use std::path::PathBuf;

/// 移动命令参数
#[derive(Args, Debug)]
pub struct MoveCommand {
    /// 目标水平角（度）
    #[arg(long)]
    pub pan: Option<f64>,

    /// 目标俯仰角（度）
    #[arg(long)]
    pub tilt: Option<f64>,

    /// 只下发命令，不等待到位
    #[arg(long)]
    pub no_wait: bool,

    /// 配置文件（到位确认参数）
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl MoveCommand {
    /// 检查参数：至少一个轴，且都在协议范围内
    pub fn validate(&self) -> Result<()> {
        if self.pan.is_none() && self.tilt.is_none() {
            anyhow::bail!("未指定目标，请使用 --pan 和/或 --tilt");
        }
        if let Some(pan) = self.pan {
            validate_angle(Axis::Pan, pan)?;
        }
        if let Some(tilt) = self.tilt {
            validate_angle(Axis::Tilt, tilt)?;
        }
        Ok(())
    }

    pub fn execute(&self, connection: &ConnectionArgs) -> Result<()> {
        self.validate()?;
        let config = load_scan_config(self.config.as_deref())?;
        let mut mount = connection.connect(config.verifier)?;

        println!("⏳ 移动到 pan={:?} tilt={:?}", self.pan, self.tilt);
        if self.no_wait {
            mount.set_pose(self.pan, self.tilt)?;
            println!("✅ 命令已下发");
            return Ok(());
        }

        let arrival = mount.goto_blocked(self.pan, self.tilt)?;
        match (arrival.reached, arrival.actual) {
            (true, Some(actual)) => println!("✅ 已到位: {}", actual),
            (true, None) => println!("✅ 已到位"),
            (false, Some(actual)) => println!("⚠️  未确认到位，最后读数: {}", actual),
            (false, None) => println!("⚠️  未确认到位（云台无应答）"),
        }
        Ok(())
    }
}
