//! 网格命令：打印扫描位姿与四角

use crate::commands::config::load_scan_config;
use crate::validation::validate_grid;
use anyhow::Result;
use clap::Args;
use ptz_sdk::Pose;
use ptz_sdk::scan::{GridConfig, generate};
use std::path::PathBuf;

/// 网格参数覆盖（命令行优先于配置文件）
#[derive(Args, Debug, Clone, Default)]
pub struct GridOverrides {
    /// 中心水平角（度）
    #[arg(long)]
    pub center_pan: Option<f64>,

    /// 中心俯仰角（度）
    #[arg(long)]
    pub center_tilt: Option<f64>,

    /// 水平视场角（度）
    #[arg(long)]
    pub h_fov: Option<f64>,

    /// 垂直视场角（度）
    #[arg(long)]
    pub v_fov: Option<f64>,

    /// 水平点数
    #[arg(long)]
    pub h_count: Option<usize>,

    /// 垂直点数
    #[arg(long)]
    pub v_count: Option<usize>,
}

impl GridOverrides {
    pub fn apply(&self, grid: &mut GridConfig) {
        if let Some(v) = self.center_pan {
            grid.center_pan = v;
        }
        if let Some(v) = self.center_tilt {
            grid.center_tilt = v;
        }
        if let Some(v) = self.h_fov {
            grid.h_fov = v;
        }
        if let Some(v) = self.v_fov {
            grid.v_fov = v;
        }
        if let Some(v) = self.h_count {
            grid.h_count = v;
        }
        if let Some(v) = self.v_count {
            grid.v_count = v;
        }
    }
}

/// 网格命令参数
#[derive(Args, Debug)]
pub struct GridCommand {
    /// 配置文件
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub grid: GridOverrides,

    /// 输出格式（table / json）
    #[arg(short, long, default_value = "table")]
    pub format: String,
}

#[derive(serde::Serialize)]
struct GridReport<'a> {
    grid: &'a GridConfig,
    corners: Vec<(String, Pose)>,
    poses: Vec<Pose>,
}

impl GridCommand {
    pub fn resolve(&self) -> Result<GridConfig> {
        let mut grid = load_scan_config(self.config.as_deref())?.grid;
        self.grid.apply(&mut grid);
        validate_grid(&grid)?;
        Ok(grid)
    }

    pub fn execute(&self) -> Result<()> {
        let grid = self.resolve()?;
        let poses = generate(&grid);

        match self.format.as_str() {
            "json" => {
                let report = GridReport {
                    grid: &grid,
                    corners: grid.corners().iter().map(|(c, p)| (c.to_string(), *p)).collect(),
                    poses,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            },
            "table" => {
                println!("📐 网格 {} × {} = {} 个位置", grid.h_count, grid.v_count, poses.len());
                for (i, pose) in poses.iter().enumerate() {
                    println!("  #{:<4} pan {:>7.2}°  tilt {:>6.2}°", i + 1, pose.pan, pose.tilt);
                }
                println!("\n📍 四角:");
                for (corner, pose) in grid.corners() {
                    println!("  {:<13} pan {:>7.2}°  tilt {:>6.2}°", corner, pose.pan, pose.tilt);
                }
            },
            other => anyhow::bail!("未知输出格式: {}（可选 table / json）", other),
        }
        Ok(())
    }
}
