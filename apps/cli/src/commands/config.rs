//! 配置管理命令
//!
//! 扫描配置保存为 TOML，默认位于 `<config_dir>/ptz-calib/scan.toml`

use anyhow::{Context, Result};
use clap::Subcommand;
use ptz_sdk::ScanConfig;
use std::path::{Path, PathBuf};

/// 默认配置文件路径
pub fn default_config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;
    path.push("ptz-calib");
    path.push("scan.toml");
    Ok(path)
}

/// 加载扫描配置
///
/// 显式给出的路径必须存在；否则读取默认路径，默认路径不存在时使用内置默认值。
pub fn load_scan_config(path: Option<&Path>) -> Result<ScanConfig> {
    if let Some(path) = path {
        return ScanConfig::load_from_file(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()));
    }

    match default_config_path() {
        Ok(path) if path.exists() => ScanConfig::load_from_file(&path)
            .with_context(|| format!("读取配置文件失败: {}", path.display())),
        _ => Ok(ScanConfig::default()),
    }
}

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 写出默认配置
    Init {
        /// 目标路径（默认为用户配置目录）
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// 覆盖已有文件
        #[arg(long)]
        force: bool,
    },

    /// 显示生效的配置
    Show {
        /// 配置文件
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// 打印默认配置文件路径
    Path,
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            ConfigCommand::Init { path, force } => Self::init_(path, force),
            ConfigCommand::Show { path } => Self::show_(path.as_deref()),
            ConfigCommand::Path => {
                println!("{}", default_config_path()?.display());
                Ok(())
            },
        }
    }

    fn init_(path: Option<PathBuf>, force: bool) -> Result<()> {
        let path = match path {
            Some(path) => path,
            None => default_config_path()?,
        };
        if path.exists() && !force {
            anyhow::bail!("配置文件已存在: {}（使用 --force 覆盖）", path.display());
        }

        ScanConfig::default()
            .save_to_file(&path)
            .with_context(|| format!("写入配置文件失败: {}", path.display()))?;
        println!("✅ 已写入默认配置: {}", path.display());
        Ok(())
    }

    fn show_(path: Option<&Path>) -> Result<()> {
        let config = load_scan_config(path)?;
        let text = config.to_toml_string().context("序列化配置失败")?;
        println!("{}", text);
        Ok(())
    }
}
