//! 扫描命令
//!
//! 按网格逐点移动并采集；Ctrl-C 在当前位置完成后停止扫描。

use crate::commands::config::load_scan_config;
use crate::commands::grid::GridOverrides;
use crate::connection::ConnectionArgs;
use crate::safety;
use crate::validation::{validate_grid, validate_output_dir};
use anyhow::{Context, Result};
use clap::Args;
use crossbeam_channel::Receiver;
use ptz_sdk::capture::{PairWriter, PixelFormat, StereoCapture, SyntheticStream};
use ptz_sdk::scan::{
    CapturePolicy, NoCapture, PairSource, ScanConfig, ScanEvent, ScanOrchestrator,
};
use std::path::PathBuf;
use tracing::warn;

/// 合成相机分辨率
const SYNTHETIC_SIZE: (u32, u32) = (640, 480);

/// 扫描命令参数
#[derive(Args, Debug)]
pub struct ScanCommand {
    /// 配置文件
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 帧对保存目录
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 使用合成相机（无相机硬件）
    #[arg(long)]
    pub synthetic_cameras: bool,

    /// 只在确认到位后采集
    #[arg(long)]
    pub strict: bool,

    /// 曝光（微秒）
    #[arg(long)]
    pub exposure: Option<f64>,

    /// 增益（dB）
    #[arg(long)]
    pub gain: Option<f64>,

    /// 跳过确认提示
    #[arg(short, long)]
    pub yes: bool,

    #[command(flatten)]
    pub grid: GridOverrides,
}

impl ScanCommand {
    /// 合并配置文件与命令行参数
    pub fn resolve(&self) -> Result<ScanConfig> {
        let mut config = load_scan_config(self.config.as_deref())?;
        self.grid.apply(&mut config.grid);
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if self.strict {
            config.capture_policy = CapturePolicy::OnlyWhenReached;
        }
        if self.exposure.is_some() {
            config.exposure_us = self.exposure;
        }
        if self.gain.is_some() {
            config.gain_db = self.gain;
        }
        validate_grid(&config.grid)?;
        config.validate().context("扫描配置无效")?;
        Ok(config)
    }

    fn capture(&self, config: &ScanConfig) -> Result<Box<dyn PairSource>> {
        if !self.synthetic_cameras {
            warn!("No camera backend selected, running a motion-only scan");
            println!("⚠️  未启用相机，只执行运动扫描（使用 --synthetic-cameras 启用合成相机）");
            return Ok(Box::new(NoCapture));
        }

        validate_output_dir(&config.output_dir)?;
        let (width, height) = SYNTHETIC_SIZE;
        let (left, right) = SyntheticStream::synced_pair(width, height, PixelFormat::Rgb8Planar);
        let writer = PairWriter::new(&config.output_dir, config.capture.image_format);
        let capture = StereoCapture::new(left, right, config.capture.clone(), Some(writer))
            .context("启动采集线程失败")?;
        println!("📷 帧对保存到 {}", config.output_dir.display());
        Ok(Box::new(capture))
    }

    pub fn execute(&self, connection: &ConnectionArgs) -> Result<()> {
        let config = self.resolve()?;
        if safety::requires_confirmation(&config, self.yes) && !safety::confirm_scan(&config)? {
            println!("已取消");
            return Ok(());
        }

        let client = connection.connect(config.verifier.clone())?.into_client();
        let capture = self.capture(&config)?;

        let (tx, rx) = crossbeam_channel::unbounded();
        let mut orchestrator = ScanOrchestrator::new(client, capture, config).with_events(tx);

        let cancel = orchestrator.cancel_token();
        ctrlc::set_handler(move || {
            println!("\n🛑 收到中断，当前位置完成后停止...");
            cancel.cancel();
        })
        .context("注册 Ctrl-C 处理器失败")?;

        let printer = std::thread::spawn(move || print_events(rx));
        let session = orchestrator.run();
        drop(orchestrator);
        if printer.join().is_err() {
            warn!("Event printer thread panicked");
        }

        let summary = session.summary();
        println!("\n📊 {}", summary);
        let failed: Vec<_> = session.positions().iter().filter(|p| !p.reached).collect();
        if !failed.is_empty() {
            println!("⚠️  未确认到位的位置:");
            for position in failed {
                println!("  {}", position);
            }
        }
        Ok(())
    }
}

fn print_events(rx: Receiver<ScanEvent>) {
    let mut total = 0;
    for event in rx.iter() {
        match event {
            ScanEvent::Started { total: n } => {
                total = n;
                println!("🚀 开始扫描，共 {} 个位置", n);
            },
            ScanEvent::PositionRecorded(position) => {
                let mark = if position.reached { "✅" } else { "⚠️ " };
                println!("{} [{}/{}] {}", mark, position.index, total, position);
            },
            ScanEvent::PairSaved { files, .. } => {
                println!("   💾 {} / {}", files.left.display(), files.right.display());
            },
            ScanEvent::Cancelled { completed } => {
                println!("🛑 扫描已取消（完成 {} 个位置）", completed);
            },
            ScanEvent::StateChanged { .. } | ScanEvent::Finished(_) => {},
        }
    }
}
