//! # PTZ CLI
//!
//! 云台双目标定扫描命令行工具。
//!
//! ```bash
//! # 生成默认配置
//! ptz-cli config init
//!
//! # 查看网格
//! ptz-cli grid --h-count 3 --v-count 2
//!
//! # 手动移动 / 查询 / 急停
//! ptz-cli --port /dev/ttyUSB0 move --pan 90 --tilt 30
//! ptz-cli position
//! ptz-cli stop
//!
//! # 完整扫描（无硬件时使用模拟云台与合成相机）
//! ptz-cli --simulate scan --synthetic-cameras --output ./DCIM
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod connection;
mod safety;
mod validation;

use commands::{
    ConfigCommand, CornerCommand, GridCommand, MoveCommand, PositionCommand, PresetCommand,
    ScanCommand, StopCommand,
};
use connection::ConnectionArgs;

const LOG_DIRECTIVES: &str = "ptz_cli=info,ptz_scan=info,ptz_driver=info,ptz_capture=info";

/// PTZ CLI - 云台标定扫描工具
#[derive(Parser, Debug)]
#[command(name = "ptz-cli")]
#[command(about = "Command-line interface for pan-tilt stereo calibration", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 打印扫描网格与四角
    Grid {
        #[command(flatten)]
        args: GridCommand,
    },

    /// 移动云台
    Move {
        #[command(flatten)]
        args: MoveCommand,
    },

    /// 查询当前位姿
    Position {
        #[command(flatten)]
        args: PositionCommand,
    },

    /// 停止运动
    Stop {
        #[command(flatten)]
        args: StopCommand,
    },

    /// 调用预置位
    Preset {
        #[command(flatten)]
        args: PresetCommand,
    },

    /// 移动到视场角的一个角
    Corner {
        #[command(flatten)]
        args: CornerCommand,
    },

    /// 执行网格扫描
    Scan {
        #[command(flatten)]
        args: ScanCommand,
    },
}

fn main() -> Result<()> {
    ptz_sdk::init_logging(LOG_DIRECTIVES).map_err(|e| anyhow::anyhow!(e))?;

    let cli = Cli::parse();
    let connection = cli.connection;

    match cli.command {
        Commands::Config(cmd) => cmd.execute(),
        Commands::Grid { args } => args.execute(),
        Commands::Move { args } => args.execute(&connection),
        Commands::Position { args } => args.execute(&connection),
        Commands::Stop { args } => args.execute(&connection),
        Commands::Preset { args } => args.execute(&connection),
        Commands::Corner { args } => args.execute(&connection),
        Commands::Scan { args } => args.execute(&connection),
    }
}
