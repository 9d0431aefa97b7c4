//! # PTZ Scan
//!
//! 标定扫描：
//!
//! - [`grid::generate`]: 由视场角与网格密度生成有序位姿序列
//! - [`ScanOrchestrator`]: 逐位置执行 移动 → 确认 → 触发 → 等待帧对 → 记录
//! - [`ScanSession`]: 一次扫描的有序记录与触发编号
//! - [`ScanEvent`]: 供界面订阅的进度事件
//! - [`ScanConfig`]: 可从 TOML 文件加载的扫描配置

pub mod config;
mod error;
pub mod events;
pub mod grid;
pub mod orchestrator;
pub mod session;

pub use config::{CapturePolicy, ScanConfig};
pub use error::ScanError;
pub use events::ScanEvent;
pub use grid::{Corner, GridConfig, generate};
pub use orchestrator::{CancelToken, NoCapture, PairSource, ScanOrchestrator, ScanRun};
pub use session::{CaptureOutcome, PositionState, ScanPosition, ScanSession, ScanSummary};
