//! 扫描会话与单个位置的记录

use ptz_capture::PairFiles;
use ptz_protocol::Pose;
use std::fmt;

/// 单个扫描位置的状态
///
/// `Idle → Moving → Verifying → {Reached, TimedOut} → Triggered → AwaitingPair
/// → {Paired, PairTimeout, CaptureFailed} → Recorded`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionState {
    Idle,
    Moving,
    Verifying,
    Reached,
    TimedOut,
    Triggered,
    AwaitingPair,
    Paired,
    PairTimeout,
    CaptureFailed,
    Recorded,
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// 一个位置的采集结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// 没有发起采集（未启用采集、策略跳过或运动命令失败）
    Skipped,
    /// 帧对完成；`files` 为 `None` 表示未落盘
    Paired {
        trigger_id: u64,
        files: Option<PairFiles>,
    },
    PairTimeout { trigger_id: u64 },
    Failed { trigger_id: u64, reason: String },
}

impl CaptureOutcome {
    pub fn trigger_id(&self) -> Option<u64> {
        match self {
            CaptureOutcome::Skipped => None,
            CaptureOutcome::Paired { trigger_id, .. }
            | CaptureOutcome::PairTimeout { trigger_id }
            | CaptureOutcome::Failed { trigger_id, .. } => Some(*trigger_id),
        }
    }

    pub fn is_paired(&self) -> bool {
        matches!(self, CaptureOutcome::Paired { .. })
    }
}

/// 一个网格点的最终记录（记录后不再修改）
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPosition {
    /// 从 1 开始
    pub index: usize,
    pub target: Pose,
    pub actual: Option<Pose>,
    pub reached: bool,
    pub capture: CaptureOutcome,
    /// 运动命令失败时的错误描述
    pub error: Option<String>,
}

impl fmt::Display for ScanPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} target {}", self.index, self.target)?;
        match self.actual {
            Some(actual) => write!(f, " actual {}", actual)?,
            None => write!(f, " actual ?")?,
        }
        write!(f, " reached={}", self.reached)?;
        match &self.capture {
            CaptureOutcome::Skipped => write!(f, " capture skipped")?,
            CaptureOutcome::Paired { trigger_id, files } => {
                write!(f, " pair #{}", trigger_id)?;
                if let Some(files) = files {
                    write!(f, " stem {}", files.stem)?;
                }
            },
            CaptureOutcome::PairTimeout { trigger_id } => {
                write!(f, " pair #{} timed out", trigger_id)?
            },
            CaptureOutcome::Failed { trigger_id, reason } => {
                write!(f, " pair #{} failed: {}", trigger_id, reason)?
            },
        }
        if let Some(error) = &self.error {
            write!(f, " error: {}", error)?;
        }
        Ok(())
    }
}

/// 扫描统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanSummary {
    /// 网格点总数
    pub total: usize,
    pub recorded: usize,
    pub reached: usize,
    pub paired: usize,
    pub cancelled: bool,
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} positions recorded, {} reached, {} pairs",
            self.recorded, self.total, self.reached, self.paired
        )?;
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        Ok(())
    }
}

/// 一次扫描的会话：有序的位置记录与触发编号计数器
///
/// 只由编排线程修改。
#[derive(Debug, Clone, Default)]
pub struct ScanSession {
    total: usize,
    positions: Vec<ScanPosition>,
    trigger_counter: u64,
    cancelled: bool,
}

impl ScanSession {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            positions: Vec::with_capacity(total),
            ..Default::default()
        }
    }

    /// 递增并返回新的触发编号（从 1 开始）
    pub fn next_trigger_id(&mut self) -> u64 {
        self.trigger_counter += 1;
        self.trigger_counter
    }

    pub fn trigger_count(&self) -> u64 {
        self.trigger_counter
    }

    pub fn record(&mut self, position: ScanPosition) {
        self.positions.push(position);
    }

    pub fn positions(&self) -> &[ScanPosition] {
        &self.positions
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub(crate) fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            total: self.total,
            recorded: self.positions.len(),
            reached: self.positions.iter().filter(|p| p.reached).count(),
            paired: self.positions.iter().filter(|p| p.capture.is_paired()).count(),
            cancelled: self.cancelled,
        }
    }
}
