//! 扫描进度事件
//!
//! 编排器把事件发到一个 crossbeam 通道，界面一侧订阅并在自己的线程里处理。
//! 接收端被丢弃后发送静默失败，不影响扫描本身。

use crate::session::{PositionState, ScanPosition, ScanSummary};
use crossbeam_channel::Sender;
use ptz_capture::PairFiles;
use tracing::trace;

#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    Started {
        total: usize,
    },
    StateChanged {
        index: usize,
        state: PositionState,
    },
    PositionRecorded(ScanPosition),
    PairSaved {
        index: usize,
        trigger_id: u64,
        files: PairFiles,
    },
    Cancelled {
        completed: usize,
    },
    Finished(ScanSummary),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct EventSink {
    tx: Option<Sender<ScanEvent>>,
}

impl EventSink {
    pub(crate) fn new(tx: Sender<ScanEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub(crate) fn emit(&self, event: ScanEvent) {
        if let Some(tx) = &self.tx
            && tx.send(event).is_err()
        {
            trace!("Scan event receiver dropped");
        }
    }

    pub(crate) fn state(&self, index: usize, state: PositionState) {
        self.emit(ScanEvent::StateChanged { index, state });
    }
}
