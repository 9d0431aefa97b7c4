//! 帧配对
//!
//! 每路最多保留一个待配对帧（新帧覆盖旧帧）。两个槽位都是当前触发编号的帧时，
//! 组成一对、清空槽位，并（可选）落盘。
//!
//! 槽位由两个采集线程并发写入，因此槽位更新和完成判定都在同一把锁内完成。
//! 落盘在锁外进行，不阻塞另一路的 `on_frame`。
//!
//! # 触发编号
//!
//! - 小于当前编号的帧（上一次触发的迟到帧）直接丢弃，不会与新触发的帧配对。
//! - 大于当前编号的帧同样丢弃：编号只由 [`FramePairer::begin_trigger`] 推进。
//! - 当前编号一旦组成帧对，同编号的重复帧一律丢弃，每个触发最多落盘一次。

use crate::error::CaptureError;
use crate::frame::{Frame, FramePair, StreamId};
use crate::worker::FrameSink;
use crate::writer::PairWriter;
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// 配对统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairerStats {
    pub completed: u64,
    pub stale_discarded: u64,
    pub future_discarded: u64,
    pub duplicate_discarded: u64,
    pub overwritten: u64,
}

#[derive(Default)]
struct PairerState {
    expected: u64,
    left: Option<Frame>,
    right: Option<Frame>,
    /// 已组成帧对的触发编号，`begin_trigger` 前不再接收同编号的帧
    paired: Option<u64>,
    /// 当前触发的完成结果（配对成功或落盘失败）
    completed: Option<(u64, Result<FramePair, CaptureError>)>,
    stats: PairerStats,
}

impl PairerState {
    fn slot(&mut self, stream: StreamId) -> &mut Option<Frame> {
        match stream {
            StreamId::Left => &mut self.left,
            StreamId::Right => &mut self.right,
        }
    }
}

/// 帧配对器
pub struct FramePairer {
    state: Mutex<PairerState>,
    cond: Condvar,
    writer: Option<PairWriter>,
}

impl Default for FramePairer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl FramePairer {
    pub fn new(writer: Option<PairWriter>) -> Self {
        Self {
            state: Mutex::new(PairerState::default()),
            cond: Condvar::new(),
            writer,
        }
    }

    /// 开始新的触发：清空槽位与上一次的结果
    pub fn begin_trigger(&self, trigger_id: u64) {
        let mut state = self.state.lock();
        if trigger_id <= state.expected {
            warn!(
                "Trigger id {} does not advance past {}",
                trigger_id, state.expected
            );
        }
        state.expected = trigger_id;
        state.left = None;
        state.right = None;
        state.paired = None;
        state.completed = None;
    }

    pub fn expected_trigger(&self) -> u64 {
        self.state.lock().expected
    }

    pub fn stats(&self) -> PairerStats {
        self.state.lock().stats
    }

    /// 接收一路的帧
    pub fn on_frame(&self, frame: Frame) {
        let (left, right) = {
            let mut state = self.state.lock();
            let expected = state.expected;
            if frame.trigger_id < expected {
                debug!(
                    "Discarding stale {} frame (trigger {} < {})",
                    frame.stream_id, frame.trigger_id, expected
                );
                state.stats.stale_discarded += 1;
                return;
            }
            if frame.trigger_id > expected {
                warn!(
                    "Discarding {} frame from unknown trigger {} (expected {})",
                    frame.stream_id, frame.trigger_id, expected
                );
                state.stats.future_discarded += 1;
                return;
            }
            if state.paired == Some(expected) {
                debug!(
                    "Trigger {} already paired, dropping extra {} frame",
                    expected, frame.stream_id
                );
                state.stats.duplicate_discarded += 1;
                return;
            }

            let stream = frame.stream_id;
            if state.slot(stream).replace(frame).is_some() {
                state.stats.overwritten += 1;
            }

            match (state.left.take(), state.right.take()) {
                (Some(left), Some(right)) => {
                    state.paired = Some(expected);
                    (left, right)
                },
                (left, right) => {
                    state.left = left;
                    state.right = right;
                    return;
                },
            }
        };

        let trigger_id = left.trigger_id;
        let result = match &self.writer {
            Some(writer) => writer.write(&left, &right).map(Some),
            None => Ok(None),
        };
        if let Err(e) = &result {
            error!("Failed to save pair for trigger {}: {}", trigger_id, e);
        }
        let result = result.map(|files| FramePair {
            trigger_id,
            left,
            right,
            files,
        });

        let mut state = self.state.lock();
        if state.expected != trigger_id {
            warn!("Pair for trigger {} completed after trigger advanced", trigger_id);
            return;
        }
        state.stats.completed += 1;
        state.completed = Some((trigger_id, result));
        self.cond.notify_all();
    }

    /// 等待 `trigger_id` 的帧对完成，最长 `timeout`
    ///
    /// # 错误
    /// - `CaptureError::PairTimeout`: 超时（至少一路没有产出）
    /// - `CaptureError::Persist` / `Io`: 配对成功但落盘失败
    pub fn await_pair(&self, trigger_id: u64, timeout: Duration) -> Result<FramePair, CaptureError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if state
                .completed
                .as_ref()
                .is_some_and(|(id, _)| *id == trigger_id)
                && let Some((_, result)) = state.completed.take()
            {
                return result;
            }
            if self.cond.wait_until(&mut state, deadline).timed_out() {
                let has_left = state.left.is_some();
                let has_right = state.right.is_some();
                warn!(
                    "Pair timeout for trigger {} (left: {}, right: {})",
                    trigger_id, has_left, has_right
                );
                return Err(CaptureError::PairTimeout { trigger_id });
            }
        }
    }
}

impl FrameSink for FramePairer {
    fn on_frame(&self, frame: Frame) {
        FramePairer::on_frame(self, frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn frame(stream_id: StreamId, trigger_id: u64, value: u8) -> Frame {
        Frame {
            stream_id,
            trigger_id,
            width: 1,
            height: 1,
            pixels: vec![value; 3],
            frame_number: trigger_id,
        }
    }

    #[test]
    fn test_pair_completes_when_both_arrive() {
        let pairer = FramePairer::default();
        pairer.begin_trigger(1);
        pairer.on_frame(frame(StreamId::Right, 1, 2));
        pairer.on_frame(frame(StreamId::Left, 1, 1));

        let pair = pairer.await_pair(1, Duration::from_millis(10)).unwrap();
        assert_eq!(pair.trigger_id, 1);
        assert_eq!(pair.left.stream_id, StreamId::Left);
        assert_eq!(pair.right.pixels, vec![2; 3]);
        assert!(pair.files.is_none());
        assert_eq!(pairer.stats().completed, 1);
    }

    #[test]
    fn test_stale_frame_is_discarded() {
        let pairer = FramePairer::default();
        pairer.begin_trigger(1);
        pairer.on_frame(frame(StreamId::Left, 1, 1));
        // 触发 1 的右帧迟到，触发 2 已开始
        pairer.begin_trigger(2);
        pairer.on_frame(frame(StreamId::Right, 1, 9));
        pairer.on_frame(frame(StreamId::Left, 2, 1));

        assert!(matches!(
            pairer.await_pair(2, Duration::from_millis(20)),
            Err(CaptureError::PairTimeout { trigger_id: 2 })
        ));
        assert_eq!(pairer.stats().stale_discarded, 1);

        pairer.on_frame(frame(StreamId::Right, 2, 2));
        let pair = pairer.await_pair(2, Duration::from_millis(20)).unwrap();
        assert_eq!(pair.right.trigger_id, 2);
    }

    #[test]
    fn test_future_frame_is_discarded() {
        let pairer = FramePairer::default();
        pairer.begin_trigger(1);
        pairer.on_frame(frame(StreamId::Left, 3, 1));
        pairer.on_frame(frame(StreamId::Right, 1, 1));
        assert!(pairer.await_pair(1, Duration::from_millis(10)).is_err());
        assert_eq!(pairer.stats().future_discarded, 1);
    }

    #[test]
    fn test_newest_frame_wins() {
        let pairer = FramePairer::default();
        pairer.begin_trigger(4);
        pairer.on_frame(frame(StreamId::Left, 4, 1));
        pairer.on_frame(frame(StreamId::Left, 4, 7));
        pairer.on_frame(frame(StreamId::Right, 4, 2));

        let pair = pairer.await_pair(4, Duration::from_millis(10)).unwrap();
        assert_eq!(pair.left.pixels, vec![7; 3]);
        assert_eq!(pairer.stats().overwritten, 1);
    }

    #[test]
    fn test_one_sided_trigger_times_out() {
        let pairer = FramePairer::default();
        pairer.begin_trigger(1);
        pairer.on_frame(frame(StreamId::Left, 1, 1));

        let start = Instant::now();
        let result = pairer.await_pair(1, Duration::from_millis(50));
        assert!(matches!(result, Err(CaptureError::PairTimeout { trigger_id: 1 })));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_concurrent_producers() {
        let pairer = Arc::new(FramePairer::default());
        for id in 1..=50u64 {
            pairer.begin_trigger(id);
            let handles: Vec<_> = StreamId::ALL
                .into_iter()
                .map(|stream| {
                    let pairer = pairer.clone();
                    thread::spawn(move || pairer.on_frame(frame(stream, id, 0)))
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
            let pair = pairer.await_pair(id, Duration::from_secs(1)).unwrap();
            assert_eq!(pair.left.trigger_id, pair.right.trigger_id);
        }
        assert_eq!(pairer.stats().completed, 50);
    }

    #[test]
    fn test_pair_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let writer = PairWriter::new(dir.path(), crate::config::ImageFormat::Png);
        let pairer = FramePairer::new(Some(writer));
        pairer.begin_trigger(1);
        pairer.on_frame(frame(StreamId::Left, 1, 1));
        pairer.on_frame(frame(StreamId::Right, 1, 2));

        let pair = pairer.await_pair(1, Duration::from_secs(1)).unwrap();
        let files = pair.files.unwrap();
        assert!(files.left.exists() && files.right.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_duplicate_frames_after_pair_are_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let writer = PairWriter::new(dir.path(), crate::config::ImageFormat::Png);
        let pairer = FramePairer::new(Some(writer));
        pairer.begin_trigger(1);
        pairer.on_frame(frame(StreamId::Left, 1, 1));
        pairer.on_frame(frame(StreamId::Right, 1, 2));
        pairer.await_pair(1, Duration::from_secs(1)).unwrap();

        // 结果已被取走，同一触发的重复帧仍不能再组成一对
        pairer.on_frame(frame(StreamId::Left, 1, 3));
        pairer.on_frame(frame(StreamId::Right, 1, 4));

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
        assert_eq!(pairer.stats().completed, 1);
        assert_eq!(pairer.stats().duplicate_discarded, 2);
        assert!(matches!(
            pairer.await_pair(1, Duration::from_millis(20)),
            Err(CaptureError::PairTimeout { trigger_id: 1 })
        ));

        // 新触发重新开放配对
        pairer.begin_trigger(2);
        pairer.on_frame(frame(StreamId::Left, 2, 5));
        pairer.on_frame(frame(StreamId::Right, 2, 6));
        assert!(pairer.await_pair(2, Duration::from_secs(1)).is_ok());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 4);
    }

    #[test]
    fn test_duplicate_during_persist_is_dropped() {
        let pairer = Arc::new(FramePairer::default());
        pairer.begin_trigger(1);
        pairer.on_frame(frame(StreamId::Left, 1, 1));

        // 两路各送两次，并发到达
        let handles: Vec<_> = [StreamId::Right, StreamId::Left, StreamId::Right]
            .into_iter()
            .map(|stream| {
                let pairer = pairer.clone();
                thread::spawn(move || pairer.on_frame(frame(stream, 1, 0)))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(pairer.await_pair(1, Duration::from_secs(1)).is_ok());
        let stats = pairer.stats();
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.duplicate_discarded + stats.overwritten, 2);
    }
}
