//! 扫描编排
//!
//! 对每个网格点依次执行：移动 → 到位确认 → 触发采集 → 等待帧对 → 记录。
//! 单个位置的任何失败都只记录在 [`ScanPosition`] 中，扫描继续下一个位置。
//!
//! [`ScanRun`] 是惰性迭代器：每次 `next()` 完成一个位置。
//! 取消标志只在两个位置之间检查，正在进行的位置总会完整结束。

use crate::config::{CapturePolicy, ScanConfig};
use crate::error::ScanError;
use crate::events::{EventSink, ScanEvent};
use crate::grid::{self, Corner, GridConfig};
use crate::session::{CaptureOutcome, PositionState, ScanPosition, ScanSession};
use crossbeam_channel::Sender;
use ptz_capture::{CaptureError, FramePair, StereoCapture};
use ptz_driver::{Arrival, MotionController, MountClient, PoseVerifier};
use ptz_protocol::Pose;
use ptz_serial::Transport;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// 帧对来源
pub trait PairSource {
    /// 开始编号为 `trigger_id` 的一次触发；返回两路是否都已触发
    fn begin(&self, trigger_id: u64) -> bool;

    fn await_pair(&self, trigger_id: u64, timeout: Duration) -> Result<FramePair, CaptureError>;

    /// 扫描开始前设置曝光/增益
    fn configure(&self, _exposure_us: f64, _gain_db: f64) -> Result<(), CaptureError> {
        Ok(())
    }

    /// 为 `false` 时编排器不发起采集
    fn is_enabled(&self) -> bool {
        true
    }
}

impl PairSource for StereoCapture {
    fn begin(&self, trigger_id: u64) -> bool {
        StereoCapture::begin(self, trigger_id)
    }

    fn await_pair(&self, trigger_id: u64, timeout: Duration) -> Result<FramePair, CaptureError> {
        StereoCapture::await_pair(self, trigger_id, timeout)
    }

    fn configure(&self, exposure_us: f64, gain_db: f64) -> Result<(), CaptureError> {
        self.set_exposure_gain(exposure_us, gain_db)
    }
}

impl<P: PairSource + ?Sized> PairSource for Box<P> {
    fn begin(&self, trigger_id: u64) -> bool {
        (**self).begin(trigger_id)
    }

    fn await_pair(&self, trigger_id: u64, timeout: Duration) -> Result<FramePair, CaptureError> {
        (**self).await_pair(trigger_id, timeout)
    }

    fn configure(&self, exposure_us: f64, gain_db: f64) -> Result<(), CaptureError> {
        (**self).configure(exposure_us, gain_db)
    }

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }
}

/// 只运动、不采集
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapture;

impl PairSource for NoCapture {
    fn begin(&self, _trigger_id: u64) -> bool {
        false
    }

    fn await_pair(&self, _trigger_id: u64, _timeout: Duration) -> Result<FramePair, CaptureError> {
        Err(CaptureError::NotSupported("capture disabled"))
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// 可克隆的取消句柄
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// 扫描编排器
///
/// 独占云台客户端，所有串口操作都在调用线程上执行。
pub struct ScanOrchestrator<T: Transport, P: PairSource> {
    controller: MotionController<T>,
    capture: P,
    config: ScanConfig,
    events: EventSink,
    cancel: CancelToken,
}

impl<T: Transport, P: PairSource> ScanOrchestrator<T, P> {
    /// 到位确认使用 `config.verifier`
    pub fn new(client: MountClient<T>, capture: P, config: ScanConfig) -> Self {
        let verifier = PoseVerifier::new(config.verifier.clone());
        Self {
            controller: MotionController::new(client, verifier),
            capture,
            config,
            events: EventSink::default(),
            cancel: CancelToken::new(),
        }
    }

    /// 订阅进度事件
    pub fn with_events(mut self, tx: Sender<ScanEvent>) -> Self {
        self.events = EventSink::new(tx);
        self
    }

    /// 使用外部提供的取消句柄（例如 Ctrl-C 处理器持有的那个）
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn controller_mut(&mut self) -> &mut MotionController<T> {
        &mut self.controller
    }

    pub fn capture(&self) -> &P {
        &self.capture
    }

    pub fn into_parts(self) -> (MotionController<T>, P) {
        (self.controller, self.capture)
    }

    /// 手动移动到 `pose` 并确认到位
    pub fn move_to(&mut self, pose: Pose) -> Result<Arrival, ScanError> {
        Ok(self.controller.move_to(pose)?)
    }

    /// 移动到当前网格配置的某个角
    pub fn move_to_corner(&mut self, corner: Corner) -> Result<Arrival, ScanError> {
        let pose = self.config.grid.corner(corner);
        info!("Jogging to {} corner {}", corner, pose);
        self.move_to(pose)
    }

    /// 按配置中的网格扫描到底，返回会话记录
    pub fn run(&mut self) -> ScanSession {
        let grid = self.config.grid.clone();
        let mut run = self.run_scan(&grid);
        for position in run.by_ref() {
            debug!("{}", position);
        }
        run.into_session()
    }

    /// 开始扫描，返回惰性的逐位置迭代器
    pub fn run_scan(&mut self, grid: &GridConfig) -> ScanRun<'_, T, P> {
        let poses = grid::generate(grid);
        info!(
            "Starting scan: {} x {} = {} positions",
            grid.h_count,
            grid.v_count,
            poses.len()
        );
        self.events.emit(ScanEvent::Started { total: poses.len() });
        self.apply_sensor_settings();

        ScanRun {
            session: ScanSession::new(poses.len()),
            poses: poses.into_iter(),
            index: 0,
            finished: false,
            orchestrator: self,
        }
    }

    fn apply_sensor_settings(&self) {
        if !self.capture.is_enabled() {
            return;
        }
        let (exposure, gain) = match (self.config.exposure_us, self.config.gain_db) {
            (None, None) => return,
            (exposure, gain) => (exposure.unwrap_or(220_000.0), gain.unwrap_or(5.0)),
        };
        if let Err(e) = self.capture.configure(exposure, gain) {
            warn!("Continuing scan without exposure/gain settings: {}", e);
        }
    }

    fn scan_position(
        &mut self,
        session: &mut ScanSession,
        index: usize,
        target: Pose,
    ) -> ScanPosition {
        info!("Position {}/{}: moving to {}", index, session.total(), target);
        self.events.state(index, PositionState::Moving);

        if let Err(e) = self.controller.set_pose(Some(target.pan), Some(target.tilt)) {
            warn!("Position {}: move command failed: {}", index, e);
            self.events.state(index, PositionState::TimedOut);
            return ScanPosition {
                index,
                target,
                actual: None,
                reached: false,
                capture: CaptureOutcome::Skipped,
                error: Some(e.to_string()),
            };
        }

        self.events.state(index, PositionState::Verifying);
        let arrival = self.controller.verify(target);
        self.events.state(
            index,
            if arrival.reached {
                PositionState::Reached
            } else {
                PositionState::TimedOut
            },
        );

        spin_sleep::sleep(self.config.post_move_delay());
        let actual = self.controller.client_mut().read_pose().or(arrival.actual);
        if let Some(actual) = actual {
            info!("Position {}: actual pose {}", index, actual);
        }

        let capture = if !self.capture.is_enabled() {
            CaptureOutcome::Skipped
        } else if !arrival.reached && self.config.capture_policy == CapturePolicy::OnlyWhenReached {
            info!("Position {}: not reached, skipping capture", index);
            CaptureOutcome::Skipped
        } else {
            self.capture_pair(session, index)
        };

        ScanPosition {
            index,
            target,
            actual,
            reached: arrival.reached,
            capture,
            error: None,
        }
    }

    fn capture_pair(&mut self, session: &mut ScanSession, index: usize) -> CaptureOutcome {
        spin_sleep::sleep(self.config.capture_settle());

        let trigger_id = session.next_trigger_id();
        self.events.state(index, PositionState::Triggered);
        if !self.capture.begin(trigger_id) {
            warn!("Position {}: trigger {} not fully armed", index, trigger_id);
        }

        self.events.state(index, PositionState::AwaitingPair);
        match self.capture.await_pair(trigger_id, self.config.pair_timeout()) {
            Ok(pair) => {
                self.events.state(index, PositionState::Paired);
                if let Some(files) = &pair.files {
                    info!(
                        "Position {}: saved {} and {}",
                        index,
                        files.left.display(),
                        files.right.display()
                    );
                    self.events.emit(ScanEvent::PairSaved {
                        index,
                        trigger_id,
                        files: files.clone(),
                    });
                }
                CaptureOutcome::Paired {
                    trigger_id,
                    files: pair.files,
                }
            },
            Err(CaptureError::PairTimeout { .. }) => {
                warn!("Position {}: no frame pair for trigger {}", index, trigger_id);
                self.events.state(index, PositionState::PairTimeout);
                CaptureOutcome::PairTimeout { trigger_id }
            },
            Err(e) => {
                warn!("Position {}: capture failed: {}", index, e);
                self.events.state(index, PositionState::CaptureFailed);
                CaptureOutcome::Failed {
                    trigger_id,
                    reason: e.to_string(),
                }
            },
        }
    }
}

/// 正在进行的扫描
///
/// 每次 `next()` 完成并记录一个位置；取消后或网格耗尽后返回 `None`。
pub struct ScanRun<'a, T: Transport, P: PairSource> {
    orchestrator: &'a mut ScanOrchestrator<T, P>,
    poses: std::vec::IntoIter<Pose>,
    session: ScanSession,
    index: usize,
    finished: bool,
}

impl<T: Transport, P: PairSource> ScanRun<'_, T, P> {
    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    pub fn into_session(self) -> ScanSession {
        self.session
    }

    fn finish(&mut self) {
        self.finished = true;
        let summary = self.session.summary();
        info!("Scan finished: {}", summary);
        self.orchestrator.events.emit(ScanEvent::Finished(summary));
    }
}

impl<T: Transport, P: PairSource> Iterator for ScanRun<'_, T, P> {
    type Item = ScanPosition;

    fn next(&mut self) -> Option<ScanPosition> {
        if self.finished {
            return None;
        }

        if self.orchestrator.cancel.is_cancelled() {
            let completed = self.session.positions().len();
            warn!("Scan cancelled after {} positions", completed);
            self.session.mark_cancelled();
            self.orchestrator.events.emit(ScanEvent::Cancelled { completed });
            self.finish();
            return None;
        }

        let Some(target) = self.poses.next() else {
            self.finish();
            return None;
        };

        self.index += 1;
        let position = self
            .orchestrator
            .scan_position(&mut self.session, self.index, target);
        self.orchestrator.events.state(self.index, PositionState::Recorded);
        self.session.record(position.clone());
        self.orchestrator
            .events
            .emit(ScanEvent::PositionRecorded(position.clone()));
        Some(position)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            (0, Some(0))
        } else {
            (0, Some(self.poses.len()))
        }
    }
}
