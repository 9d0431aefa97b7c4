//! 采集线程
//!
//! 每路传感器一个长期运行的线程，独占该路的 [`SensorStream`]：
//!
//! ```text
//! 空闲 ──start_capture(id)──▶ 已触发 ──(软触发)──▶ fetch(超时) ──▶ 转换 RGB ──▶ sink.on_frame
//!   ▲                                                   │ 失败
//!   └───────────────────────────────────────────────────┘ 不发布任何帧
//! ```
//!
//! 触发是单槽的：已触发期间再次 `start_capture` 是空操作，避免重复取帧。

use crate::config::CaptureConfig;
use crate::error::CaptureError;
use crate::frame::{Frame, StreamId};
use crate::stream::SensorStream;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded, unbounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// 帧接收端
///
/// 由采集线程调用，实现必须线程安全。
pub trait FrameSink: Send + Sync {
    fn on_frame(&self, frame: Frame);
}

impl FrameSink for Sender<Frame> {
    fn on_frame(&self, frame: Frame) {
        if self.send(frame).is_err() {
            trace!("Frame receiver dropped");
        }
    }
}

enum WorkerCommand {
    Arm {
        trigger_id: u64,
    },
    Configure {
        exposure_us: Option<f64>,
        gain_db: Option<f64>,
        reply: Sender<Result<(), CaptureError>>,
    },
}

/// Extension trait for timeout-capable thread joins
trait JoinTimeout {
    fn join_timeout(self, timeout: Duration) -> Result<(), &'static str>;
}

impl JoinTimeout for JoinHandle<()> {
    fn join_timeout(self, timeout: Duration) -> Result<(), &'static str> {
        let (tx, rx) = bounded(1);
        std::thread::spawn(move || {
            let _ = tx.send(self.join().is_ok());
        });
        match rx.recv_timeout(timeout) {
            Ok(true) => Ok(()),
            Ok(false) => Err("thread panicked"),
            Err(RecvTimeoutError::Timeout) => Err("join timed out"),
            Err(RecvTimeoutError::Disconnected) => Err("thread panicked during join"),
        }
    }
}

/// 单路采集线程句柄
pub struct CaptureWorker {
    stream_id: StreamId,
    cmd_tx: Option<Sender<WorkerCommand>>,
    armed: Arc<AtomicBool>,
    is_running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    join_timeout: Duration,
}

impl CaptureWorker {
    /// 启动采集线程
    ///
    /// 当 `config.trigger_mode` 要求该路发出软触发时，线程在每次被触发后先调用
    /// `stream.trigger()` 再取帧。
    pub fn spawn<S>(
        stream: S,
        config: &CaptureConfig,
        stream_id: StreamId,
        sink: Arc<dyn FrameSink>,
    ) -> Result<Self, CaptureError>
    where
        S: SensorStream + 'static,
    {
        let (cmd_tx, cmd_rx) = unbounded();
        let armed = Arc::new(AtomicBool::new(false));
        let is_running = Arc::new(AtomicBool::new(true));

        let ctx = WorkerContext {
            stream_id,
            fires_trigger: config.trigger_mode.fires(stream_id),
            fetch_timeout: config.fetch_timeout(),
            poll_interval: config.poll_interval(),
            armed: armed.clone(),
            is_running: is_running.clone(),
            sink,
        };

        let thread = std::thread::Builder::new()
            .name(format!("capture-{}", stream_id))
            .spawn(move || worker_loop(stream, cmd_rx, ctx))?;

        info!(
            "Capture worker for {} stream started (fires trigger: {})",
            stream_id,
            config.trigger_mode.fires(stream_id)
        );

        Ok(Self {
            stream_id,
            cmd_tx: Some(cmd_tx),
            armed,
            is_running,
            thread: Some(thread),
            join_timeout: config.fetch_timeout() + config.poll_interval() + Duration::from_secs(1),
        })
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Acquire)
    }

    /// 触发一次采集
    ///
    /// 返回 `false` 表示已处于触发状态（本次为空操作）或线程已退出。
    pub fn start_capture(&self, trigger_id: u64) -> bool {
        if self
            .armed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(
                "{} worker already armed, ignoring trigger {}",
                self.stream_id, trigger_id
            );
            return false;
        }

        let sent = self
            .cmd_tx
            .as_ref()
            .is_some_and(|tx| tx.send(WorkerCommand::Arm { trigger_id }).is_ok());
        if !sent {
            self.armed.store(false, Ordering::Release);
            warn!("{} worker stopped, cannot arm trigger {}", self.stream_id, trigger_id);
        }
        sent
    }

    /// 设置曝光/增益（在采集线程中执行，等待结果）
    pub fn configure(
        &self,
        exposure_us: Option<f64>,
        gain_db: Option<f64>,
    ) -> Result<(), CaptureError> {
        let tx = self
            .cmd_tx
            .as_ref()
            .ok_or(CaptureError::WorkerStopped(self.stream_id))?;
        let (reply, result) = bounded(1);
        tx.send(WorkerCommand::Configure {
            exposure_us,
            gain_db,
            reply,
        })
        .map_err(|_| CaptureError::WorkerStopped(self.stream_id))?;
        result
            .recv()
            .map_err(|_| CaptureError::WorkerStopped(self.stream_id))?
    }

    /// 停止线程并等待退出
    pub fn stop(&mut self) {
        self.is_running.store(false, Ordering::Release);
        // 先关闭命令通道，线程的 recv 立即返回 Disconnected
        self.cmd_tx.take();

        if let Some(handle) = self.thread.take()
            && let Err(e) = handle.join_timeout(self.join_timeout)
        {
            error!(
                "{} capture worker failed to shut down within {:?}: {}",
                self.stream_id, self.join_timeout, e
            );
        }
    }
}

impl Drop for CaptureWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

struct WorkerContext {
    stream_id: StreamId,
    fires_trigger: bool,
    fetch_timeout: Duration,
    poll_interval: Duration,
    armed: Arc<AtomicBool>,
    is_running: Arc<AtomicBool>,
    sink: Arc<dyn FrameSink>,
}

fn worker_loop<S: SensorStream>(mut stream: S, cmd_rx: Receiver<WorkerCommand>, ctx: WorkerContext) {
    while ctx.is_running.load(Ordering::Acquire) {
        match cmd_rx.recv_timeout(ctx.poll_interval) {
            Ok(WorkerCommand::Arm { trigger_id }) => {
                capture_once(&mut stream, &ctx, trigger_id);
                ctx.armed.store(false, Ordering::Release);
            },
            Ok(WorkerCommand::Configure {
                exposure_us,
                gain_db,
                reply,
            }) => {
                let result = configure_stream(&mut stream, exposure_us, gain_db);
                let _ = reply.send(result);
            },
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    ctx.is_running.store(false, Ordering::Release);
    debug!("{} capture worker exited", ctx.stream_id);
}

fn capture_once<S: SensorStream>(stream: &mut S, ctx: &WorkerContext, trigger_id: u64) {
    debug!("{} stream capturing for trigger {}", ctx.stream_id, trigger_id);

    if ctx.fires_trigger
        && let Err(e) = stream.trigger()
    {
        warn!("{} stream trigger failed: {}", ctx.stream_id, e);
    }

    let raw = match stream.fetch(ctx.fetch_timeout) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("{} stream: {} (trigger {})", ctx.stream_id, e, trigger_id);
            return;
        },
    };
    trace!(
        "{} stream got frame {} ({}x{}, {:?})",
        ctx.stream_id, raw.frame_number, raw.width, raw.height, raw.format
    );

    match Frame::from_raw(ctx.stream_id, trigger_id, raw) {
        Ok(frame) => ctx.sink.on_frame(frame),
        Err(e) => warn!("{} stream: dropping unconvertible frame: {}", ctx.stream_id, e),
    }
}

fn configure_stream<S: SensorStream>(
    stream: &mut S,
    exposure_us: Option<f64>,
    gain_db: Option<f64>,
) -> Result<(), CaptureError> {
    if let Some(exposure_us) = exposure_us {
        stream.set_exposure_us(exposure_us)?;
    }
    if let Some(gain_db) = gain_db {
        stream.set_gain_db(gain_db)?;
    }
    Ok(())
}
