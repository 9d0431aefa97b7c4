//! 双目同步采集
//!
//! 组合两个 [`CaptureWorker`] 与一个 [`FramePairer`]：
//!
//! 1. `begin(id)`: 配对器切换到新触发编号，然后触发两路采集线程
//!    （主从模式下只有主相机发出软触发）
//! 2. `await_pair(id, timeout)`: 等待配对完成（含落盘）

use crate::config::CaptureConfig;
use crate::error::CaptureError;
use crate::frame::{FramePair, StreamId};
use crate::pairer::{FramePairer, PairerStats};
use crate::stream::SensorStream;
use crate::worker::{CaptureWorker, FrameSink};
use crate::writer::PairWriter;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// 双目同步采集
pub struct StereoCapture {
    pairer: Arc<FramePairer>,
    left: CaptureWorker,
    right: CaptureWorker,
    config: CaptureConfig,
}

impl StereoCapture {
    /// 启动两路采集线程
    ///
    /// `writer` 为 `None` 时只配对不落盘。
    pub fn new<L, R>(
        left: L,
        right: R,
        config: CaptureConfig,
        writer: Option<PairWriter>,
    ) -> Result<Self, CaptureError>
    where
        L: SensorStream + 'static,
        R: SensorStream + 'static,
    {
        let pairer = Arc::new(FramePairer::new(writer));
        let sink: Arc<dyn FrameSink> = pairer.clone();
        let left = CaptureWorker::spawn(left, &config, StreamId::Left, sink.clone())?;
        let right = CaptureWorker::spawn(right, &config, StreamId::Right, sink)?;
        info!("Stereo capture ready ({:?})", config.trigger_mode);
        Ok(Self {
            pairer,
            left,
            right,
            config,
        })
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn pairer(&self) -> &FramePairer {
        &self.pairer
    }

    pub fn stats(&self) -> PairerStats {
        self.pairer.stats()
    }

    /// 对两路设置相同的曝光（微秒）与增益（dB）
    pub fn set_exposure_gain(&self, exposure_us: f64, gain_db: f64) -> Result<(), CaptureError> {
        let left = self.left.configure(Some(exposure_us), Some(gain_db));
        let right = self.right.configure(Some(exposure_us), Some(gain_db));
        match (left, right) {
            (Ok(()), Ok(())) => {
                info!("Exposure {} us / gain {} dB applied", exposure_us, gain_db);
                Ok(())
            },
            (Err(e), _) | (_, Err(e)) => {
                warn!("Failed to set exposure/gain: {}", e);
                Err(e)
            },
        }
    }

    /// 开始一次触发；返回两路是否都被成功触发
    pub fn begin(&self, trigger_id: u64) -> bool {
        self.pairer.begin_trigger(trigger_id);
        let left = self.left.start_capture(trigger_id);
        let right = self.right.start_capture(trigger_id);
        if !(left && right) {
            warn!(
                "Trigger {}: left armed = {}, right armed = {}",
                trigger_id, left, right
            );
        }
        left && right
    }

    pub fn await_pair(&self, trigger_id: u64, timeout: Duration) -> Result<FramePair, CaptureError> {
        self.pairer.await_pair(trigger_id, timeout)
    }

    /// `begin` + `await_pair`
    pub fn capture(&self, trigger_id: u64, timeout: Duration) -> Result<FramePair, CaptureError> {
        self.begin(trigger_id);
        self.await_pair(trigger_id, timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TriggerMode;
    use crate::frame::PixelFormat;
    use crate::synthetic::SyntheticStream;

    fn config(trigger_mode: TriggerMode) -> CaptureConfig {
        CaptureConfig {
            fetch_timeout_ms: 300,
            poll_interval_ms: 5,
            trigger_mode,
            ..Default::default()
        }
    }

    #[test]
    fn test_hardware_sync_pairs() {
        let (left, right) = SyntheticStream::synced_pair(8, 6, PixelFormat::Bgr8);
        let capture = StereoCapture::new(
            left,
            right,
            config(TriggerMode::default()),
            None,
        )
        .unwrap();

        for id in 1..=3 {
            let pair = capture.capture(id, Duration::from_secs(2)).unwrap();
            assert_eq!(pair.trigger_id, id);
            assert_eq!(pair.left.trigger_id, pair.right.trigger_id);
            assert_eq!((pair.left.width, pair.left.height), (8, 6));
        }
    }

    #[test]
    fn test_software_trigger_pairs() {
        let left = SyntheticStream::new("l", 2, 2, PixelFormat::Mono8);
        let right = SyntheticStream::new("r", 2, 2, PixelFormat::Mono8);
        let capture =
            StereoCapture::new(left, right, config(TriggerMode::Software), None).unwrap();

        let pair = capture.capture(1, Duration::from_secs(2)).unwrap();
        assert_eq!(pair.left.pixels.len(), 12);
    }

    #[test]
    fn test_missing_side_times_out() {
        let left = SyntheticStream::new("l", 2, 2, PixelFormat::Rgb8);
        let right = SyntheticStream::new("r", 2, 2, PixelFormat::Rgb8);
        right.control().set_offline(true);
        let capture =
            StereoCapture::new(left, right, config(TriggerMode::Software), None).unwrap();

        let result = capture.capture(1, Duration::from_millis(200));
        assert!(matches!(result, Err(CaptureError::PairTimeout { trigger_id: 1 })));
    }

    #[test]
    fn test_set_exposure_gain_fans_out() {
        let (left, right) = SyntheticStream::synced_pair(2, 2, PixelFormat::Rgb8);
        let (lc, rc) = (left.control(), right.control());
        let capture =
            StereoCapture::new(left, right, config(TriggerMode::default()), None).unwrap();

        capture.set_exposure_gain(10_000.0, 2.0).unwrap();
        assert_eq!(lc.exposure_us(), Some(10_000.0));
        assert_eq!(rc.gain_db(), Some(2.0));
    }
}
