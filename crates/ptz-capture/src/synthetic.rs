//! 合成图像流
//!
//! 无硬件时使用（测试、`--synthetic-cameras`）。每次触发产生一帧确定性的测试图案。
//!
//! [`SyntheticStream::synced_pair`] 构造共享一条"触发线"的两路流，模拟主从硬件同步：
//! 任一路的软触发都会让两路各产出一帧。

use crate::error::CaptureError;
use crate::frame::{PixelFormat, RawSensorBuffer};
use crate::stream::SensorStream;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

#[derive(Default)]
struct TriggerLine {
    pulses: Mutex<u64>,
    cond: Condvar,
}

impl TriggerLine {
    fn pulse(&self) {
        *self.pulses.lock() += 1;
        self.cond.notify_all();
    }

    /// 等待脉冲数超过 `seen`，返回当前脉冲数
    fn wait_beyond(&self, seen: u64, timeout: Duration) -> Option<u64> {
        let deadline = Instant::now() + timeout;
        let mut pulses = self.pulses.lock();
        while *pulses <= seen {
            if self.cond.wait_until(&mut pulses, deadline).timed_out() {
                return None;
            }
        }
        Some(*pulses)
    }
}

#[derive(Debug, Default)]
struct FaultState {
    fail_next: usize,
    offline: bool,
    latency: Duration,
    exposure_us: Option<f64>,
    gain_db: Option<f64>,
}

/// 合成流的控制句柄（流被移入采集线程后仍可使用）
#[derive(Clone, Default)]
pub struct SyntheticControl {
    state: Arc<Mutex<FaultState>>,
}

impl SyntheticControl {
    /// 后续 `n` 次取帧失败
    pub fn fail_next_fetches(&self, n: usize) {
        self.state.lock().fail_next = n;
    }

    /// 离线：所有取帧立即失败
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// 出图延迟
    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = latency;
    }

    pub fn exposure_us(&self) -> Option<f64> {
        self.state.lock().exposure_us
    }

    pub fn gain_db(&self) -> Option<f64> {
        self.state.lock().gain_db
    }
}

/// 合成图像流
pub struct SyntheticStream {
    name: String,
    width: u32,
    height: u32,
    format: PixelFormat,
    line: Arc<TriggerLine>,
    consumed: u64,
    control: SyntheticControl,
}

impl SyntheticStream {
    pub fn new(name: impl Into<String>, width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            format,
            line: Arc::new(TriggerLine::default()),
            consumed: 0,
            control: SyntheticControl::default(),
        }
    }

    /// 共享触发线的一对流（左、右）
    pub fn synced_pair(width: u32, height: u32, format: PixelFormat) -> (Self, Self) {
        let left = Self::new("synthetic-left", width, height, format);
        let right = Self {
            name: "synthetic-right".to_string(),
            line: left.line.clone(),
            control: SyntheticControl::default(),
            ..Self::new("", width, height, format)
        };
        (left, right)
    }

    pub fn control(&self) -> SyntheticControl {
        self.control.clone()
    }

    fn pattern(&self, frame_number: u64) -> Vec<u8> {
        let channels = self.format.channels();
        let len = self.width as usize * self.height as usize * channels;
        let seed = (frame_number % 251) as usize;
        (0..len).map(|i| ((i / channels + seed * 7 + i % channels * 85) % 256) as u8).collect()
    }
}

impl SensorStream for SyntheticStream {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&mut self, timeout: Duration) -> Result<RawSensorBuffer, CaptureError> {
        let latency = {
            let mut faults = self.control.state.lock();
            if faults.offline {
                return Err(CaptureError::fetch_failed(&self.name, "stream offline"));
            }
            if faults.fail_next > 0 {
                faults.fail_next -= 1;
                return Err(CaptureError::fetch_failed(&self.name, "injected failure"));
            }
            faults.latency
        };

        if self.line.wait_beyond(self.consumed, timeout).is_none() {
            return Err(CaptureError::fetch_failed(
                &self.name,
                format!("no frame within {:?}", timeout),
            ));
        }
        self.consumed += 1;
        if !latency.is_zero() {
            std::thread::sleep(latency);
        }

        trace!("{}: frame {}", self.name, self.consumed);
        Ok(
            RawSensorBuffer::new(self.pattern(self.consumed), self.width, self.height, self.format)
                .with_frame_number(self.consumed),
        )
    }

    fn trigger(&mut self) -> Result<(), CaptureError> {
        self.line.pulse();
        Ok(())
    }

    fn set_exposure_us(&mut self, exposure_us: f64) -> Result<(), CaptureError> {
        self.control.state.lock().exposure_us = Some(exposure_us);
        Ok(())
    }

    fn set_gain_db(&mut self, gain_db: f64) -> Result<(), CaptureError> {
        self.control.state.lock().gain_db = Some(gain_db);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_without_trigger_times_out() {
        let mut stream = SyntheticStream::new("s", 4, 2, PixelFormat::Rgb8);
        let err = stream.fetch(Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, CaptureError::CaptureFetchFailed { .. }));
    }

    #[test]
    fn test_trigger_then_fetch() {
        let mut stream = SyntheticStream::new("s", 4, 2, PixelFormat::Bgr8);
        stream.trigger().unwrap();
        let raw = stream.fetch(Duration::from_millis(10)).unwrap();
        assert_eq!(raw.data.len(), 4 * 2 * 3);
        assert_eq!(raw.frame_number, 1);
        // 一次触发只产出一帧
        assert!(stream.fetch(Duration::from_millis(10)).is_err());
    }

    #[test]
    fn test_synced_pair_shares_trigger() {
        let (mut left, mut right) = SyntheticStream::synced_pair(2, 2, PixelFormat::Mono8);
        right.trigger().unwrap();
        assert!(left.fetch(Duration::from_millis(10)).is_ok());
        assert!(right.fetch(Duration::from_millis(10)).is_ok());
    }

    #[test]
    fn test_injected_faults() {
        let mut stream = SyntheticStream::new("s", 1, 1, PixelFormat::Rgb8);
        let control = stream.control();
        control.fail_next_fetches(1);
        stream.trigger().unwrap();
        assert!(stream.fetch(Duration::from_millis(10)).is_err());
        assert!(stream.fetch(Duration::from_millis(10)).is_ok());

        control.set_offline(true);
        stream.trigger().unwrap();
        assert!(stream.fetch(Duration::from_millis(10)).is_err());
    }

    #[test]
    fn test_exposure_and_gain_recorded() {
        let mut stream = SyntheticStream::new("s", 1, 1, PixelFormat::Rgb8);
        let control = stream.control();
        stream.set_exposure_us(5000.0).unwrap();
        stream.set_gain_db(3.5).unwrap();
        assert_eq!(control.exposure_us(), Some(5000.0));
        assert_eq!(control.gain_db(), Some(3.5));
    }
}
