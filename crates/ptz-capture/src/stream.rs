//! 传感器流接口

use crate::error::CaptureError;
use crate::frame::RawSensorBuffer;
use std::time::Duration;

/// 一路硬件图像流
///
/// 实现由采集线程独占（移动进线程），因此只要求 `Send`。
///
/// # 语义
///
/// - `fetch` 阻塞等待下一帧，最长 `timeout`；超时返回 `CaptureFetchFailed`。
/// - `trigger` 发出一次软触发，不等待出图。
pub trait SensorStream: Send {
    fn name(&self) -> &str;

    fn fetch(&mut self, timeout: Duration) -> Result<RawSensorBuffer, CaptureError>;

    fn trigger(&mut self) -> Result<(), CaptureError>;

    /// 曝光时间（微秒）
    fn set_exposure_us(&mut self, _exposure_us: f64) -> Result<(), CaptureError> {
        Err(CaptureError::NotSupported("exposure"))
    }

    /// 增益（dB）
    fn set_gain_db(&mut self, _gain_db: f64) -> Result<(), CaptureError> {
        Err(CaptureError::NotSupported("gain"))
    }
}

impl<S: SensorStream + ?Sized> SensorStream for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&mut self, timeout: Duration) -> Result<RawSensorBuffer, CaptureError> {
        (**self).fetch(timeout)
    }

    fn trigger(&mut self) -> Result<(), CaptureError> {
        (**self).trigger()
    }

    fn set_exposure_us(&mut self, exposure_us: f64) -> Result<(), CaptureError> {
        (**self).set_exposure_us(exposure_us)
    }

    fn set_gain_db(&mut self, gain_db: f64) -> Result<(), CaptureError> {
        (**self).set_gain_db(gain_db)
    }
}
