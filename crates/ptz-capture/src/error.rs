//! 采集层错误类型定义

use crate::frame::StreamId;
use std::path::PathBuf;
use thiserror::Error;

/// 采集层错误类型
#[derive(Error, Debug)]
pub enum CaptureError {
    /// 硬件取帧失败（超时或设备错误）
    #[error("Frame fetch failed on {stream}: {reason}")]
    CaptureFetchFailed { stream: String, reason: String },

    /// 等待帧对超时（至少一侧没有产出）
    #[error("Timed out waiting for frame pair of trigger {trigger_id}")]
    PairTimeout { trigger_id: u64 },

    /// 原始缓冲区长度与宽高/像素格式不符
    #[error("Buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Unsupported pixel format: {0}")]
    UnsupportedPixelFormat(String),

    /// 图像编码或写文件失败
    #[error("Failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 采集线程已退出
    #[error("Capture worker for {0} stream stopped")]
    WorkerStopped(StreamId),

    /// 传感器不支持该操作
    #[error("Not supported: {0}")]
    NotSupported(&'static str),
}

impl CaptureError {
    pub fn fetch_failed(stream: impl Into<String>, reason: impl Into<String>) -> Self {
        CaptureError::CaptureFetchFailed {
            stream: stream.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_error_display() {
        let err = CaptureError::PairTimeout { trigger_id: 3 };
        assert_eq!(err.to_string(), "Timed out waiting for frame pair of trigger 3");

        let err = CaptureError::fetch_failed("left", "timeout");
        assert_eq!(err.to_string(), "Frame fetch failed on left: timeout");

        let err = CaptureError::WorkerStopped(StreamId::Right);
        assert_eq!(err.to_string(), "Capture worker for right stream stopped");
    }
}
