//! 扫描配置
//!
//! 所有字段都有默认值，配置文件（TOML）只需写出需要覆盖的部分：
//!
//! ```toml
//! output_dir = "/data/calib/session-01"
//!
//! [grid]
//! h_fov = 55.0
//! h_count = 10
//!
//! [verifier]
//! policy = "within_tolerance"
//! ```

use crate::error::ScanError;
use crate::grid::GridConfig;
use ptz_capture::CaptureConfig;
use ptz_driver::VerifierConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 未到位时是否仍然采集
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapturePolicy {
    /// 总是尝试采集（尽力而为）
    #[default]
    Always,
    /// 只在确认到位后采集
    OnlyWhenReached,
}

/// 扫描配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub grid: GridConfig,
    pub verifier: VerifierConfig,
    pub capture: CaptureConfig,
    pub capture_policy: CapturePolicy,
    /// 到位确认后、读取实际位姿前的等待（毫秒）
    pub post_move_delay_ms: u64,
    /// 触发采集前的额外稳定等待（毫秒）
    pub capture_settle_ms: u64,
    /// 等待帧对的超时（毫秒），必须大于 `capture.fetch_timeout_ms`
    pub pair_timeout_ms: u64,
    /// 扫描开始前下发的曝光（微秒）
    pub exposure_us: Option<f64>,
    /// 扫描开始前下发的增益（dB）
    pub gain_db: Option<f64>,
    /// 帧对保存目录
    pub output_dir: PathBuf,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            verifier: VerifierConfig::default(),
            capture: CaptureConfig::default(),
            capture_policy: CapturePolicy::Always,
            post_move_delay_ms: 500,
            capture_settle_ms: 0,
            pair_timeout_ms: 15_000,
            exposure_us: None,
            gain_db: None,
            output_dir: default_output_dir(),
        }
    }
}

/// `$HOME/DCIM`，取不到 HOME 时为 `./DCIM`
pub fn default_output_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("DCIM")
}

impl ScanConfig {
    pub fn pair_timeout(&self) -> Duration {
        Duration::from_millis(self.pair_timeout_ms)
    }

    pub fn post_move_delay(&self) -> Duration {
        Duration::from_millis(self.post_move_delay_ms)
    }

    pub fn capture_settle(&self) -> Duration {
        Duration::from_millis(self.capture_settle_ms)
    }

    /// 检查字段之间的约束：帧对超时必须大于取帧超时，
    /// 否则上一次触发的取帧可能仍占着采集线程，下一次触发无法布防。
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.pair_timeout_ms <= self.capture.fetch_timeout_ms {
            return Err(ScanError::PairTimeoutTooShort {
                pair_timeout_ms: self.pair_timeout_ms,
                fetch_timeout_ms: self.capture.fetch_timeout_ms,
            });
        }
        Ok(())
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ScanError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ScanError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ScanError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ScanError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ptz_capture::{ImageFormat, TriggerMode};
    use ptz_driver::ArrivalPolicy;

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.pair_timeout(), Duration::from_secs(15));
        assert_eq!(config.post_move_delay(), Duration::from_millis(500));
        assert_eq!(config.capture_policy, CapturePolicy::Always);
        assert!(config.output_dir.ends_with("DCIM"));
    }

    #[test]
    fn test_partial_toml() {
        let config = ScanConfig::from_toml_str(
            r#"
            capture_policy = "only_when_reached"

            [grid]
            h_count = 2
            v_count = 3

            [verifier]
            policy = "within_tolerance"

            [capture.image_format]
            type = "png"
            "#,
        )
        .unwrap();

        assert_eq!(config.grid.h_count, 2);
        assert_eq!(config.grid.center_pan, 90.0);
        assert_eq!(config.verifier.policy, ArrivalPolicy::WithinTolerance);
        assert_eq!(config.verifier.timeout_ms, 40_000);
        assert_eq!(config.capture.image_format, ImageFormat::Png);
        assert_eq!(config.capture_policy, CapturePolicy::OnlyWhenReached);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("scan.toml");
        let config = ScanConfig {
            exposure_us: Some(220_000.0),
            gain_db: Some(5.0),
            output_dir: dir.path().join("out"),
            ..Default::default()
        };
        config.save_to_file(&path).unwrap();

        let loaded = ScanConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(
            loaded.capture.trigger_mode,
            TriggerMode::HardwareSync {
                master: ptz_capture::StreamId::Right
            }
        );
    }

    #[test]
    fn test_pair_timeout_must_exceed_fetch_timeout() {
        assert!(ScanConfig::default().validate().is_ok());

        let err = ScanConfig::from_toml_str(
            r#"
            pair_timeout_ms = 5000

            [capture]
            fetch_timeout_ms = 5000
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ScanError::PairTimeoutTooShort {
                pair_timeout_ms: 5000,
                fetch_timeout_ms: 5000
            }
        ));

        let config =
            ScanConfig::from_toml_str("pair_timeout_ms = 3000\n[capture]\nfetch_timeout_ms = 1000")
                .unwrap();
        assert_eq!(config.pair_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            ScanConfig::from_toml_str("grid = 3"),
            Err(ScanError::ConfigParse(_))
        ));
    }
}
