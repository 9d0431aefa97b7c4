//! 到位确认
//!
//! 运动命令下发后，轮询两轴位置判断云台是否到位。
//!
//! 位置查询在云台运动中经常无应答，因此"到位"的判定由 [`ArrivalPolicy`] 显式选择：
//!
//! - [`ArrivalPolicy::AnyReading`]（默认）：两轴首次都读到即视为到位；
//!   若超出容差只记录偏差警告。
//! - [`ArrivalPolicy::WithinTolerance`]：必须读到容差内的位置，否则继续轮询直到超时。

use crate::client::MountClient;
use ptz_protocol::{Axis, Pose};
use ptz_serial::Transport;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// 到位判定策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrivalPolicy {
    /// 任意一次完整读数即视为到位（尽力而为）
    #[default]
    AnyReading,
    /// 读数必须在容差内
    WithinTolerance,
}

/// 到位确认配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// 开始轮询前的稳定等待（毫秒）
    pub settle_delay_ms: u64,
    /// 每个轴查询前的等待（毫秒）
    pub inter_axis_delay_ms: u64,
    /// 读数失败后的重试间隔（毫秒）
    pub retry_interval_ms: u64,
    /// 总超时（毫秒）
    pub timeout_ms: u64,
    /// 位置容差（度）
    pub tolerance_deg: f64,
    pub policy: ArrivalPolicy,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 1000,
            inter_axis_delay_ms: 100,
            retry_interval_ms: 1000,
            timeout_ms: 40_000,
            tolerance_deg: 0.5,
            policy: ArrivalPolicy::AnyReading,
        }
    }
}

impl VerifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// 到位确认结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrival {
    pub reached: bool,
    /// 最后一次完整读数（两轴都读到）
    pub actual: Option<Pose>,
}

impl Arrival {
    pub const fn unreached() -> Self {
        Self {
            reached: false,
            actual: None,
        }
    }
}

/// 到位确认器
#[derive(Debug, Clone, Default)]
pub struct PoseVerifier {
    config: VerifierConfig,
}

impl PoseVerifier {
    pub fn new(config: VerifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// 确认是否到达 `target`
    pub fn verify<T: Transport>(&self, client: &mut MountClient<T>, target: Pose) -> Arrival {
        self.verify_axes(client, Some(target.pan), Some(target.tilt))
    }

    /// 只对给定的轴做容差比较；`None` 的轴只要求可读
    pub fn verify_axes<T: Transport>(
        &self,
        client: &mut MountClient<T>,
        pan: Option<f64>,
        tilt: Option<f64>,
    ) -> Arrival {
        let config = &self.config;
        spin_sleep::sleep(Duration::from_millis(config.settle_delay_ms));

        let start = Instant::now();
        let mut last = None;
        while start.elapsed() < config.timeout() {
            match self.read_both(client) {
                Some(actual) => {
                    last = Some(actual);
                    let within = within(pan, actual.pan, config.tolerance_deg)
                        && within(tilt, actual.tilt, config.tolerance_deg);
                    if within {
                        debug!("Mount arrived at {}", actual);
                        return Arrival {
                            reached: true,
                            actual: Some(actual),
                        };
                    }
                    match config.policy {
                        ArrivalPolicy::AnyReading => {
                            warn!(
                                "Mount reports {} but target is (pan={:?}, tilt={:?}); accepting reading",
                                actual, pan, tilt
                            );
                            return Arrival {
                                reached: true,
                                actual: Some(actual),
                            };
                        },
                        ArrivalPolicy::WithinTolerance => {
                            debug!("Mount at {}, still outside tolerance", actual);
                        },
                    }
                },
                None => debug!("Waiting for mount to settle..."),
            }
            spin_sleep::sleep(Duration::from_millis(config.retry_interval_ms));
        }

        info!("Mount did not confirm arrival within {:?}", config.timeout());
        Arrival {
            reached: false,
            actual: last,
        }
    }

    /// 契约形式：覆盖超时与容差，只返回是否到位
    pub fn confirm_arrival<T: Transport>(
        &self,
        client: &mut MountClient<T>,
        target: Pose,
        timeout: Duration,
        tolerance: f64,
    ) -> bool {
        let verifier = PoseVerifier::new(VerifierConfig {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            tolerance_deg: tolerance,
            ..self.config.clone()
        });
        verifier.verify(client, target).reached
    }

    fn read_both<T: Transport>(&self, client: &mut MountClient<T>) -> Option<Pose> {
        let pan = self.read_axis(client, Axis::Pan);
        let tilt = self.read_axis(client, Axis::Tilt);
        Some(Pose::new(pan?, tilt?))
    }

    fn read_axis<T: Transport>(&self, client: &mut MountClient<T>, axis: Axis) -> Option<f64> {
        spin_sleep::sleep(Duration::from_millis(self.config.inter_axis_delay_ms));
        client.query_axis(axis).ok()
    }
}

fn within(target: Option<f64>, actual: f64, tolerance: f64) -> bool {
    target.is_none_or(|t| (t - actual).abs() < tolerance)
}
