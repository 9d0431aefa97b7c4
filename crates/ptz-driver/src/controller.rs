//! 运动控制器
//!
//! 组合 [`MountClient`] 与 [`PoseVerifier`]：下发运动命令并等待到位。

use crate::client::MountClient;
use crate::error::DriverError;
use crate::verifier::{Arrival, PoseVerifier};
use ptz_protocol::Pose;
use ptz_serial::Transport;
use tracing::{info, warn};

/// 运动控制器
pub struct MotionController<T: Transport> {
    client: MountClient<T>,
    verifier: PoseVerifier,
}

impl<T: Transport> MotionController<T> {
    pub fn new(client: MountClient<T>, verifier: PoseVerifier) -> Self {
        Self { client, verifier }
    }

    /// 移动到 `pose` 并等待到位
    pub fn move_to(&mut self, pose: Pose) -> Result<Arrival, DriverError> {
        self.goto_blocked(Some(pose.pan), Some(pose.tilt))
    }

    /// 下发给定轴并阻塞等待到位
    ///
    /// # 错误
    /// 只有命令下发失败（越界、传输错误）返回 `Err`；未到位通过 `Arrival::reached` 表达。
    pub fn goto_blocked(
        &mut self,
        pan: Option<f64>,
        tilt: Option<f64>,
    ) -> Result<Arrival, DriverError> {
        self.client.set_pose(pan, tilt)?;

        info!("Waiting for mount to reach (pan={:?}, tilt={:?})", pan, tilt);
        let arrival = self.verifier.verify_axes(&mut self.client, pan, tilt);
        if arrival.reached {
            info!("Mount reached target");
        } else {
            warn!("Mount did not reach target within {:?}", self.verifier.config().timeout());
        }
        Ok(arrival)
    }

    /// 对已经下发的目标做到位确认
    pub fn verify(&mut self, target: Pose) -> Arrival {
        self.verifier.verify(&mut self.client, target)
    }

    /// 不等待到位，直接下发
    pub fn set_pose(&mut self, pan: Option<f64>, tilt: Option<f64>) -> Result<(), DriverError> {
        self.client.set_pose(pan, tilt)
    }

    pub fn current_pose(&mut self) -> (Option<f64>, Option<f64>) {
        self.client.current_pose()
    }

    pub fn cancel_motion(&mut self) -> Result<(), DriverError> {
        self.client.cancel_motion()
    }

    pub fn go_to_preset(&mut self, preset: u8) -> Result<(), DriverError> {
        self.client.go_to_preset(preset)
    }

    pub fn client(&self) -> &MountClient<T> {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut MountClient<T> {
        &mut self.client
    }

    pub fn verifier(&self) -> &PoseVerifier {
        &self.verifier
    }

    pub fn into_client(self) -> MountClient<T> {
        self.client
    }
}
