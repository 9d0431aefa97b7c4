//! 模拟云台
//!
//! 在 [`MockTransport`] 之上实现设备端协议：解析命令帧、更新位姿、应答位置查询。

use super::{MockHandle, MockTransport};
use ptz_protocol::{Axis, CommandFrame, Opcode, Pose, ResponseFrame, decode_degrees};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
struct MountState {
    pose: Pose,
    /// 剩余的"不应答"查询次数（模拟运动中查询失败）
    unanswered_queries: usize,
    /// 应答位置相对真实位置的偏差（度）
    offset: Pose,
    presets: HashMap<u8, Pose>,
    cancels: usize,
    moves: usize,
    queries: usize,
}

/// 模拟云台（Pelco-D 子集）
#[derive(Clone, Default)]
pub struct SimulatedMount {
    state: Arc<Mutex<MountState>>,
}

impl SimulatedMount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pose(self, pose: Pose) -> Self {
        self.update(|s| s.pose = pose);
        self
    }

    /// 前 `n` 次位置查询不应答
    pub fn with_unanswered_queries(self, n: usize) -> Self {
        self.update(|s| s.unanswered_queries = n);
        self
    }

    /// 应答位置附加固定偏差
    pub fn with_offset(self, pan: f64, tilt: f64) -> Self {
        self.update(|s| s.offset = Pose::new(pan, tilt));
        self
    }

    pub fn with_preset(self, preset: u8, pose: Pose) -> Self {
        self.update(|s| {
            s.presets.insert(preset, pose);
        });
        self
    }

    /// 当前（真实）位姿
    pub fn pose(&self) -> Pose {
        self.read(|s| s.pose)
    }

    pub fn move_count(&self) -> usize {
        self.read(|s| s.moves)
    }

    pub fn query_count(&self) -> usize {
        self.read(|s| s.queries)
    }

    pub fn cancel_count(&self) -> usize {
        self.read(|s| s.cancels)
    }

    /// 创建连接到此模拟云台的传输
    pub fn transport(&self) -> (MockTransport, MockHandle) {
        let mount = self.clone();
        MockTransport::with_responder(move |bytes| mount.respond(bytes))
    }

    fn update(&self, f: impl FnOnce(&mut MountState)) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state);
    }

    fn read<R>(&self, f: impl FnOnce(&MountState) -> R) -> R {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    fn respond(&self, bytes: &[u8]) -> Vec<u8> {
        let frame = match CommandFrame::parse(bytes) {
            Ok(frame) if frame.is_valid() => frame,
            Ok(_) => {
                warn!("SimulatedMount: checksum mismatch, ignoring {}", hex::encode(bytes));
                return Vec::new();
            },
            Err(e) => {
                warn!("SimulatedMount: unparsable command ({})", e);
                return Vec::new();
            },
        };

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match frame.opcode() {
            Opcode::SetPan => {
                state.pose.pan = decode_degrees(frame.value());
                state.moves += 1;
                Vec::new()
            },
            Opcode::SetTilt => {
                state.pose.tilt = decode_degrees(frame.value());
                state.moves += 1;
                Vec::new()
            },
            Opcode::QueryPan | Opcode::QueryTilt => {
                state.queries += 1;
                if state.unanswered_queries > 0 {
                    state.unanswered_queries -= 1;
                    return Vec::new();
                }
                let axis = if frame.opcode() == Opcode::QueryPan {
                    Axis::Pan
                } else {
                    Axis::Tilt
                };
                let reported = state.pose.get(axis) + state.offset.get(axis);
                let value = (reported.max(0.0) * 100.0).round() as u16;
                ResponseFrame::position(frame.address(), axis, value)
                    .raw()
                    .to_vec()
            },
            Opcode::GotoPreset => {
                let preset = frame.data()[1];
                match state.presets.get(&preset).copied() {
                    Some(pose) => {
                        state.pose = pose;
                        state.moves += 1;
                    },
                    None => debug!("SimulatedMount: preset {} not stored", preset),
                }
                Vec::new()
            },
            Opcode::Cancel => {
                state.cancels += 1;
                Vec::new()
            },
            Opcode::PanResponse | Opcode::TiltResponse => Vec::new(),
        }
    }
}
