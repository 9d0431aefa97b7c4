//! 扫描网格生成
//!
//! 纯函数：同样的配置总是得到同样的位姿序列。
//!
//! 两轴各自在 `[center - fov/2, center + fov/2]` 上均匀插值；外层循环 tilt、内层循环 pan，
//! 相邻位姿优先在 pan 方向变化。pan 回绕到 `[0, 360)`，tilt 饱和到 `[0, 180]`。

use ptz_protocol::Pose;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 网格配置（角度单位：度）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub center_pan: f64,
    pub center_tilt: f64,
    pub h_fov: f64,
    pub v_fov: f64,
    pub h_count: usize,
    pub v_count: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            center_pan: 90.0,
            center_tilt: 30.0,
            h_fov: 60.0,
            v_fov: 40.0,
            h_count: 9,
            v_count: 9,
        }
    }
}

/// 视场角四个角
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Corner::TopLeft => "top-left",
            Corner::TopRight => "top-right",
            Corner::BottomLeft => "bottom-left",
            Corner::BottomRight => "bottom-right",
        }
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Corner {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Corner::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| format!("unknown corner '{}'", s))
    }
}

impl GridConfig {
    /// 位姿总数
    pub fn len(&self) -> usize {
        self.h_count * self.v_count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 左上角：`(center_pan - h_fov/2, center_tilt - v_fov/2)`
    ///
    /// 四个角都不做回绕或饱和。
    pub fn top_left(&self) -> Pose {
        Pose::new(
            self.center_pan - self.h_fov / 2.0,
            self.center_tilt - self.v_fov / 2.0,
        )
    }

    pub fn top_right(&self) -> Pose {
        Pose::new(
            self.center_pan + self.h_fov / 2.0,
            self.center_tilt - self.v_fov / 2.0,
        )
    }

    pub fn bottom_left(&self) -> Pose {
        Pose::new(
            self.center_pan - self.h_fov / 2.0,
            self.center_tilt + self.v_fov / 2.0,
        )
    }

    pub fn bottom_right(&self) -> Pose {
        Pose::new(
            self.center_pan + self.h_fov / 2.0,
            self.center_tilt + self.v_fov / 2.0,
        )
    }

    pub fn corner(&self, corner: Corner) -> Pose {
        match corner {
            Corner::TopLeft => self.top_left(),
            Corner::TopRight => self.top_right(),
            Corner::BottomLeft => self.bottom_left(),
            Corner::BottomRight => self.bottom_right(),
        }
    }

    pub fn corners(&self) -> [(Corner, Pose); 4] {
        Corner::ALL.map(|c| (c, self.corner(c)))
    }
}

/// `n` 个等距点，包含两端；`n == 1` 时为 `[start]`
fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        },
    }
}

/// 生成扫描网格
///
/// 俯仰在外层、水平在内层；水平角折回 `[0, 360)`，俯仰角截断到 `[0, 180]`。
///
/// 云台只接受 `[0, 359]` 的水平角，折回后落在 `(359, 360)` 的点保留在网格中，
/// 移动时以 `OutOfRange` 失败并记录为未到位。
pub fn generate(config: &GridConfig) -> Vec<Pose> {
    let pans = linspace(
        config.center_pan - config.h_fov / 2.0,
        config.center_pan + config.h_fov / 2.0,
        config.h_count,
    );
    let tilts = linspace(
        config.center_tilt - config.v_fov / 2.0,
        config.center_tilt + config.v_fov / 2.0,
        config.v_count,
    );

    tilts
        .iter()
        .flat_map(|&tilt| {
            pans.iter()
                .map(move |&pan| Pose::new(wrap_pan(pan), tilt.clamp(0.0, 180.0)))
        })
        .collect()
}

fn wrap_pan(pan: f64) -> f64 {
    let wrapped = pan.rem_euclid(360.0);
    // rem_euclid 对极小的负数可能舍入到 360.0
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}
