//! 轴与位姿类型

use std::fmt;

/// 云台轴
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Axis {
    /// 水平（平移）
    Pan,
    /// 俯仰（倾斜）
    Tilt,
}

impl Axis {
    /// 可下发的角度范围（度，闭区间）
    ///
    /// - Pan: `[0, 359]`
    /// - Tilt: `[0, 180]`
    pub const fn range(self) -> (f64, f64) {
        match self {
            Axis::Pan => (0.0, 359.0),
            Axis::Tilt => (0.0, 180.0),
        }
    }

    /// 角度是否可下发（NaN 视为越界）
    pub fn contains(self, degrees: f64) -> bool {
        let (min, max) = self.range();
        (min..=max).contains(&degrees)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Axis::Pan => "pan",
            Axis::Tilt => "tilt",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 云台位姿（度）
///
/// 不可变值类型：`pan ∈ [0, 360)`，`tilt ∈ [0, 180]`。
/// 构造时不做校验，范围检查发生在下发命令时（见 [`crate::encode_degrees`]）。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose {
    pub pan: f64,
    pub tilt: f64,
}

impl Pose {
    pub const fn new(pan: f64, tilt: f64) -> Self {
        Self { pan, tilt }
    }

    /// 按轴取分量
    pub const fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Pan => self.pan,
            Axis::Tilt => self.tilt,
        }
    }

    /// 两个分量是否都在 `tolerance` 度以内
    pub fn within(&self, other: &Pose, tolerance: f64) -> bool {
        (self.pan - other.pan).abs() < tolerance && (self.tilt - other.tilt).abs() < tolerance
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(pan={:.2}°, tilt={:.2}°)", self.pan, self.tilt)
    }
}

impl From<(f64, f64)> for Pose {
    fn from((pan, tilt): (f64, f64)) -> Self {
        Self { pan, tilt }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_range() {
        assert!(Axis::Pan.contains(0.0));
        assert!(Axis::Pan.contains(359.0));
        assert!(!Axis::Pan.contains(359.5));
        assert!(!Axis::Pan.contains(-0.1));
        assert!(Axis::Tilt.contains(180.0));
        assert!(!Axis::Tilt.contains(180.01));
        assert!(!Axis::Tilt.contains(f64::NAN));
    }

    #[test]
    fn test_pose_within() {
        let a = Pose::new(60.0, 10.0);
        assert!(a.within(&Pose::new(60.3, 9.8), 0.5));
        assert!(!a.within(&Pose::new(61.0, 10.0), 0.5));
        assert!(!a.within(&Pose::new(60.0, 10.5), 0.5));
    }

    #[test]
    fn test_pose_get_and_display() {
        let p = Pose::from((120.0, 50.0));
        assert_eq!(p.get(Axis::Pan), 120.0);
        assert_eq!(p.get(Axis::Tilt), 50.0);
        assert_eq!(p.to_string(), "(pan=120.00°, tilt=50.00°)");
    }
}
