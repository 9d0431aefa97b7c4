//! 输入验证模块
//!
//! 命令行参数在下发到云台之前的检查

use anyhow::Result;
use ptz_sdk::Axis;
use ptz_sdk::scan::GridConfig;
use std::path::Path;

/// 单次扫描允许的最大位置数
pub const MAX_GRID_POSITIONS: usize = 10_000;

/// 验证单轴角度
///
/// # 错误
/// 角度为 NaN/无穷大，或超出该轴的协议范围
pub fn validate_angle(axis: Axis, degrees: f64) -> Result<()> {
    if !degrees.is_finite() {
        anyhow::bail!("{} 角度无效: {}", axis, degrees);
    }
    if !axis.contains(degrees) {
        let (min, max) = axis.range();
        anyhow::bail!("{} 角度 {:.2}° 超出范围 [{}, {}]", axis, degrees, min, max);
    }
    Ok(())
}

/// 验证网格配置
pub fn validate_grid(grid: &GridConfig) -> Result<()> {
    let values = [
        ("center_pan", grid.center_pan),
        ("center_tilt", grid.center_tilt),
        ("h_fov", grid.h_fov),
        ("v_fov", grid.v_fov),
    ];
    for (name, value) in values {
        if !value.is_finite() {
            anyhow::bail!("网格参数 {} 无效: {}", name, value);
        }
    }
    if grid.h_fov < 0.0 || grid.v_fov < 0.0 {
        anyhow::bail!("视场角不能为负数");
    }
    if grid.is_empty() {
        anyhow::bail!("网格为空（h_count = {}, v_count = {}）", grid.h_count, grid.v_count);
    }
    if grid.len() > MAX_GRID_POSITIONS {
        anyhow::bail!("网格过大：{} 个位置（上限 {}）", grid.len(), MAX_GRID_POSITIONS);
    }
    Ok(())
}

/// 验证输出目录：不存在时允许创建，存在时必须是目录
pub fn validate_output_dir(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        anyhow::bail!("输出目录为空");
    }
    if path.exists() && !path.is_dir() {
        anyhow::bail!("输出路径不是目录: {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_angle() {
        assert!(validate_angle(Axis::Pan, 359.0).is_ok());
        assert!(validate_angle(Axis::Pan, 400.0).is_err());
        assert!(validate_angle(Axis::Tilt, 180.0).is_ok());
        assert!(validate_angle(Axis::Tilt, -1.0).is_err());
        assert!(validate_angle(Axis::Tilt, f64::NAN).is_err());
    }

    #[test]
    fn test_validate_grid() {
        assert!(validate_grid(&GridConfig::default()).is_ok());

        let empty = GridConfig {
            v_count: 0,
            ..Default::default()
        };
        assert!(validate_grid(&empty).is_err());

        let negative = GridConfig {
            h_fov: -10.0,
            ..Default::default()
        };
        assert!(validate_grid(&negative).is_err());

        let huge = GridConfig {
            h_count: 1000,
            v_count: 1000,
            ..Default::default()
        };
        assert!(validate_grid(&huge).is_err());
    }

    #[test]
    fn test_validate_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_output_dir(dir.path()).is_ok());
        assert!(validate_output_dir(&dir.path().join("new")).is_ok());

        let file = dir.path().join("file.txt");
        std::fs::write(&file, b"x").unwrap();
        assert!(validate_output_dir(&file).is_err());
        assert!(validate_output_dir(Path::new("")).is_err());
    }
}
