//! 安全检查模块
//!
//! 大范围扫描开始前要求用户确认

use anyhow::Result;
use ptz_sdk::ScanConfig;
use std::time::Duration;

/// 超过该位置数的扫描需要确认
pub const CONFIRM_ABOVE_POSITIONS: usize = 25;

/// 估算扫描耗时的下限（不含串口往返与采集本身）
pub fn estimate_duration(config: &ScanConfig) -> Duration {
    let per_position_ms = config.verifier.settle_delay_ms
        + 2 * config.verifier.inter_axis_delay_ms
        + config.post_move_delay_ms
        + config.capture_settle_ms;
    Duration::from_millis(per_position_ms * config.grid.len() as u64)
}

/// 检查是否需要用户确认
pub fn requires_confirmation(config: &ScanConfig, assume_yes: bool) -> bool {
    !assume_yes && config.grid.len() > CONFIRM_ABOVE_POSITIONS
}

/// 显示确认提示
pub fn confirm_scan(config: &ScanConfig) -> Result<bool> {
    println!("⚠️  大范围扫描");
    println!("  位置数: {}", config.grid.len());
    println!("  预计至少: {:.0} 秒", estimate_duration(config).as_secs_f64());

    // ✅ 使用 inquire 提供更好的交互体验
    let confirmed = inquire::Confirm::new("确定要开始扫描吗？")
        .with_default(false)
        .prompt()
        .map_err(|e| anyhow::anyhow!("用户交互失败: {}", e))?;

    Ok(confirmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ptz_sdk::scan::GridConfig;

    #[test]
    fn test_requires_confirmation() {
        let mut config = ScanConfig::default();
        assert!(requires_confirmation(&config, false));
        assert!(!requires_confirmation(&config, true));

        config.grid = GridConfig {
            h_count: 2,
            v_count: 2,
            ..Default::default()
        };
        assert!(!requires_confirmation(&config, false));
    }

    #[test]
    fn test_estimate_duration() {
        let config = ScanConfig::default();
        // (1000 + 200 + 500 + 0) ms × 81
        assert_eq!(estimate_duration(&config), Duration::from_millis(1700 * 81));
    }
}
