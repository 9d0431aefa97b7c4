//! 位置查询命令

use crate::connection::ConnectionArgs;
use anyhow::Result;
use clap::Args;
use ptz_sdk::driver::VerifierConfig;

/// 位置查询命令参数
#[derive(Args, Debug)]
pub struct PositionCommand {
    /// 输出格式（table / json）
    #[arg(short, long, default_value = "table")]
    pub format: String,
}

fn axis_text(value: Option<f64>) -> String {
    value.map_or_else(|| "无应答".to_string(), |v| format!("{:.2}°", v))
}

impl PositionCommand {
    pub fn execute(&self, connection: &ConnectionArgs) -> Result<()> {
        let mut mount = connection.connect(VerifierConfig::default())?;

        println!("⏳ 正在查询位姿...");
        let (pan, tilt) = mount.current_pose();

        match self.format.as_str() {
            "json" => {
                let value = serde_json::json!({ "pan": pan, "tilt": tilt });
                println!("{}", value);
            },
            "table" => {
                println!("📊 当前位姿:");
                println!("  pan:  {}", axis_text(pan));
                println!("  tilt: {}", axis_text(tilt));
            },
            other => anyhow::bail!("未知输出格式: {}（可选 table / json）", other),
        }

        if pan.is_none() && tilt.is_none() {
            anyhow::bail!("云台无应答");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_text() {
        assert_eq!(axis_text(Some(12.5)), "12.50°");
        assert_eq!(axis_text(None), "无应答");
    }
}
