//! 日志初始化
//!
//! `RUST_LOG` 优先；未设置时使用调用方给出的默认指令。
//! 同时把 `log` 记录桥接到 `tracing`。

use tracing_subscriber::EnvFilter;

/// 默认日志指令
pub const DEFAULT_DIRECTIVES: &str =
    "ptz_scan=info,ptz_driver=info,ptz_capture=info,ptz_serial=warn";

pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 构造过滤器：`RUST_LOG` 优先，否则使用 `default_directives`
pub fn env_filter(default_directives: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives))
}

/// 初始化全局订阅者
///
/// 重复调用返回 `Err`（全局订阅者只能设置一次）。
pub fn init_logging(default_directives: &str) -> Result<(), InitError> {
    // 可能已被其他组件设置，忽略
    let _ = tracing_log::LogTracer::init();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_directives))
        .with_target(true)
        .try_init()
}
