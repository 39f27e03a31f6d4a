//! 日志初始化

use std::str::FromStr;
use tracing::Level;

/// 初始化全局 fmt 订阅者，无法识别的级别回退到 info
pub fn init(level: &str) {
    let level = parse_level(level);
    let result = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
    if result.is_err() {
        tracing::debug!("日志订阅者已初始化，跳过");
    }
}

fn parse_level(level: &str) -> Level {
    Level::from_str(level.trim()).unwrap_or(Level::INFO)
}
