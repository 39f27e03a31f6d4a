//! Plone 应用
//!
//! 加载配置、初始化日志并启动 HTTP 服务。

pub mod config;
pub mod logger;

use std::path::PathBuf;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

pub use config::{AppConfig, ConfigError, ServerConfig};

/// 启动应用，`config_path` 为空时按默认顺序查找配置
pub async fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    logger::init(&config.log_level);
    info!(
        bind = %config.server.bind_addr(),
        request_scope = config.request_scope.enabled,
        "配置已加载"
    );

    let router = plone_server::build_router(config.request_scope.clone(), &config.security);
    let listener = TcpListener::bind(config.server.bind_addr())
        .await
        .with_context(|| format!("无法监听 {}", config.server.bind_addr()))?;
    plone_server::serve(listener, router).await?;
    Ok(())
}
