//! Plone HTTP 服务
//!
//! 基于 axum 的 HTTP 层：为每个请求建立当前请求作用域，
//! 并提供依赖当前请求的视图和 URL 计算。

pub mod error;
pub mod middleware;
pub mod router;
pub mod url;
pub mod views;

pub use error::ServerError;
pub use middleware::{RequestScopeConfig, SecurityMiddlewareConfig};
pub use router::build_router;
pub use url::{absolute_url, UrlMode};
pub use views::{describe_current, ResourceUrl, ResourceView};

use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

/// 在给定监听器上运行服务，直到收到 Ctrl-C
pub async fn serve(listener: TcpListener, router: Router) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "HTTP 服务已启动");
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("收到退出信号，正在关闭 HTTP 服务");
    }
}
