//! 安全中间件
//!
//! 请求体大小限制与请求超时，作用于请求作用域之外的最外层。

use axum::Router;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// 安全中间件配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityMiddlewareConfig {
    /// 最大请求体大小（字节），默认 4MB
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    /// 请求超时（秒），0 表示不限制
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_max_body_size() -> usize {
    4 * 1024 * 1024
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for SecurityMiddlewareConfig {
    fn default() -> Self {
        Self {
            max_body_size: default_max_body_size(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl SecurityMiddlewareConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// 为路由挂载请求体限制和超时
    pub fn apply(&self, router: Router) -> Router {
        let router = router.layer(RequestBodyLimitLayer::new(self.max_body_size));
        match self.request_timeout() {
            Some(timeout) => router.layer(TimeoutLayer::new(timeout)),
            None => router,
        }
    }
}
