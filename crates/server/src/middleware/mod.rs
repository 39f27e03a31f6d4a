//! HTTP 中间件
//!
//! - `request_scope` - 为每个请求建立当前请求作用域
//! - `security` - 请求体大小限制与超时

pub mod request_scope;
pub mod security;

pub use request_scope::{request_scope, to_request, RequestScopeConfig};
pub use security::SecurityMiddlewareConfig;
