//! 请求作用域中间件
//!
//! 把每个 HTTP 请求转换为 `plone_core::Request`，并在以处理器入口帧
//! 初始化的 task-local 帧栈中运行后续处理链。请求结束时帧栈随任务
//! 作用域一起释放，下游代码通过 `locate_current_request` 取得请求。

use axum::extract::{Request as HttpRequest, State};
use axum::http::header::{HeaderName, HeaderValue, HOST};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use plone_core::{scope_with, CallFrame, FrameStack, Request, RequestHandler, SharedRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// 请求作用域配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestScopeConfig {
    /// 是否为请求建立作用域
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// 请求 ID header，值可解析为 UUID 时沿用，响应中回写
    #[serde(default = "default_request_id_header")]
    pub request_id_header: String,
    /// 入口帧中 RequestHandler 的名称
    #[serde(default = "default_handler_name")]
    pub handler_name: String,
}

fn default_enabled() -> bool {
    true
}
fn default_request_id_header() -> String {
    "X-Request-Id".to_string()
}
fn default_handler_name() -> String {
    "plone.http".to_string()
}

impl Default for RequestScopeConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            request_id_header: default_request_id_header(),
            handler_name: default_handler_name(),
        }
    }
}

/// axum 中间件：`from_fn_with_state(Arc<RequestScopeConfig>, request_scope)`
pub async fn request_scope(
    State(config): State<Arc<RequestScopeConfig>>,
    mut req: HttpRequest,
    next: Next,
) -> Response {
    if !config.enabled {
        return next.run(req).await;
    }

    let request: SharedRequest = Arc::new(to_request(&config, &req));
    req.extensions_mut().insert(request.clone());
    debug!(
        request_id = %request.id(),
        method = %request.method(),
        path = %request.path(),
        "进入请求作用域"
    );

    let request_id = request.id();
    let frame = CallFrame::handler(RequestHandler::new(config.handler_name.clone()), request);
    let mut response = scope_with(FrameStack::with_frame(frame), next.run(req)).await;

    match (
        HeaderName::from_bytes(config.request_id_header.as_bytes()),
        HeaderValue::from_str(&request_id.to_string()),
    ) {
        (Ok(name), Ok(value)) => {
            response.headers_mut().insert(name, value);
        }
        _ => warn!(header = %config.request_id_header, "无效的请求 ID header 名称"),
    }
    response
}

/// 从 HTTP 请求构建核心请求对象
pub fn to_request(config: &RequestScopeConfig, req: &HttpRequest) -> Request {
    let headers = req.headers();
    let host = header_str(headers, HOST.as_str())
        .or_else(|| req.uri().host())
        .unwrap_or("localhost");
    let scheme = header_str(headers, "x-forwarded-proto")
        .or_else(|| req.uri().scheme_str())
        .unwrap_or("http");

    let mut builder = Request::builder(req.method().as_str(), req.uri().path())
        .host(host)
        .scheme(scheme);
    if let Some(id) =
        header_str(headers, &config.request_id_header).and_then(|v| Uuid::parse_str(v).ok())
    {
        builder = builder.id(id);
    }
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            builder = builder.header(name.as_str(), value);
        }
    }
    builder.build()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
