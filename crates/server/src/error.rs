//! 服务端错误类型

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use plone_core::RequestNotFound;
use serde_json::json;

/// 请求处理错误
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    RequestNotFound(#[from] RequestNotFound),

    #[error("无效的资源路径: {0}")]
    InvalidPath(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            // 作用域中间件未挂载时才会出现，属于服务端配置问题
            ServerError::RequestNotFound(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::InvalidPath(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ServerError::RequestNotFound(_) => "request_not_found",
            ServerError::InvalidPath(_) => "invalid_path",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "type": self.kind(),
                "message": self.to_string(),
            }
        });
        (self.status(), Json(body)).into_response()
    }
}
