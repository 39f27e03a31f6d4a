//! 路由
//!
//! 所有路由都运行在请求作用域中间件之内。

use axum::extract::{Path, Query};
use axum::routing::get;
use axum::{middleware, Extension, Json, Router};
use plone_core::{RequestSummary, SharedRequest};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::ServerError;
use crate::middleware::{request_scope, RequestScopeConfig, SecurityMiddlewareConfig};
use crate::url::UrlMode;
use crate::views::{describe_current, ResourceUrl, ResourceView};

/// 构建应用路由
pub fn build_router(scope: RequestScopeConfig, security: &SecurityMiddlewareConfig) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/@current", get(current_request))
        .route("/:db/@url/*path", get(resource_url))
        .layer(middleware::from_fn_with_state(Arc::new(scope), request_scope));
    security.apply(router)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Serialize)]
struct CurrentRequestResponse {
    #[serde(flatten)]
    summary: RequestSummary,
    /// 作用域查找结果与请求扩展中的请求是否为同一对象
    matches_extension: bool,
}

async fn current_request(
    extension: Option<Extension<SharedRequest>>,
) -> Result<Json<CurrentRequestResponse>, ServerError> {
    let summary = describe_current()?;
    let matches_extension = extension
        .map(|Extension(request)| request.id() == summary.id)
        .unwrap_or(false);
    Ok(Json(CurrentRequestResponse {
        summary,
        matches_extension,
    }))
}

#[derive(Debug, Deserialize)]
struct UrlQuery {
    #[serde(default)]
    mode: UrlMode,
}

async fn resource_url(
    Path((_db, path)): Path<(String, String)>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<ResourceUrl>, ServerError> {
    let view = ResourceView::for_current(format!("/{path}"))?;
    Ok(Json(view.render(query.mode)?))
}
