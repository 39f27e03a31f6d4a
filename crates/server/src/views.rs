//! 视图
//!
//! 视图持有自己的请求（带 `request` 属性的处理器形态）。渲染时把视图
//! 作为 `self` 推入调用帧，渲染链深处的代码就会取到视图的请求，
//! 而不是外层 HTTP 入口帧的请求。

use std::sync::Arc;

use plone_core::{
    enter, locate_current_request, CallFrame, HasRequest, RequestSummary, SharedRequest,
};
use serde::Serialize;

use crate::error::ServerError;
use crate::url::{absolute_url, UrlMode};

/// 资源 URL 视图
#[derive(Debug)]
pub struct ResourceView {
    request: SharedRequest,
    resource_path: String,
}

/// 资源 URL 视图的输出
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceUrl {
    pub path: String,
    pub url: String,
    pub request_id: String,
}

impl ResourceView {
    pub fn new(request: SharedRequest, resource_path: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            request,
            resource_path: resource_path.into(),
        })
    }

    /// 以当前请求创建视图
    pub fn for_current(resource_path: impl Into<String>) -> Result<Arc<Self>, ServerError> {
        Ok(Self::new(locate_current_request()?, resource_path))
    }

    pub fn render(self: &Arc<Self>, mode: UrlMode) -> Result<ResourceUrl, ServerError> {
        let _frame = enter(CallFrame::new("ResourceView::render").with_self(self.clone()));
        let url = absolute_url(&self.resource_path, mode, None)?;
        let request = locate_current_request()?;
        Ok(ResourceUrl {
            path: self.resource_path.clone(),
            url,
            request_id: request.id().to_string(),
        })
    }
}

impl HasRequest for ResourceView {
    fn request(&self) -> Option<SharedRequest> {
        Some(self.request.clone())
    }
}

/// 描述当前请求，供调用链深处的服务代码使用
pub fn describe_current() -> Result<RequestSummary, ServerError> {
    let request = locate_current_request()?;
    Ok(request.summary())
}
