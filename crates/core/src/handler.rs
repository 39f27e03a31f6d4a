//! 处理器能力
//!
//! 调用帧中绑定为 `self` 的值通过 `HasRequest` 暴露两种可识别形态：
//! - 带 `request` 属性的对象（`request()` 返回 `Some`）
//! - 框架的名义处理器类型（`as_request_handler()` 返回 `Some`），
//!   此时请求取自同一帧的 `request` 绑定
//!
//! 两个方法默认都返回 `None`，普通对象实现空 impl 即可。

use crate::request::SharedRequest;

/// 能够提供当前请求的处理器能力
pub trait HasRequest: Send + Sync {
    /// 对象自身携带的请求
    fn request(&self) -> Option<SharedRequest> {
        None
    }

    /// 若对象是框架的请求处理器，返回其名义类型
    fn as_request_handler(&self) -> Option<&RequestHandler> {
        None
    }
}

/// 框架定义的请求处理器类型
///
/// 按类型识别而非按属性识别：它本身不持有请求，请求由入口帧的
/// `request` 绑定提供。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHandler {
    name: String,
}

impl RequestHandler {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl HasRequest for RequestHandler {
    fn as_request_handler(&self) -> Option<&RequestHandler> {
        Some(self)
    }
}
