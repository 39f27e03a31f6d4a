//! Plone Core Crate
//!
//! 请求作用域核心：让调用链深处的代码无需逐层传参即可取得当前活动请求。
//!
//! ## 模块结构
//!
//! - `request` - 请求对象及其注解存储
//! - `handler` - `HasRequest` 能力与 `RequestHandler` 名义类型
//! - `frame` - 调用帧与帧栈
//! - `scope` - 帧栈的 task-local / thread-local 存储与 RAII 守卫
//! - `scanner` - 由内向外的首个匹配查找
//! - `error` - `RequestNotFound` 错误

pub mod error;
pub mod frame;
pub mod handler;
pub mod request;
pub mod scanner;
pub mod scope;

pub use error::{RequestNotFound, Result};
pub use frame::{CallFrame, FrameLocals, FrameStack};
pub use handler::{HasRequest, RequestHandler};
pub use request::{Request, RequestBuilder, RequestSummary, SharedRequest};
pub use scanner::{locate_current_request, resolve_request, try_current_request, StackScanner};
pub use scope::{depth, enter, scope, scope_with, snapshot, FrameGuard};
