//! 当前请求查找
//!
//! 由内向外遍历活动帧栈，对每个帧按固定顺序检查 `self`：
//! 1. `self` 带 `request` 属性时返回该属性
//! 2. 否则 `self` 是 `RequestHandler` 时返回同一帧的 `request` 绑定
//! 3. 否则继续检查外层帧
//!
//! 第一个命中的帧即为结果，外层帧不再检查。查找本身不推入帧，
//! 因此结果总是来自调用方之上的帧。

use tracing::{debug, trace, warn};

use crate::error::{RequestNotFound, Result};
use crate::frame::{CallFrame, FrameLocals};
use crate::request::SharedRequest;
use crate::scope;

/// 单个帧的检查结果
enum Verdict {
    Found(SharedRequest),
    MissingBinding,
    Skip,
}

fn inspect(locals: &FrameLocals) -> Verdict {
    let Some(this) = locals.this.as_ref() else {
        return Verdict::Skip;
    };
    if let Some(request) = this.request() {
        return Verdict::Found(request);
    }
    if this.as_request_handler().is_some() {
        return match locals.request.as_ref() {
            Some(request) => Verdict::Found(request.clone()),
            None => Verdict::MissingBinding,
        };
    }
    Verdict::Skip
}

/// 帧链扫描器
pub struct StackScanner;

impl StackScanner {
    /// 扫描由内向外排列的帧序列
    pub fn scan<'a, I>(frames: I) -> Result<SharedRequest>
    where
        I: IntoIterator<Item = &'a CallFrame>,
    {
        let mut scanned = 0;
        for frame in frames {
            scanned += 1;
            match inspect(frame.locals()) {
                Verdict::Found(request) => {
                    trace!(frame = %frame.label(), scanned, "命中请求帧");
                    return Ok(request);
                }
                Verdict::MissingBinding => {
                    return Err(missing_binding(frame.label()));
                }
                Verdict::Skip => {}
            }
        }
        Err(exhausted(scanned))
    }

    /// 扫描当前执行上下文的活动帧栈
    pub fn scan_current() -> Result<SharedRequest> {
        let depth = scope::depth();
        for (scanned, index) in (0..depth).rev().enumerate() {
            // 先复制绑定并释放帧栈借用，处理器代码可能重入
            let Some(locals) = frame_locals(index) else {
                return Err(exhausted(scanned));
            };
            match inspect(&locals) {
                Verdict::Found(request) => {
                    trace!(index, scanned = scanned + 1, "命中请求帧");
                    return Ok(request);
                }
                Verdict::MissingBinding => {
                    let label = frame_label(index).unwrap_or_default();
                    return Err(missing_binding(&label));
                }
                Verdict::Skip => {}
            }
        }
        Err(exhausted(depth))
    }
}

fn frame_locals(index: usize) -> Option<FrameLocals> {
    scope::with_active_stack(|stack| stack.get(index).map(|frame| frame.locals().clone())).flatten()
}

fn frame_label(index: usize) -> Option<String> {
    scope::with_active_stack(|stack| stack.get(index).map(|frame| frame.label().to_string()))
        .flatten()
}

fn missing_binding(label: &str) -> RequestNotFound {
    warn!(frame = %label, "RequestHandler 帧缺少 request 绑定");
    RequestNotFound::MissingBinding {
        frame: label.to_string(),
    }
}

fn exhausted(scanned: usize) -> RequestNotFound {
    debug!(scanned, "调用链中没有活动请求");
    if scanned == 0 {
        RequestNotFound::EmptyChain
    } else {
        RequestNotFound::Exhausted { scanned }
    }
}

/// 返回调用链中最内层处理器关联的请求
pub fn locate_current_request() -> Result<SharedRequest> {
    StackScanner::scan_current()
}

/// 与 `locate_current_request` 相同，找不到时返回 `None`
pub fn try_current_request() -> Option<SharedRequest> {
    locate_current_request().ok()
}

/// 优先使用显式传入的请求，否则查找当前请求
pub fn resolve_request(explicit: Option<SharedRequest>) -> Result<SharedRequest> {
    match explicit {
        Some(request) => Ok(request),
        None => locate_current_request(),
    }
}
