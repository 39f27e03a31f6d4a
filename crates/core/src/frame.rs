//! 调用帧
//!
//! 帧栈按进入顺序保存（最外层在前），扫描时由内向外遍历。

use std::fmt;
use std::sync::Arc;

use crate::handler::{HasRequest, RequestHandler};
use crate::request::SharedRequest;

/// 一个调用帧的局部绑定
///
/// 只有 `self` 与 `request` 两个标识符对查找有意义。
#[derive(Clone, Default)]
pub struct FrameLocals {
    /// 绑定为 `self` 的值
    pub this: Option<Arc<dyn HasRequest>>,
    /// 绑定为 `request` 的值
    pub request: Option<SharedRequest>,
}

impl fmt::Debug for FrameLocals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameLocals")
            .field("this", &self.this.as_ref().map(|_| "<self>"))
            .field("request", &self.request.as_ref().map(|r| r.id()))
            .finish()
    }
}

/// 活动调用链中的一个帧
#[derive(Debug, Clone)]
pub struct CallFrame {
    label: String,
    locals: FrameLocals,
}

impl CallFrame {
    /// 创建不带任何绑定的帧
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            locals: FrameLocals::default(),
        }
    }

    /// 处理器入口帧：`self` 为 RequestHandler，`request` 为正在处理的请求
    pub fn handler(handler: RequestHandler, request: SharedRequest) -> Self {
        let label = format!("{}::handle", handler.name());
        Self::new(label)
            .with_self(Arc::new(handler))
            .with_request(request)
    }

    pub fn with_self(mut self, this: Arc<dyn HasRequest>) -> Self {
        self.locals.this = Some(this);
        self
    }

    pub fn with_request(mut self, request: SharedRequest) -> Self {
        self.locals.request = Some(request);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn locals(&self) -> &FrameLocals {
        &self.locals
    }
}

/// 帧栈（最外层在前）
#[derive(Debug, Clone, Default)]
pub struct FrameStack {
    frames: Vec<Slot>,
}

/// 帧及其推入令牌，0 表示不属于任何守卫
#[derive(Debug, Clone)]
struct Slot {
    token: u64,
    frame: CallFrame,
}

impl FrameStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frame(frame: CallFrame) -> Self {
        let mut stack = Self::new();
        stack.push(frame);
        stack
    }

    pub fn push(&mut self, frame: CallFrame) {
        self.push_tagged(0, frame);
    }

    pub(crate) fn push_tagged(&mut self, token: u64, frame: CallFrame) {
        self.frames.push(Slot { token, frame });
    }

    /// 取出带 `token` 的帧，其它帧保持原位
    pub(crate) fn remove_tagged(&mut self, token: u64) -> Option<CallFrame> {
        let index = self.frames.iter().rposition(|slot| slot.token == token)?;
        Some(self.frames.remove(index).frame)
    }

    pub fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth);
    }

    /// 拆出 `depth` 及之后的帧
    pub fn split_off(&mut self, depth: usize) -> FrameStack {
        let depth = depth.min(self.frames.len());
        Self {
            frames: self.frames.split_off(depth),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// 第 `index` 个帧，0 为最外层
    pub fn get(&self, index: usize) -> Option<&CallFrame> {
        self.frames.get(index).map(|slot| &slot.frame)
    }

    /// 由内向外遍历
    pub fn iter_innermost(&self) -> impl Iterator<Item = &CallFrame> {
        self.frames.iter().rev().map(|slot| &slot.frame)
    }
}

impl FromIterator<CallFrame> for FrameStack {
    fn from_iter<I: IntoIterator<Item = CallFrame>>(iter: I) -> Self {
        let mut stack = Self::new();
        for frame in iter {
            stack.push(frame);
        }
        stack
    }
}
