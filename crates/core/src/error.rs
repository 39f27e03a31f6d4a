//! 请求查找错误类型

/// 调用链中找不到活动请求
///
/// 这是查找操作唯一的失败类型，由调用方决定视为致命错误还是可恢复的缺省。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestNotFound {
    /// 当前执行上下文没有任何调用帧
    #[error("无法找到当前请求：调用链为空")]
    EmptyChain,

    /// 遍历完全部调用帧仍未匹配
    #[error("无法找到当前请求：已检查 {scanned} 个调用帧")]
    Exhausted { scanned: usize },

    /// 命中 RequestHandler 帧，但该帧没有 request 绑定
    #[error("无法找到当前请求：处理器帧 `{frame}` 缺少 request 绑定")]
    MissingBinding { frame: String },
}

pub type Result<T> = std::result::Result<T, RequestNotFound>;
