//! 帧栈存储
//!
//! 在 `scope` / `scope_with` 内运行的任务使用 task-local 帧栈，
//! 其它代码使用当前线程的帧栈。`enter` 推入的帧在 `FrameGuard`
//! 被丢弃时弹出，包括提前返回和 panic 展开。守卫只弹出自己的帧，
//! 同一线程上交替运行的本地任务不会删掉彼此的帧。
//!
//! 新任务不会继承父任务的帧栈，需要显式传递：
//!
//! ```ignore
//! tokio::spawn(plone_core::scope_with(plone_core::snapshot(), async move {
//!     let request = plone_core::locate_current_request()?;
//!     // ...
//! }));
//! ```

use std::cell::RefCell;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{trace, warn};

use crate::frame::{CallFrame, FrameStack};

tokio::task_local! {
    static TASK_FRAMES: RefCell<FrameStack>;
}

thread_local! {
    static THREAD_FRAMES: RefCell<FrameStack> = RefCell::new(FrameStack::new());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Storage {
    Task,
    Thread,
}

fn active_storage() -> Storage {
    if TASK_FRAMES.try_with(|_| ()).is_ok() {
        Storage::Task
    } else {
        Storage::Thread
    }
}

fn with_storage<R>(storage: Storage, f: impl FnOnce(&RefCell<FrameStack>) -> R) -> Option<R> {
    match storage {
        Storage::Task => TASK_FRAMES.try_with(f).ok(),
        Storage::Thread => THREAD_FRAMES.try_with(f).ok(),
    }
}

/// 对当前活动帧栈执行只读操作
///
/// 借用在闭包返回时释放，闭包内不得调用处理器代码。帧栈正被修改时
/// 视为没有帧栈。
pub(crate) fn with_active_stack<R>(f: impl FnOnce(&FrameStack) -> R) -> Option<R> {
    with_storage(active_storage(), |frames| {
        frames.try_borrow().ok().map(|frames| f(&frames))
    })
    .flatten()
}

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// 推入帧后返回的守卫，丢弃时只弹出自己推入的帧
///
/// 守卫绑定在创建它的线程上，不能跨 `.await` 持有。
#[must_use = "守卫被丢弃时帧会立即弹出"]
#[derive(Debug)]
pub struct FrameGuard {
    storage: Storage,
    depth: usize,
    token: u64,
    _not_send: PhantomData<*const ()>,
}

impl FrameGuard {
    /// 推入前的帧栈深度
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        let token = self.token;
        // 帧在借用释放后才析构，析构中的处理器代码可以重入
        let popped = with_storage(self.storage, |frames| {
            frames
                .try_borrow_mut()
                .ok()
                .and_then(|mut frames| frames.remove_tagged(token))
        })
        .flatten();
        trace!(depth = self.depth, popped = popped.is_some(), "离开调用帧");
        drop(popped);
    }
}

/// 向当前活动帧栈推入一个帧
pub fn enter(frame: CallFrame) -> FrameGuard {
    let storage = active_storage();
    let token = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);
    let label = frame.label().to_string();
    let depth = with_storage(storage, |frames| match frames.try_borrow_mut() {
        Ok(mut frames) => {
            let depth = frames.len();
            frames.push_tagged(token, frame);
            Some(depth)
        }
        Err(_) => None,
    })
    .flatten();
    match depth {
        Some(depth) => trace!(frame = %label, depth, storage = ?storage, "进入调用帧"),
        None => warn!(frame = %label, storage = ?storage, "帧栈不可用，未推入调用帧"),
    }
    FrameGuard {
        storage,
        depth: depth.unwrap_or(0),
        token,
        _not_send: PhantomData,
    }
}

/// 以空的 task-local 帧栈运行 `fut`
pub fn scope<F: Future>(fut: F) -> impl Future<Output = F::Output> {
    scope_with(FrameStack::new(), fut)
}

/// 以给定的初始帧栈运行 `fut`
pub fn scope_with<F: Future>(stack: FrameStack, fut: F) -> impl Future<Output = F::Output> {
    TASK_FRAMES.scope(RefCell::new(stack), fut)
}

/// 复制当前活动帧栈
pub fn snapshot() -> FrameStack {
    with_active_stack(FrameStack::clone).unwrap_or_default()
}

/// 当前活动帧栈的深度
pub fn depth() -> usize {
    with_active_stack(FrameStack::len).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{HasRequest, RequestHandler};
    use crate::request::Request;
    use crate::scanner::{locate_current_request, try_current_request};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tokio::sync::oneshot;
    use tokio::task::LocalSet;

    #[test]
    fn test_guard_pops_frame() {
        let base = depth();
        {
            let _outer = enter(CallFrame::new("outer"));
            assert_eq!(depth(), base + 1);
            {
                let inner = enter(CallFrame::new("inner"));
                assert_eq!(inner.depth(), base + 1);
                assert_eq!(depth(), base + 2);
            }
            assert_eq!(depth(), base + 1);
        }
        assert_eq!(depth(), base);
    }

    #[test]
    fn test_out_of_order_drop_removes_own_frame() {
        let base = depth();
        let outer = enter(CallFrame::new("outer"));
        let inner = enter(CallFrame::new("inner"));
        drop(outer);
        assert_eq!(depth(), base + 1);
        assert_eq!(
            snapshot().iter_innermost().next().map(CallFrame::label),
            Some("inner")
        );
        drop(inner);
        assert_eq!(depth(), base);
    }

    /// 析构时查找当前请求并推入帧
    struct LooksUpOnDrop {
        looked_up: Arc<AtomicBool>,
    }

    impl HasRequest for LooksUpOnDrop {}

    impl Drop for LooksUpOnDrop {
        fn drop(&mut self) {
            let _guard = enter(CallFrame::new("teardown"));
            let found = try_current_request();
            self.looked_up.store(found.is_some(), Ordering::SeqCst);
        }
    }

    #[test]
    fn test_frame_drop_may_reenter_lookup() {
        let base = depth();
        let request = Request::builder("GET", "/db/outer").shared();
        let _outer = enter(CallFrame::handler(RequestHandler::new("http"), request));
        let looked_up = Arc::new(AtomicBool::new(false));
        let guard = enter(CallFrame::new("LooksUpOnDrop::call").with_self(Arc::new(
            LooksUpOnDrop {
                looked_up: looked_up.clone(),
            },
        )));
        drop(guard);
        assert!(looked_up.load(Ordering::SeqCst));
        assert_eq!(depth(), base + 1);
    }

    #[test]
    fn test_guard_pops_on_panic() {
        let base = depth();
        let result = std::panic::catch_unwind(|| {
            let _guard = enter(CallFrame::new("panicking"));
            panic!("boom");
        });
        assert!(result.is_err());
        assert_eq!(depth(), base);
    }

    #[test]
    fn test_snapshot_copies_frames() {
        let _guard = enter(CallFrame::new("handler"));
        let copy = snapshot();
        assert_eq!(copy.len(), depth());
        assert_eq!(
            copy.iter_innermost().next().map(CallFrame::label),
            Some("handler")
        );
    }

    #[tokio::test]
    async fn test_task_scope_is_isolated_from_thread() {
        let _thread_guard = enter(CallFrame::new("thread"));
        let thread_depth = depth();

        let inside = scope(async {
            assert_eq!(depth(), 0);
            let _guard = enter(CallFrame::new("task"));
            depth()
        })
        .await;

        assert_eq!(inside, 1);
        assert_eq!(depth(), thread_depth);
    }

    #[tokio::test]
    async fn test_scope_with_initial_stack_survives_await() {
        let stack = FrameStack::with_frame(CallFrame::new("entry"));
        let labels = scope_with(stack, async {
            tokio::task::yield_now().await;
            snapshot()
                .iter_innermost()
                .map(|frame| frame.label().to_string())
                .collect::<Vec<_>>()
        })
        .await;
        assert_eq!(labels, vec!["entry".to_string()]);
    }

    #[tokio::test]
    async fn test_interleaved_local_tasks_keep_own_frames() {
        let local = LocalSet::new();
        let (before, after) = local
            .run_until(async {
                let (entered_tx, entered_rx) = oneshot::channel::<()>();
                let (release_tx, release_rx) = oneshot::channel::<()>();

                let task_a = tokio::task::spawn_local(async move {
                    let request = Request::builder("GET", "/a").shared();
                    let _guard = enter(CallFrame::handler(RequestHandler::new("a"), request));
                    let _ = entered_tx.send(());
                    let _ = release_rx.await;
                });

                let task_b = tokio::task::spawn_local(async move {
                    let _ = entered_rx.await;
                    let request = Request::builder("GET", "/b").shared();
                    let _guard = enter(CallFrame::handler(RequestHandler::new("b"), request));
                    let before = locate_current_request().map(|r| r.path().to_string());
                    let _ = release_tx.send(());
                    task_a.await.unwrap();
                    let after = locate_current_request().map(|r| r.path().to_string());
                    (before, after)
                });

                task_b.await.unwrap()
            })
            .await;

        assert_eq!(before.unwrap(), "/b");
        assert_eq!(after.unwrap(), "/b");
        assert_eq!(depth(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_spawned_task_with_snapshot() {
        let stack = FrameStack::with_frame(CallFrame::new("parent"));
        let child_depth = scope_with(stack, async {
            tokio::spawn(scope_with(snapshot(), async { depth() }))
                .await
                .unwrap()
        })
        .await;
        assert_eq!(child_depth, 1);
    }
}
