use std::sync::OnceLock;

use crate::core::signal::DispatchQueue;

static DISPATCH_QUEUE: OnceLock<DispatchQueue> = OnceLock::new();

/// 进程级默认分发队列
///
/// 第一次访问时创建。`Signal::new()` 与 `Application::new()` 使用它；
/// 需要隔离的场景（如测试）应自行创建 `DispatchQueue`。
pub fn dispatch_queue() -> &'static DispatchQueue {
    DISPATCH_QUEUE.get_or_init(DispatchQueue::new)
}
