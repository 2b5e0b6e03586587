//! 信号/槽分发核心
//!
//! 提供类型化的发布/订阅机制，让互不依赖的组件之间通信，而无需直接耦合。
//!
//! # 组成
//!
//! - [`Signal`]：类型化的信号（发射端），按连接顺序保存所有槽
//! - `Slot`：信号内部的连接记录，包含可调用适配器和本次连接的投递方式
//! - `Callable`：统一“绑定到接收者的方法”与“任意闭包”两种形态
//! - [`DispatchQueue`]：排队投递的 FIFO 队列，由主循环统一处理
//! - [`Receiver`] / [`Senders`]：接收者能力，记录哪些信号引用了自己，
//!   析构时自动断开这些连接
//!
//! # 生命周期保证
//!
//! 信号与接收者之间只有弱引用：
//!
//! | 先销毁 | 结果 |
//! |------|------|
//! | 接收者 | `Senders` 析构时通知所有信号移除指向它的槽；排队中的调用在处理时被丢弃 |
//! | 信号 | 信号析构时把自己从每个接收者的发送者集合中移除 |
//!
//! 因此任何一方都不会通过悬垂引用被调用。
//!
//! # 使用示例
//!
//! ```no_run
//! use std::sync::Arc;
//! use dee::core::signal::*;
//!
//! #[derive(Default)]
//! struct Counter {
//!     senders: Senders,
//! }
//!
//! impl Receiver for Counter {
//!     fn senders(&self) -> &Senders {
//!         &self.senders
//!     }
//! }
//!
//! impl Counter {
//!     fn on_value(&self, value: i32) {
//!         println!("value = {}", value);
//!     }
//! }
//!
//! let queue = DispatchQueue::new();
//! let changed: Signal<(i32,)> = Signal::with_queue(&queue, DeliveryMode::Queued);
//! let counter = Arc::new(Counter::default());
//!
//! changed.connect(&counter, Counter::on_value);
//! changed.emit((5,));
//!
//! // 排队的调用在这里执行
//! queue.process_slots();
//! ```

mod callable;
mod queue;
mod receiver;
mod emitter;
mod slot;

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub use self::callable::{Args, MethodId, SlotMethod};
pub use self::queue::DispatchQueue;
pub use self::receiver::{Receiver, ReceiverId, Senders, SignalId};
pub use self::emitter::Signal;

/// 投递方式
///
/// 决定信号发射时槽是立即执行，还是推迟到 [`DispatchQueue::process_slots`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// 使用信号构造时指定的默认方式
    #[default]
    Auto,

    /// 在发射线程上同步调用
    ///
    /// 不做任何同步，调用方需要保证接收者可以在发射线程上被访问。
    Direct,

    /// 复制参数并推入分发队列，由主循环统一执行
    Queued,
}

impl DeliveryMode {
    /// 把 `Auto` 解析为具体的投递方式
    ///
    /// `default` 本身为 `Auto` 时解析为 `Queued`。
    pub fn resolve(self, default: DeliveryMode) -> DeliveryMode {
        match (self, default) {
            (DeliveryMode::Auto, DeliveryMode::Auto) => DeliveryMode::Queued,
            (DeliveryMode::Auto, default) => default,
            (mode, _) => mode,
        }
    }
}

/// 获取互斥锁，忽略中毒状态
///
/// 槽执行时从不持有这些锁，中毒只可能来自簿记代码本身，数据仍然一致。
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_mode_resolution() {
        assert_eq!(DeliveryMode::Auto.resolve(DeliveryMode::Direct), DeliveryMode::Direct);
        assert_eq!(DeliveryMode::Auto.resolve(DeliveryMode::Queued), DeliveryMode::Queued);
        assert_eq!(DeliveryMode::Auto.resolve(DeliveryMode::Auto), DeliveryMode::Queued);
        assert_eq!(DeliveryMode::Direct.resolve(DeliveryMode::Queued), DeliveryMode::Direct);
        assert_eq!(DeliveryMode::Queued.resolve(DeliveryMode::Direct), DeliveryMode::Queued);
    }
}
