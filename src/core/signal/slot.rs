//! 连接记录
//!
//! 信号内部的一条连接：可调用适配器 + 本次连接解析后的投递方式。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tracing::trace;

use super::callable::{Args, Callable, MethodId};
use super::queue::{DispatchQueue, PendingCall};
use super::receiver::{ReceiverId, SenderTable};
use super::DeliveryMode;

pub(crate) struct Slot<A> {
    mode: DeliveryMode,
    callable: Callable<A>,
    /// 发射过程中被断开的槽不再执行
    connected: Arc<AtomicBool>,
}

impl<A: Args> Slot<A> {
    pub(crate) fn new(mode: DeliveryMode, callable: Callable<A>) -> Self {
        debug_assert_ne!(mode, DeliveryMode::Auto, "slot mode must be resolved before connecting");

        Self {
            mode,
            callable,
            connected: Arc::new(AtomicBool::new(true)),
        }
    }

    /// 直接调用或排队
    pub(crate) fn call(&self, args: A, queue: &DispatchQueue) {
        if !self.is_connected() {
            return;
        }

        match self.mode {
            DeliveryMode::Direct => {
                if !self.callable.call(args) {
                    trace!(receiver = ?self.receiver(), "Skipped direct call, receiver is gone");
                }
            }
            DeliveryMode::Queued | DeliveryMode::Auto => {
                queue.enqueue(PendingCall::new(self.callable.clone(), args));
            }
        }
    }

    pub(crate) fn mode(&self) -> DeliveryMode {
        self.mode
    }

    pub(crate) fn receiver(&self) -> Option<ReceiverId> {
        self.callable.receiver()
    }

    pub(crate) fn method(&self) -> Option<MethodId> {
        self.callable.method_id()
    }

    pub(crate) fn senders(&self) -> Option<&Weak<SenderTable>> {
        self.callable.senders()
    }

    pub(crate) fn targets(&self, receiver: ReceiverId) -> bool {
        self.receiver() == Some(receiver)
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// 标记为已断开，已经取到快照的发射也会跳过它
    pub(crate) fn sever(&self) {
        self.connected.store(false, Ordering::Release);
    }
}

impl<A> Clone for Slot<A> {
    fn clone(&self) -> Self {
        Self {
            mode: self.mode,
            callable: self.callable.clone(),
            connected: Arc::clone(&self.connected),
        }
    }
}
