//! 信号（发射端）

use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use tracing::trace;

use super::callable::{Args, Callable, MethodId, SlotMethod};
use super::queue::DispatchQueue;
use super::receiver::{Receiver, ReceiverId, SenderLink, SignalId};
use super::slot::Slot;
use super::{lock, DeliveryMode};
use crate::core::runtime;

/// 类型化信号
///
/// `A` 是参数元组，默认为 `()`。信号按连接顺序保存槽，`emit` 时逐个
/// 直接调用或排入分发队列。
///
/// 信号不可复制；需要在线程之间共享时放进 `Arc`。信号析构时会把自己从
/// 所有接收者的发送者集合中移除。
///
/// # 线程安全
///
/// `emit` 可以在任意线程调用。槽列表只在取快照、增删槽时短暂加锁，
/// 槽执行期间不持有任何锁，所以在槽里再次 `emit`、`connect` 或
/// `disconnect` 都不会死锁。直接连接的槽在发射线程上执行。
///
/// # 示例
///
/// ```
/// use dee::core::signal::{DeliveryMode, DispatchQueue, Signal};
///
/// let queue = DispatchQueue::new();
/// let resized: Signal<(u32, u32)> = Signal::with_queue(&queue, DeliveryMode::Direct);
///
/// resized.connect_fn(|(width, height)| println!("{}x{}", width, height));
/// resized.emit((1920, 1080));
/// ```
pub struct Signal<A: Args = ()> {
    inner: Arc<SignalInner<A>>,
}

struct SignalInner<A: Args> {
    id: SignalId,
    default_mode: DeliveryMode,
    queue: DispatchQueue,
    slots: Mutex<Vec<Slot<A>>>,
}

impl<A: Args> SignalInner<A> {
    /// 移除所有匹配的槽，返回 `receiver` 是否仍有剩余连接
    fn remove_slots<P>(&self, receiver: ReceiverId, matches: P) -> bool
    where
        P: Fn(&Slot<A>) -> bool,
    {
        let mut slots = lock(&self.slots);
        let before = slots.len();
        slots.retain(|slot| {
            if matches(slot) {
                slot.sever();
                false
            } else {
                true
            }
        });

        trace!(
            signal = ?self.id,
            receiver = ?receiver,
            removed = before - slots.len(),
            "Disconnected slots"
        );

        slots.iter().any(|slot| slot.targets(receiver))
    }
}

impl<A: Args> SenderLink for SignalInner<A> {
    fn disconnect_receiver(&self, receiver: ReceiverId) {
        self.remove_slots(receiver, |slot| slot.targets(receiver));
    }
}

impl<A: Args> Signal<A> {
    /// 使用进程级分发队列创建信号，默认排队投递
    pub fn new() -> Self {
        Self::with_mode(DeliveryMode::Auto)
    }

    /// 使用进程级分发队列创建信号
    ///
    /// `mode` 是 `connect` 传入 `Auto` 时采用的投递方式，`Auto` 本身解析为 `Queued`。
    pub fn with_mode(mode: DeliveryMode) -> Self {
        Self::with_queue(runtime::dispatch_queue(), mode)
    }

    /// 使用指定的分发队列创建信号
    pub fn with_queue(queue: &DispatchQueue, mode: DeliveryMode) -> Self {
        Self {
            inner: Arc::new(SignalInner {
                id: SignalId::next(),
                default_mode: mode.resolve(DeliveryMode::Queued),
                queue: queue.clone(),
                slots: Mutex::new(Vec::new()),
            }),
        }
    }

    /// 信号标识
    pub fn id(&self) -> SignalId {
        self.inner.id
    }

    /// 默认投递方式（已解析，不会是 `Auto`）
    pub fn default_mode(&self) -> DeliveryMode {
        self.inner.default_mode
    }

    /// 连接接收者的方法，使用默认投递方式
    pub fn connect<R, M>(&self, receiver: &Arc<R>, method: M)
    where
        R: Receiver,
        M: SlotMethod<R, A>,
    {
        self.connect_with(receiver, method, DeliveryMode::Auto);
    }

    /// 连接接收者的方法
    ///
    /// 同一个（接收者, 方法）重复连接会产生多个独立的槽，每次发射都会各调用一次。
    pub fn connect_with<R, M>(&self, receiver: &Arc<R>, method: M, mode: DeliveryMode)
    where
        R: Receiver,
        M: SlotMethod<R, A>,
    {
        let mode = mode.resolve(self.inner.default_mode);
        let link: Weak<SignalInner<A>> = Arc::downgrade(&self.inner);
        let link: Weak<dyn SenderLink> = link;

        receiver.senders().add_sender(self.inner.id, link);
        self.push_slot(Slot::new(mode, Callable::method(receiver, method)));
    }

    /// 连接闭包，使用默认投递方式
    ///
    /// 闭包不能单独断开，只随信号销毁。
    pub fn connect_fn<F>(&self, f: F)
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        self.connect_fn_with(f, DeliveryMode::Auto);
    }

    /// 连接闭包
    pub fn connect_fn_with<F>(&self, f: F, mode: DeliveryMode)
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        let mode = mode.resolve(self.inner.default_mode);
        self.push_slot(Slot::new(mode, Callable::closure(f)));
    }

    fn push_slot(&self, slot: Slot<A>) {
        trace!(signal = ?self.inner.id, receiver = ?slot.receiver(), mode = ?slot.mode(), "Connected slot");
        lock(&self.inner.slots).push(slot);
    }

    /// 发射信号
    ///
    /// 按连接顺序处理每个槽：直接连接立即调用，排队连接复制参数后入队。
    /// 最后一个槽拿到参数的所有权，之前的槽拿到副本。没有槽时什么也不做。
    ///
    /// 发射开始时对槽列表取快照：发射过程中新连接的槽要到下一次发射才生效，
    /// 被断开的槽立即跳过。
    pub fn emit(&self, args: A) {
        let slots = lock(&self.inner.slots).clone();

        let Some((last, rest)) = slots.split_last() else {
            trace!(signal = ?self.inner.id, "Emitted with no connected slots");
            return;
        };

        for slot in rest {
            slot.call(args.clone(), &self.inner.queue);
        }
        last.call(args, &self.inner.queue);
    }

    /// 断开接收者的所有连接
    ///
    /// 只影响绑定方法，闭包不受影响。
    pub fn disconnect<R: Receiver>(&self, receiver: &R) {
        let id = receiver.senders().id();

        if !self.inner.remove_slots(id, |slot| slot.targets(id)) {
            receiver.senders().remove_sender(self.inner.id);
        }
    }

    /// 断开（接收者, 方法）的连接
    ///
    /// 同一接收者连接到其他方法的槽保留。`method` 只用于确定方法标识。
    pub fn disconnect_method<R, M>(&self, receiver: &R, _method: M)
    where
        R: Receiver,
        M: SlotMethod<R, A>,
    {
        let id = receiver.senders().id();
        let method = MethodId::of::<M>();

        if !self.inner.remove_slots(id, |slot| slot.targets(id) && slot.method() == Some(method)) {
            receiver.senders().remove_sender(self.inner.id);
        }
    }

    /// 当前的槽数量
    pub fn slot_count(&self) -> usize {
        lock(&self.inner.slots).len()
    }

    /// 是否有槽指向 `receiver`
    pub fn is_connected<R: Receiver>(&self, receiver: &R) -> bool {
        let id = receiver.senders().id();
        lock(&self.inner.slots).iter().any(|slot| slot.targets(id))
    }
}

impl<A: Args> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Args> Drop for Signal<A> {
    fn drop(&mut self) {
        let slots = std::mem::take(&mut *lock(&self.inner.slots));

        for slot in &slots {
            slot.sever();
            if let Some(table) = slot.senders().and_then(|senders| senders.upgrade()) {
                table.remove_sender(self.inner.id);
            }
        }
    }
}

impl<A: Args> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("default_mode", &self.inner.default_mode)
            .field("slots", &self.slot_count())
            .finish()
    }
}
