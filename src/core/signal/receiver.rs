//! 接收者能力
//!
//! 每个可以被连接的对象都内嵌一个 [`Senders`]，记录当前有哪些信号持有指向自己的槽。
//! `Senders` 析构时逐个通知这些信号移除相关的槽，保证信号永远不会持有已销毁接收者的连接。

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use super::lock;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// 接收者标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReceiverId(u64);

/// 信号标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalId(u64);

impl ReceiverId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl SignalId {
    pub(crate) fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// 接收者反向访问信号的入口
pub(crate) trait SenderLink: Send + Sync {
    /// 移除所有指向 `receiver` 的槽
    fn disconnect_receiver(&self, receiver: ReceiverId);
}

struct SenderEntry {
    id: SignalId,
    link: Weak<dyn SenderLink>,
}

/// 发送者集合的共享部分，槽通过弱引用指向它
pub(crate) struct SenderTable {
    receiver: ReceiverId,
    senders: Mutex<Vec<SenderEntry>>,
}

impl SenderTable {
    /// 登记发送者，按信号标识去重
    pub(crate) fn add_sender(&self, id: SignalId, link: Weak<dyn SenderLink>) {
        let mut senders = lock(&self.senders);
        if senders.iter().all(|entry| entry.id != id) {
            senders.push(SenderEntry { id, link });
        }
    }

    /// 注销一个匹配的发送者
    pub(crate) fn remove_sender(&self, id: SignalId) {
        let mut senders = lock(&self.senders);
        if let Some(pos) = senders.iter().position(|entry| entry.id == id) {
            senders.remove(pos);
        }
    }
}

/// 发送者集合
///
/// 作为字段内嵌到接收者中，并通过 [`Receiver::senders`] 暴露。
/// 不可复制：每个接收者有且只有一个集合。
pub struct Senders {
    table: Arc<SenderTable>,
}

impl Senders {
    /// 创建空的发送者集合，并分配新的接收者标识
    pub fn new() -> Self {
        Self {
            table: Arc::new(SenderTable {
                receiver: ReceiverId::next(),
                senders: Mutex::new(Vec::new()),
            }),
        }
    }

    /// 接收者标识
    pub fn id(&self) -> ReceiverId {
        self.table.receiver
    }

    /// 当前引用此接收者的信号数量
    pub fn len(&self) -> usize {
        lock(&self.table.senders).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 信号 `signal` 是否持有指向此接收者的槽
    pub fn contains(&self, signal: SignalId) -> bool {
        lock(&self.table.senders).iter().any(|entry| entry.id == signal)
    }

    /// 断开所有信号到此接收者的连接
    ///
    /// 析构时自动调用。集合先被取出再逐个通知，通知期间不持有锁。
    pub fn disconnect_all(&self) {
        let senders = std::mem::take(&mut *lock(&self.table.senders));
        for entry in senders {
            if let Some(link) = entry.link.upgrade() {
                link.disconnect_receiver(self.id());
            }
        }
    }

    pub(crate) fn table(&self) -> Weak<SenderTable> {
        Arc::downgrade(&self.table)
    }

    pub(crate) fn add_sender(&self, id: SignalId, link: Weak<dyn SenderLink>) {
        self.table.add_sender(id, link);
    }

    pub(crate) fn remove_sender(&self, id: SignalId) {
        self.table.remove_sender(id);
    }
}

impl Default for Senders {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Senders {
    fn drop(&mut self) {
        self.disconnect_all();
    }
}

impl fmt::Debug for Senders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Senders")
            .field("receiver", &self.id())
            .field("senders", &self.len())
            .finish()
    }
}

/// 接收者能力
///
/// 绑定方法只能连接到实现了此 trait 的类型。接收者以 `Arc<R>` 共享，
/// 槽方法接收 `&self`，需要可变状态时使用内部可变性。
///
/// # 示例
///
/// ```
/// use dee::core::signal::{Receiver, Senders};
///
/// #[derive(Default)]
/// struct Hud {
///     senders: Senders,
/// }
///
/// impl Receiver for Hud {
///     fn senders(&self) -> &Senders {
///         &self.senders
///     }
/// }
/// ```
pub trait Receiver: Send + Sync + 'static {
    /// 内嵌的发送者集合
    fn senders(&self) -> &Senders;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingLink {
        disconnects: Mutex<Vec<ReceiverId>>,
    }

    impl SenderLink for CountingLink {
        fn disconnect_receiver(&self, receiver: ReceiverId) {
            self.disconnects.lock().unwrap().push(receiver);
        }
    }

    fn link() -> Arc<CountingLink> {
        Arc::new(CountingLink { disconnects: Mutex::new(Vec::new()) })
    }

    fn weak(link: &Arc<CountingLink>) -> Weak<dyn SenderLink> {
        let link: Arc<dyn SenderLink> = link.clone();
        Arc::downgrade(&link)
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Senders::new();
        let b = Senders::new();
        assert_ne!(a.id(), b.id());
        assert_ne!(SignalId::next(), SignalId::next());
    }

    #[test]
    fn test_add_sender_deduplicates() {
        let senders = Senders::new();
        let signal = link();
        let id = SignalId::next();

        senders.add_sender(id, weak(&signal));
        senders.add_sender(id, weak(&signal));
        assert_eq!(senders.len(), 1);
        assert!(senders.contains(id));

        senders.remove_sender(id);
        assert!(senders.is_empty());

        // 移除不存在的发送者不是错误
        senders.remove_sender(id);
        assert!(senders.is_empty());
    }

    #[test]
    fn test_drop_notifies_every_sender() {
        let first = link();
        let second = link();
        let senders = Senders::new();
        let receiver = senders.id();

        senders.add_sender(SignalId::next(), weak(&first));
        senders.add_sender(SignalId::next(), weak(&second));
        drop(senders);

        assert_eq!(*first.disconnects.lock().unwrap(), vec![receiver]);
        assert_eq!(*second.disconnects.lock().unwrap(), vec![receiver]);
    }

    #[test]
    fn test_disconnect_all_skips_dead_senders() {
        let alive = link();
        let senders = Senders::new();
        senders.add_sender(SignalId::next(), weak(&alive));
        {
            let gone = link();
            senders.add_sender(SignalId::next(), weak(&gone));
        }

        senders.disconnect_all();
        assert!(senders.is_empty());
        assert_eq!(alive.disconnects.lock().unwrap().len(), 1);
    }
}
