//! 分发队列
//!
//! 保存排队投递的调用记录，按入队顺序统一执行。
//! 不了解任何业务语义，只负责排序与清空。

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{debug, trace};

use super::callable::{Args, Callable};
use super::lock;

trait Invocation: Send {
    fn invoke(self: Box<Self>) -> bool;
}

struct Deferred<A> {
    callable: Callable<A>,
    args: A,
}

impl<A: Args> Invocation for Deferred<A> {
    fn invoke(self: Box<Self>) -> bool {
        let Deferred { callable, args } = *self;
        callable.call(args)
    }
}

/// 调用记录
///
/// 可调用对象的共享引用 + 入队时复制的参数，无需其他上下文即可执行。
/// 绑定方法只弱引用接收者，接收者在执行前销毁时记录被直接丢弃。
pub(crate) struct PendingCall(Box<dyn Invocation>);

impl PendingCall {
    pub(crate) fn new<A: Args>(callable: Callable<A>, args: A) -> Self {
        Self(Box::new(Deferred { callable, args }))
    }

    fn invoke(self) -> bool {
        self.0.invoke()
    }
}

impl fmt::Debug for PendingCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PendingCall { .. }")
    }
}

/// 分发队列
///
/// 可复制的句柄，所有副本共享同一个 FIFO。`enqueue` 可以在任意线程调用，
/// `process_slots` 只应在一个指定的上下文（通常是主循环）中调用。
///
/// # 示例
///
/// ```
/// use dee::core::signal::{DeliveryMode, DispatchQueue, Signal};
///
/// let queue = DispatchQueue::new();
/// let tick: Signal = Signal::with_queue(&queue, DeliveryMode::Queued);
/// tick.connect_fn(|()| println!("tick"));
///
/// tick.emit(());
/// assert_eq!(queue.len(), 1);
/// assert_eq!(queue.process_slots(), 1);
/// ```
#[derive(Clone, Default)]
pub struct DispatchQueue {
    pending: Arc<Mutex<VecDeque<PendingCall>>>,
}

impl DispatchQueue {
    /// 创建独立的空队列
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn enqueue(&self, call: PendingCall) {
        lock(&self.pending).push_back(call);
    }

    /// 依次执行所有排队的调用，直到队列为空
    ///
    /// 执行过程中新入队的记录也会在本次处理完毕。每条记录执行时不持有队列锁。
    /// 返回处理的记录数（包括因接收者已销毁而丢弃的记录）。
    ///
    /// 同一队列同一时间只能有一个 `process_slots` 在运行。
    pub fn process_slots(&self) -> usize {
        let mut processed = 0;
        let mut dropped = 0;

        loop {
            let next = lock(&self.pending).pop_front();
            let Some(call) = next else { break };

            if !call.invoke() {
                dropped += 1;
            }
            processed += 1;
        }

        if dropped > 0 {
            debug!(dropped, "Dropped queued calls whose receivers are gone");
        }
        if processed > 0 {
            trace!(processed, "Dispatch queue drained");
        }

        processed
    }

    /// 待处理的记录数
    pub fn len(&self) -> usize {
        lock(&self.pending).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for DispatchQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchQueue")
            .field("pending", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::signal::{DeliveryMode, Signal};
    use std::sync::Weak;

    type Log = Arc<Mutex<Vec<String>>>;

    fn push(log: &Log, entry: impl Into<String>) {
        log.lock().unwrap().push(entry.into());
    }

    #[test]
    fn test_empty_queue() {
        let queue = DispatchQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.process_slots(), 0);
    }

    #[test]
    fn test_fifo_across_signals() {
        let queue = DispatchQueue::new();
        let log: Log = Arc::default();
        let a: Signal<(u32,)> = Signal::with_queue(&queue, DeliveryMode::Queued);
        let b: Signal<(u32,)> = Signal::with_queue(&queue, DeliveryMode::Queued);

        let sink = Arc::clone(&log);
        a.connect_fn(move |(n,)| push(&sink, format!("A{}", n)));
        let sink = Arc::clone(&log);
        b.connect_fn(move |(n,)| push(&sink, format!("B{}", n)));

        a.emit((1,));
        b.emit((1,));
        a.emit((2,));

        assert_eq!(queue.process_slots(), 3);
        assert_eq!(*log.lock().unwrap(), vec!["A1", "B1", "A2"]);
    }

    #[test]
    fn test_calls_enqueued_while_draining_run_in_same_pass() {
        let queue = DispatchQueue::new();
        let log: Log = Arc::default();
        let first = Arc::new(Signal::<()>::with_queue(&queue, DeliveryMode::Queued));
        let second = Arc::new(Signal::<()>::with_queue(&queue, DeliveryMode::Queued));

        let follow_up: Weak<Signal> = Arc::downgrade(&second);
        let sink = Arc::clone(&log);
        first.connect_fn(move |()| {
            push(&sink, "first");
            if let Some(second) = follow_up.upgrade() {
                second.emit(());
            }
        });
        let sink = Arc::clone(&log);
        second.connect_fn(move |()| push(&sink, "second"));

        first.emit(());
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.process_slots(), 2);
        assert!(queue.is_empty());
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_isolated_queues() {
        let main = DispatchQueue::new();
        let other = DispatchQueue::new();
        let signal: Signal = Signal::with_queue(&other, DeliveryMode::Queued);
        signal.connect_fn(|()| {});
        signal.emit(());

        assert!(main.is_empty());
        assert_eq!(other.len(), 1);

        // 副本共享同一个 FIFO
        assert_eq!(other.clone().process_slots(), 1);
        assert!(other.is_empty());
    }

    #[test]
    fn test_enqueue_from_many_threads() {
        let queue = DispatchQueue::new();
        let total = Arc::new(Mutex::new(0u32));
        let signal = Arc::new(Signal::<(u32,)>::with_queue(&queue, DeliveryMode::Queued));

        let sink = Arc::clone(&total);
        signal.connect_fn(move |(n,)| *sink.lock().unwrap() += n);

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let signal = Arc::clone(&signal);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        signal.emit((1,));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(queue.len(), 100);
        assert_eq!(queue.process_slots(), 100);
        assert_eq!(*total.lock().unwrap(), 100);
    }
}
