//! 周期定时器
//!
//! 在自己的工作线程上计时，每经过一个间隔发射一次 `timeout` 信号。
//! `timeout` 默认排队投递，槽在主循环处理分发队列时执行。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::error::{Result, TimerError};
use crate::core::runtime;
use crate::core::signal::{DeliveryMode, DispatchQueue, Receiver, Senders, Signal};
use crate::core::thread::Thread;
use crate::engine_warn;

/// 两次检查之间的最长休眠
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// 周期定时器
pub struct Timer {
    senders: Senders,
    /// 每个间隔发射一次
    pub timeout: Arc<Signal>,
    interval_ms: Arc<AtomicU64>,
    thread: Arc<Thread>,
}

impl Receiver for Timer {
    fn senders(&self) -> &Senders {
        &self.senders
    }
}

impl Timer {
    /// 创建定时器，信号投递到进程级分发队列
    pub fn new(interval: Duration) -> Arc<Self> {
        Self::with_queue(interval, runtime::dispatch_queue())
    }

    /// 创建定时器，信号投递到指定的分发队列
    pub fn with_queue(interval: Duration, queue: &DispatchQueue) -> Arc<Self> {
        Arc::new(Self {
            senders: Senders::new(),
            timeout: Arc::new(Signal::with_queue(queue, DeliveryMode::Queued)),
            interval_ms: Arc::new(AtomicU64::new(millis(interval))),
            thread: Thread::with_queue("dee-timer", queue),
        })
    }

    /// 启动定时器
    ///
    /// 间隔为 0 时记录警告并返回 `TimerError::ZeroInterval`，定时器不会启动。
    pub fn start(&self) -> Result<()> {
        if self.interval_ms.load(Ordering::Acquire) == 0 {
            engine_warn!("Timer: trying to start timer with zero interval, it won't start");
            return Err(TimerError::ZeroInterval.into());
        }

        let timeout = Arc::clone(&self.timeout);
        let interval_ms = Arc::clone(&self.interval_ms);

        self.thread.start(move |token| {
            let mut last = Instant::now();

            while !token.is_stopped() {
                let interval = Duration::from_millis(interval_ms.load(Ordering::Acquire));
                if interval.is_zero() {
                    std::thread::sleep(POLL_INTERVAL);
                    continue;
                }

                let elapsed = last.elapsed();
                if elapsed >= interval {
                    timeout.emit(());
                    last = Instant::now();
                    continue;
                }

                std::thread::sleep(POLL_INTERVAL.min(interval - elapsed));
            }
        })
    }

    /// 停止定时器（槽）
    pub fn stop(&self) {
        self.thread.stop();
    }

    /// 停止并等待计时线程退出
    pub fn wait(&self) -> Result<()> {
        self.thread.stop();
        self.thread.join()
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_running()
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.load(Ordering::Acquire))
    }

    /// 修改间隔，运行中的定时器在下一次检查时生效
    pub fn set_interval(&self, interval: Duration) {
        self.interval_ms.store(millis(interval), Ordering::Release);
    }

    /// 计时线程，可连接其 `started` / `finished` 信号
    pub fn thread(&self) -> &Arc<Thread> {
        &self.thread
    }
}

fn millis(interval: Duration) -> u64 {
    u64::try_from(interval.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::DeeError;

    fn wait_for_pending(queue: &DispatchQueue, count: usize) {
        for _ in 0..500 {
            if queue.len() >= count {
                return;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        panic!("timer did not fire in time");
    }

    #[test]
    fn test_zero_interval_does_not_start() {
        let queue = DispatchQueue::new();
        let timer = Timer::with_queue(Duration::ZERO, &queue);

        let err = timer.start().unwrap_err();
        assert!(matches!(err, DeeError::Timer(TimerError::ZeroInterval)));
        assert!(!timer.is_running());
    }

    #[test]
    fn test_timeout_is_delivered_through_queue() {
        let queue = DispatchQueue::new();
        let timer = Timer::with_queue(Duration::from_millis(5), &queue);
        let ticks = Arc::new(AtomicU64::new(0));

        let counter = Arc::clone(&ticks);
        timer.timeout.connect_fn(move |()| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        timer.start().unwrap();
        assert!(timer.is_running());
        wait_for_pending(&queue, 4);
        timer.wait().unwrap();

        // 计时线程的 started / finished 与 timeout 共用同一个队列
        let processed = queue.process_slots();
        assert!(ticks.load(Ordering::Relaxed) >= 3);
        assert!(processed as u64 >= ticks.load(Ordering::Relaxed));
        assert!(!timer.is_running());
    }

    #[test]
    fn test_stop_slot_and_restart() {
        let queue = DispatchQueue::new();
        let timer = Timer::with_queue(Duration::from_millis(2), &queue);

        let stopper: Signal = Signal::with_queue(&queue, DeliveryMode::Direct);
        stopper.connect(&timer, Timer::stop);

        timer.start().unwrap();
        stopper.emit(());
        timer.thread().join().unwrap();
        assert!(!timer.is_running());

        timer.set_interval(Duration::from_millis(3));
        assert_eq!(timer.interval(), Duration::from_millis(3));
        timer.start().unwrap();
        timer.wait().unwrap();
    }
}
