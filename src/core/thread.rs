//! 工作线程
//!
//! 对 `std::thread` 的轻量封装，带有 `started` / `finished` 信号和 `stop` 槽。
//! 线程体通过 [`StopToken`] 协作式地检查停止请求。
//!
//! # 使用示例
//!
//! ```
//! use dee::core::signal::DispatchQueue;
//! use dee::core::thread::Thread;
//!
//! let queue = DispatchQueue::new();
//! let worker = Thread::with_queue("loader", &queue);
//!
//! worker.start(|token| {
//!     while !token.is_stopped() {
//!         std::thread::sleep(std::time::Duration::from_millis(1));
//!     }
//! }).unwrap();
//!
//! worker.stop();
//! worker.join().unwrap();
//! queue.process_slots();
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::core::error::{Result, ThreadError};
use crate::core::runtime;
use crate::core::signal::{lock, DeliveryMode, DispatchQueue, Receiver, Senders, Signal};
use crate::{engine_debug, engine_warn};

/// 停止请求
///
/// 线程体应在每次循环时检查 [`StopToken::is_stopped`]。
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    stopped: Arc<AtomicBool>,
}

impl StopToken {
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    fn request(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    fn reset(&self) {
        self.stopped.store(false, Ordering::Release);
    }
}

/// 线程体退出（包括 panic）时清除运行标志
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// 工作线程
pub struct Thread {
    senders: Senders,
    name: String,
    /// 线程体开始执行前在工作线程上发射
    pub started: Arc<Signal>,
    /// 线程体返回后在工作线程上发射
    pub finished: Arc<Signal>,
    token: StopToken,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Receiver for Thread {
    fn senders(&self) -> &Senders {
        &self.senders
    }
}

impl Thread {
    /// 创建线程，信号投递到进程级分发队列
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Self::with_queue(name, runtime::dispatch_queue())
    }

    /// 创建线程，信号投递到指定的分发队列
    pub fn with_queue(name: impl Into<String>, queue: &DispatchQueue) -> Arc<Self> {
        Arc::new(Self {
            senders: Senders::new(),
            name: name.into(),
            started: Arc::new(Signal::with_queue(queue, DeliveryMode::Queued)),
            finished: Arc::new(Signal::with_queue(queue, DeliveryMode::Queued)),
            token: StopToken::default(),
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 在新线程上运行 `body`
    ///
    /// 线程仍在运行时返回 `ThreadError::AlreadyRunning`。上一次运行留下的
    /// 句柄会先被回收。
    pub fn start<F>(&self, body: F) -> Result<()>
    where
        F: FnOnce(StopToken) + Send + 'static,
    {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(ThreadError::AlreadyRunning(self.name.clone()).into());
        }

        if let Some(previous) = lock(&self.handle).take() {
            if previous.join().is_err() {
                engine_warn!(thread = %self.name, "Previous run of the thread panicked");
            }
        }
        self.token.reset();

        let guard = RunningGuard(Arc::clone(&self.running));
        let token = self.token.clone();
        let started = Arc::clone(&self.started);
        let finished = Arc::clone(&self.finished);
        let name = self.name.clone();

        let spawned = std::thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || {
                started.emit(());
                {
                    let _guard = guard;
                    body(token);
                }
                finished.emit(());
                engine_debug!(thread = %name, "Thread finished");
            });

        match spawned {
            Ok(handle) => {
                engine_debug!(thread = %self.name, "Thread started");
                *lock(&self.handle) = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.running.store(false, Ordering::Release);
                Err(err.into())
            }
        }
    }

    /// 请求线程停止（槽）
    ///
    /// 只设置停止标志，线程体需要自行检查并退出。
    pub fn stop(&self) {
        self.token.request();
    }

    /// 等待线程结束
    ///
    /// 在线程自身上调用时直接返回。线程体 panic 时返回 `ThreadError::Panicked`。
    pub fn join(&self) -> Result<()> {
        let Some(handle) = lock(&self.handle).take() else {
            return Ok(());
        };

        if handle.thread().id() == std::thread::current().id() {
            return Ok(());
        }

        handle
            .join()
            .map_err(|_| ThreadError::Panicked(self.name.clone()).into())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for Thread {
    fn drop(&mut self) {
        self.stop();
        if let Err(err) = self.join() {
            engine_warn!(thread = %self.name, "{}", err);
        }
    }
}

impl std::fmt::Debug for Thread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Thread")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .finish()
    }
}
