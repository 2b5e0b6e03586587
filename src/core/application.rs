//! 应用主循环
//!
//! `Application` 拥有窗口和分发队列，每帧依次：
//!
//! 1. 发射 `before_render`（直接投递）
//! 2. 发射 `after_render`（直接投递）
//! 3. 处理分发队列中所有排队的调用
//! 4. 按 `max_fps` 限帧
//!
//! 循环结束后发射 `about_to_quit`（排队投递）并再处理一次队列，
//! 保证退出前排队的调用都能执行。

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::core::config::{ApplicationConfig, Config};
use crate::core::runtime;
use crate::core::signal::{DeliveryMode, DispatchQueue, Receiver, Senders, Signal};
use crate::core::window::Window;
use crate::{engine_debug, engine_info};

/// 应用主循环
pub struct Application {
    senders: Senders,
    /// 主循环结束后发射，排队投递
    pub about_to_quit: Signal,
    /// 每帧开始时发射，直接投递
    pub before_render: Signal,
    /// 每帧渲染后发射，直接投递
    pub after_render: Signal,
    config: ApplicationConfig,
    queue: DispatchQueue,
    window: Arc<Window>,
    running: AtomicBool,
    exit_code: AtomicI32,
    frames: AtomicU64,
}

impl Receiver for Application {
    fn senders(&self) -> &Senders {
        &self.senders
    }
}

impl Application {
    /// 使用进程级分发队列创建应用
    pub fn new(config: &Config) -> Arc<Self> {
        Self::with_queue(config, runtime::dispatch_queue())
    }

    /// 使用指定的分发队列创建应用
    ///
    /// 窗口的 `closed` 连接到 [`Application::quit`]，
    /// `about_to_quit` 连接到 [`Window::close`]。
    pub fn with_queue(config: &Config, queue: &DispatchQueue) -> Arc<Self> {
        let default_mode = config.dispatch.default_mode;
        let window = Arc::new(Window::new(&config.window, queue, default_mode));

        let app = Arc::new(Self {
            senders: Senders::new(),
            about_to_quit: Signal::with_queue(queue, DeliveryMode::Queued),
            before_render: Signal::with_queue(queue, DeliveryMode::Direct),
            after_render: Signal::with_queue(queue, DeliveryMode::Direct),
            config: config.application.clone(),
            queue: queue.clone(),
            window,
            running: AtomicBool::new(false),
            exit_code: AtomicI32::new(0),
            frames: AtomicU64::new(0),
        });

        app.window.closed.connect(&app, Application::quit);
        app.about_to_quit.connect(&app.window, Window::close);

        engine_debug!(mode = ?default_mode, "Application initialized");
        app
    }

    /// 运行主循环，返回退出码
    pub fn run(&self) -> i32 {
        engine_info!(title = %self.window.name(), "Application running");

        self.window.show();
        self.running.store(true, Ordering::Release);

        let frame_time = self.config.frame_time();
        let frame_limit = self.config.frame_limit();

        while self.running.load(Ordering::Acquire) {
            let frame_start = Instant::now();

            self.before_render.emit(());
            self.after_render.emit(());
            self.queue.process_slots();

            let frames = self.frames.fetch_add(1, Ordering::AcqRel) + 1;
            if let Some(limit) = frame_limit {
                if frames >= limit {
                    self.running.store(false, Ordering::Release);
                }
            }

            if let Some(frame_time) = frame_time {
                let elapsed = frame_start.elapsed();
                if elapsed < frame_time && self.running.load(Ordering::Acquire) {
                    std::thread::sleep(frame_time - elapsed);
                }
            }
        }

        self.about_to_quit.emit(());
        self.queue.process_slots();

        let code = self.exit_code.load(Ordering::Acquire);
        engine_info!(frames = self.frame_count(), code, "Application finished");
        code
    }

    /// 以退出码 0 结束主循环（槽）
    pub fn quit(&self) {
        self.exit(0);
    }

    /// 以指定退出码结束主循环（槽）
    ///
    /// 只有第一次请求生效：主循环停止后（包括关闭流程中窗口发出的 `closed`）
    /// 的调用不会覆盖已经设定的退出码。
    pub fn exit(&self, code: i32) {
        if self.running.swap(false, Ordering::AcqRel) {
            self.exit_code.store(code, Ordering::Release);
        }
    }

    /// 立即处理分发队列，返回处理的调用数
    pub fn process_events(&self) -> usize {
        self.queue.process_slots()
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// 已完成的帧数
    pub fn frame_count(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn config(max_frames: u64) -> Config {
        let mut config = Config::default();
        config.application.max_fps = 0;
        config.application.max_frames = max_frames;
        config.window.fullscreen = false;
        config
    }

    #[test]
    fn test_frame_limit() {
        let queue = DispatchQueue::new();
        let app = Application::with_queue(&config(5), &queue);

        assert_eq!(app.run(), 0);
        assert_eq!(app.frame_count(), 5);
        assert!(!app.is_running());
    }

    #[test]
    fn test_frame_order_and_queued_delivery() {
        let queue = DispatchQueue::new();
        let app = Application::with_queue(&config(1), &queue);
        let log = Arc::new(Mutex::new(Vec::new()));
        let tick: Arc<Signal> = Arc::new(Signal::with_queue(&queue, DeliveryMode::Queued));

        let sink = Arc::clone(&log);
        tick.connect_fn(move |()| sink.lock().unwrap().push("queued"));

        let sink = Arc::clone(&log);
        let producer = Arc::clone(&tick);
        app.before_render.connect_fn(move |()| {
            sink.lock().unwrap().push("before");
            producer.emit(());
        });
        let sink = Arc::clone(&log);
        app.after_render.connect_fn(move |()| sink.lock().unwrap().push("after"));
        let sink = Arc::clone(&log);
        app.about_to_quit.connect_fn(move |()| sink.lock().unwrap().push("quit"));

        app.run();
        assert_eq!(*log.lock().unwrap(), vec!["before", "after", "queued", "quit"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_window_close_quits() {
        let queue = DispatchQueue::new();
        let app = Application::with_queue(&config(0), &queue);

        let window = Arc::clone(app.window());
        let frames = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&frames);
        app.before_render.connect_fn(move |()| {
            if counter.fetch_add(1, Ordering::Relaxed) + 1 == 3 {
                window.close();
            }
        });

        assert_eq!(app.run(), 0);
        assert_eq!(app.frame_count(), 3);
        assert!(!app.window().is_visible());
    }

    #[test]
    fn test_about_to_quit_closes_window() {
        let queue = DispatchQueue::new();
        let app = Application::with_queue(&config(2), &queue);
        let closed = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&closed);
        app.window().closed.connect_fn(move |()| flag.store(true, Ordering::Release));

        app.run();
        assert!(closed.load(Ordering::Acquire));
        assert!(!app.window().is_visible());
    }

    #[test]
    fn test_exit_code_from_slot() {
        let queue = DispatchQueue::new();
        let app = Application::with_queue(&config(0), &queue);
        let fail: Arc<Signal<(i32,)>> = Arc::new(Signal::with_queue(&queue, DeliveryMode::Queued));
        fail.connect(&app, Application::exit);

        let trigger = Arc::clone(&fail);
        app.after_render.connect_fn(move |()| trigger.emit((3,)));

        assert_eq!(app.run(), 3);
        assert_eq!(app.frame_count(), 1);
        // 关闭流程中窗口的 closed → quit 不会覆盖退出码
        assert!(!app.window().is_visible());
    }

    #[test]
    fn test_first_exit_request_wins() {
        let queue = DispatchQueue::new();
        let app = Application::with_queue(&config(0), &queue);

        let target = Arc::downgrade(&app);
        app.before_render.connect_fn(move |()| {
            if let Some(app) = target.upgrade() {
                app.exit(7);
                app.quit();
                app.exit(9);
            }
        });

        assert_eq!(app.run(), 7);
        assert_eq!(app.frame_count(), 1);
    }

    #[test]
    fn test_process_events_drains_queue() {
        let queue = DispatchQueue::new();
        let app = Application::with_queue(&config(1), &queue);
        let signal: Signal = Signal::with_queue(&queue, DeliveryMode::Queued);
        signal.connect(app.window(), Window::show);

        signal.emit(());
        assert_eq!(app.process_events(), 1);
        assert!(app.window().is_visible());
    }
}
