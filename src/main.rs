//! Dee - 信号/槽驱动的引擎演示程序
//!
//! 启动一个无头主循环：定时器在工作线程上发射 `timeout`，
//! 排队的调用在主循环里执行，心跳数达到上限后通过信号让应用退出。
//!
//! # 使用方法
//!
//! ```bash
//! # 使用配置文件 dee.toml（不存在时使用默认配置）
//! cargo run
//!
//! # 命令行覆盖
//! cargo run -- --title Demo --no-fullscreen --frames 120
//! ```
//!
//! # 信号连接
//!
//! ```text
//! Timer::timeout ──(queued)──▶ Heartbeat::on_timeout ──▶ Heartbeat::done ──▶ Application::quit
//! Window::resized ───────────▶ Heartbeat::on_resized
//! Application::about_to_quit ─▶ Timer::stop
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dee::app_info;
use dee::core::signal::{DeliveryMode, Receiver, Senders, Signal};
use dee::core::{log, Application, Config, Size, Timer};

/// 退出前的心跳数
const BEATS: u32 = 3;

/// 心跳间隔
const BEAT_INTERVAL: Duration = Duration::from_millis(250);

/// 统计定时器心跳，达到上限后发射 `done`
struct Heartbeat {
    senders: Senders,
    beats: AtomicU32,
    done: Signal,
}

impl Receiver for Heartbeat {
    fn senders(&self) -> &Senders {
        &self.senders
    }
}

impl Heartbeat {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            senders: Senders::new(),
            beats: AtomicU32::new(0),
            done: Signal::with_mode(DeliveryMode::Direct),
        })
    }

    fn on_timeout(&self) {
        let beat = self.beats.fetch_add(1, Ordering::Relaxed) + 1;
        app_info!(beat, "Heartbeat");

        if beat == BEATS {
            self.done.emit(());
        }
    }

    fn on_resized(&self, size: Size) {
        app_info!(%size, "Window resized");
    }
}

/// 应用程序入口点
///
/// # 初始化流程
///
/// 1. 加载配置文件（dee.toml）并应用命令行参数
/// 2. 初始化日志系统
/// 3. 创建应用、定时器和心跳接收者并连接信号
/// 4. 运行主循环，以其退出码退出进程
fn main() -> anyhow::Result<()> {
    let mut config = Config::from_file_or_default("dee.toml");
    config.apply_args(std::env::args());
    config.validate().context("Invalid configuration")?;

    let log_file = config
        .logging
        .file_output
        .then_some(config.logging.log_file.as_str());
    log::init_logger(config.logging.level, config.logging.file_output, log_file)
        .context("Failed to initialize logger")?;

    app_info!(version = env!("CARGO_PKG_VERSION"), "Dee starting");

    let app = Application::new(&config);
    let timer = Timer::new(BEAT_INTERVAL);
    let heartbeat = Heartbeat::new();

    timer.timeout.connect(&heartbeat, Heartbeat::on_timeout);
    heartbeat.done.connect(&app, Application::quit);
    app.window().resized.connect(&heartbeat, Heartbeat::on_resized);
    app.about_to_quit.connect_with(&timer, Timer::stop, DeliveryMode::Direct);

    let size = app.window().size();
    app.window().set_size(size.width, size.height);

    timer.start().context("Failed to start timer")?;
    let code = app.run();
    timer.wait().context("Timer thread failed")?;

    app_info!(code, beats = heartbeat.beats.load(Ordering::Relaxed), "Dee exiting");
    std::process::exit(code);
}
