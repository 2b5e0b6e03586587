//! 核心功能模块
//!
//! 本模块提供了引擎的基础功能：信号/槽分发核心，以及围绕它的日志、配置、
//! 错误处理、工作线程、定时器、窗口和主循环。
//!
//! # 模块组织
//!
//! - `signal`：信号/槽分发核心（信号、接收者、分发队列）
//! - `runtime`：进程级默认分发队列
//! - `thread`：带 `started` / `finished` 信号的工作线程
//! - `timer`：在工作线程上计时的周期定时器
//! - `window`：无头窗口状态与信号
//! - `application`：主循环，每帧处理分发队列
//! - `log`：日志系统，提供结构化的日志记录功能
//! - `config`：配置管理，支持从配置文件加载引擎设置
//! - `error`：错误处理，定义统一的错误类型

pub mod application;
pub mod config;
pub mod error;
pub mod log;
pub mod runtime;
pub mod signal;
pub mod thread;
pub mod timer;
pub mod window;

// 重新导出常用类型，方便使用
pub use application::Application;
pub use config::Config;
pub use error::{DeeError, Result};
pub use signal::{DeliveryMode, DispatchQueue, Receiver, Senders, Signal};
pub use thread::{StopToken, Thread};
pub use timer::Timer;
pub use window::{Size, Window};
