//! Dee - 信号/槽驱动的实时引擎核心
//!
//! 本库的核心是类型化的信号/槽分发机制：组件之间通过信号通信，
//! 槽可以直接在发射线程上执行，也可以排队到主循环统一执行。
//! 信号和接收者任何一方先销毁，另一方都不会通过悬垂引用被调用。
//!
//! # 模块结构
//!
//! - `core`: 核心功能模块（信号/槽、线程、定时器、窗口、主循环、日志、配置、错误处理）
//!
//! # 使用示例
//!
//! ```
//! use std::sync::Arc;
//! use dee::core::signal::{DeliveryMode, DispatchQueue, Receiver, Senders, Signal};
//!
//! #[derive(Default)]
//! struct Hud {
//!     senders: Senders,
//! }
//!
//! impl Receiver for Hud {
//!     fn senders(&self) -> &Senders {
//!         &self.senders
//!     }
//! }
//!
//! impl Hud {
//!     fn on_score(&self, score: u32) {
//!         println!("score: {}", score);
//!     }
//! }
//!
//! let queue = DispatchQueue::new();
//! let scored: Signal<(u32,)> = Signal::with_queue(&queue, DeliveryMode::Queued);
//! let hud = Arc::new(Hud::default());
//!
//! scored.connect(&hud, Hud::on_score);
//! scored.emit((10,));
//! assert_eq!(queue.process_slots(), 1);
//! ```

pub mod core;
