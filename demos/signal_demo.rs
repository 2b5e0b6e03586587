//! 信号/槽演示
//!
//! 演示直接投递、排队投递、断开连接，以及信号与接收者各自先销毁的情况。
//!
//! # 运行方式
//!
//! ```bash
//! cargo run --example signal_demo
//! ```

use std::sync::Arc;

use dee::core::signal::{DeliveryMode, DispatchQueue, Receiver, Senders, Signal};
use dee::core::window::Size;

struct Hud {
    senders: Senders,
    name: &'static str,
}

impl Receiver for Hud {
    fn senders(&self) -> &Senders {
        &self.senders
    }
}

impl Hud {
    fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            senders: Senders::new(),
            name,
        })
    }

    fn on_resized(&self, size: Size) {
        println!("✓ [{}] 窗口尺寸: {}", self.name, size);
    }

    fn on_score(&self, player: String, score: u32) {
        println!("✓ [{}] {} 得分 {}", self.name, player, score);
    }
}

fn main() {
    println!("=== Dee 信号/槽演示 ===\n");

    let queue = DispatchQueue::new();

    // === 1. 直接投递 ===
    println!("--- 1. 直接投递 ---");
    let resized: Signal<(Size,)> = Signal::with_queue(&queue, DeliveryMode::Direct);
    let hud = Hud::new("hud");
    resized.connect(&hud, Hud::on_resized);
    resized.emit((Size::new(1920, 1080),));
    println!("队列中待处理: {} (预期为 0)\n", queue.len());

    // === 2. 排队投递 ===
    println!("--- 2. 排队投递 ---");
    let scored: Signal<(String, u32)> = Signal::with_queue(&queue, DeliveryMode::Queued);
    scored.connect(&hud, Hud::on_score);
    scored.emit(("alice".to_string(), 10));
    scored.emit(("bob".to_string(), 7));
    println!("发射后队列中待处理: {}", queue.len());
    println!("处理了 {} 个调用\n", queue.process_slots());

    // === 3. 混合投递方式 ===
    println!("--- 3. 混合投递方式 ---");
    let overlay = Hud::new("overlay");
    scored.connect_with(&overlay, Hud::on_score, DeliveryMode::Direct);
    scored.emit(("carol".to_string(), 3));
    println!("(上面是直接投递的 overlay，下面是排队的 hud)");
    queue.process_slots();
    println!();

    // === 4. 断开连接 ===
    println!("--- 4. 断开连接 ---");
    scored.disconnect_method(&*hud, Hud::on_score);
    println!("hud 仍连接: {} (预期为 false)", scored.is_connected(&*hud));
    scored.emit(("dave".to_string(), 1));
    queue.process_slots();
    println!();

    // === 5. 接收者先销毁 ===
    println!("--- 5. 接收者先销毁 ---");
    println!("销毁前槽数量: {}", scored.slot_count());
    drop(overlay);
    println!("销毁后槽数量: {} (预期为 0)", scored.slot_count());
    scored.emit(("erin".to_string(), 5));
    println!();

    // === 6. 信号先销毁 ===
    println!("--- 6. 信号先销毁 ---");
    println!("hud 引用的信号数: {}", hud.senders().len());
    drop(resized);
    println!("销毁 resized 后: {}", hud.senders().len());
    drop(scored);
    println!("销毁 scored 后: {} (预期为 0)", hud.senders().len());

    println!("\n=== 演示完成 ===");
}
