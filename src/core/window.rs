//! 无头窗口
//!
//! 只维护窗口状态（标题、尺寸、可见性、全屏）并在状态变化时发射信号，
//! 不连接任何平台窗口系统。

use std::fmt;
use std::sync::Mutex;

use crate::core::config::WindowConfig;
use crate::core::signal::{lock, DeliveryMode, DispatchQueue, Receiver, Senders, Signal};
use crate::engine_debug;

/// 窗口尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug)]
struct WindowState {
    name: String,
    size: Size,
    visible: bool,
    fullscreen: bool,
}

/// 无头窗口
pub struct Window {
    senders: Senders,
    state: Mutex<WindowState>,
    /// 窗口变为可见后发射
    pub shown: Signal,
    /// 窗口关闭后发射
    pub closed: Signal,
    /// 尺寸改变后发射
    pub resized: Signal<(Size,)>,
    /// 可见窗口的全屏状态改变后发射
    pub fullscreen_changed: Signal<(bool,)>,
}

impl Receiver for Window {
    fn senders(&self) -> &Senders {
        &self.senders
    }
}

impl Window {
    /// 按配置创建窗口，初始不可见
    ///
    /// `mode` 是窗口信号的默认投递方式。
    pub fn new(config: &WindowConfig, queue: &DispatchQueue, mode: DeliveryMode) -> Self {
        Self {
            senders: Senders::new(),
            state: Mutex::new(WindowState {
                name: config.title.clone(),
                size: Size::new(config.width, config.height),
                visible: false,
                fullscreen: config.fullscreen,
            }),
            shown: Signal::with_queue(queue, mode),
            closed: Signal::with_queue(queue, mode),
            resized: Signal::with_queue(queue, mode),
            fullscreen_changed: Signal::with_queue(queue, mode),
        }
    }

    /// 显示窗口（槽）
    ///
    /// 全屏窗口在显示后还会发射 `fullscreen_changed(true)`。
    pub fn show(&self) {
        let fullscreen = {
            let mut state = lock(&self.state);
            if state.visible {
                return;
            }
            state.visible = true;
            state.fullscreen
        };

        engine_debug!(window = %self.name(), "Window shown");
        self.shown.emit(());
        if fullscreen {
            self.fullscreen_changed.emit((true,));
        }
    }

    /// 隐藏窗口（槽），不发射 `closed`
    pub fn hide(&self) {
        lock(&self.state).visible = false;
    }

    /// 关闭窗口（槽）
    ///
    /// 只有可见的窗口会发射 `closed`，重复关闭没有效果。
    pub fn close(&self) {
        let was_visible = std::mem::replace(&mut lock(&self.state).visible, false);
        if was_visible {
            engine_debug!(window = %self.name(), "Window closed");
            self.closed.emit(());
        }
    }

    pub fn set_name(&self, name: impl Into<String>) {
        lock(&self.state).name = name.into();
    }

    /// 修改尺寸并发射 `resized`
    pub fn set_size(&self, width: u32, height: u32) {
        let size = Size::new(width, height);
        lock(&self.state).size = size;
        self.resized.emit((size,));
    }

    /// 修改全屏状态
    ///
    /// 窗口可见且状态确实改变时发射 `fullscreen_changed`。
    pub fn set_fullscreen(&self, fullscreen: bool) {
        let changed = {
            let mut state = lock(&self.state);
            let changed = state.visible && state.fullscreen != fullscreen;
            state.fullscreen = fullscreen;
            changed
        };

        if changed {
            self.fullscreen_changed.emit((fullscreen,));
        }
    }

    pub fn name(&self) -> String {
        lock(&self.state).name.clone()
    }

    pub fn size(&self) -> Size {
        lock(&self.state).size
    }

    pub fn is_visible(&self) -> bool {
        lock(&self.state).visible
    }

    pub fn is_fullscreen(&self) -> bool {
        lock(&self.state).fullscreen
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window").field("state", &*lock(&self.state)).finish()
    }
}
