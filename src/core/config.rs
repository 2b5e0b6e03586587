//! 配置管理模块
//!
//! 提供引擎配置的加载、解析和管理功能。
//! 支持从 TOML 配置文件加载，也支持命令行参数覆盖。
//!
//! # 配置文件格式 (dee.toml)
//!
//! ```toml
//! [dispatch]
//! default_mode = "queued"  # auto, direct, queued
//!
//! [application]
//! max_fps = 60             # 0 表示不限帧
//! max_frames = 0           # 0 表示一直运行到 quit
//!
//! [window]
//! title = "Dee"
//! width = 800
//! height = 600
//! fullscreen = true
//!
//! [logging]
//! level = "info"           # trace, debug, info, warn, error
//! file_output = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::error::{ConfigError, Result};
use super::signal::DeliveryMode;

/// 引擎配置
///
/// 包含了引擎运行所需的所有配置项。
/// 可以从配置文件加载，也可以通过代码构建。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 信号分发配置
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// 主循环配置
    #[serde(default)]
    pub application: ApplicationConfig,

    /// 窗口配置
    #[serde(default)]
    pub window: WindowConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 信号分发配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// 引擎内部信号的默认投递方式
    ///
    /// `auto` 与 `queued` 等价。
    #[serde(default = "default_mode")]
    pub default_mode: DeliveryMode,
}

/// 主循环配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// 帧率上限，0 表示不限帧
    #[serde(default = "default_max_fps")]
    pub max_fps: u32,

    /// 运行的最大帧数，0 表示一直运行到 `quit`
    #[serde(default)]
    pub max_frames: u64,
}

/// 窗口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// 窗口标题
    #[serde(default = "default_title")]
    pub title: String,

    /// 窗口宽度
    #[serde(default = "default_width")]
    pub width: u32,

    /// 窗口高度
    #[serde(default = "default_height")]
    pub height: u32,

    /// 显示时是否全屏
    #[serde(default = "default_fullscreen")]
    pub fullscreen: bool,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default = "default_file_output")]
    pub file_output: bool,

    /// 日志文件路径
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

// 默认值函数
fn default_mode() -> DeliveryMode { DeliveryMode::Queued }
fn default_max_fps() -> u32 { 60 }
fn default_title() -> String { "Dee".to_string() }
fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }
fn default_fullscreen() -> bool { true }
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_file_output() -> bool { false }
fn default_log_file() -> String { "dee.log".to_string() }

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_mode: default_mode(),
        }
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            max_fps: default_max_fps(),
            max_frames: 0,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            width: default_width(),
            height: default_height(),
            fullscreen: default_fullscreen(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: default_file_output(),
            log_file: default_log_file(),
        }
    }
}

impl ApplicationConfig {
    /// 每帧的最短时长，不限帧时返回 `None`
    pub fn frame_time(&self) -> Option<Duration> {
        (self.max_fps > 0).then(|| Duration::from_secs(1) / self.max_fps)
    }

    /// 帧数上限，未设置时返回 `None`
    pub fn frame_limit(&self) -> Option<u64> {
        (self.max_frames > 0).then_some(self.max_frames)
    }
}

impl Config {
    /// 从配置文件加载
    ///
    /// # 参数
    ///
    /// * `path` - 配置文件路径
    ///
    /// # 返回值
    ///
    /// 成功返回 `Config` 实例，失败返回错误
    ///
    /// # 示例
    ///
    /// ```no_run
    /// use dee::core::Config;
    ///
    /// let config = Config::from_file("dee.toml").unwrap();
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path_str.clone()))?;

        Self::from_toml(&contents)
    }

    /// 从 TOML 字符串解析
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// 从配置文件加载，如果文件不存在则使用默认配置
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::from_file(path).unwrap_or_default()
    }

    /// 保存配置到文件
    ///
    /// # 返回值
    ///
    /// 成功返回 `Ok(())`，失败返回错误
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// 从命令行参数覆盖配置
    ///
    /// 支持的参数：
    /// - `--title <name>`: 设置窗口标题
    /// - `--no-fullscreen`: 以窗口模式显示
    /// - `--width <value>` / `--height <value>`: 设置窗口尺寸
    /// - `--direct`: 引擎信号默认直接投递
    /// - `--frames <value>`: 运行指定帧数后退出
    pub fn apply_args<I>(&mut self, args: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

        if let Some(title) = value_after(&args, "--title") {
            self.window.title = title.clone();
        }

        if args.iter().any(|a| a == "--no-fullscreen") {
            self.window.fullscreen = false;
        }

        if args.iter().any(|a| a == "--direct") {
            self.dispatch.default_mode = DeliveryMode::Direct;
        }

        if let Some(width) = value_after(&args, "--width").and_then(|v| v.parse().ok()) {
            self.window.width = width;
        }

        if let Some(height) = value_after(&args, "--height").and_then(|v| v.parse().ok()) {
            self.window.height = height;
        }

        if let Some(frames) = value_after(&args, "--frames").and_then(|v| v.parse().ok()) {
            self.application.max_frames = frames;
        }
    }

    /// 验证配置的有效性
    ///
    /// # 返回值
    ///
    /// 配置有效返回 `Ok(())`，否则返回错误
    pub fn validate(&self) -> Result<()> {
        // 验证窗口尺寸
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "window.width/height".to_string(),
                reason: "Window dimensions must be greater than 0".to_string(),
            }.into());
        }

        if self.application.max_fps > 1000 {
            return Err(ConfigError::InvalidValue {
                field: "application.max_fps".to_string(),
                reason: "Frame rate cap must be at most 1000 (or 0 for unpaced)".to_string(),
            }.into());
        }

        Ok(())
    }
}

fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a String> {
    let idx = args.iter().position(|a| a == flag)?;
    args.get(idx + 1)
}
