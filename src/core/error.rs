//! 错误处理模块
//!
//! 定义了引擎外层（配置、线程、定时器、日志）使用的统一错误类型。
//!
//! 信号/槽分发核心本身没有可恢复的错误：空信号发射、重复连接都不是错误，
//! 接收者类型不匹配在编译期被拒绝，悬垂接收者由弱引用在结构上排除。
//!
//! # 设计原则
//!
//! - 为每种错误类型提供清晰的上下文信息
//! - 支持错误链（error source）
//! - 易于模式匹配和错误处理

use std::fmt;

/// 引擎统一的 Result 类型
///
/// 所有可能返回错误的函数都应该使用这个类型。
pub type Result<T> = std::result::Result<T, DeeError>;

/// Dee 引擎的错误类型
#[derive(Debug)]
pub enum DeeError {
    /// 配置错误
    Config(ConfigError),

    /// 工作线程错误
    Thread(ThreadError),

    /// 定时器错误
    Timer(TimerError),

    /// IO 错误
    Io(std::io::Error),

    /// 日志系统错误
    Log(String),
}

/// 配置相关的错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),

    /// 配置文件解析失败
    ParseError(String),

    /// 配置值无效
    InvalidValue { field: String, reason: String },
}

/// 工作线程相关的错误
#[derive(Debug)]
pub enum ThreadError {
    /// 线程已在运行，不能重复启动
    AlreadyRunning(String),

    /// 线程体发生 panic
    Panicked(String),
}

/// 定时器相关的错误
#[derive(Debug, PartialEq, Eq)]
pub enum TimerError {
    /// 间隔为 0 的定时器不会启动
    ZeroInterval,
}

impl fmt::Display for DeeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeeError::Config(e) => write!(f, "Configuration error: {}", e),
            DeeError::Thread(e) => write!(f, "Thread error: {}", e),
            DeeError::Timer(e) => write!(f, "Timer error: {}", e),
            DeeError::Io(e) => write!(f, "IO error: {}", e),
            DeeError::Log(msg) => write!(f, "Log error: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseError(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl fmt::Display for ThreadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadError::AlreadyRunning(name) => write!(f, "Thread '{}' is already running", name),
            ThreadError::Panicked(name) => write!(f, "Thread '{}' panicked", name),
        }
    }
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerError::ZeroInterval => write!(f, "Timer interval must be greater than 0"),
        }
    }
}

impl std::error::Error for DeeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DeeError::Config(e) => Some(e),
            DeeError::Thread(e) => Some(e),
            DeeError::Timer(e) => Some(e),
            DeeError::Io(e) => Some(e),
            DeeError::Log(_) => None,
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for ThreadError {}
impl std::error::Error for TimerError {}

// 实现 From trait 以便于错误转换
impl From<std::io::Error> for DeeError {
    fn from(err: std::io::Error) -> Self {
        DeeError::Io(err)
    }
}

impl From<ConfigError> for DeeError {
    fn from(err: ConfigError) -> Self {
        DeeError::Config(err)
    }
}

impl From<ThreadError> for DeeError {
    fn from(err: ThreadError) -> Self {
        DeeError::Thread(err)
    }
}

impl From<TimerError> for DeeError {
    fn from(err: TimerError) -> Self {
        DeeError::Timer(err)
    }
}
