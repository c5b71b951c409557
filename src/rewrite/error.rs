//! 改写模块统一错误处理
//!
//! 提供结构化错误类型和错误处理机制

use std::fmt;

use thiserror::Error;

/// 改写错误类型
#[derive(Error, Debug, Clone)]
pub enum RewriteError {
    /// 配置错误
    #[error("configuration error: {0}")]
    Config(String),

    /// 设置存储错误
    #[error("settings store error: {0}")]
    Settings(String),

    /// 模式编译错误
    #[error("pattern compilation error: {0}")]
    Compile(String),

    /// 节点访问错误
    #[error("node access error: {0}")]
    NodeAccess(String),

    /// 序列化错误
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO错误
    #[error("io error: {0}")]
    Io(String),

    /// 内部错误
    #[error("internal error: {0}")]
    Internal(String),
}

impl RewriteError {
    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RewriteError::Config(_) => ErrorSeverity::Warning,
            RewriteError::Settings(_) => ErrorSeverity::Error,
            RewriteError::Compile(_) => ErrorSeverity::Error,
            RewriteError::NodeAccess(_) => ErrorSeverity::Warning,
            RewriteError::Serialization(_) => ErrorSeverity::Error,
            RewriteError::Io(_) => ErrorSeverity::Error,
            RewriteError::Internal(_) => ErrorSeverity::Critical,
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(self, context: T) -> Self {
        let new_msg = format!("{} (context: {})", self, context);

        match self {
            RewriteError::Config(_) => RewriteError::Config(new_msg),
            RewriteError::Settings(_) => RewriteError::Settings(new_msg),
            RewriteError::Compile(_) => RewriteError::Compile(new_msg),
            RewriteError::NodeAccess(_) => RewriteError::NodeAccess(new_msg),
            RewriteError::Serialization(_) => RewriteError::Serialization(new_msg),
            RewriteError::Io(_) => RewriteError::Io(new_msg),
            RewriteError::Internal(_) => RewriteError::Internal(new_msg),
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl From<std::io::Error> for RewriteError {
    fn from(error: std::io::Error) -> Self {
        RewriteError::Io(error.to_string())
    }
}

impl From<serde_json::Error> for RewriteError {
    fn from(error: serde_json::Error) -> Self {
        RewriteError::Serialization(format!("JSON: {}", error))
    }
}

impl From<toml::de::Error> for RewriteError {
    fn from(error: toml::de::Error) -> Self {
        RewriteError::Config(format!("TOML: {}", error))
    }
}

impl From<regex::Error> for RewriteError {
    fn from(error: regex::Error) -> Self {
        RewriteError::Compile(error.to_string())
    }
}

/// 错误结果类型别名
pub type RewriteResult<T> = Result<T, RewriteError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 按严重程度记录错误
    pub fn log_error(error: &RewriteError) {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("{}", error),
            ErrorSeverity::Warning => tracing::warn!("{}", error),
            ErrorSeverity::Error => tracing::error!("{}", error),
            ErrorSeverity::Critical => tracing::error!("critical: {}", error),
        }
    }

    /// 记录错误并回退到默认值
    pub fn log_or_default<T: Default>(result: RewriteResult<T>) -> T {
        result.unwrap_or_else(|error| {
            log_error(&error);
            T::default()
        })
    }

    pub fn config_error<T: fmt::Display>(msg: T) -> RewriteError {
        RewriteError::Config(msg.to_string())
    }

    pub fn settings_error<T: fmt::Display>(msg: T) -> RewriteError {
        RewriteError::Settings(msg.to_string())
    }

    pub fn node_error<T: fmt::Display>(msg: T) -> RewriteError {
        RewriteError::NodeAccess(msg.to_string())
    }
}
