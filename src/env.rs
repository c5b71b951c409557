//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量管理

use std::env;
use std::fmt;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "WORDSWAP_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("warn".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }
}

/// 引擎相关环境变量
pub mod engine {
    use super::*;

    /// 去抖窗口
    pub struct DebounceMs;
    impl EnvVar<u64> for DebounceMs {
        const NAME: &'static str = "WORDSWAP_DEBOUNCE_MS";
        const DEFAULT: Option<u64> = None;
        const DESCRIPTION: &'static str = "Quiet window in milliseconds before queued mutations are processed";

        fn parse(value: &str) -> EnvResult<u64> {
            parse_positive_usize(value, Self::NAME, 1, 10_000).map(|ms| ms as u64)
        }
    }

    /// 每批处理的文本节点数
    pub struct BatchSize;
    impl EnvVar<usize> for BatchSize {
        const NAME: &'static str = "WORDSWAP_BATCH_SIZE";
        const DEFAULT: Option<usize> = None;
        const DESCRIPTION: &'static str = "Text nodes rewritten between cooperative yields";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 100_000)
        }
    }

    /// 最短文本长度
    pub struct MinTextLength;
    impl EnvVar<usize> for MinTextLength {
        const NAME: &'static str = "WORDSWAP_MIN_TEXT_LENGTH";
        const DEFAULT: Option<usize> = None;
        const DESCRIPTION: &'static str = "Text nodes shorter than this many characters are skipped";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 1_000)
        }
    }

    /// 词条上限
    pub struct MaxWords;
    impl EnvVar<usize> for MaxWords {
        const NAME: &'static str = "WORDSWAP_MAX_WORDS";
        const DEFAULT: Option<usize> = None;
        const DESCRIPTION: &'static str = "Maximum number of word entries compiled across all groups";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 50_000)
        }
    }
}

fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables\n\n");

    let entries = [
        (core::LogLevel::NAME, core::LogLevel::DESCRIPTION),
        (engine::DebounceMs::NAME, engine::DebounceMs::DESCRIPTION),
        (engine::BatchSize::NAME, engine::BatchSize::DESCRIPTION),
        (engine::MinTextLength::NAME, engine::MinTextLength::DESCRIPTION),
        (engine::MaxWords::NAME, engine::MaxWords::DESCRIPTION),
    ];

    for (name, description) in entries {
        docs.push_str(&format!("- `{}`: {}\n", name, description));
    }

    docs
}
