//! 引擎配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

pub use manager::{ConfigManager, EngineOptions};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 文本处理相关
    pub const MIN_TEXT_LENGTH: usize = 2;
    pub const BATCH_SIZE: usize = 100;
    pub const DEBOUNCE: Duration = Duration::from_millis(50);

    // 模式编译相关
    pub const MAX_WORDS: usize = 500;
    pub const REGEX_SIZE_LIMIT: usize = 10 * (1 << 20);

    // 替换文本为空时使用
    pub const DEFAULT_REPLACEMENT: &str = "Cocaine";

    // 不参与改写的元素
    pub const EXCLUDED_ELEMENTS: &[&str] = &[
        "script", "style", "noscript", "iframe", "frame", "textarea", "input", "select", "option",
    ];

    // 设置存储键
    pub const KEY_ENABLED: &str = "enabled";
    pub const KEY_REPLACEMENT_GROUPS: &str = "replacementGroups";
    pub const LEGACY_KEY_REPLACEMENT: &str = "replacement";
    pub const LEGACY_KEY_WORDS: &str = "words";
    pub const LEGACY_KEY_MATCH_WHOLE_WORDS: &str = "matchWholeWords";
    pub const LEGACY_KEY_CASE_INSENSITIVE: &str = "caseInsensitive";
    pub const LEGACY_KEYS: &[&str] = &[
        LEGACY_KEY_REPLACEMENT,
        LEGACY_KEY_WORDS,
        LEGACY_KEY_MATCH_WHOLE_WORDS,
        LEGACY_KEY_CASE_INSENSITIVE,
    ];

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "wordswap.toml",
        ".wordswap.toml",
        "~/.config/wordswap/options.toml",
        "/etc/wordswap/options.toml",
    ];
}

