//! 文本改写模块
//!
//! 在活动文档中查找配置好的词语并替换，同时保留原文的大小写形态：
//! - **config**: 引擎选项与常量
//! - **settings**: 替换组、设置存储与旧格式迁移
//! - **pipeline**: 模式编译、大小写适配、节点过滤、收集与批次应用
//! - **storage**: 已处理节点标记
//! - **core**: 活动文档、变更协调与引擎控制器
//! - **error**: 错误处理

/// 配置管理模块 - 引擎选项、默认值与环境变量覆盖
pub mod config;

/// 核心引擎模块 - 文档观察、变更协调与改写引擎
pub mod core;

/// 错误处理模块 - 统一的错误类型和处理机制
pub mod error;

/// 文本处理管道模块 - 编译、过滤、收集与应用
pub mod pipeline;

/// 设置模块 - 替换组模型与设置存储
pub mod settings;

/// 存储管理模块 - 已处理节点标记
pub mod storage;

// 重新导出主要类型
pub use config::{ConfigManager, EngineOptions};
pub use self::core::{EngineEvent, LiveDocument, MutationRecord, RewriteEngine};
pub use error::{RewriteError, RewriteResult};
pub use pipeline::{adapt_case, compile_matchers, ApplyStats, MatcherSet};
pub use settings::{
    migrate_legacy_settings, Configuration, MemoryStore, ReplacementGroup, SettingsStore,
    StorageArea, StorageChange,
};
pub use storage::ProcessedMarkers;
