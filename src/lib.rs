//! # Wordswap Library
//!
//! 在不断变化的文档树中实时替换配置好的词语，并保留原文的大小写形态。
//!
//! ## 模块组织
//!
//! - `env` - 类型化的环境变量
//! - `parsers` - HTML 解析、DOM 工具与序列化
//! - `rewrite` - 改写引擎（编译、过滤、应用、变更协调）

pub mod env;
pub mod parsers;
pub mod rewrite;

// Re-export commonly used items for convenience
pub use parsers::{html_to_dom, serialize_document};
pub use rewrite::{
    Configuration, EngineOptions, LiveDocument, MemoryStore, ReplacementGroup, RewriteEngine,
    RewriteError, RewriteResult,
};
