//! 改写管道模块
//!
//! 提供文本处理管道，包括模式编译、大小写适配、节点过滤、收集和批次应用

pub mod apply;
pub mod case;
pub mod collector;
pub mod compiler;
pub mod filters;

// 重新导出主要类型
pub use apply::{Applier, ApplyStats};
pub use case::adapt_case;
pub use collector::{collect_text_nodes, CollectionStats};
pub use compiler::{compile_matchers, CompiledMatcher, MatcherSet};
pub use filters::{is_eligible, is_excluded_element};
