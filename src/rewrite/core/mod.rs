//! 改写系统核心模块
//!
//! 把管道组件连接到活动文档上：
//!
//! - **文档层** (`mutation.rs`): `LiveDocument` 与变更记录，充当宿主页面的观察者
//! - **协调层** (`coordinator.rs`): 去抖、去重，并把受影响的节点交回管道
//! - **引擎层** (`engine.rs`): 加载配置、编译匹配器、执行初始与增量改写
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use wordswap::rewrite::config::EngineOptions;
//! use wordswap::rewrite::core::{LiveDocument, RewriteEngine};
//! use wordswap::rewrite::settings::MemoryStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::from_json(r#"{"replacementGroups": [{"replacement": "dog", "words": ["cat"]}]}"#)?;
//! let document = LiveDocument::from_html("<p>A cat.</p>");
//!
//! let mut engine = RewriteEngine::new(store, document, EngineOptions::default());
//! engine.start().await;
//! println!("rewrote {} nodes", engine.last_pass().nodes_rewritten);
//! # Ok(())
//! # }
//! ```

pub mod coordinator;
pub mod engine;
pub mod mutation;

pub use coordinator::{CoordinatorState, MutationCoordinator};
pub use engine::{EngineEvent, EngineState, RewriteEngine};
pub use mutation::{LiveDocument, MutationRecord};
