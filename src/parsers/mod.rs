//! # 解析器模块
//!
//! HTML 文档解析、DOM 操作与序列化。引擎只通过这里的辅助函数接触
//! `markup5ever_rcdom` 的节点结构。

pub mod html;

pub use html::{html_to_dom, serialize_document};
