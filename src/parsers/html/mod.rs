//! HTML解析和处理模块
//!
//! - `dom`: 基础DOM操作
//! - `serializer`: 序列化功能

pub mod dom;
pub mod serializer;

pub use dom::{
    append_child, find_nodes, get_node_attr, get_node_name, get_parent_node, html_to_dom,
    is_connected, node_id, parse_body_fragment, remove_child, text_content, NodeId,
};
pub use serializer::serialize_document;
