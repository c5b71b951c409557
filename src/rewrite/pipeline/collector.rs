//! 文本收集器模块
//!
//! 深度优先收集子树中可改写的文本节点，保持文档顺序

use markup5ever_rcdom::{Handle, NodeData};

use super::filters::{is_eligible, is_excluded_element};

/// 收集统计信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionStats {
    pub nodes_visited: usize,
    pub subtrees_skipped: usize,
    pub texts_collected: usize,
}

/// Eligible text nodes under `root`, `root` included when it is a text node.
///
/// The root's ancestors are checked once; below the root, excluded elements
/// prune their whole subtree.
pub fn collect_text_nodes(root: &Handle) -> (Vec<Handle>, CollectionStats) {
    let mut texts = Vec::new();
    let mut stats = CollectionStats::default();

    if !is_eligible(root) {
        stats.subtrees_skipped += 1;
        return (texts, stats);
    }

    // explicit stack keeps deep documents off the call stack
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        stats.nodes_visited += 1;

        match node.data {
            NodeData::Text { .. } => {
                stats.texts_collected += 1;
                texts.push(node.clone());
            }
            NodeData::Element { .. } if is_excluded_element(&node) => {
                stats.subtrees_skipped += 1;
            }
            NodeData::Element { .. } | NodeData::Document => {
                let children = node.children.borrow();
                stack.extend(children.iter().rev().cloned());
            }
            _ => {}
        }
    }

    (texts, stats)
}
