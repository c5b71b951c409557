//! 节点过滤器模块
//!
//! 判断节点是否可以被改写。脚本、样式、表单控件以及可编辑区域中的文本
//! 一律不动；资格会从任意一层祖先继承下来。

use markup5ever_rcdom::Handle;

use crate::parsers::html::{get_node_attr, get_node_name, get_parent_node};
use crate::rewrite::config::constants;

/// Editing state an element declares through `contenteditable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Editability {
    Editable,
    ReadOnly,
    Inherit,
}

fn editability(node: &Handle) -> Editability {
    match get_node_attr(node, "contenteditable") {
        Some(value) if value.trim().eq_ignore_ascii_case("false") => Editability::ReadOnly,
        Some(value) if value.trim().eq_ignore_ascii_case("inherit") => Editability::Inherit,
        Some(_) => Editability::Editable,
        None => Editability::Inherit,
    }
}

/// True for elements whose own subtree is never rewritten.
pub fn is_excluded_element(node: &Handle) -> bool {
    match get_node_name(node) {
        Some(name) => {
            constants::EXCLUDED_ELEMENTS.contains(&name)
                || editability(node) == Editability::Editable
        }
        None => false,
    }
}

/// Walks from `node` up to its root and decides whether its text may change.
pub fn is_eligible(node: &Handle) -> bool {
    let mut editability_decided = false;
    let mut current = Some(node.clone());

    while let Some(candidate) = current {
        if let Some(name) = get_node_name(&candidate) {
            if constants::EXCLUDED_ELEMENTS.contains(&name) {
                return false;
            }

            // the nearest explicit contenteditable decides
            if !editability_decided {
                match editability(&candidate) {
                    Editability::Editable => return false,
                    Editability::ReadOnly => editability_decided = true,
                    Editability::Inherit => {}
                }
            }
        }

        current = get_parent_node(&candidate);
    }

    true
}
