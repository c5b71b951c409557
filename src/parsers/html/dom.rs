use std::rc::Rc;

use encoding_rs::Encoding;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Identity of a DOM node, stable for as long as the node is alive
pub type NodeId = usize;

/// 将 HTML 字节转换为 DOM
pub fn html_to_dom(data: &[u8], document_encoding: &str) -> RcDom {
    let s: String = match Encoding::for_label(document_encoding.as_bytes()) {
        Some(encoding) => {
            let (string, _, _) = encoding.decode(data);
            string.to_string()
        }
        None => String::from_utf8_lossy(data).to_string(),
    };

    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut s.as_bytes())
        .unwrap_or_default()
}

/// 查找指定路径的DOM节点
pub fn find_nodes(node: &Handle, node_names: &[&str]) -> Vec<Handle> {
    let mut found_nodes = Vec::new();
    let Some((node_name, rest)) = node_names.split_first() else {
        return found_nodes;
    };

    let is_named = matches!(node.data, NodeData::Element { ref name, .. } if &*name.local == *node_name);

    if is_named && rest.is_empty() {
        found_nodes.push(node.clone());
    }

    if is_named && !rest.is_empty() {
        for child_node in node.children.borrow().iter() {
            found_nodes.append(&mut find_nodes(child_node, rest));
        }
    } else {
        for child_node in node.children.borrow().iter() {
            found_nodes.append(&mut find_nodes(child_node, node_names));
        }
    }

    found_nodes
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == attr_name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// Returns the parent of `child`, leaving the child's parent link in place.
pub fn get_parent_node(child: &Handle) -> Option<Handle> {
    let weak = child.parent.take();
    let parent = weak.as_ref().and_then(|node| node.upgrade());
    child.parent.set(weak);
    parent
}

/// Current contents of a text node, `None` for every other node kind.
pub fn text_content(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Text { contents } => Some(contents.borrow().to_string()),
        _ => None,
    }
}

/// True while the node can still be reached from its document root.
pub fn is_connected(node: &Handle) -> bool {
    let mut current = node.clone();
    loop {
        if matches!(current.data, NodeData::Document) {
            return true;
        }
        match get_parent_node(&current) {
            Some(parent) => current = parent,
            None => return false,
        }
    }
}

pub fn node_id(node: &Handle) -> NodeId {
    Rc::as_ptr(node) as usize
}

/// Appends `child` to `parent`, fixing up the child's parent link.
pub fn append_child(parent: &Handle, child: Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

/// Detaches `child` from `parent`. Returns false when it was not a child.
pub fn remove_child(parent: &Handle, child: &Handle) -> bool {
    let mut children = parent.children.borrow_mut();
    match children.iter().position(|c| Rc::ptr_eq(c, child)) {
        Some(index) => {
            let removed = children.remove(index);
            removed.parent.set(None);
            true
        }
        None => false,
    }
}

/// Parses `html` as body content and returns the detached top-level nodes.
pub fn parse_body_fragment(html: &str) -> Vec<Handle> {
    let dom = html_to_dom(format!("<body>{}</body>", html).as_bytes(), "utf-8");
    let Some(body) = find_nodes(&dom.document, &["html", "body"]).into_iter().next() else {
        return Vec::new();
    };

    let nodes: Vec<Handle> = body.children.borrow_mut().drain(..).collect();
    for node in &nodes {
        node.parent.set(None);
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_parent_node_keeps_link() {
        let dom = html_to_dom(b"<html><body><p>hello</p></body></html>", "utf-8");
        let p = find_nodes(&dom.document, &["html", "body", "p"])[0].clone();
        let text = p.children.borrow()[0].clone();

        let first = get_parent_node(&text).map(|n| node_id(&n));
        let second = get_parent_node(&text).map(|n| node_id(&n));

        assert_eq!(first, Some(node_id(&p)));
        assert_eq!(first, second);
    }

    #[test]
    fn test_is_connected_after_removal() {
        let dom = html_to_dom(b"<html><body><p>hello</p></body></html>", "utf-8");
        let body = find_nodes(&dom.document, &["html", "body"])[0].clone();
        let p = find_nodes(&body, &["p"])[0].clone();

        assert!(is_connected(&p));
        assert!(remove_child(&body, &p));
        assert!(!is_connected(&p));
    }

    #[test]
    fn test_parse_body_fragment() {
        let nodes = parse_body_fragment("<p>one</p>two<span>three</span>");

        assert_eq!(nodes.len(), 3);
        assert_eq!(get_node_name(&nodes[0]), Some("p"));
        assert_eq!(text_content(&nodes[1]).as_deref(), Some("two"));
        assert!(nodes.iter().all(|n| get_parent_node(n).is_none()));
    }

    #[test]
    fn test_get_node_attr() {
        let dom = html_to_dom(b"<div contenteditable=\"true\">x</div>", "utf-8");
        let div = find_nodes(&dom.document, &["html", "body", "div"])[0].clone();

        assert_eq!(get_node_attr(&div, "contenteditable").as_deref(), Some("true"));
        assert_eq!(get_node_attr(&div, "missing"), None);
    }
}
