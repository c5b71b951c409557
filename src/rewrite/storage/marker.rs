//! 已处理节点标记（弱引用侧表）
//!
//! 记录哪些文本节点已经扫描过以及扫描时的文本。表中只保存 `Weak` 引用，
//! 不会延长已移除节点的生命周期；它只是缓存，随时清空只会导致重新扫描。

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use markup5ever_rcdom::{Handle, Node};

use crate::parsers::html::{node_id, NodeId};

/// Inserts between sweeps of dead entries.
const PRUNE_INTERVAL: usize = 1024;

struct MarkerEntry {
    node: Weak<Node>,
    fingerprint: u64,
}

/// 标记统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkerStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
    pub pruned: u64,
}

#[derive(Default)]
pub struct ProcessedMarkers {
    entries: HashMap<NodeId, MarkerEntry>,
    inserts_since_prune: usize,
    stats: MarkerStats,
}

impl ProcessedMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `node` was marked while holding exactly `text`.
    pub fn is_processed(&mut self, node: &Handle, text: &str) -> bool {
        let hit = match self.entries.get(&node_id(node)) {
            Some(entry) => is_same_node(entry, node) && entry.fingerprint == fingerprint(text),
            None => false,
        };

        if hit {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        hit
    }

    pub fn mark(&mut self, node: &Handle, text: &str) {
        self.entries.insert(
            node_id(node),
            MarkerEntry {
                node: Rc::downgrade(node),
                fingerprint: fingerprint(text),
            },
        );

        self.inserts_since_prune += 1;
        if self.inserts_since_prune >= PRUNE_INTERVAL {
            self.prune();
        }
    }

    pub fn invalidate(&mut self, node: &Handle) {
        if self.entries.remove(&node_id(node)).is_some() {
            self.stats.invalidations += 1;
        }
    }

    /// Drops the marker unless `current_text` is still the marked text.
    ///
    /// A node the engine just rewrote keeps its marker, so the change record
    /// produced by that write leaves nothing to do.
    pub fn invalidate_if_changed(&mut self, node: &Handle, current_text: &str) -> bool {
        let stale = match self.entries.get(&node_id(node)) {
            Some(entry) => !is_same_node(entry, node) || entry.fingerprint != fingerprint(current_text),
            None => return false,
        };

        if stale {
            self.invalidate(node);
        }
        stale
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.inserts_since_prune = 0;
    }

    /// Removes entries whose node has been dropped.
    pub fn prune(&mut self) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.node.strong_count() > 0);
        self.stats.pruned += (before - self.entries.len()) as u64;
        self.inserts_since_prune = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> MarkerStats {
        self.stats
    }
}

// guards against an address being reused by a new node
fn is_same_node(entry: &MarkerEntry, node: &Handle) -> bool {
    entry
        .node
        .upgrade()
        .map_or(false, |alive| Rc::ptr_eq(&alive, node))
}

fn fingerprint(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use html5ever::tendril::StrTendril;
    use markup5ever_rcdom::NodeData;
    use std::cell::RefCell;

    fn text_node(text: &str) -> Handle {
        Node::new(NodeData::Text {
            contents: RefCell::new(StrTendril::from_slice(text)),
        })
    }

    #[test]
    fn test_mark_and_lookup() {
        let mut markers = ProcessedMarkers::new();
        let node = text_node("hello");

        assert!(!markers.is_processed(&node, "hello"));
        markers.mark(&node, "hello");
        assert!(markers.is_processed(&node, "hello"));
        assert!(!markers.is_processed(&node, "hello world"));
        assert_eq!(markers.stats().hits, 1);
    }

    #[test]
    fn test_invalidate_if_changed_keeps_own_write() {
        let mut markers = ProcessedMarkers::new();
        let node = text_node("the dog");
        markers.mark(&node, "the dog");

        assert!(!markers.invalidate_if_changed(&node, "the dog"));
        assert_eq!(markers.len(), 1);

        assert!(markers.invalidate_if_changed(&node, "the cat"));
        assert!(markers.is_empty());
    }

    #[test]
    fn test_entries_do_not_keep_nodes_alive() {
        let mut markers = ProcessedMarkers::new();
        let node = text_node("gone soon");
        let weak = Rc::downgrade(&node);
        markers.mark(&node, "gone soon");

        drop(node);
        assert!(weak.upgrade().is_none());

        markers.prune();
        assert!(markers.is_empty());
        assert_eq!(markers.stats().pruned, 1);
    }

    #[test]
    fn test_clear() {
        let mut markers = ProcessedMarkers::new();
        let node = text_node("a");
        markers.mark(&node, "a");
        markers.clear();

        assert!(!markers.is_processed(&node, "a"));
    }
}
