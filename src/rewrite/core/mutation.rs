//! 活动文档与变更记录
//!
//! `LiveDocument` 是引擎的宿主侧：连接观察者期间，文本和结构的变化都会
//! 以 [`MutationRecord`] 的形式上报，如同浏览器的变更观察者。包括引擎
//! 自身在内的所有写入都经过它。

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use markup5ever_rcdom::{Handle, NodeData, RcDom};
use tokio::sync::Notify;

use crate::parsers::html::{self, html_to_dom};
use crate::rewrite::error::{helpers, RewriteResult};

/// One observed change.
#[derive(Debug, Clone)]
pub enum MutationRecord {
    /// The text content of `target` changed.
    CharacterData { target: Handle },
    /// Children were added to or removed from `target`.
    ChildList {
        target: Handle,
        added: Vec<Handle>,
        removed: Vec<Handle>,
    },
}

#[derive(Default)]
struct MutationRecorder {
    observing: Cell<bool>,
    pending: RefCell<Vec<MutationRecord>>,
    notify: Notify,
}

impl MutationRecorder {
    fn record(&self, record: MutationRecord) {
        if self.observing.get() {
            self.pending.borrow_mut().push(record);
            self.notify.notify_one();
        }
    }
}

/// Document root plus the observer standing in for the browser's.
///
/// Clones share the same document and the same observer.
#[derive(Clone)]
pub struct LiveDocument {
    root: Handle,
    recorder: Rc<MutationRecorder>,
}

impl LiveDocument {
    pub fn new(dom: RcDom) -> Self {
        Self {
            root: dom.document,
            recorder: Rc::new(MutationRecorder::default()),
        }
    }

    pub fn from_html(html: &str) -> Self {
        Self::new(html_to_dom(html.as_bytes(), "utf-8"))
    }

    pub fn root(&self) -> &Handle {
        &self.root
    }

    /// First element matching the tag path, searched from the root.
    pub fn find(&self, path: &[&str]) -> Option<Handle> {
        html::find_nodes(&self.root, path).into_iter().next()
    }

    pub fn body(&self) -> Option<Handle> {
        self.find(&["html", "body"])
    }

    pub fn observe(&self) {
        self.recorder.observing.set(true);
    }

    /// Stops recording and discards records not yet taken.
    pub fn disconnect(&self) {
        self.recorder.observing.set(false);
        self.recorder.pending.borrow_mut().clear();
    }

    pub fn is_observing(&self) -> bool {
        self.recorder.observing.get()
    }

    pub fn take_records(&self) -> Vec<MutationRecord> {
        std::mem::take(&mut *self.recorder.pending.borrow_mut())
    }

    pub fn has_pending_records(&self) -> bool {
        !self.recorder.pending.borrow().is_empty()
    }

    /// Resolves once a record is queued after the last wake-up.
    pub async fn records_available(&self) {
        self.recorder.notify.notified().await
    }

    /// Replaces the contents of a text node in a single write.
    pub fn set_text(&self, node: &Handle, text: &str) -> RewriteResult<()> {
        let NodeData::Text { ref contents } = node.data else {
            return Err(helpers::node_error("target is not a text node"));
        };

        {
            let mut contents = contents
                .try_borrow_mut()
                .map_err(|e| helpers::node_error(format!("text is in use: {}", e)))?;
            contents.clear();
            contents.push_slice(text);
        }

        self.recorder.record(MutationRecord::CharacterData {
            target: node.clone(),
        });
        Ok(())
    }

    /// Parses `markup` as body content and appends it to `parent`.
    pub fn append_html(&self, parent: &Handle, markup: &str) -> Vec<Handle> {
        let added = html::parse_body_fragment(markup);
        for node in &added {
            html::append_child(parent, node.clone());
        }

        self.recorder.record(MutationRecord::ChildList {
            target: parent.clone(),
            added: added.clone(),
            removed: Vec::new(),
        });
        added
    }

    pub fn remove_child(&self, parent: &Handle, child: &Handle) -> bool {
        let removed = html::remove_child(parent, child);
        if removed {
            self.recorder.record(MutationRecord::ChildList {
                target: parent.clone(),
                added: Vec::new(),
                removed: vec![child.clone()],
            });
        }
        removed
    }

    pub fn to_html(&self) -> RewriteResult<String> {
        let bytes = html::serialize_document(&self.root, "utf-8")?;
        String::from_utf8(bytes).map_err(helpers::node_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::text_content;

    #[test]
    fn test_records_only_while_observing() {
        let doc = LiveDocument::from_html("<p>one</p>");
        let body = doc.body().unwrap();

        doc.append_html(&body, "<p>two</p>");
        assert!(doc.take_records().is_empty());

        doc.observe();
        doc.append_html(&body, "<p>three</p>");
        let records = doc.take_records();

        assert_eq!(records.len(), 1);
        assert!(matches!(&records[0], MutationRecord::ChildList { added, .. } if added.len() == 1));
    }

    #[test]
    fn test_set_text_is_one_record() {
        let doc = LiveDocument::from_html("<p>one</p>");
        let p = doc.find(&["p"]).unwrap();
        let text = p.children.borrow()[0].clone();

        doc.observe();
        doc.set_text(&text, "uno").unwrap();

        assert_eq!(text_content(&text).as_deref(), Some("uno"));
        assert_eq!(doc.take_records().len(), 1);
    }

    #[test]
    fn test_set_text_rejects_elements() {
        let doc = LiveDocument::from_html("<p>one</p>");
        let p = doc.find(&["p"]).unwrap();

        assert!(doc.set_text(&p, "x").is_err());
    }

    #[test]
    fn test_disconnect_discards_pending() {
        let doc = LiveDocument::from_html("<p>one</p>");
        let body = doc.body().unwrap();

        doc.observe();
        doc.append_html(&body, "<p>two</p>");
        doc.disconnect();

        assert!(!doc.has_pending_records());
    }

    #[test]
    fn test_to_html() {
        let doc = LiveDocument::from_html("<p>one</p>");
        assert!(doc.to_html().unwrap().contains("<p>one</p>"));
    }
}
