//! 批次应用模块
//!
//! 遍历子树中可改写的文本节点并分批改写，批次之间让出执行权，
//! 避免单个大子树长时间占用线程。

use markup5ever_rcdom::{Handle, NodeData};

use super::collector::collect_text_nodes;
use super::compiler::MatcherSet;
use crate::rewrite::config::EngineOptions;
use crate::rewrite::core::mutation::LiveDocument;
use crate::rewrite::error::{helpers, RewriteResult};
use crate::rewrite::storage::ProcessedMarkers;

/// Counters for one or more passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyStats {
    /// Text nodes handed to the apply step.
    pub nodes_visited: usize,
    pub nodes_rewritten: usize,
    pub nodes_too_short: usize,
    /// Skipped because the marker table already knew the text.
    pub nodes_cached: usize,
    pub errors: usize,
    pub batches: usize,
}

impl ApplyStats {
    pub fn merge(&mut self, other: &ApplyStats) {
        self.nodes_visited += other.nodes_visited;
        self.nodes_rewritten += other.nodes_rewritten;
        self.nodes_too_short += other.nodes_too_short;
        self.nodes_cached += other.nodes_cached;
        self.errors += other.errors;
        self.batches += other.batches;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeOutcome {
    Rewritten,
    Unchanged,
    TooShort,
    Cached,
}

pub struct Applier {
    batch_size: usize,
    min_text_length: usize,
}

impl Applier {
    pub fn new(options: &EngineOptions) -> Self {
        Self {
            batch_size: options.batch_size.max(1),
            min_text_length: options.min_text_length,
        }
    }

    /// Rewrites every eligible text node under `root`.
    pub async fn apply_subtree(
        &self,
        document: &LiveDocument,
        root: &Handle,
        matchers: &MatcherSet,
        markers: &mut ProcessedMarkers,
    ) -> ApplyStats {
        let mut stats = ApplyStats::default();
        if matchers.is_empty() {
            return stats;
        }

        let (nodes, _) = collect_text_nodes(root);
        let mut batches = nodes.chunks(self.batch_size).peekable();

        while let Some(batch) = batches.next() {
            stats.batches += 1;
            for node in batch {
                stats.nodes_visited += 1;
                match self.apply_to_node(document, node, matchers, markers) {
                    Ok(NodeOutcome::Rewritten) => stats.nodes_rewritten += 1,
                    Ok(NodeOutcome::TooShort) => stats.nodes_too_short += 1,
                    Ok(NodeOutcome::Cached) => stats.nodes_cached += 1,
                    Ok(NodeOutcome::Unchanged) => {}
                    Err(error) => {
                        stats.errors += 1;
                        helpers::log_error(&error);
                    }
                }
            }

            if batches.peek().is_some() {
                tokio::task::yield_now().await;
            }
        }

        tracing::debug!(
            "applied to {} text nodes, {} rewritten, {} cached",
            stats.nodes_visited,
            stats.nodes_rewritten,
            stats.nodes_cached
        );
        stats
    }

    fn apply_to_node(
        &self,
        document: &LiveDocument,
        node: &Handle,
        matchers: &MatcherSet,
        markers: &mut ProcessedMarkers,
    ) -> RewriteResult<NodeOutcome> {
        let text = read_text(node)?;

        if text.chars().count() < self.min_text_length {
            return Ok(NodeOutcome::TooShort);
        }

        if markers.is_processed(node, &text) {
            return Ok(NodeOutcome::Cached);
        }

        if !matchers.is_match(&text) {
            markers.mark(node, &text);
            return Ok(NodeOutcome::Unchanged);
        }

        match matchers.rewrite(&text) {
            Some(rewritten) => {
                document.set_text(node, &rewritten)?;
                markers.mark(node, &rewritten);
                Ok(NodeOutcome::Rewritten)
            }
            None => {
                markers.mark(node, &text);
                Ok(NodeOutcome::Unchanged)
            }
        }
    }
}

fn read_text(node: &Handle) -> RewriteResult<String> {
    match &node.data {
        NodeData::Text { contents } => contents
            .try_borrow()
            .map(|c| c.to_string())
            .map_err(|e| helpers::node_error(format!("text is in use: {}", e))),
        _ => Err(helpers::node_error("not a text node")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::text_content;
    use crate::rewrite::pipeline::compiler::compile_matchers;
    use crate::rewrite::settings::ReplacementGroup;

    fn matchers(groups: &[ReplacementGroup]) -> MatcherSet {
        compile_matchers(groups, &EngineOptions::default()).unwrap()
    }

    fn paragraph_text(doc: &LiveDocument) -> String {
        let p = doc.find(&["p"]).unwrap();
        let text = p.children.borrow()[0].clone();
        text_content(&text).unwrap()
    }

    #[tokio::test]
    async fn test_rewrites_and_marks() {
        let doc = LiveDocument::from_html("<p>the cat sat</p><script>cat</script>");
        let set = matchers(&[ReplacementGroup::new("dog", &["cat"])]);
        let mut markers = ProcessedMarkers::new();
        let applier = Applier::new(&EngineOptions::default());

        let stats = applier.apply_subtree(&doc, doc.root(), &set, &mut markers).await;

        assert_eq!(paragraph_text(&doc), "the dog sat");
        assert_eq!(stats.nodes_visited, 1);
        assert_eq!(stats.nodes_rewritten, 1);
        assert_eq!(markers.len(), 1);
    }

    #[tokio::test]
    async fn test_second_pass_hits_markers() {
        let doc = LiveDocument::from_html("<p>cat cat</p><p>nothing here</p>");
        let set = matchers(&[ReplacementGroup::new("cat cat", &["cat"])]);
        let mut markers = ProcessedMarkers::new();
        let applier = Applier::new(&EngineOptions::default());

        applier.apply_subtree(&doc, doc.root(), &set, &mut markers).await;
        let second = applier.apply_subtree(&doc, doc.root(), &set, &mut markers).await;

        assert_eq!(paragraph_text(&doc), "cat cat cat cat");
        assert_eq!(second.nodes_cached, 2);
        assert_eq!(second.nodes_rewritten, 0);
    }

    #[tokio::test]
    async fn test_short_text_is_skipped() {
        let doc = LiveDocument::from_html("<p>a</p>");
        let set = matchers(&[ReplacementGroup::new("b", &["a"]).with_whole_words(false)]);
        let mut markers = ProcessedMarkers::new();
        let applier = Applier::new(&EngineOptions::default());

        let stats = applier.apply_subtree(&doc, doc.root(), &set, &mut markers).await;

        assert_eq!(stats.nodes_too_short, 1);
        assert_eq!(paragraph_text(&doc), "a");
    }

    #[tokio::test]
    async fn test_batches_are_bounded() {
        let body: String = (0..25).map(|i| format!("<p>cat {}</p>", i)).collect();
        let doc = LiveDocument::from_html(&body);
        let set = matchers(&[ReplacementGroup::new("dog", &["cat"])]);
        let mut markers = ProcessedMarkers::new();
        let options = EngineOptions {
            batch_size: 10,
            ..EngineOptions::default()
        };

        let stats = Applier::new(&options)
            .apply_subtree(&doc, doc.root(), &set, &mut markers)
            .await;

        assert_eq!(stats.batches, 3);
        assert_eq!(stats.nodes_rewritten, 25);
    }

    #[tokio::test]
    async fn test_busy_node_does_not_stop_the_pass() {
        let doc = LiveDocument::from_html("<p>cat one</p><p>cat two</p>");
        let set = matchers(&[ReplacementGroup::new("dog", &["cat"])]);
        let mut markers = ProcessedMarkers::new();
        let applier = Applier::new(&EngineOptions::default());

        let first = doc.find(&["p"]).unwrap();
        let first_text = first.children.borrow()[0].clone();
        let guard = match &first_text.data {
            NodeData::Text { contents } => contents.borrow_mut(),
            _ => unreachable!(),
        };

        let stats = applier.apply_subtree(&doc, doc.root(), &set, &mut markers).await;
        drop(guard);

        assert_eq!(stats.errors, 1);
        assert_eq!(stats.nodes_rewritten, 1);
        assert!(doc.to_html().unwrap().contains("dog two"));
    }
}
