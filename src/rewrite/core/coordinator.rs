//! 变更协调器
//!
//! 收集被变更记录触及的节点，在文档安静一个去抖窗口后作为一个去重批次交出。

use std::collections::HashSet;
use std::time::Duration;

use markup5ever_rcdom::Handle;
use tokio::time::Instant;

use super::mutation::MutationRecord;
use crate::parsers::html::{is_connected, node_id, text_content, NodeId};
use crate::rewrite::storage::ProcessedMarkers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Stopped,
    Observing,
}

pub struct MutationCoordinator {
    state: CoordinatorState,
    debounce: Duration,
    queue: Vec<Handle>,
    queued: HashSet<NodeId>,
    deadline: Option<Instant>,
}

impl MutationCoordinator {
    pub fn new(debounce: Duration) -> Self {
        Self {
            state: CoordinatorState::Stopped,
            debounce,
            queue: Vec::new(),
            queued: HashSet::new(),
            deadline: None,
        }
    }

    pub fn start(&mut self) {
        self.state = CoordinatorState::Observing;
    }

    /// Stops observing and drops everything still queued.
    pub fn stop(&mut self) {
        self.state = CoordinatorState::Stopped;
        self.queue.clear();
        self.queued.clear();
        self.deadline = None;
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn is_observing(&self) -> bool {
        self.state == CoordinatorState::Observing
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Queues the nodes a batch of records touched and restarts the quiet period.
    pub fn on_mutation_batch(
        &mut self,
        records: Vec<MutationRecord>,
        markers: &mut ProcessedMarkers,
        now: Instant,
    ) {
        if !self.is_observing() || records.is_empty() {
            return;
        }

        for record in records {
            match record {
                MutationRecord::CharacterData { target } => {
                    if let Some(text) = text_content(&target) {
                        markers.invalidate_if_changed(&target, &text);
                    }
                    self.enqueue(target);
                }
                MutationRecord::ChildList { added, .. } => {
                    for node in added {
                        self.enqueue(node);
                    }
                }
            }
        }

        self.deadline = Some(now + self.debounce);
    }

    /// Queued nodes still in the document, once the deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<Vec<Handle>> {
        match self.deadline {
            Some(deadline) if deadline <= now => {}
            _ => return None,
        }

        self.deadline = None;
        self.queued.clear();
        let due: Vec<Handle> = std::mem::take(&mut self.queue)
            .into_iter()
            .filter(is_connected)
            .collect();

        tracing::debug!("{} queued nodes due", due.len());
        Some(due)
    }

    fn enqueue(&mut self, node: Handle) {
        if self.queued.insert(node_id(&node)) {
            self.queue.push(node);
        }
    }
}
