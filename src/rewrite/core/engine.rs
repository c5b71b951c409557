//! 改写引擎控制器
//!
//! 每个文档由一个 `RewriteEngine` 持有全部派生状态：已加载的配置、编译后的
//! 匹配器、已处理节点标记和变更协调器。所有入口都接收 `&mut self`，
//! 事件按顺序逐个处理完毕。

use markup5ever_rcdom::Handle;
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::coordinator::{CoordinatorState, MutationCoordinator};
use super::mutation::{LiveDocument, MutationRecord};
use crate::rewrite::config::EngineOptions;
use crate::rewrite::error::helpers;
use crate::rewrite::pipeline::{compile_matchers, Applier, ApplyStats, MatcherSet};
use crate::rewrite::settings::{Configuration, SettingsStore, StorageChange};
use crate::rewrite::storage::ProcessedMarkers;

/// Inputs the run loop reacts to besides the document's own records.
#[derive(Debug)]
pub enum EngineEvent {
    Mutations(Vec<MutationRecord>),
    SettingsChanged(StorageChange),
    Shutdown,
}

/// 引擎状态
pub struct EngineState {
    pub configuration: Configuration,
    pub matchers: MatcherSet,
    pub markers: ProcessedMarkers,
    pub coordinator: MutationCoordinator,
    /// Stats of the most recent pass, initial or incremental.
    pub last_pass: ApplyStats,
    pub totals: ApplyStats,
    pub passes: usize,
}

impl EngineState {
    fn new(options: &EngineOptions) -> Self {
        Self {
            configuration: Configuration::default(),
            matchers: MatcherSet::empty(),
            markers: ProcessedMarkers::new(),
            coordinator: MutationCoordinator::new(options.debounce()),
            last_pass: ApplyStats::default(),
            totals: ApplyStats::default(),
            passes: 0,
        }
    }

    fn record_pass(&mut self, stats: ApplyStats) {
        self.last_pass = stats;
        self.totals.merge(&stats);
        self.passes += 1;
    }
}

pub struct RewriteEngine<S: SettingsStore> {
    store: S,
    options: EngineOptions,
    document: LiveDocument,
    applier: Applier,
    state: EngineState,
}

impl<S: SettingsStore> RewriteEngine<S> {
    pub fn new(store: S, document: LiveDocument, options: EngineOptions) -> Self {
        Self {
            applier: Applier::new(&options),
            state: EngineState::new(&options),
            store,
            options,
            document,
        }
    }

    pub fn document(&self) -> &LiveDocument {
        &self.document
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn configuration(&self) -> &Configuration {
        &self.state.configuration
    }

    pub fn last_pass(&self) -> ApplyStats {
        self.state.last_pass
    }

    pub fn is_active(&self) -> bool {
        self.state.coordinator.state() == CoordinatorState::Observing
    }

    /// Loads the configuration and runs the initial pass.
    ///
    /// Never fails: when the store cannot be read the document is left as is.
    pub async fn start(&mut self) {
        match self.load_configuration().await {
            Some(configuration) => self.reconfigure(configuration).await,
            None => tracing::warn!("settings unavailable, engine stays idle"),
        }
    }

    /// Reloads and reapplies the configuration when `change` concerns it.
    pub async fn on_settings_changed(&mut self, change: StorageChange) {
        if !change.affects_configuration() {
            tracing::debug!("ignoring {:?} storage change", change.area);
            return;
        }

        if let Some(configuration) = self.load_configuration().await {
            self.reconfigure(configuration).await;
        }
    }

    /// Disconnects from the document. Text already rewritten stays rewritten.
    pub fn stop(&mut self) {
        self.document.disconnect();
        self.state.coordinator.stop();
    }

    /// Feeds observed records to the coordinator.
    pub fn on_mutations(&mut self, records: Vec<MutationRecord>) {
        if records.is_empty() {
            return;
        }
        self.state
            .coordinator
            .on_mutation_batch(records, &mut self.state.markers, Instant::now());
    }

    /// Moves records queued on the document into the coordinator.
    pub fn pump_records(&mut self) {
        let records = self.document.take_records();
        self.on_mutations(records);
    }

    /// Runs the incremental pass once the debounce deadline has passed.
    pub async fn flush_due(&mut self) -> Option<ApplyStats> {
        let nodes = self.state.coordinator.take_due(Instant::now())?;

        let mut stats = ApplyStats::default();
        for node in &nodes {
            let pass = self.apply(node).await;
            stats.merge(&pass);
        }

        tracing::debug!(
            "incremental pass over {} roots rewrote {} nodes",
            nodes.len(),
            stats.nodes_rewritten
        );
        self.state.record_pass(stats);
        Some(stats)
    }

    /// Event loop: reacts to events, document records and the debounce timer
    /// until `Shutdown` arrives or every sender is gone.
    pub async fn run(&mut self, mut events: mpsc::UnboundedReceiver<EngineEvent>) {
        let document = self.document.clone();

        loop {
            self.pump_records();
            let deadline = self.state.coordinator.deadline();

            tokio::select! {
                event = events.recv() => match event {
                    Some(EngineEvent::Mutations(records)) => self.on_mutations(records),
                    Some(EngineEvent::SettingsChanged(change)) => self.on_settings_changed(change).await,
                    Some(EngineEvent::Shutdown) | None => break,
                },
                _ = document.records_available() => {}
                _ = sleep_until_deadline(deadline) => {
                    self.flush_due().await;
                }
            }
        }

        self.stop();
        tracing::info!("engine stopped after {} passes", self.state.passes);
    }

    async fn load_configuration(&self) -> Option<Configuration> {
        match self.store.get(&Configuration::storage_keys()).await {
            Ok(items) => Some(Configuration::from_storage(
                &items,
                &self.options.fallback_replacement,
            )),
            Err(error) => {
                helpers::log_error(&error);
                None
            }
        }
    }

    async fn reconfigure(&mut self, configuration: Configuration) {
        let changed = configuration != self.state.configuration;
        if !changed && self.is_active() == self.wants_observation() {
            tracing::debug!("configuration unchanged");
            return;
        }

        self.stop();

        // markers stay valid for as long as the matchers do
        if changed {
            self.state.markers.clear();
            self.state.matchers = if configuration.enabled {
                match compile_matchers(&configuration.groups, &self.options) {
                    Ok(matchers) => matchers,
                    Err(error) => {
                        helpers::log_error(&error);
                        MatcherSet::empty()
                    }
                }
            } else {
                MatcherSet::empty()
            };
            self.state.configuration = configuration;
        }

        if !self.state.configuration.enabled {
            tracing::info!("rewriting disabled");
            return;
        }
        if self.state.matchers.is_empty() {
            tracing::info!("no words configured");
            return;
        }

        // observe first so host changes made during the pass's yields are seen
        self.document.observe();
        self.state.coordinator.start();

        let root = self.document.root().clone();
        let stats = self.apply(&root).await;
        tracing::info!(
            "initial pass rewrote {} of {} text nodes with {} matchers",
            stats.nodes_rewritten,
            stats.nodes_visited,
            self.state.matchers.len()
        );
        self.state.record_pass(stats);
    }

    fn wants_observation(&self) -> bool {
        self.state.configuration.enabled && !self.state.matchers.is_empty()
    }

    async fn apply(&mut self, root: &Handle) -> ApplyStats {
        self.applier
            .apply_subtree(
                &self.document,
                root,
                &self.state.matchers,
                &mut self.state.markers,
            )
            .await
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
