//! 设置存储模块
//!
//! 引擎只通过 [`SettingsStore::get`] 读取设置；写入属于设置编辑器和
//! [`migrate_legacy_settings`]。

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::{Map, Value};
use tokio::sync::mpsc;

use super::{legacy_group, StorageArea, StorageChange, ValueChange};
use crate::rewrite::config::constants;
use crate::rewrite::error::{helpers, RewriteResult};

/// Asynchronous key-value store holding the synchronized settings.
#[allow(async_fn_in_trait)]
pub trait SettingsStore {
    /// Returns the stored values for `keys`; absent keys are omitted.
    async fn get(&self, keys: &[&str]) -> RewriteResult<Map<String, Value>>;

    async fn set(&self, items: Map<String, Value>) -> RewriteResult<()>;

    async fn remove(&self, keys: &[&str]) -> RewriteResult<()>;
}

/// In-memory store shared by clones, notifying subscribers of every change.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    items: Map<String, Value>,
    subscribers: Vec<mpsc::UnboundedSender<StorageChange>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Map<String, Value>) -> Self {
        let store = Self::default();
        store.inner.borrow_mut().items = items;
        store
    }

    /// Parses a JSON object in the store schema.
    pub fn from_json(json: &str) -> RewriteResult<Self> {
        match serde_json::from_str::<Value>(json)? {
            Value::Object(items) => Ok(Self::with_items(items)),
            other => Err(helpers::settings_error(format!(
                "settings must be a JSON object, got {}",
                other
            ))),
        }
    }

    /// Change notifications for every subsequent `set`/`remove`.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<StorageChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.borrow_mut().subscribers.push(tx);
        rx
    }

    pub fn snapshot(&self) -> Map<String, Value> {
        self.inner.borrow().items.clone()
    }

    fn publish(&self, changes: HashMap<String, ValueChange>) {
        if changes.is_empty() {
            return;
        }

        let change = StorageChange {
            area: StorageArea::Sync,
            changes,
        };
        self.inner
            .borrow_mut()
            .subscribers
            .retain(|tx| tx.send(change.clone()).is_ok());
    }
}

impl SettingsStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> RewriteResult<Map<String, Value>> {
        let inner = self.inner.borrow();
        Ok(keys
            .iter()
            .filter_map(|key| inner.items.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, items: Map<String, Value>) -> RewriteResult<()> {
        let mut changes = HashMap::new();
        {
            let mut inner = self.inner.borrow_mut();
            for (key, new_value) in items {
                let old_value = inner.items.insert(key.clone(), new_value.clone());
                changes.insert(
                    key,
                    ValueChange {
                        new_value: Some(new_value),
                        old_value,
                    },
                );
            }
        }
        self.publish(changes);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> RewriteResult<()> {
        let mut changes = HashMap::new();
        {
            let mut inner = self.inner.borrow_mut();
            for key in keys {
                if let Some(old_value) = inner.items.remove(*key) {
                    changes.insert(
                        key.to_string(),
                        ValueChange {
                            new_value: None,
                            old_value: Some(old_value),
                        },
                    );
                }
            }
        }
        self.publish(changes);
        Ok(())
    }
}

/// Upgrades legacy single-group keys into `replacementGroups` and clears them.
///
/// Returns `true` when a migration was written.
pub async fn migrate_legacy_settings<S: SettingsStore>(
    store: &S,
    fallback_replacement: &str,
) -> RewriteResult<bool> {
    let mut keys = vec![constants::KEY_REPLACEMENT_GROUPS];
    keys.extend_from_slice(constants::LEGACY_KEYS);
    let items = store.get(&keys).await?;

    if items.contains_key(constants::KEY_REPLACEMENT_GROUPS) {
        return Ok(false);
    }

    let Some(group) = legacy_group(&items, fallback_replacement) else {
        let stale: Vec<&str> = constants::LEGACY_KEYS
            .iter()
            .copied()
            .filter(|key| items.contains_key(*key))
            .collect();
        if !stale.is_empty() {
            store.remove(&stale).await?;
            tracing::info!("removed {} legacy keys without a word list", stale.len());
        }
        return Ok(false);
    };

    let mut upgraded = Map::new();
    upgraded.insert(
        constants::KEY_REPLACEMENT_GROUPS.to_string(),
        Value::Array(vec![serde_json::to_value(&group)?]),
    );
    store.set(upgraded).await?;
    store.remove(constants::LEGACY_KEYS).await?;

    tracing::info!("migrated legacy settings into one replacement group");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_omits_missing_keys() {
        let store = MemoryStore::from_json(r#"{"enabled": false}"#).unwrap();

        let items = store.get(&["enabled", "words"]).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items["enabled"], json!(false));
    }

    #[tokio::test]
    async fn test_set_notifies_subscribers() {
        let store = MemoryStore::new();
        let mut changes = store.subscribe();

        let mut items = Map::new();
        items.insert("enabled".to_string(), json!(true));
        store.set(items).await.unwrap();

        let change = changes.recv().await.unwrap();
        assert_eq!(change.area, StorageArea::Sync);
        assert_eq!(change.changes["enabled"].new_value, Some(json!(true)));
        assert_eq!(change.changes["enabled"].old_value, None);
    }

    #[tokio::test]
    async fn test_migration_clears_legacy_keys_without_words() {
        let store =
            MemoryStore::from_json(r#"{"replacement": "X", "matchWholeWords": false}"#).unwrap();

        assert!(!migrate_legacy_settings(&store, "Cocaine").await.unwrap());

        let snapshot = store.snapshot();
        for key in constants::LEGACY_KEYS {
            assert!(!snapshot.contains_key(*key));
        }
        assert!(!snapshot.contains_key(constants::KEY_REPLACEMENT_GROUPS));
    }

    #[tokio::test]
    async fn test_remove_absent_key_is_silent() {
        let store = MemoryStore::new();
        let mut changes = store.subscribe();

        store.remove(&["words"]).await.unwrap();

        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_migration_is_skipped_when_groups_exist() {
        let store = MemoryStore::from_json(
            r#"{"words": ["foo"], "replacementGroups": []}"#,
        )
        .unwrap();

        assert!(!migrate_legacy_settings(&store, "Cocaine").await.unwrap());
        assert!(store.snapshot().contains_key("words"));
    }

    #[test]
    fn test_from_json_rejects_non_objects() {
        assert!(MemoryStore::from_json("[1, 2]").is_err());
        assert!(MemoryStore::from_json("not json").is_err());
    }
}
