//! In-memory document store
//!
//! Process-local stand-in for the managed document database. Each
//! collection keeps its documents ordered by id and owns a broadcast
//! channel; every write publishes the full post-write snapshot while the
//! collection entry is still locked, so subscribers observe writes in
//! commit order.

use std::collections::BTreeMap;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::PlatformConfig;
use crate::domain::{
    apply_transforms, ChangeKind, CollectionSnapshot, Document, DocumentChange, DocumentStore,
    DomainError, DomainResult, FieldTransform, Subscription,
};

/// Default per-collection notification buffer
const DEFAULT_CAPACITY: usize = 256;

struct CollectionState {
    documents: BTreeMap<String, Document>,
    version: u64,
    sender: broadcast::Sender<CollectionSnapshot>,
}

impl CollectionState {
    fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            documents: BTreeMap::new(),
            version: 0,
            sender,
        }
    }

    fn snapshot(&self, collection: &str, changes: Vec<DocumentChange>) -> CollectionSnapshot {
        CollectionSnapshot {
            collection: collection.to_string(),
            version: self.version,
            documents: self.documents.values().cloned().collect(),
            changes,
        }
    }
}

/// In-memory storage for development and testing
pub struct InMemoryDocumentStore {
    collections: DashMap<String, CollectionState>,
    capacity: usize,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            collections: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Open the store for a platform project. Fails when the project
    /// credentials are incomplete.
    pub fn connect(platform: &PlatformConfig) -> DomainResult<Self> {
        platform.validate()?;
        info!(project_id = %platform.project_id, "Document store initialized");
        Ok(Self::new())
    }

    /// Run `mutate` against a collection and publish the resulting snapshot
    /// if it reported any change.
    fn write<R>(
        &self,
        collection: &str,
        mutate: impl FnOnce(&mut BTreeMap<String, Document>) -> (R, Vec<DocumentChange>),
    ) -> R {
        let capacity = self.capacity;
        let mut state = self
            .collections
            .entry(collection.to_string())
            .or_insert_with(|| CollectionState::new(capacity));

        let (result, changes) = mutate(&mut state.documents);
        if !changes.is_empty() {
            state.version += 1;
            let snapshot = state.snapshot(collection, changes);
            match state.sender.send(snapshot) {
                Ok(receivers) => debug!(collection, version = state.version, receivers, "Snapshot published"),
                Err(_) => debug!(collection, version = state.version, "Snapshot published (no subscribers)"),
            }
        }
        result
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn change(kind: ChangeKind, id: &str) -> Vec<DocumentChange> {
    vec![DocumentChange {
        kind,
        id: id.to_string(),
    }]
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> DomainResult<Option<Document>> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|state| state.documents.get(id).cloned()))
    }

    async fn list(&self, collection: &str) -> DomainResult<Vec<Document>> {
        Ok(self
            .collections
            .get(collection)
            .map(|state| state.documents.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn set(&self, collection: &str, id: &str, data: Map<String, Value>) -> DomainResult<()> {
        if id.is_empty() {
            return Err(DomainError::Validation("document id must not be empty".into()));
        }
        self.write(collection, |docs| {
            let kind = if docs.contains_key(id) {
                ChangeKind::Modified
            } else {
                ChangeKind::Added
            };
            docs.insert(id.to_string(), Document::new(id, data));
            ((), change(kind, id))
        });
        Ok(())
    }

    async fn add(&self, collection: &str, data: Map<String, Value>) -> DomainResult<String> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.write(collection, |docs| {
            docs.insert(id.clone(), Document::new(id.clone(), data));
            ((), change(ChangeKind::Added, &id))
        });
        Ok(id)
    }

    async fn transform(
        &self,
        collection: &str,
        id: &str,
        transforms: &[FieldTransform],
    ) -> DomainResult<()> {
        if id.is_empty() {
            return Err(DomainError::Validation("document id must not be empty".into()));
        }
        self.write(collection, |docs| {
            let kind = if docs.contains_key(id) {
                ChangeKind::Modified
            } else {
                ChangeKind::Added
            };
            let doc = docs
                .entry(id.to_string())
                .or_insert_with(|| Document::new(id, Map::new()));
            apply_transforms(&mut doc.data, transforms);
            ((), change(kind, id))
        });
        Ok(())
    }

    async fn subscribe(&self, collection: &str) -> DomainResult<Subscription> {
        let capacity = self.capacity;
        let state = self
            .collections
            .entry(collection.to_string())
            .or_insert_with(|| CollectionState::new(capacity));

        let receiver = state.sender.subscribe();
        let initial = state.snapshot(collection, Vec::new());
        debug!(collection, version = initial.version, "New subscription");
        Ok(Subscription::new(initial, receiver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn set_get_and_list_in_id_order() {
        let store = InMemoryDocumentStore::new();
        store.set("users", "b", body(json!({"email": "b@x.io"}))).await.unwrap();
        store.set("users", "a", body(json!({"email": "a@x.io"}))).await.unwrap();

        let ids: Vec<String> = store
            .list("users")
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(
            store.get("users", "a").await.unwrap().unwrap().str_field("email"),
            Some("a@x.io")
        );
        assert!(store.get("users", "zzz").await.unwrap().is_none());
        assert!(store.list("empty").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn subscription_sees_current_state_then_writes() {
        let store = InMemoryDocumentStore::new();
        store.set("users", "a", body(json!({}))).await.unwrap();

        let mut sub = store.subscribe("users").await.unwrap();
        let initial = sub.next().await.unwrap();
        assert_eq!(initial.documents.len(), 1);
        assert!(initial.changes.is_empty());

        let id = store.add("users", body(json!({"email": "c@x.io"}))).await.unwrap();
        let next = sub.next().await.unwrap();
        assert_eq!(next.version, initial.version + 1);
        assert_eq!(next.documents.len(), 2);
        assert_eq!(
            next.changes,
            vec![DocumentChange {
                kind: ChangeKind::Added,
                id
            }]
        );
    }

    #[tokio::test]
    async fn concurrent_transforms_are_atomic() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let mut handles = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .transform(
                        "apiMetrics",
                        "login-metrics",
                        &[
                            FieldTransform::increment("totalCalls", 1),
                            FieldTransform::append("responseTimes", i),
                        ],
                    )
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let doc = store.get("apiMetrics", "login-metrics").await.unwrap().unwrap();
        assert_eq!(doc.u64_field("totalCalls"), Some(50));
        assert_eq!(doc.field("responseTimes").unwrap().as_array().unwrap().len(), 50);
    }

    #[tokio::test]
    async fn empty_ids_are_rejected() {
        let store = InMemoryDocumentStore::new();
        let err = store.set("users", "", Map::new()).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn connect_requires_project_credentials() {
        let platform = PlatformConfig {
            api_key: String::new(),
            project_id: "demo".into(),
            auth_domain: None,
            app_id: None,
        };
        assert!(matches!(
            InMemoryDocumentStore::connect(&platform),
            Err(DomainError::Configuration(_))
        ));
    }
}
