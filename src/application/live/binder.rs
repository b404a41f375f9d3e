//! Live collection binder
//!
//! Opens a store subscription and keeps a typed, ordered copy of the
//! collection in a `watch` channel. One pump task per binding applies
//! notifications in arrival order; each one rematerialises the full list
//! from the snapshot rather than patching the previous one.

use std::sync::Arc;

use futures_util::stream::{self, Stream};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::cancel::CancelGate;
use crate::domain::{DocumentStore, DomainError, DomainResult, FromDocument, Subscription};
use crate::shared::{retry_with_backoff, RetryConfig};

const ACTIVE_GAUGE: &str = "live_subscriptions_active";

/// Lifecycle of a bound collection. Independent from emptiness: a `Ready`
/// view may hold zero items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum LiveStatus {
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveView<T> {
    pub status: LiveStatus,
    pub items: Vec<T>,
    /// Store version of the snapshot the items came from
    pub version: u64,
}

impl<T> LiveView<T> {
    fn loading() -> Self {
        Self {
            status: LiveStatus::Loading,
            items: Vec::new(),
            version: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == LiveStatus::Loading
    }
}

/// Subscribes collections and hands out [`LiveCollection`]s.
#[derive(Clone)]
pub struct LiveCollectionBinder {
    store: Arc<dyn DocumentStore>,
}

impl LiveCollectionBinder {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Bind `collection`. Fails when the subscription cannot be opened;
    /// no retry is attempted.
    pub async fn bind<T>(&self, collection: &str) -> DomainResult<LiveCollection<T>>
    where
        T: FromDocument + Clone + Send + Sync + 'static,
    {
        let subscription = self.store.subscribe(collection).await?;
        Ok(LiveCollection::spawn(subscription))
    }

    /// Bind with bounded exponential backoff on transient failures.
    pub async fn bind_with_retry<T>(
        &self,
        collection: &str,
        retry: &RetryConfig,
    ) -> DomainResult<LiveCollection<T>>
    where
        T: FromDocument + Clone + Send + Sync + 'static,
    {
        retry_with_backoff(
            retry.clone(),
            || self.bind::<T>(collection),
            DomainError::is_transient,
            collection,
        )
        .await
    }
}

/// A typed, continuously refreshed view of one collection.
///
/// Dropping it cancels the subscription.
pub struct LiveCollection<T> {
    collection: String,
    receiver: watch::Receiver<LiveView<T>>,
    gate: Arc<CancelGate>,
}

impl<T> LiveCollection<T>
where
    T: FromDocument + Clone + Send + Sync + 'static,
{
    fn spawn(subscription: Subscription) -> Self {
        let collection = subscription.collection().to_string();
        let (sender, receiver) = watch::channel(LiveView::loading());
        let gate = Arc::new(CancelGate::new());

        metrics::gauge!(ACTIVE_GAUGE, "collection" => collection.clone()).increment(1.0);
        debug!(collection = %collection, "Live subscription opened");
        tokio::spawn(pump(subscription, sender, gate.clone()));

        Self {
            collection,
            receiver,
            gate,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn current(&self) -> LiveView<T> {
        self.receiver.borrow().clone()
    }

    pub fn items(&self) -> Vec<T> {
        self.receiver.borrow().items.clone()
    }

    /// Wait for the next published view. `None` after cancellation or once
    /// the pump stopped.
    pub async fn changed(&mut self) -> Option<LiveView<T>> {
        if self.gate.is_cancelled() {
            return None;
        }
        tokio::select! {
            changed = self.receiver.changed() => changed.ok()?,
            _ = self.gate.cancelled() => return None,
        }
        if self.gate.is_cancelled() {
            return None;
        }
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Stream of views: the current one first, then every update until
    /// the collection is cancelled.
    pub fn updates(&self) -> impl Stream<Item = LiveView<T>> + Send + 'static {
        let receiver = self.receiver.clone();
        let gate = self.gate.clone();

        stream::unfold((receiver, gate, true), |(mut receiver, gate, first)| async move {
            if !first {
                tokio::select! {
                    changed = receiver.changed() => {
                        if changed.is_err() {
                            return None;
                        }
                    }
                    _ = gate.cancelled() => return None,
                }
            }
            if gate.is_cancelled() {
                return None;
            }
            let view = receiver.borrow_and_update().clone();
            Some((view, (receiver, gate, false)))
        })
    }

    /// Stop receiving updates. Idempotent.
    pub fn cancel(&self) {
        if self.gate.cancel() {
            debug!(collection = %self.collection, "Live subscription cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.gate.is_cancelled()
    }
}

impl<T> Drop for LiveCollection<T> {
    fn drop(&mut self) {
        self.gate.cancel();
    }
}

async fn pump<T>(
    mut subscription: Subscription,
    sender: watch::Sender<LiveView<T>>,
    gate: Arc<CancelGate>,
) where
    T: FromDocument + Clone + Send + Sync + 'static,
{
    let collection = subscription.collection().to_string();

    loop {
        let next = tokio::select! {
            snapshot = subscription.next() => snapshot,
            _ = gate.cancelled() => break,
        };

        let Some(snapshot) = next else {
            warn!(collection = %collection, "Subscription closed by the store");
            gate.publish(|| {
                sender.send_modify(|view| {
                    view.status = LiveStatus::Failed("subscription closed".into());
                })
            });
            break;
        };

        let items: Vec<T> = snapshot.documents.iter().map(T::from_document).collect();
        let version = snapshot.version;
        let count = items.len();
        let published = gate.publish(|| {
            sender.send_replace(LiveView {
                status: LiveStatus::Ready,
                items,
                version,
            });
        });
        if !published {
            break;
        }
        debug!(collection = %collection, version, count, "Live view updated");
    }

    metrics::gauge!(ACTIVE_GAUGE, "collection" => collection.clone()).decrement(1.0);
    info!(collection = %collection, "Live subscription stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CollectionSnapshot, Document, FieldTransform, UserRecord};
    use crate::infrastructure::storage::InMemoryDocumentStore;
    use async_trait::async_trait;
    use futures_util::StreamExt;
    use serde_json::{json, Map, Value};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::sync::{broadcast, Mutex};

    fn data(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn snapshot(version: u64, ids: &[&str]) -> CollectionSnapshot {
        CollectionSnapshot {
            collection: "users".into(),
            version,
            documents: ids
                .iter()
                .map(|id| Document::new(*id, data(json!({"email": format!("{id}@x.io")}))))
                .collect(),
            changes: vec![],
        }
    }

    /// Store whose subscription is driven by the test through a sender
    /// that stays alive after the binding is cancelled.
    struct ScriptedStore {
        sender: broadcast::Sender<CollectionSnapshot>,
        failures: Mutex<Vec<DomainError>>,
        attempts: AtomicU32,
    }

    impl ScriptedStore {
        fn new() -> Self {
            let (sender, _) = broadcast::channel(16);
            Self {
                sender,
                failures: Mutex::new(Vec::new()),
                attempts: AtomicU32::new(0),
            }
        }

        fn failing_with(errors: Vec<DomainError>) -> Self {
            let store = Self::new();
            store.failures.try_lock().unwrap().extend(errors);
            store
        }

        fn emit(&self, snapshot: CollectionSnapshot) {
            let _ = self.sender.send(snapshot);
        }
    }

    #[async_trait]
    impl DocumentStore for ScriptedStore {
        async fn get(&self, _: &str, _: &str) -> DomainResult<Option<Document>> {
            Ok(None)
        }
        async fn list(&self, _: &str) -> DomainResult<Vec<Document>> {
            Ok(vec![])
        }
        async fn set(&self, _: &str, _: &str, _: Map<String, Value>) -> DomainResult<()> {
            Ok(())
        }
        async fn add(&self, _: &str, _: Map<String, Value>) -> DomainResult<String> {
            Ok("id".into())
        }
        async fn transform(&self, _: &str, _: &str, _: &[FieldTransform]) -> DomainResult<()> {
            Ok(())
        }
        async fn subscribe(&self, _: &str) -> DomainResult<Subscription> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let mut failures = self.failures.lock().await;
            if !failures.is_empty() {
                return Err(failures.remove(0));
            }
            Ok(Subscription::new(snapshot(0, &[]), self.sender.subscribe()))
        }
    }

    async fn next_ready<T: FromDocument + Clone + Send + Sync + 'static>(
        live: &mut LiveCollection<T>,
    ) -> LiveView<T> {
        tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                let view = live.changed().await.expect("live collection ended");
                if view.status == LiveStatus::Ready {
                    return view;
                }
            }
        })
        .await
        .expect("timed out waiting for an update")
    }

    #[tokio::test]
    async fn starts_loading_then_ready_empty() {
        let store = Arc::new(ScriptedStore::new());
        let binder = LiveCollectionBinder::new(store);
        let mut live = binder.bind::<UserRecord>("users").await.unwrap();

        let view = next_ready(&mut live).await;
        assert!(view.items.is_empty());
        assert!(!view.is_loading());
    }

    #[tokio::test]
    async fn rematerialises_in_arrival_order() {
        let store = Arc::new(ScriptedStore::new());
        let binder = LiveCollectionBinder::new(store.clone());
        let mut live = binder.bind::<UserRecord>("users").await.unwrap();
        next_ready(&mut live).await;

        store.emit(snapshot(1, &["a"]));
        let view = next_ready(&mut live).await;
        assert_eq!(view.version, 1);

        store.emit(snapshot(2, &["a", "b"]));
        let view = next_ready(&mut live).await;
        let uids: Vec<_> = view.items.iter().map(|u| u.uid.as_str()).collect();
        assert_eq!(uids, vec!["a", "b"]);

        store.emit(snapshot(3, &["b"]));
        let view = next_ready(&mut live).await;
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].uid, "b");
    }

    #[tokio::test]
    async fn no_updates_after_cancel() {
        let store = Arc::new(ScriptedStore::new());
        let binder = LiveCollectionBinder::new(store.clone());
        let mut live = binder.bind::<UserRecord>("users").await.unwrap();
        next_ready(&mut live).await;

        store.emit(snapshot(1, &["a"]));
        next_ready(&mut live).await;

        let updates = live.updates();
        live.cancel();
        live.cancel();

        for v in 2..6 {
            store.emit(snapshot(v, &["a", "b", "c"]));
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        let view = live.current();
        assert_eq!(view.version, 1);
        assert_eq!(view.items.len(), 1);
        assert!(live.changed().await.is_none());
        let collected: Vec<_> = updates.collect().await;
        assert!(collected.is_empty());
    }

    #[tokio::test]
    async fn updates_stream_yields_current_then_changes() {
        let store = Arc::new(ScriptedStore::new());
        let binder = LiveCollectionBinder::new(store.clone());
        let mut live = binder.bind::<UserRecord>("users").await.unwrap();
        next_ready(&mut live).await;

        let mut updates = Box::pin(live.updates());
        let first = updates.next().await.unwrap();
        assert_eq!(first.version, 0);

        store.emit(snapshot(7, &["z"]));
        let second = tokio::time::timeout(Duration::from_secs(1), updates.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.version, 7);

        drop(live);
        let ended = tokio::time::timeout(Duration::from_secs(1), updates.next())
            .await
            .unwrap();
        assert!(ended.is_none());
    }

    #[tokio::test]
    async fn establishment_failure_is_returned() {
        let store = Arc::new(ScriptedStore::failing_with(vec![DomainError::Permission(
            "missing or insufficient permissions".into(),
        )]));
        let binder = LiveCollectionBinder::new(store.clone());
        let result = binder
            .bind_with_retry::<UserRecord>("users", &RetryConfig::default())
            .await;

        assert!(matches!(result, Err(DomainError::Permission(_))));
        assert_eq!(store.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let store = Arc::new(ScriptedStore::failing_with(vec![
            DomainError::Network("unavailable".into()),
            DomainError::Network("unavailable".into()),
        ]));
        let binder = LiveCollectionBinder::new(store.clone());
        let retry = RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(5),
        };

        let live = binder.bind_with_retry::<UserRecord>("users", &retry).await;
        assert!(live.is_ok());
        assert_eq!(store.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn closed_subscription_fails_and_keeps_items() {
        let store = Arc::new(InMemoryDocumentStore::new());
        store
            .set("users", "u1", data(json!({"email": "a@b.io"})))
            .await
            .unwrap();

        let (sender, receiver) = broadcast::channel(4);
        let initial = CollectionSnapshot {
            collection: "users".into(),
            version: 1,
            documents: store.list("users").await.unwrap(),
            changes: vec![],
        };
        let mut live: LiveCollection<UserRecord> =
            LiveCollection::spawn(Subscription::new(initial, receiver));
        next_ready(&mut live).await;

        drop(sender);
        let view = tokio::time::timeout(Duration::from_secs(1), live.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(view.status, LiveStatus::Failed("subscription closed".into()));
        assert_eq!(view.items.len(), 1);
    }

    #[tokio::test]
    async fn binds_against_in_memory_store() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let binder = LiveCollectionBinder::new(store.clone());
        let mut live = binder.bind::<UserRecord>("users").await.unwrap();
        next_ready(&mut live).await;

        store
            .set("users", "u2", data(json!({"email": "b@b.io", "role": "admin"})))
            .await
            .unwrap();
        let view = next_ready(&mut live).await;
        assert!(view.items[0].is_admin());
    }
}
