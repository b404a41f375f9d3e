//! Ports to the external managed platform.
//!
//! The dashboard never talks to a concrete backend directly: every
//! component receives an `Arc<dyn DocumentStore>` / `Arc<dyn CredentialProvider>`
//! at construction time, so tests can substitute fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tracing::debug;
use utoipa::ToSchema;

use super::document::{CollectionSnapshot, Document, FieldTransform};
use crate::shared::DomainResult;

/// Live subscription to one collection.
///
/// Yields the snapshot current at subscription time first, then one
/// snapshot per change in the order the store emitted them.
pub struct Subscription {
    collection: String,
    initial: Option<CollectionSnapshot>,
    receiver: broadcast::Receiver<CollectionSnapshot>,
}

impl Subscription {
    pub fn new(
        initial: CollectionSnapshot,
        receiver: broadcast::Receiver<CollectionSnapshot>,
    ) -> Self {
        Self {
            collection: initial.collection.clone(),
            initial: Some(initial),
            receiver,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Next snapshot, or `None` once the store closed the subscription.
    pub async fn next(&mut self) -> Option<CollectionSnapshot> {
        if let Some(initial) = self.initial.take() {
            return Some(initial);
        }

        loop {
            match self.receiver.recv().await {
                Ok(snapshot) => return Some(snapshot),
                // Every snapshot carries the full collection, so skipped
                // ones are superseded by the next delivery.
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(collection = %self.collection, skipped, "Subscription lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Document collections with point reads, writes and live subscriptions.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> DomainResult<Option<Document>>;

    /// All documents in enumeration order.
    async fn list(&self, collection: &str) -> DomainResult<Vec<Document>>;

    /// Create or replace a document.
    async fn set(&self, collection: &str, id: &str, data: Map<String, Value>) -> DomainResult<()>;

    /// Append a document under a generated id, returning the id.
    async fn add(&self, collection: &str, data: Map<String, Value>) -> DomainResult<String>;

    /// Apply field transforms atomically, creating the document if needed.
    async fn transform(
        &self,
        collection: &str,
        id: &str,
        transforms: &[FieldTransform],
    ) -> DomainResult<()>;

    async fn subscribe(&self, collection: &str) -> DomainResult<Subscription>;
}

/// Identity attributes of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// Result of a successful sign-in.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: Identity,
    /// Opaque bearer credential.
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

/// Token-based identity service.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> DomainResult<Session>;

    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> DomainResult<Identity>;

    /// Resolve a bearer token to its identity. Invalid, expired and revoked
    /// tokens are `DomainError::Auth`.
    async fn verify(&self, token: &str) -> DomainResult<Identity>;

    async fn sign_out(&self, token: &str) -> DomainResult<()>;
}
