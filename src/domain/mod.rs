//! Domain layer: records, the document vocabulary and the ports to the
//! managed platform.

pub mod collections;
pub mod document;
pub mod models;
pub mod ports;

pub use document::{
    apply_transforms, ChangeKind, CollectionSnapshot, Document, DocumentChange, FieldTransform,
    FromDocument,
};
pub use models::*;
pub use ports::{CredentialProvider, DocumentStore, Identity, Session, Subscription};

pub use crate::shared::{DomainError, DomainResult};
