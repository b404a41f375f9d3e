//! Live collection subscriptions
//!
//! A [`LiveCollection`] mirrors one store collection as a typed list and
//! exposes it both as a `watch`-style current value and as a `Stream`.

mod binder;
mod cancel;

pub use binder::{LiveCollection, LiveCollectionBinder, LiveStatus, LiveView};
pub use cancel::CancelGate;
