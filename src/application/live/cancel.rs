//! Cancellation gate shared by a live collection and its pump task.
//!
//! Publication and cancellation take the same lock, so once
//! [`CancelGate::cancel`] has returned no publish can be in flight and
//! none will start.

use std::sync::{Mutex, MutexGuard};

use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct CancelGate {
    cancelled: Mutex<bool>,
    notify: Notify,
}

impl CancelGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        // A panicking publisher cannot leave the flag half-written.
        self.cancelled.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Close the gate. Returns `true` only for the call that closed it.
    pub fn cancel(&self) -> bool {
        let first = {
            let mut cancelled = self.lock();
            !std::mem::replace(&mut *cancelled, true)
        };
        if first {
            self.notify.notify_waiters();
        }
        first
    }

    pub fn is_cancelled(&self) -> bool {
        *self.lock()
    }

    /// Run `publish` unless the gate is closed. Returns whether it ran.
    pub fn publish<F: FnOnce()>(&self, publish: F) -> bool {
        let cancelled = self.lock();
        if *cancelled {
            return false;
        }
        publish();
        true
    }

    /// Resolves once the gate is closed.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}
