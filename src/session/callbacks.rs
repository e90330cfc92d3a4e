//! Callback registry keyed by mnemonic.
//!
//! Subscribers accumulate per mnemonic for the lifetime of the session;
//! there is no dedup and no unregister short of tearing the session down,
//! which matches the long-lived subscription model of the platform layer
//! (UI-facing fields subscribe once at setup).
//!
//! Dispatch snapshots the subscriber list under a read lock, then invokes
//! each callback outside it, so registration can race dispatch safely. A
//! panicking callback is caught, logged and skipped — it never blocks
//! delivery to the remaining callbacks or poisons the session.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

use crate::protocol::DecodedValue;

/// A decoded-value subscriber.
pub type Callback = Arc<dyn Fn(&DecodedValue) + Send + Sync>;

/// Mnemonic → ordered subscribers.
#[derive(Default)]
pub struct CallbackRegistry {
    subscribers: RwLock<HashMap<String, Vec<Callback>>>,
}

impl CallbackRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for every decoded value carrying `mnemonic`.
    pub fn register<F>(&self, mnemonic: &str, callback: F)
    where
        F: Fn(&DecodedValue) + Send + Sync + 'static,
    {
        self.subscribers
            .write()
            .expect("callback registry lock")
            .entry(mnemonic.to_string())
            .or_default()
            .push(Arc::new(callback));
    }

    /// Fan `value` out to every subscriber of its mnemonic, in
    /// registration order.
    pub fn dispatch(&self, value: &DecodedValue) {
        let snapshot: Vec<Callback> = {
            let subscribers = self.subscribers.read().expect("callback registry lock");
            subscribers
                .get(value.mnemonic)
                .map(|list| list.to_vec())
                .unwrap_or_default()
        };

        for callback in snapshot {
            if catch_unwind(AssertUnwindSafe(|| callback(value))).is_err() {
                tracing::error!(
                    mnemonic = value.mnemonic,
                    "callback panicked; continuing fan-out"
                );
            }
        }
    }

    /// Number of subscribers for one mnemonic.
    pub fn subscriber_count(&self, mnemonic: &str) -> usize {
        self.subscribers
            .read()
            .expect("callback registry lock")
            .get(mnemonic)
            .map_or(0, Vec::len)
    }
}
