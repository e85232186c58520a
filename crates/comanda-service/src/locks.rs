//! # Per-Comanda Locks
//!
//! A registry of async mutexes keyed by comanda id.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_item(A) ──► lock("A") ──► load ─► mutate ─► save ──► release       │
//! │  add_item(A) ──► lock("A") ······ waits ······················► runs    │
//! │  add_item(B) ──► lock("B") ──► runs in parallel with A                  │
//! │                                                                         │
//! │  registry: HashMap<id, Arc<tokio::Mutex<()>>>                           │
//! │  entry created on first lock, removed when the last holder/waiter       │
//! │  for that id is gone                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Keyed lock registry.
#[derive(Debug, Default)]
pub struct OrderLocks {
    entries: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl OrderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `id`. Released when the guard drops.
    pub async fn lock(&self, id: &str) -> OrderGuard<'_> {
        // The Arc clone is taken under the registry lock, so a concurrent
        // release sees a strong count above one and keeps the entry.
        let mutex = {
            let mut entries = self.entries();
            Arc::clone(entries.entry(id.to_string()).or_default())
        };

        let guard = mutex.lock_owned().await;

        OrderGuard {
            registry: self,
            id: id.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of ids with a live holder or waiter.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn release(&self, id: &str) {
        let mut entries = self.entries();
        if let Some(mutex) = entries.get(id) {
            if Arc::strong_count(mutex) == 1 {
                entries.remove(id);
            }
        }
    }
}

/// Exclusive access to one comanda id.
#[derive(Debug)]
pub struct OrderGuard<'a> {
    registry: &'a OrderLocks,
    id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl OrderGuard<'_> {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for OrderGuard<'_> {
    fn drop(&mut self) {
        // Unlock first so the guard's Arc no longer counts.
        self.guard.take();
        self.registry.release(&self.id);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
