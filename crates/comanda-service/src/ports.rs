//! # Storage Ports
//!
//! The two seams between the engine and persistence.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         ComandaService                                  │
//! │                 │                          │                            │
//! │                 ▼                          ▼                            │
//! │      Arc<dyn Catalog>            Arc<dyn ComandaStore>                  │
//! │         │         │                 │            │                      │
//! │         ▼         ▼                 ▼            ▼                      │
//! │    Database   MemoryStore       Database    MemoryStore                 │
//! │   (SQLite)     (tests)         (SQLite)      (tests)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `save` is the only write path for an existing comanda. It must persist
//! the order fields and the full item list in one atomic step, and only
//! when the stored version equals `expected_version` and the stored status
//! is still open; otherwise it reports [`StoreError::VersionConflict`].

use async_trait::async_trait;

use comanda_core::{Comanda, DayWindow, Product};
use comanda_db::Database;

use crate::error::{StoreError, StoreResult};

/// Read-only product lookup.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Returns the product, active or not, or `None` if unknown.
    async fn get_product(&self, id: &str) -> StoreResult<Option<Product>>;
}

/// Comanda persistence with optimistic versioning.
#[async_trait]
pub trait ComandaStore: Send + Sync {
    /// Inserts a freshly opened comanda.
    ///
    /// ## Errors
    /// - `StoreError::Duplicate` if `(number, business_day)` is taken
    async fn insert(&self, comanda: &Comanda) -> StoreResult<()>;

    /// Loads a comanda with its items in insertion order.
    async fn get(&self, id: &str) -> StoreResult<Option<Comanda>>;

    /// Replaces the stored comanda and returns the new version.
    async fn save(&self, comanda: &Comanda, expected_version: i64) -> StoreResult<i64>;

    /// Any comanda with `number` created inside `window`, regardless of status.
    async fn find_by_number_between(
        &self,
        number: i64,
        window: &DayWindow,
    ) -> StoreResult<Option<Comanda>>;

    /// Comandas created inside `window`, open first, newest first.
    async fn list_created_between(&self, window: &DayWindow) -> StoreResult<Vec<Comanda>>;
}

// =============================================================================
// SQLite adapters
// =============================================================================

#[async_trait]
impl Catalog for Database {
    async fn get_product(&self, id: &str) -> StoreResult<Option<Product>> {
        self.products().get_by_id(id).await.map_err(StoreError::from)
    }
}

#[async_trait]
impl ComandaStore for Database {
    async fn insert(&self, comanda: &Comanda) -> StoreResult<()> {
        self.comandas().insert(comanda).await.map_err(StoreError::from)
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Comanda>> {
        self.comandas().get_by_id(id).await.map_err(StoreError::from)
    }

    async fn save(&self, comanda: &Comanda, expected_version: i64) -> StoreResult<i64> {
        self.comandas()
            .save(comanda, expected_version)
            .await
            .map_err(StoreError::from)
    }

    async fn find_by_number_between(
        &self,
        number: i64,
        window: &DayWindow,
    ) -> StoreResult<Option<Comanda>> {
        self.comandas()
            .find_by_number_between(number, window)
            .await
            .map_err(StoreError::from)
    }

    async fn list_created_between(&self, window: &DayWindow) -> StoreResult<Vec<Comanda>> {
        self.comandas()
            .list_created_between(window)
            .await
            .map_err(StoreError::from)
    }
}
