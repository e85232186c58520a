//! # In-Memory Store
//!
//! [`Catalog`] and [`ComandaStore`] over plain maps, with the same
//! version, status and uniqueness rules as the SQLite schema.
//! Used by tests and by embedders that do not need durability.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, RwLock};

use comanda_core::{Comanda, ComandaStatus, DayWindow, Product};

use crate::error::{StoreError, StoreResult};
use crate::ports::{Catalog, ComandaStore};

/// Map-backed store. Clones of returned comandas are detached snapshots.
#[derive(Debug, Default)]
pub struct MemoryStore {
    products: RwLock<HashMap<String, Product>>,
    comandas: Mutex<HashMap<String, Comanda>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a catalog product.
    pub fn put_product(&self, product: Product) {
        let mut products = self
            .products
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        products.insert(product.id.clone(), product);
    }

    /// Number of stored comandas.
    pub fn comanda_count(&self) -> usize {
        self.comandas().len()
    }

    fn comandas(&self) -> MutexGuard<'_, HashMap<String, Comanda>> {
        self.comandas
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Catalog for MemoryStore {
    async fn get_product(&self, id: &str) -> StoreResult<Option<Product>> {
        let products = self
            .products
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(products.get(id).cloned())
    }
}

#[async_trait]
impl ComandaStore for MemoryStore {
    async fn insert(&self, comanda: &Comanda) -> StoreResult<()> {
        let mut comandas = self.comandas();

        let taken = comandas
            .values()
            .any(|c| c.number == comanda.number && c.business_day == comanda.business_day);
        if taken || comandas.contains_key(&comanda.id) {
            return Err(StoreError::Duplicate {
                field: "comandas.number, comandas.business_day".to_string(),
                value: format!("{} @ {}", comanda.number, comanda.business_day),
            });
        }

        comandas.insert(comanda.id.clone(), comanda.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Comanda>> {
        Ok(self.comandas().get(id).cloned())
    }

    async fn save(&self, comanda: &Comanda, expected_version: i64) -> StoreResult<i64> {
        let mut comandas = self.comandas();

        let stored = comandas
            .get_mut(&comanda.id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "Comanda".to_string(),
                id: comanda.id.clone(),
            })?;

        if stored.version != expected_version || stored.status != ComandaStatus::Open {
            return Err(StoreError::VersionConflict {
                id: comanda.id.clone(),
                expected: expected_version,
            });
        }

        let version = expected_version + 1;
        *stored = Comanda {
            version,
            ..comanda.clone()
        };
        Ok(version)
    }

    async fn find_by_number_between(
        &self,
        number: i64,
        window: &DayWindow,
    ) -> StoreResult<Option<Comanda>> {
        Ok(self
            .comandas()
            .values()
            .find(|c| c.number == number && window.contains(c.created_at))
            .cloned())
    }

    async fn list_created_between(&self, window: &DayWindow) -> StoreResult<Vec<Comanda>> {
        let mut found: Vec<Comanda> = self
            .comandas()
            .values()
            .filter(|c| window.contains(c.created_at))
            .cloned()
            .collect();

        found.sort_by(|a, b| {
            a.status
                .cmp(&b.status)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(found)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
