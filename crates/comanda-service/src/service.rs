//! # Comanda Service
//!
//! The engine's public operations. Each mutation is one critical section
//! per comanda id, wrapped in an optimistic retry loop.
//!
//! ## Mutation Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         mutate(id, op)                                  │
//! │                                                                         │
//! │  locks.lock(id) ─────────────────────────────────────────────┐          │
//! │       │                                                       │          │
//! │       ▼                                                       │          │
//! │  store.get(id) ──► None ──► comanda_not_found                 │ held     │
//! │       │                                                       │          │
//! │       ▼                                                       │          │
//! │  op(&mut comanda, now)  (aggregate rules + recalculation)     │          │
//! │       ├── unchanged ──► return without writing                │          │
//! │       │                                                       │          │
//! │       ▼                                                       │          │
//! │  store.save(comanda, loaded_version)                          │          │
//! │       ├── Ok(v) ──► comanda.version = v ──► return            │          │
//! │       └── VersionConflict ──► retry (reload) or `conflict`    │          │
//! │                                                               ▼          │
//! │  guard dropped ──────────────────────────────────────────► unlocked     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The lock serializes writers inside this process; the version check in
//! `save` catches writers in other processes sharing the database.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use comanda_core::validation::validate_comanda_number;
use comanda_core::{
    Clock, Comanda, CoreError, CoreResult, ItemOutcome, Money, NewItem, PaymentMethod,
    QuantityOutcome,
};
use comanda_db::Database;

use crate::config::ServiceConfig;
use crate::error::{ApiError, ApiResult, StoreError};
use crate::locks::OrderLocks;
use crate::ports::{Catalog, ComandaStore};

/// Reloads allowed after a version conflict before giving up.
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

// =============================================================================
// Requests
// =============================================================================

/// Input for [`ComandaService::add_item`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: String,
    /// Defaults to 1.
    pub quantity: Option<i64>,
    /// Required for weight-priced products.
    pub weight_grams: Option<i64>,
    pub observation: Option<String>,
}

impl AddItemRequest {
    pub fn new(product_id: impl Into<String>) -> Self {
        AddItemRequest {
            product_id: product_id.into(),
            ..AddItemRequest::default()
        }
    }

    pub fn quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn weight_grams(mut self, grams: i64) -> Self {
        self.weight_grams = Some(grams);
        self
    }

    pub fn observation(mut self, text: impl Into<String>) -> Self {
        self.observation = Some(text.into());
        self
    }
}

/// Input for [`ComandaService::close`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseRequest {
    pub payment_method: PaymentMethod,
    /// Required for cash, ignored otherwise.
    pub cash_paid: Option<Money>,
}

impl CloseRequest {
    pub fn pix() -> Self {
        CloseRequest {
            payment_method: PaymentMethod::Pix,
            cash_paid: None,
        }
    }

    pub fn card() -> Self {
        CloseRequest {
            payment_method: PaymentMethod::Card,
            cash_paid: None,
        }
    }

    pub fn cash(paid: Money) -> Self {
        CloseRequest {
            payment_method: PaymentMethod::Cash,
            cash_paid: Some(paid),
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// Order engine over a [`ComandaStore`] and a [`Catalog`].
///
/// ## Example
/// ```rust,ignore
/// let store = Arc::new(MemoryStore::new());
/// let service = ComandaService::new(store.clone(), store, Arc::new(SystemClock::new()));
///
/// let comanda = service.create(12).await?;
/// service.add_item(&comanda.id, AddItemRequest::new(&refri_id).quantity(2)).await?;
/// let closed = service.close(&comanda.id, CloseRequest::pix()).await?;
/// ```
pub struct ComandaService {
    store: Arc<dyn ComandaStore>,
    catalog: Arc<dyn Catalog>,
    clock: Arc<dyn Clock>,
    locks: OrderLocks,
    max_conflict_retries: u32,
}

impl ComandaService {
    pub fn new(
        store: Arc<dyn ComandaStore>,
        catalog: Arc<dyn Catalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        ComandaService {
            store,
            catalog,
            clock,
            locks: OrderLocks::new(),
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }

    /// Sets how many times a conflicting save is reloaded and re-applied.
    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    /// Opens the SQLite database named by `config` and builds a service on it.
    pub async fn connect(config: &ServiceConfig) -> ApiResult<Self> {
        let db = Arc::new(Database::new(config.db_config()).await?);
        let clock: Arc<dyn Clock> = Arc::new(config.clock());

        Ok(ComandaService::new(db.clone(), db, clock)
            .with_max_conflict_retries(config.engine.max_conflict_retries))
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Loads a comanda with its items.
    ///
    /// ## Errors
    /// - `comanda_not_found`
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> ApiResult<Comanda> {
        self.load(id).await
    }

    /// Comandas created today (local calendar), open first, newest first.
    #[instrument(skip(self))]
    pub async fn list_today(&self) -> ApiResult<Vec<Comanda>> {
        let window = self.clock.today_window();
        Ok(self.store.list_created_between(&window).await?)
    }

    // -------------------------------------------------------------------------
    // Daily uniqueness guard
    // -------------------------------------------------------------------------

    /// Opens a comanda with `number`, unique per local calendar day.
    ///
    /// ## Process
    /// 1. `number` must be positive
    /// 2. Any comanda with `number` created today, open or closed, rejects it
    /// 3. Insert; a unique-constraint hit from a racing insert is reported
    ///    the same way as step 2
    ///
    /// ## Errors
    /// - `validation_error`
    /// - `number_already_exists_today` (409)
    #[instrument(skip(self))]
    pub async fn create(&self, number: i64) -> ApiResult<Comanda> {
        validate_comanda_number(number).map_err(CoreError::from)?;

        let now = self.clock.now();
        let day = self.clock.day_of(now);
        let window = self.clock.window_of(day);

        if self
            .store
            .find_by_number_between(number, &window)
            .await?
            .is_some()
        {
            return Err(CoreError::NumberAlreadyExistsToday(number).into());
        }

        let comanda = Comanda::open(number, now, day)?;
        match self.store.insert(&comanda).await {
            Ok(()) => {}
            Err(StoreError::Duplicate { .. }) => {
                return Err(CoreError::NumberAlreadyExistsToday(number).into());
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            comanda_id = %comanda.id,
            number,
            business_day = %day,
            "Comanda opened"
        );
        Ok(comanda)
    }

    // -------------------------------------------------------------------------
    // Item mutations
    // -------------------------------------------------------------------------

    /// Adds a product. Unit products merge into an existing line of the same
    /// product; weight products always get a new line.
    ///
    /// ## Errors (in check order)
    /// - `comanda_not_found`, `comanda_closed`
    /// - `product_not_found`, `product_inactive`
    /// - `missing_weight`, `invalid_price_per_kg`, `validation_error`
    #[instrument(skip(self))]
    pub async fn add_item(&self, id: &str, request: AddItemRequest) -> ApiResult<Comanda> {
        let product = self.catalog.get_product(&request.product_id).await?;
        let new = NewItem {
            quantity: request.quantity,
            weight_grams: request.weight_grams,
            observation: request.observation,
        };

        let (comanda, outcome) = self
            .mutate(id, |comanda, now| {
                comanda.ensure_open()?;
                let product = product
                    .as_ref()
                    .ok_or_else(|| CoreError::ProductNotFound(request.product_id.clone()))?;
                comanda.add_item(product, &new, now)
            })
            .await?;

        match &outcome {
            ItemOutcome::Created(item_id) => debug!(comanda_id = %id, item_id = %item_id, "Item added"),
            ItemOutcome::Merged(item_id) => debug!(comanda_id = %id, item_id = %item_id, "Item merged"),
        }
        Ok(comanda)
    }

    /// Changes an item's quantity by `delta`; a result ≤ 0 removes the item.
    ///
    /// ## Errors
    /// - `comanda_not_found`, `comanda_closed`, `item_not_found`
    /// - `validation_error` if the new quantity or total does not fit
    #[instrument(skip(self))]
    pub async fn adjust_quantity(&self, id: &str, item_id: &str, delta: i64) -> ApiResult<Comanda> {
        let (comanda, outcome) = self
            .mutate(id, |comanda, _| comanda.adjust_quantity(item_id, delta))
            .await?;

        if let QuantityOutcome::Removed { item_id } = outcome {
            debug!(comanda_id = %id, item_id = %item_id, "Item removed");
        }
        Ok(comanda)
    }

    /// Replaces an item's note; `None` or an empty string clears it.
    ///
    /// ## Errors
    /// - `comanda_not_found`, `comanda_closed`, `item_not_found`
    #[instrument(skip(self))]
    pub async fn set_observation(
        &self,
        id: &str,
        item_id: &str,
        observation: Option<String>,
    ) -> ApiResult<Comanda> {
        let (comanda, ()) = self
            .mutate(id, |comanda, _| {
                comanda.set_observation(item_id, observation.as_deref())
            })
            .await?;
        Ok(comanda)
    }

    // -------------------------------------------------------------------------
    // Recalculation and lifecycle
    // -------------------------------------------------------------------------

    /// Recomputes `total` and `items_count` from the stored items and
    /// persists them. A closed comanda is returned as stored.
    #[instrument(skip(self))]
    pub async fn recalc(&self, id: &str) -> ApiResult<Comanda> {
        let (comanda, ()) = self
            .mutate(id, |comanda, _| {
                if comanda.is_open() {
                    comanda.recalculate()?;
                }
                Ok(())
            })
            .await?;
        Ok(comanda)
    }

    /// Settles and closes a comanda.
    ///
    /// ## Errors
    /// - `comanda_not_found`
    /// - `already_closed`
    /// - `empty_comanda`
    /// - `cash_insufficient` (cash below total, or no cash amount given)
    #[instrument(skip(self))]
    pub async fn close(&self, id: &str, request: CloseRequest) -> ApiResult<Comanda> {
        let (comanda, settlement) = self
            .mutate(id, |comanda, now| {
                comanda.close(request.payment_method, request.cash_paid, now)
            })
            .await?;

        info!(
            comanda_id = %comanda.id,
            number = comanda.number,
            total = comanda.total.cents(),
            method = %settlement.method,
            change = settlement.change.map(|c| c.cents()),
            "Comanda closed"
        );
        Ok(comanda)
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    async fn load(&self, id: &str) -> ApiResult<Comanda> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(id.to_string()).into())
    }

    /// Runs `op` under the comanda's lock and persists the result.
    ///
    /// `op` may run more than once: after a version conflict the comanda is
    /// reloaded and `op` re-applied to the fresh state. Nothing is written
    /// when `op` leaves the comanda unchanged.
    async fn mutate<T, F>(&self, id: &str, mut op: F) -> ApiResult<(Comanda, T)>
    where
        F: FnMut(&mut Comanda, DateTime<Utc>) -> CoreResult<T> + Send,
        T: Send,
    {
        let _guard = self.locks.lock(id).await;
        let mut attempt = 0;

        loop {
            let loaded = self.load(id).await?;
            let expected = loaded.version;
            let mut comanda = loaded.clone();
            let output = op(&mut comanda, self.clock.now())?;
            if comanda == loaded {
                return Ok((comanda, output));
            }

            match self.store.save(&comanda, expected).await {
                Ok(version) => {
                    comanda.version = version;
                    return Ok((comanda, output));
                }
                Err(StoreError::VersionConflict { .. }) if attempt < self.max_conflict_retries => {
                    attempt += 1;
                    warn!(comanda_id = %id, attempt, expected, "Version conflict, reloading");
                }
                Err(StoreError::VersionConflict { .. }) => {
                    warn!(comanda_id = %id, attempt, "Version conflict, retries exhausted");
                    return Err(ApiError::conflict(id));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
