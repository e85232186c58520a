//! # Order Aggregate
//!
//! The comanda and its line items, with every mutation that keeps them
//! consistent.
//!
//! ## Mutation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Comanda Operations                                   │
//! │                                                                         │
//! │  Operation              Checks                      Item Change         │
//! │  ─────────              ──────                      ───────────         │
//! │                                                                         │
//! │  add_item() ──────────► open, active, weight ─────► merge or push       │
//! │                                                                         │
//! │  adjust_quantity() ───► open, item on comanda ────► qty += delta        │
//! │                                                     (≤ 0 removes)       │
//! │                                                                         │
//! │  set_observation() ───► open, item on comanda ────► replace / clear     │
//! │                                                                         │
//! │  close() ─────────────► not closed, not empty ────► (none, settles)     │
//! │                                                                         │
//! │  NOTE: add/adjust/close total the new item set before committing it,    │
//! │        so an overflowing amount leaves the comanda untouched.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Merge Rule
//! Unit products merge into an existing unit item of the same product.
//! Weight products always create a new item, since every serving is weighed
//! separately.
//!
//! The aggregate is plain data: it knows nothing about locks or storage.
//! Callers load it, mutate it, and persist it as one unit.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing;
use crate::settlement::{settle, Settlement};
use crate::types::{ComandaStatus, PaymentMethod, Product};
use crate::validation::{
    normalize_observation, too_large, validate_comanda_number, validate_quantity,
};
use crate::DEFAULT_QUANTITY;

// =============================================================================
// Line Item
// =============================================================================

/// One priced entry on a comanda.
///
/// ## Design Notes
/// - `name`: frozen copy of the product name at add time
/// - `price`: unit price for unit items, serving price for weight items;
///   never re-read from the catalog after the item exists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ComandaItem {
    pub id: String,
    pub comanda_id: String,
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub price: Money,
    /// Present exactly when the item is weight-priced.
    pub weight_grams: Option<i64>,
    pub observation: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl ComandaItem {
    /// `price × quantity`.
    ///
    /// ## Errors
    /// - `Validation` if the product does not fit in cents
    #[inline]
    pub fn line_value(&self) -> CoreResult<Money> {
        pricing::line_value(self.price, self.quantity)
    }

    #[inline]
    pub fn is_weight_priced(&self) -> bool {
        self.weight_grams.is_some()
    }
}

/// Input for [`Comanda::add_item`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    /// Defaults to 1.
    pub quantity: Option<i64>,
    /// Required for weight products, ignored for unit products.
    pub weight_grams: Option<i64>,
    pub observation: Option<String>,
}

impl NewItem {
    pub fn units(quantity: i64) -> Self {
        NewItem {
            quantity: Some(quantity),
            ..NewItem::default()
        }
    }

    pub fn weighed(grams: i64) -> Self {
        NewItem {
            weight_grams: Some(grams),
            ..NewItem::default()
        }
    }

    pub fn with_observation(mut self, text: impl Into<String>) -> Self {
        self.observation = Some(text.into());
        self
    }
}

/// What [`Comanda::add_item`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// A new line was appended.
    Created(String),
    /// The quantity of an existing unit line was increased.
    Merged(String),
}

impl ItemOutcome {
    pub fn item_id(&self) -> &str {
        match self {
            ItemOutcome::Created(id) | ItemOutcome::Merged(id) => id,
        }
    }
}

/// What [`Comanda::adjust_quantity`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityOutcome {
    Updated { item_id: String, quantity: i64 },
    Removed { item_id: String },
}

// =============================================================================
// Comanda
// =============================================================================

/// An open tab tied to a table or ticket number.
///
/// ## Invariants
/// - `total == Σ item.line_value()` and `items_count == Σ item.quantity`
/// - no item has quantity ≤ 0
/// - a closed comanda never changes its items
/// - `cash_paid` / `change` are set only when `payment_method` is cash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Comanda {
    pub id: String,
    pub number: i64,
    pub status: ComandaStatus,
    /// Local calendar date of creation; `(number, business_day)` is unique.
    #[ts(as = "String")]
    pub business_day: NaiveDate,
    pub total: Money,
    pub items_count: i64,
    pub payment_method: Option<PaymentMethod>,
    pub cash_paid: Option<Money>,
    pub change: Option<Money>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency stamp, bumped by the store on every save.
    pub version: i64,
    pub items: Vec<ComandaItem>,
}

impl Comanda {
    /// Opens a new, empty comanda.
    ///
    /// ## Errors
    /// - `Validation` if `number` is not positive
    pub fn open(number: i64, now: DateTime<Utc>, business_day: NaiveDate) -> CoreResult<Self> {
        validate_comanda_number(number)?;

        Ok(Comanda {
            id: Uuid::new_v4().to_string(),
            number,
            status: ComandaStatus::Open,
            business_day,
            total: Money::zero(),
            items_count: 0,
            payment_method: None,
            cash_paid: None,
            change: None,
            created_at: now,
            closed_at: None,
            version: 0,
            items: Vec::new(),
        })
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == ComandaStatus::Open
    }

    /// Fails with `OrderClosed` unless the comanda accepts item changes.
    pub fn ensure_open(&self) -> CoreResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(CoreError::OrderClosed(self.id.clone()))
        }
    }

    /// Looks up an item on this comanda.
    pub fn item(&self, item_id: &str) -> CoreResult<&ComandaItem> {
        self.items
            .iter()
            .find(|i| i.id == item_id)
            .ok_or_else(|| self.item_not_found(item_id))
    }

    fn item_position(&self, item_id: &str) -> CoreResult<usize> {
        self.items
            .iter()
            .position(|i| i.id == item_id)
            .ok_or_else(|| self.item_not_found(item_id))
    }

    fn item_not_found(&self, item_id: &str) -> CoreError {
        CoreError::ItemNotFound {
            comanda_id: self.id.clone(),
            item_id: item_id.to_string(),
        }
    }

    // -------------------------------------------------------------------------
    // Item mutations
    // -------------------------------------------------------------------------

    /// Adds a product, merging into an existing unit line when possible.
    ///
    /// ## Errors (in check order)
    /// - `OrderClosed`
    /// - `ProductInactive`
    /// - `Validation` for a non-positive quantity, an over-long observation,
    ///   or a quantity / weight whose amount does not fit in cents
    /// - `MissingWeight` / `InvalidPricePerKg` from pricing
    pub fn add_item(
        &mut self,
        product: &Product,
        new: &NewItem,
        now: DateTime<Utc>,
    ) -> CoreResult<ItemOutcome> {
        self.ensure_open()?;

        if !product.active {
            return Err(CoreError::ProductInactive(product.id.clone()));
        }

        let quantity = new.quantity.unwrap_or(DEFAULT_QUANTITY);
        validate_quantity(quantity)?;
        let observation = normalize_observation(new.observation.as_deref())?;

        let weight_grams = if product.is_weight_priced() {
            new.weight_grams
        } else {
            None
        };
        let price = pricing::item_price(product, weight_grams)?;

        let mut items = self.items.clone();

        if !product.is_weight_priced() {
            if let Some(item) = items
                .iter_mut()
                .find(|i| i.product_id == product.id && i.weight_grams.is_none())
            {
                item.quantity = item
                    .quantity
                    .checked_add(quantity)
                    .ok_or_else(|| too_large("quantity"))?;
                let id = item.id.clone();
                self.commit_items(items)?;
                return Ok(ItemOutcome::Merged(id));
            }
        }

        let item = ComandaItem {
            id: Uuid::new_v4().to_string(),
            comanda_id: self.id.clone(),
            product_id: product.id.clone(),
            name: product.name.clone(),
            quantity,
            price,
            weight_grams,
            observation,
            created_at: now,
        };
        let id = item.id.clone();
        items.push(item);
        self.commit_items(items)?;

        Ok(ItemOutcome::Created(id))
    }

    /// Changes an item's quantity by `delta`; a result ≤ 0 removes the item.
    pub fn adjust_quantity(&mut self, item_id: &str, delta: i64) -> CoreResult<QuantityOutcome> {
        self.ensure_open()?;
        let idx = self.item_position(item_id)?;

        let new_qty = self.items[idx]
            .quantity
            .checked_add(delta)
            .ok_or_else(|| too_large("quantity"))?;

        let mut items = self.items.clone();
        let outcome = if new_qty <= 0 {
            let removed = items.remove(idx);
            QuantityOutcome::Removed { item_id: removed.id }
        } else {
            items[idx].quantity = new_qty;
            QuantityOutcome::Updated {
                item_id: item_id.to_string(),
                quantity: new_qty,
            }
        };

        self.commit_items(items)?;
        Ok(outcome)
    }

    /// Replaces an item's note; `None` or blank text clears it.
    pub fn set_observation(&mut self, item_id: &str, text: Option<&str>) -> CoreResult<()> {
        self.ensure_open()?;
        let idx = self.item_position(item_id)?;
        let observation = normalize_observation(text)?;

        self.items[idx].observation = observation;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Derived fields and lifecycle
    // -------------------------------------------------------------------------

    /// Recomputes `total` and `items_count` from the current items.
    ///
    /// ## Errors
    /// - `Validation` if the items do not total within `i64`; nothing changes
    pub fn recalculate(&mut self) -> CoreResult<()> {
        let (total, items_count) = totals(&self.items)?;
        self.total = total;
        self.items_count = items_count;
        Ok(())
    }

    /// Installs `items` together with their totals, or changes nothing.
    fn commit_items(&mut self, items: Vec<ComandaItem>) -> CoreResult<()> {
        let (total, items_count) = totals(&items)?;
        self.items = items;
        self.total = total;
        self.items_count = items_count;
        Ok(())
    }

    /// Closes the comanda against a payment method.
    ///
    /// ## Process
    /// 1. `AlreadyClosed` if closed, `EmptyOrder` if it has no items
    /// 2. Forced recalculation
    /// 3. Settlement (cash must cover the total)
    /// 4. Status, closed_at and payment fields are set together
    ///
    /// Nothing is modified when an error is returned.
    pub fn close(
        &mut self,
        method: PaymentMethod,
        cash_paid: Option<Money>,
        now: DateTime<Utc>,
    ) -> CoreResult<Settlement> {
        if !self.is_open() {
            return Err(CoreError::AlreadyClosed(self.id.clone()));
        }
        if self.items_count <= 0 {
            return Err(CoreError::EmptyOrder(self.id.clone()));
        }

        let (total, items_count) = totals(&self.items)?;
        let settlement = settle(total, method, cash_paid)?;

        self.total = total;
        self.items_count = items_count;
        self.status = ComandaStatus::Closed;
        self.closed_at = Some(now);
        self.payment_method = Some(settlement.method);
        self.cash_paid = settlement.cash_paid;
        self.change = settlement.change;

        Ok(settlement)
    }
}

/// `(Σ line value, Σ quantity)` over `items`, checked.
fn totals(items: &[ComandaItem]) -> CoreResult<(Money, i64)> {
    items
        .iter()
        .try_fold((Money::zero(), 0i64), |(total, count), item| {
            let total = total
                .checked_add(item.line_value()?)
                .ok_or_else(|| too_large("total"))?;
            let count = count
                .checked_add(item.quantity)
                .ok_or_else(|| too_large("itemsCount"))?;
            Ok((total, count))
        })
}

// =============================================================================
// Unit Tests
// =============================================================================
