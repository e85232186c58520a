//! # Domain Types
//!
//! Catalog and lifecycle types shared by every layer.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────────┐                        │
//! │  │    Product      │   │     PricingMode      │                        │
//! │  │  ─────────────  │   │  ──────────────────  │                        │
//! │  │  id (UUID)      │──►│  Unit { price }      │                        │
//! │  │  name, category │   │  Weight {            │                        │
//! │  │  active         │   │    price_per_kg }    │                        │
//! │  └─────────────────┘   └──────────────────────┘                        │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │  ComandaStatus  │   │  PaymentMethod  │                             │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  Open           │   │  Pix            │                             │
//! │  │  Closed         │   │  Card           │                             │
//! │  └─────────────────┘   │  Cash           │                             │
//! │                        └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Pricing Mode
// =============================================================================

/// How a product is priced.
///
/// Each variant carries only the rate that applies to it, so a unit product
/// never has a per-kilogram rate lying around and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "pricingType", rename_all = "snake_case")]
pub enum PricingMode {
    /// Fixed price per unit.
    Unit { price: Money },
    /// Rate per kilogram; each serving is priced from its weight in grams.
    Weight {
        #[serde(rename = "pricePerKg")]
        price_per_kg: Money,
    },
}

impl PricingMode {
    /// Returns true for weight-priced products.
    #[inline]
    pub fn is_weight(&self) -> bool {
        matches!(self, PricingMode::Weight { .. })
    }

    /// Stable lowercase name ("unit" / "weight").
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingMode::Unit { .. } => "unit",
            PricingMode::Weight { .. } => "weight",
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product, read-only to the order engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, snapshotted onto items when added.
    pub name: String,

    /// Free-form grouping ("Bebidas", "Pratos", ...).
    pub category: String,

    /// Unit or weight pricing with its rate.
    pub pricing: PricingMode,

    /// Whether the product can be added to comandas.
    pub active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns true for weight-priced products.
    #[inline]
    pub fn is_weight_priced(&self) -> bool {
        self.pricing.is_weight()
    }
}

// =============================================================================
// Comanda Status
// =============================================================================

/// Lifecycle state of a comanda. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ComandaStatus {
    /// Items may be added, adjusted and annotated.
    Open,
    /// Paid and settled.
    Closed,
}

impl Default for ComandaStatus {
    fn default() -> Self {
        ComandaStatus::Open
    }
}

impl ComandaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComandaStatus::Open => "open",
            ComandaStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for ComandaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Instant bank transfer.
    Pix,
    /// Card on an external terminal.
    Card,
    /// Physical cash; the only method with tendered amount and change.
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Pix => "pix",
            PaymentMethod::Card => "card",
            PaymentMethod::Cash => "cash",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
