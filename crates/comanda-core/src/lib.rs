//! # comanda-core: Pure Order Logic
//!
//! This crate is the **heart** of the comanda engine. It holds the pricing
//! rules, the order aggregate and settlement as pure functions and plain
//! data, with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Comanda Engine Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Transport (external, not here)                  │   │
//! │  │    open tab ──► add item ──► adjust / note ──► close            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    comanda-service                              │   │
//! │  │    per-order lock, load ──► mutate ──► save, retries            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ comanda-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  pricing  │  │  comanda  │  │settlement │  │   clock   │  │   │
//! │  │   │ unit/kg   │  │ aggregate │  │  change   │  │ today's   │  │   │
//! │  │   │  price    │  │  recalc   │  │   math    │  │  window   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  comanda-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Product, pricing mode, status and payment method
//! - [`money`] - Integer-cent money with half-up rounding
//! - [`pricing`] - Price of a line from a product's pricing mode
//! - [`comanda`] - The order aggregate and its mutations
//! - [`settlement`] - Cash / pix / card finalisation
//! - [`clock`] - Time source and business-day windows
//! - [`error`] - Domain error types
//! - [`validation`] - Input checks
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use comanda_core::{Comanda, Money, NewItem, PaymentMethod, PricingMode, Product};
//!
//! let soda = Product {
//!     id: "p-soda".into(),
//!     name: "Refrigerante".into(),
//!     category: "Bebidas".into(),
//!     pricing: PricingMode::Unit { price: Money::from_cents(950) },
//!     active: true,
//!     created_at: Utc::now(),
//!     updated_at: Utc::now(),
//! };
//!
//! let now = Utc::now();
//! let mut comanda = Comanda::open(12, now, now.date_naive()).unwrap();
//! comanda.add_item(&soda, &NewItem::units(2), now).unwrap();
//! comanda.add_item(&soda, &NewItem::default(), now).unwrap();
//! assert_eq!(comanda.total.cents(), 2850);
//!
//! let settlement = comanda
//!     .close(PaymentMethod::Cash, Some(Money::from_cents(5000)), now)
//!     .unwrap();
//! assert_eq!(settlement.change, Some(Money::from_cents(2150)));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod clock;
pub mod comanda;
pub mod error;
pub mod money;
pub mod pricing;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use comanda_core::Money` instead of
// `use comanda_core::money::Money`

pub use clock::{Clock, DayWindow, FixedClock, SystemClock};
pub use comanda::{Comanda, ComandaItem, ItemOutcome, NewItem, QuantityOutcome};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use settlement::Settlement;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Grams in a kilogram, the unit of a weight product's rate.
pub const GRAMS_PER_KG: i64 = 1000;

/// Quantity used when an add-item request does not specify one.
pub const DEFAULT_QUANTITY: i64 = 1;

/// Maximum length of an item observation, in characters.
///
/// ## Business Reason
/// Notes are printed on kitchen tickets; anything longer is a paste error.
pub const MAX_OBSERVATION_LEN: usize = 500;
