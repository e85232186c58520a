//! # Pricing Calculator
//!
//! Single dispatch point from a product's [`PricingMode`] to money.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  price(product, quantity, weight_grams)                                 │
//! │                                                                         │
//! │  Unit   { price }        ──► round2(price × quantity)                   │
//! │  Weight { price_per_kg } ──► round2(grams / 1000 × price_per_kg)        │
//! │                              (quantity does not scale a serving)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{PricingMode, Product};
use crate::validation::{too_large, validate_quantity, validate_weight_grams};

/// Computes the monetary price of `quantity` units (unit products) or of one
/// weighed serving (weight products).
///
/// ## Errors
/// - `Validation` if `quantity` or `weight_grams` is not positive, or the
///   resulting amount does not fit in cents
/// - `MissingWeight` if a weight product has no `weight_grams`
/// - `InvalidPricePerKg` if the catalog rate is not positive
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use comanda_core::{pricing, Money, PricingMode, Product};
///
/// let buffet = Product {
///     id: "p-buffet".into(),
///     name: "Buffet".into(),
///     category: "Pratos".into(),
///     pricing: PricingMode::Weight { price_per_kg: Money::from_cents(4000) },
///     active: true,
///     created_at: Utc::now(),
///     updated_at: Utc::now(),
/// };
///
/// let price = pricing::price(&buffet, 1, Some(250)).unwrap();
/// assert_eq!(price.cents(), 1000);
/// ```
pub fn price(product: &Product, quantity: i64, weight_grams: Option<i64>) -> CoreResult<Money> {
    match product.pricing {
        PricingMode::Unit { price } => {
            validate_quantity(quantity)?;
            line_value(price, quantity)
        }
        PricingMode::Weight { price_per_kg } => {
            let grams = weight_grams.ok_or_else(|| CoreError::MissingWeight(product.id.clone()))?;
            validate_weight_grams(grams)?;
            if !price_per_kg.is_positive() {
                return Err(CoreError::InvalidPricePerKg(product.id.clone()));
            }
            price_per_kg
                .for_grams(grams)
                .ok_or_else(|| too_large("weightGrams"))
        }
    }
}

/// Price stored on a new item: the unit price for unit products, the serving
/// price for weight products.
#[inline]
pub fn item_price(product: &Product, weight_grams: Option<i64>) -> CoreResult<Money> {
    price(product, 1, weight_grams)
}

/// Value of one line: `price × quantity`, already whole cents.
#[inline]
pub fn line_value(price: Money, quantity: i64) -> CoreResult<Money> {
    price
        .checked_multiply_quantity(quantity)
        .ok_or_else(|| too_large("quantity"))
}
