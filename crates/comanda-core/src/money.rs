//! # Money Module
//!
//! Integer-cent money type used for every price, total and settlement value.
//!
//! ## Rounding Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ROUND HALF UP, TO THE CENT, AFTER THE ARITHMETIC                       │
//! │                                                                         │
//! │  250 g × R$ 40.00/kg   = 250 × 4000 / 1000   = 1000.000  → 1000 cents   │
//! │  333 g × R$ 39.90/kg   = 333 × 3990 / 1000   = 1328.670  → 1329 cents   │
//! │  125 g × R$ 10.20/kg   = 125 × 1020 / 1000   =  127.500  →  128 cents   │
//! │                                                                         │
//! │  Every computation boundary (serving price, line value, total,         │
//! │  tendered cash, change) yields whole cents, so each stage can be        │
//! │  reproduced independently from the stored values.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use comanda_core::money::Money;
//!
//! let price = Money::from_cents(950); // R$ 9.50
//! let line = price.checked_multiply_quantity(3).unwrap();
//! assert_eq!(line.cents(), 2850);
//!
//! // 250 g of a R$ 40.00/kg product
//! let serving = Money::from_cents(4000).for_grams(250).unwrap();
//! assert_eq!(serving.cents(), 1000);
//!
//! // Results outside i64 cents are reported, never wrapped
//! assert!(Money::from_cents(950).checked_multiply_quantity(i64::MAX).is_none());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use ts_rs::TS;

use crate::GRAMS_PER_KG;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents (the smallest currency unit).
///
/// ## Design Decisions
/// - **i64 (signed)**: subtraction is total, settlement rejects negatives
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Checked growth**: everything that scales a price (quantity, grams,
///   summing lines) returns `None` instead of overflowing
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// `self + rhs`, or `None` on overflow.
    #[inline]
    pub const fn checked_add(self, rhs: Money) -> Option<Money> {
        match self.0.checked_add(rhs.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Multiplies a unit price by an integer quantity, or `None` on overflow.
    ///
    /// Exact in cents, so `round2(price × qty)` needs no further rounding.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Prices a weighed serving: `round2((grams / 1000) × self)` where `self`
    /// is a per-kilogram rate. `None` when the result does not fit in cents.
    ///
    /// ## User Workflow
    /// ```text
    /// Scale reads 333 g ──► for_grams(333) on R$ 39.90/kg ──► R$ 13.29
    /// ```
    pub fn for_grams(&self, grams: i64) -> Option<Money> {
        let raw = i128::from(self.0) * i128::from(grams);
        let cents = div_round_half_up(raw, i128::from(GRAMS_PER_KG))?;
        i64::try_from(cents).ok().map(Money)
    }
}

/// Integer division rounding half up (towards positive infinity on ties).
///
/// `denominator` must be positive.
fn div_round_half_up(numerator: i128, denominator: i128) -> Option<i128> {
    let doubled = numerator.checked_mul(2)?.checked_add(denominator)?;
    Some(doubled.div_euclid(2 * denominator))
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money as `R$ 12.34` (debugging and receipts; UIs localise themselves).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}R$ {}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Money;

    #[inline]
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    #[inline]
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
