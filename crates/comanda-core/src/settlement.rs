//! # Settlement
//!
//! Payment-method-specific finalisation performed when a comanda closes.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  total = R$ 28.50                                                       │
//! │                                                                         │
//! │  pix / card ──► Settlement { cash_paid: None,  change: None }           │
//! │                                                                         │
//! │  cash 20.00 ──► CashInsufficient                                        │
//! │  cash 28.50 ──► Settlement { cash_paid: 28.50, change: 0.00 }           │
//! │  cash 50.00 ──► Settlement { cash_paid: 50.00, change: 21.50 }          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::PaymentMethod;

/// Outcome of settling a total against a payment method.
///
/// `cash_paid` and `change` are `Some` exactly when `method` is cash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub method: PaymentMethod,
    pub cash_paid: Option<Money>,
    pub change: Option<Money>,
}

/// Settles `total` against `method`.
///
/// `cash_paid` is in whole cents and is ignored for pix and card. A cash payment without a tendered amount is
/// rejected, reported as zero tendered.
pub fn settle(total: Money, method: PaymentMethod, cash_paid: Option<Money>) -> CoreResult<Settlement> {
    match method {
        PaymentMethod::Cash => {
            let paid = cash_paid.unwrap_or_else(Money::zero);
            if cash_paid.is_none() || paid < total {
                return Err(CoreError::CashInsufficient {
                    total_cents: total.cents(),
                    paid_cents: paid.cents(),
                });
            }
            Ok(Settlement {
                method,
                cash_paid: Some(paid),
                change: Some(paid - total),
            })
        }
        PaymentMethod::Pix | PaymentMethod::Card => Ok(Settlement {
            method,
            cash_paid: None,
            change: None,
        }),
    }
}
