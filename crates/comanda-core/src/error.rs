//! # Error Types
//!
//! Domain-specific error types for comanda-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  comanda-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  comanda-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  comanda-service errors                                                │
//! │  ├── StoreError       - Port-level persistence failures                │
//! │  └── ApiError         - What callers see (code + message + status)     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → transport              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the order aggregate.
///
/// Every variant maps to one stable identifier at the service boundary, so
/// new variants must also be added to the `ApiError` conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The referenced comanda does not exist.
    #[error("Comanda not found: {0}")]
    OrderNotFound(String),

    /// The item is not part of the referenced comanda.
    #[error("Item {item_id} not found on comanda {comanda_id}")]
    ItemNotFound { comanda_id: String, item_id: String },

    /// The catalog has no product with this id.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Item mutation attempted on a closed comanda.
    #[error("Comanda {0} is closed")]
    OrderClosed(String),

    /// Close attempted on a comanda that is already closed.
    #[error("Comanda {0} is already closed")]
    AlreadyClosed(String),

    /// The product is disabled for new sales.
    #[error("Product {0} is inactive")]
    ProductInactive(String),

    /// Weight-priced product added without a weight.
    ///
    /// ## User Workflow
    /// ```text
    /// Cashier picks "Buffet por kg" ──► forgets to read the scale
    ///      │
    ///      ▼
    /// MissingWeight ──► UI asks for weightGrams
    /// ```
    #[error("Product {0} is sold by weight and requires weightGrams")]
    MissingWeight(String),

    /// Close attempted on a comanda without items.
    #[error("Comanda {0} has no items")]
    EmptyOrder(String),

    /// Tendered cash does not cover the total.
    #[error("Cash paid {paid_cents} is below total {total_cents}")]
    CashInsufficient { total_cents: i64, paid_cents: i64 },

    /// Another comanda with this number was created today.
    #[error("Comanda number {0} already exists today")]
    NumberAlreadyExistsToday(i64),

    /// Catalog data for a weight product has a non-positive rate.
    #[error("Product {0} has an invalid price per kg")]
    InvalidPricePerKg(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value is valid on its own but the amount it produces does not fit
    /// in `i64` cents (or the item count in `i64`).
    #[error("{field} is too large")]
    TooLarge { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
