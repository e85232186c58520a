//! # Validation Module
//!
//! Input validation for comanda operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Transport (external)                                         │
//! │  └── Schema checks, type coercion                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Business-meaningful ranges (positive number, quantity, grams)     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (quantity > 0)                                  │
//! │  └── UNIQUE (number, business_day)                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::MAX_OBSERVATION_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a comanda (table / ticket) number.
///
/// ```rust
/// use comanda_core::validation::validate_comanda_number;
///
/// assert!(validate_comanda_number(12).is_ok());
/// assert!(validate_comanda_number(0).is_err());
/// ```
pub fn validate_comanda_number(number: i64) -> ValidationResult<()> {
    if number <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "number".to_string(),
        });
    }

    Ok(())
}

/// Validates an item quantity (must be > 0).
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a scale reading in grams (must be > 0).
pub fn validate_weight_grams(grams: i64) -> ValidationResult<()> {
    if grams <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "weightGrams".to_string(),
        });
    }

    Ok(())
}

/// Error for an amount or count that overflows its integer representation.
pub(crate) fn too_large(field: &str) -> crate::error::CoreError {
    ValidationError::TooLarge {
        field: field.to_string(),
    }
    .into()
}

// =============================================================================
// String Validators
// =============================================================================

/// Normalizes a free-text item note.
///
/// Blank notes clear the observation; longer than
/// [`MAX_OBSERVATION_LEN`] characters is rejected.
///
/// ## Returns
/// The trimmed note, or `None` when it should be cleared.
pub fn normalize_observation(text: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };

    if text.chars().count() > MAX_OBSERVATION_LEN {
        return Err(ValidationError::TooLong {
            field: "observation".to_string(),
            max: MAX_OBSERVATION_LEN,
        });
    }

    Ok(Some(text.to_string()))
}

/// Validates a product name (seed data and catalog adapters).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
