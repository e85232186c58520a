//! # Service Errors
//!
//! What callers of [`ComandaService`](crate::ComandaService) see.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Comanda Engine                     │
//! │                                                                         │
//! │  ComandaService::add_item(...)                                          │
//! │         │                                                               │
//! │         ├── Comanda::add_item ── CoreError::ProductInactive ──┐         │
//! │         │                                                      │         │
//! │         ├── store.save(...) ──── StoreError::VersionConflict  │         │
//! │         │        (retried, then Conflict)                      │         │
//! │         │                                                      ▼         │
//! │         └── store.get(...) ───── StoreError::Backend ────► ApiError     │
//! │                                                                         │
//! │  ApiError { code: "product_inactive", message: "..." }  status() = 400  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage details are logged with `tracing::error!` and replaced by a
//! generic message; callers never see SQL text.

use serde::Serialize;
use thiserror::Error;

use comanda_core::CoreError;
use comanda_db::DbError;

// =============================================================================
// Store Error
// =============================================================================

/// Failures reported by the storage ports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Uniqueness constraint hit (e.g. number + business day).
    #[error("Duplicate {field}: {value}")]
    Duplicate { field: String, value: String },

    /// The stored version moved on, or the comanda is no longer open.
    #[error("Version conflict on comanda {id} (expected version {expected})")]
    VersionConflict { id: String, expected: i64 },

    /// Anything else from the backend.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => StoreError::NotFound { entity, id },
            DbError::UniqueViolation { field, value } => StoreError::Duplicate { field, value },
            DbError::VersionConflict { id, expected } => StoreError::VersionConflict { id, expected },
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Convenience type alias for port results.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// API Error
// =============================================================================

/// Error returned from every [`ComandaService`](crate::ComandaService) operation.
///
/// ## Serialization
/// ```json
/// {
///   "code": "cash_insufficient",
///   "message": "Cash paid 2000 is below total 2850"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Stable machine-readable identifier.
    pub code: ErrorCode,

    /// Human-readable message for display.
    pub message: String,
}

/// Stable error identifiers.
///
/// ## Status Mapping
/// | status | codes |
/// |--------|-------|
/// | 404 | `comanda_not_found`, `item_not_found`, `product_not_found` |
/// | 400 | `comanda_closed`, `already_closed`, `product_inactive`, `missing_weight`, `empty_comanda`, `cash_insufficient`, `invalid_price_per_kg`, `validation_error` |
/// | 409 | `number_already_exists_today`, `conflict` |
/// | 500 | `database_error`, `internal` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    ComandaNotFound,
    ItemNotFound,
    ProductNotFound,
    ComandaClosed,
    AlreadyClosed,
    ProductInactive,
    MissingWeight,
    EmptyComanda,
    CashInsufficient,
    NumberAlreadyExistsToday,
    InvalidPricePerKg,
    ValidationError,

    /// Optimistic retries exhausted.
    Conflict,

    /// Storage failed (500).
    DatabaseError,

    /// Internal error (500).
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ComandaNotFound => "comanda_not_found",
            ErrorCode::ItemNotFound => "item_not_found",
            ErrorCode::ProductNotFound => "product_not_found",
            ErrorCode::ComandaClosed => "comanda_closed",
            ErrorCode::AlreadyClosed => "already_closed",
            ErrorCode::ProductInactive => "product_inactive",
            ErrorCode::MissingWeight => "missing_weight",
            ErrorCode::EmptyComanda => "empty_comanda",
            ErrorCode::CashInsufficient => "cash_insufficient",
            ErrorCode::NumberAlreadyExistsToday => "number_already_exists_today",
            ErrorCode::InvalidPricePerKg => "invalid_price_per_kg",
            ErrorCode::ValidationError => "validation_error",
            ErrorCode::Conflict => "conflict",
            ErrorCode::DatabaseError => "database_error",
            ErrorCode::Internal => "internal",
        }
    }

    /// HTTP-style status for this code.
    pub fn status(&self) -> u16 {
        match self {
            ErrorCode::ComandaNotFound | ErrorCode::ItemNotFound | ErrorCode::ProductNotFound => 404,
            ErrorCode::NumberAlreadyExistsToday | ErrorCode::Conflict => 409,
            ErrorCode::DatabaseError | ErrorCode::Internal => 500,
            _ => 400,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Retries exhausted on a busy comanda.
    pub fn conflict(comanda_id: &str) -> Self {
        ApiError::new(
            ErrorCode::Conflict,
            format!("Comanda {} was modified concurrently, try again", comanda_id),
        )
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// HTTP-style status (400 / 404 / 409 / 500).
    pub fn status(&self) -> u16 {
        self.code.status()
    }
}

/// Converts aggregate errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::OrderNotFound(_) => ErrorCode::ComandaNotFound,
            CoreError::ItemNotFound { .. } => ErrorCode::ItemNotFound,
            CoreError::ProductNotFound(_) => ErrorCode::ProductNotFound,
            CoreError::OrderClosed(_) => ErrorCode::ComandaClosed,
            CoreError::AlreadyClosed(_) => ErrorCode::AlreadyClosed,
            CoreError::ProductInactive(_) => ErrorCode::ProductInactive,
            CoreError::MissingWeight(_) => ErrorCode::MissingWeight,
            CoreError::EmptyOrder(_) => ErrorCode::EmptyComanda,
            CoreError::CashInsufficient { .. } => ErrorCode::CashInsufficient,
            CoreError::NumberAlreadyExistsToday(_) => ErrorCode::NumberAlreadyExistsToday,
            CoreError::InvalidPricePerKg(_) => ErrorCode::InvalidPricePerKg,
            CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        ApiError::new(code, err.to_string())
    }
}

/// Converts port errors to API errors.
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } if entity.eq_ignore_ascii_case("comanda") => {
                ApiError::new(ErrorCode::ComandaNotFound, format!("Comanda not found: {}", id))
            }
            StoreError::NotFound { entity, id } => {
                tracing::error!(entity = %entity, id = %id, "Row vanished during write");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            StoreError::Duplicate { field, value } => {
                tracing::error!(field = %field, value = %value, "Unexpected unique violation");
                ApiError::new(ErrorCode::Conflict, format!("{} '{}' already exists", field, value))
            }
            StoreError::VersionConflict { id, .. } => ApiError::conflict(&id),
            StoreError::Backend(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Storage operation failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts database errors (e.g. while opening the pool) to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            other => StoreError::from(other).into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}

/// Convenience type alias for service results.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use comanda_core::ValidationError;

    #[test]
    fn test_core_error_codes_and_statuses() {
        let cases = vec![
            (CoreError::OrderNotFound("c".into()), "comanda_not_found", 404),
            (
                CoreError::ItemNotFound {
                    comanda_id: "c".into(),
                    item_id: "i".into(),
                },
                "item_not_found",
                404,
            ),
            (CoreError::ProductNotFound("p".into()), "product_not_found", 404),
            (CoreError::OrderClosed("c".into()), "comanda_closed", 400),
            (CoreError::AlreadyClosed("c".into()), "already_closed", 400),
            (CoreError::ProductInactive("p".into()), "product_inactive", 400),
            (CoreError::MissingWeight("p".into()), "missing_weight", 400),
            (CoreError::EmptyOrder("c".into()), "empty_comanda", 400),
            (
                CoreError::CashInsufficient {
                    total_cents: 100,
                    paid_cents: 50,
                },
                "cash_insufficient",
                400,
            ),
            (
                CoreError::NumberAlreadyExistsToday(3),
                "number_already_exists_today",
                409,
            ),
            (CoreError::InvalidPricePerKg("p".into()), "invalid_price_per_kg", 400),
            (
                CoreError::Validation(ValidationError::MustBePositive {
                    field: "number".into(),
                }),
                "validation_error",
                400,
            ),
        ];

        for (err, code, status) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.code.as_str(), code);
            assert_eq!(api.status(), status);
        }
    }

    #[test]
    fn test_store_error_mapping() {
        let api: ApiError = StoreError::VersionConflict {
            id: "c".into(),
            expected: 2,
        }
        .into();
        assert_eq!(api.code, ErrorCode::Conflict);
        assert_eq!(api.status(), 409);

        let api: ApiError = StoreError::Backend("disk I/O error".into()).into();
        assert_eq!(api.code, ErrorCode::DatabaseError);
        assert!(!api.message.contains("disk"));
        assert_eq!(api.status(), 500);

        let api: ApiError = StoreError::NotFound {
            entity: "Comanda".into(),
            id: "c".into(),
        }
        .into();
        assert_eq!(api.code, ErrorCode::ComandaNotFound);
    }

    #[test]
    fn test_db_error_to_store_error() {
        let err: StoreError = DbError::duplicate("number", "12").into();
        assert!(matches!(err, StoreError::Duplicate { .. }));

        let err: StoreError = DbError::VersionConflict {
            id: "c".into(),
            expected: 1,
        }
        .into();
        assert!(matches!(err, StoreError::VersionConflict { expected: 1, .. }));

        let err: StoreError = DbError::PoolExhausted.into();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[test]
    fn test_serialization() {
        let err = ApiError::new(ErrorCode::CashInsufficient, "Cash paid 2000 is below total 2850");
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["code"], "cash_insufficient");
        assert_eq!(json["message"], "Cash paid 2000 is below total 2850");
        assert_eq!(err.to_string(), "[cash_insufficient] Cash paid 2000 is below total 2850");
    }
}
