//! # Repository Module
//!
//! Database repository implementations for the comanda engine.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  ComandaService (via the storage ports)                                │
//! │       │                                                                 │
//! │       │  db.comandas().save(&comanda, expected_version)                │
//! │       ▼                                                                 │
//! │  ComandaRepository                                                     │
//! │  ├── insert(&self, comanda)                                            │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── save(&self, comanda, expected_version)                            │
//! │  ├── find_by_number_between(&self, number, window)                     │
//! │  └── list_created_between(&self, window)                               │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog lookups
//! - [`ComandaRepository`](comanda::ComandaRepository) - Comandas and items

pub mod comanda;
pub mod product;

use chrono::{DateTime, Utc};

use crate::error::{DbError, DbResult};

/// Instants are stored as epoch milliseconds (UTC).
#[inline]
pub(crate) fn to_millis(instant: DateTime<Utc>) -> i64 {
    instant.timestamp_millis()
}

pub(crate) fn from_millis(table: &str, millis: i64) -> DbResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| DbError::corrupt(table, format!("timestamp {} out of range", millis)))
}
