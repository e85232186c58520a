//! # comanda-service: The Order Engine
//!
//! Runs the comanda aggregate against storage with per-comanda mutual
//! exclusion and optimistic persistence.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   caller (HTTP handler, desktop command, CLI ...)                       │
//! │       │  create / add_item / adjust_quantity / set_observation          │
//! │       │  close / recalc / get / list_today                              │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               comanda-service (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ComandaService ──► OrderLocks (one async mutex per id)        │   │
//! │  │        │                                                        │   │
//! │  │        ├──► comanda-core (rules, pricing, settlement)           │   │
//! │  │        │                                                        │   │
//! │  │        └──► ports: Catalog + ComandaStore                       │   │
//! │  │                 ├── comanda_db::Database (SQLite)               │   │
//! │  │                 └── MemoryStore                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │   Result<Comanda, ApiError { code, message }>                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`service`] - `ComandaService` and its request types
//! - [`ports`] - Storage traits and their SQLite implementation
//! - [`memory`] - In-memory store
//! - [`locks`] - Keyed lock registry
//! - [`error`] - `ApiError`, `ErrorCode`, `StoreError`
//! - [`config`] - TOML + environment configuration
//! - [`telemetry`] - Tracing subscriber setup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use comanda_service::{telemetry, AddItemRequest, CloseRequest, ComandaService, ServiceConfig};
//!
//! telemetry::init_tracing();
//! let config = ServiceConfig::load(None)?;
//! let service = ComandaService::connect(&config).await?;
//!
//! let comanda = service.create(12).await?;
//! service.add_item(&comanda.id, AddItemRequest::new(&buffet_id).weight_grams(250)).await?;
//! let closed = service.close(&comanda.id, CloseRequest::cash(Money::from_cents(5000))).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod locks;
pub mod memory;
pub mod ports;
pub mod service;
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, ServiceConfig};
pub use error::{ApiError, ApiResult, ErrorCode, StoreError, StoreResult};
pub use locks::OrderLocks;
pub use memory::MemoryStore;
pub use ports::{Catalog, ComandaStore};
pub use service::{AddItemRequest, CloseRequest, ComandaService};
