//! # Database Pool
//!
//! Opens the SQLite file, applies the schema and hands out repositories.
//!
//! ## Writers and the Version Check
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  process A: save(c, v=4) ──┐                                            │
//! │                            ├──► SQLite writer lock (one at a time)      │
//! │  process B: save(c, v=4) ──┘         │                                  │
//! │                                      ▼                                  │
//! │              first:  UPDATE ... WHERE version = 4  → 1 row, v = 5       │
//! │              second: UPDATE ... WHERE version = 4  → 0 rows → conflict  │
//! │                                                                         │
//! │  A writer that finds the lock held waits up to BUSY_TIMEOUT before      │
//! │  the statement fails; WAL keeps readers off the writer's path.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::comanda::ComandaRepository;
use crate::repository::product::ProductRepository;

/// How long a statement waits for another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a caller waits for a free pooled connection.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// Configuration
// =============================================================================

/// Where the database lives and how many connections may share it.
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/comanda/comanda.db").max_connections(8);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, created on first connect.
    pub database_path: PathBuf,

    /// Default: 5.
    pub max_connections: u32,

    /// `None` for in-memory databases: their data dies with the connection.
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// A private database for tests. Every `:memory:` connection is its own
    /// database, so the pool holds exactly one and never recycles it.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            idle_timeout: None,
            max_lifetime: None,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the pool. Clones share it.
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./comanda.db")).await?;
/// let comanda = db.comandas().get_by_id(&id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connects (WAL, NORMAL sync, foreign keys on) and applies pending
    /// migrations.
    ///
    /// ## Errors
    /// - `ConnectionFailed` if the file cannot be opened
    /// - `MigrationFailed` if the schema cannot be applied
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening comanda database");

        let url = format!("sqlite://{}?mode=rwc", config.database_path.display());
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        migrations::run_migrations(&pool).await?;
        info!(max_connections = config.max_connections, "Database ready");

        Ok(Database { pool })
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn comandas(&self) -> ComandaRepository {
        ComandaRepository::new(self.pool.clone())
    }

    /// `(embedded, applied)` migration counts.
    pub async fn migration_status(&self) -> DbResult<(usize, usize)> {
        migrations::migration_status(&self.pool).await
    }

    /// Whether a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// Closes every connection; later calls fail.
    pub async fn close(&self) {
        info!("Closing comanda database");
        self.pool.close().await;
    }
}
