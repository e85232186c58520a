//! # Product Repository
//!
//! Catalog lookups for the order engine, plus the inserts the seed binary
//! and tests need. Catalog management lives elsewhere.
//!
//! ## Pricing Columns
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  pricing_type │ price_cents │ price_per_kg_cents │  PricingMode         │
//! │  ─────────────┼─────────────┼────────────────────┼───────────────────── │
//! │  'unit'       │    950      │       NULL         │  Unit { 9.50 }       │
//! │  'weight'     │    NULL     │       4000         │  Weight { 40.00/kg } │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! A CHECK constraint keeps the active column populated; the other one is
//! ignored on read.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::{from_millis, to_millis};
use comanda_core::{Money, PricingMode, Product};

/// Raw `products` row.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    category: String,
    pricing_type: String,
    price_cents: Option<i64>,
    price_per_kg_cents: Option<i64>,
    active: bool,
    created_at_ms: i64,
    updated_at_ms: i64,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> DbResult<Self> {
        let pricing = match (row.pricing_type.as_str(), row.price_cents, row.price_per_kg_cents) {
            ("unit", Some(price), _) => PricingMode::Unit {
                price: Money::from_cents(price),
            },
            ("weight", _, Some(rate)) => PricingMode::Weight {
                price_per_kg: Money::from_cents(rate),
            },
            (other, _, _) => {
                return Err(DbError::corrupt(
                    "products",
                    format!("product {} has unusable pricing '{}'", row.id, other),
                ))
            }
        };

        Ok(Product {
            id: row.id,
            name: row.name,
            category: row.category,
            pricing,
            active: row.active,
            created_at: from_millis("products", row.created_at_ms)?,
            updated_at: from_millis("products", row.updated_at_ms)?,
        })
    }
}

const SELECT_PRODUCT: &str = r#"
    SELECT
        id, name, category,
        pricing_type, price_cents, price_per_kg_cents,
        active, created_at_ms, updated_at_ms
    FROM products
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found (active or not)
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        debug!(id = %id, "Loading product");

        let row: Option<ProductRow> = sqlx::query_as(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - ID already exists
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        let (price_cents, price_per_kg_cents) = match product.pricing {
            PricingMode::Unit { price } => (Some(price.cents()), None),
            PricingMode::Weight { price_per_kg } => (None, Some(price_per_kg.cents())),
        };

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category,
                pricing_type, price_cents, price_per_kg_cents,
                active, created_at_ms, updated_at_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.pricing.as_str())
        .bind(price_cents)
        .bind(price_per_kg_cents)
        .bind(product.active)
        .bind(to_millis(product.created_at))
        .bind(to_millis(product.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Enables or disables a product for new sales.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        debug!(id = %id, active, "Setting product active flag");

        let result = sqlx::query(
            "UPDATE products SET active = ?2, updated_at_ms = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(active)
        .bind(to_millis(chrono::Utc::now()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics and seeding).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}
