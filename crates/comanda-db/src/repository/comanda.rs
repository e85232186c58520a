//! # Comanda Repository
//!
//! Persistence for comandas and their items.
//!
//! ## Save Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    save(comanda, expected_version)                      │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    UPDATE comandas SET ..., version = version + 1                       │
//! │     WHERE id = ? AND version = expected AND status = 'open'             │
//! │       │                                                                 │
//! │       ├── 0 rows ──► row exists? ──► VersionConflict : NotFound         │
//! │       │              (ROLLBACK)                                         │
//! │       ▼                                                                 │
//! │    DELETE FROM comanda_items WHERE comanda_id = ?                       │
//! │    INSERT every item (position = index)                                 │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Items and header fields (total, items_count, payment fields) always land
//! in the same transaction, so a reader never sees a total that disagrees
//! with the stored items. The `status = 'open'` guard makes a closed comanda
//! immutable even for writers that loaded it before it closed.

use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{from_millis, to_millis};
use comanda_core::clock::DayWindow;
use comanda_core::{Comanda, ComandaItem, ComandaStatus, Money, PaymentMethod};

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ComandaRow {
    id: String,
    number: i64,
    business_day: NaiveDate,
    status: ComandaStatus,
    total_cents: i64,
    items_count: i64,
    payment_method: Option<PaymentMethod>,
    cash_paid_cents: Option<i64>,
    change_cents: Option<i64>,
    created_at_ms: i64,
    closed_at_ms: Option<i64>,
    version: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: String,
    comanda_id: String,
    product_id: String,
    name: String,
    quantity: i64,
    price_cents: i64,
    weight_grams: Option<i64>,
    observation: Option<String>,
    created_at_ms: i64,
}

impl TryFrom<ItemRow> for ComandaItem {
    type Error = DbError;

    fn try_from(row: ItemRow) -> DbResult<Self> {
        Ok(ComandaItem {
            id: row.id,
            comanda_id: row.comanda_id,
            product_id: row.product_id,
            name: row.name,
            quantity: row.quantity,
            price: Money::from_cents(row.price_cents),
            weight_grams: row.weight_grams,
            observation: row.observation,
            created_at: from_millis("comanda_items", row.created_at_ms)?,
        })
    }
}

impl ComandaRow {
    fn into_comanda(self, items: Vec<ComandaItem>) -> DbResult<Comanda> {
        Ok(Comanda {
            id: self.id,
            number: self.number,
            status: self.status,
            business_day: self.business_day,
            total: Money::from_cents(self.total_cents),
            items_count: self.items_count,
            payment_method: self.payment_method,
            cash_paid: self.cash_paid_cents.map(Money::from_cents),
            change: self.change_cents.map(Money::from_cents),
            created_at: from_millis("comandas", self.created_at_ms)?,
            closed_at: self
                .closed_at_ms
                .map(|ms| from_millis("comandas", ms))
                .transpose()?,
            version: self.version,
            items,
        })
    }
}

const SELECT_COMANDA: &str = r#"
    SELECT
        id, number, business_day, status,
        total_cents, items_count,
        payment_method, cash_paid_cents, change_cents,
        created_at_ms, closed_at_ms, version
    FROM comandas
"#;

const SELECT_ITEM: &str = r#"
    SELECT
        i.id, i.comanda_id, i.product_id, i.name,
        i.quantity, i.price_cents, i.weight_grams, i.observation,
        i.created_at_ms
    FROM comanda_items i
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for comanda database operations.
#[derive(Debug, Clone)]
pub struct ComandaRepository {
    pool: SqlitePool,
}

impl ComandaRepository {
    /// Creates a new ComandaRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ComandaRepository { pool }
    }

    /// Inserts a freshly opened comanda (and any items it already has).
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - number already used on this business day
    pub async fn insert(&self, comanda: &Comanda) -> DbResult<()> {
        debug!(comanda_id = %comanda.id, number = comanda.number, "Inserting comanda");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO comandas (
                id, number, business_day, status,
                total_cents, items_count,
                payment_method, cash_paid_cents, change_cents,
                created_at_ms, closed_at_ms, version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&comanda.id)
        .bind(comanda.number)
        .bind(comanda.business_day)
        .bind(comanda.status)
        .bind(comanda.total.cents())
        .bind(comanda.items_count)
        .bind(comanda.payment_method)
        .bind(comanda.cash_paid.map(|m| m.cents()))
        .bind(comanda.change.map(|m| m.cents()))
        .bind(to_millis(comanda.created_at))
        .bind(comanda.closed_at.map(to_millis))
        .bind(comanda.version)
        .execute(&mut *tx)
        .await?;

        insert_items(&mut tx, comanda).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Gets a comanda with its items, in insertion order.
    ///
    /// Header and items come from one read transaction, so the totals
    /// always match the items returned.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Comanda>> {
        debug!(comanda_id = %id, "Loading comanda");

        let mut tx = self.pool.begin().await?;
        let row: Option<ComandaRow> = sqlx::query_as(&format!("{SELECT_COMANDA} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let comanda = with_items(&mut tx, row).await?;
        tx.commit().await?;

        Ok(comanda)
    }

    /// Persists the aggregate if nobody else saved it since `expected_version`.
    ///
    /// ## Returns
    /// * `Ok(version)` - the new version
    /// * `Err(DbError::VersionConflict)` - stale version, or closed meanwhile
    /// * `Err(DbError::NotFound)` - no such comanda
    pub async fn save(&self, comanda: &Comanda, expected_version: i64) -> DbResult<i64> {
        debug!(
            comanda_id = %comanda.id,
            expected_version,
            items = comanda.items.len(),
            total = comanda.total.cents(),
            "Saving comanda"
        );

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE comandas SET
                status = ?3,
                total_cents = ?4,
                items_count = ?5,
                payment_method = ?6,
                cash_paid_cents = ?7,
                change_cents = ?8,
                closed_at_ms = ?9,
                version = version + 1
            WHERE id = ?1 AND version = ?2 AND status = 'open'
            "#,
        )
        .bind(&comanda.id)
        .bind(expected_version)
        .bind(comanda.status)
        .bind(comanda.total.cents())
        .bind(comanda.items_count)
        .bind(comanda.payment_method)
        .bind(comanda.cash_paid.map(|m| m.cents()))
        .bind(comanda.change.map(|m| m.cents()))
        .bind(comanda.closed_at.map(to_millis))
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let exists: Option<i64> = sqlx::query_scalar("SELECT version FROM comandas WHERE id = ?1")
                .bind(&comanda.id)
                .fetch_optional(&mut *tx)
                .await?;
            tx.rollback().await?;

            return Err(match exists {
                Some(_) => DbError::VersionConflict {
                    id: comanda.id.clone(),
                    expected: expected_version,
                },
                None => DbError::not_found("Comanda", &comanda.id),
            });
        }

        sqlx::query("DELETE FROM comanda_items WHERE comanda_id = ?1")
            .bind(&comanda.id)
            .execute(&mut *tx)
            .await?;
        insert_items(&mut tx, comanda).await?;

        tx.commit().await?;
        Ok(expected_version + 1)
    }

    /// Finds a comanda with `number` created inside `window`, any status.
    pub async fn find_by_number_between(
        &self,
        number: i64,
        window: &DayWindow,
    ) -> DbResult<Option<Comanda>> {
        let mut tx = self.pool.begin().await?;
        let row: Option<ComandaRow> = sqlx::query_as(&format!(
            "{SELECT_COMANDA} WHERE number = ?1 AND created_at_ms BETWEEN ?2 AND ?3 LIMIT 1"
        ))
        .bind(number)
        .bind(to_millis(window.start))
        .bind(to_millis(window.end))
        .fetch_optional(&mut *tx)
        .await?;
        let comanda = with_items(&mut tx, row).await?;
        tx.commit().await?;

        Ok(comanda)
    }

    /// Lists comandas created inside `window`: open first, then newest first.
    pub async fn list_created_between(&self, window: &DayWindow) -> DbResult<Vec<Comanda>> {
        let start = to_millis(window.start);
        let end = to_millis(window.end);

        let mut tx = self.pool.begin().await?;
        let rows: Vec<ComandaRow> = sqlx::query_as(&format!(
            r#"{SELECT_COMANDA}
            WHERE created_at_ms BETWEEN ?1 AND ?2
            ORDER BY CASE status WHEN 'open' THEN 0 ELSE 1 END, created_at_ms DESC"#
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&mut *tx)
        .await?;

        let item_rows: Vec<ItemRow> = sqlx::query_as(&format!(
            r#"{SELECT_ITEM}
            INNER JOIN comandas c ON c.id = i.comanda_id
            WHERE c.created_at_ms BETWEEN ?1 AND ?2
            ORDER BY i.comanda_id, i.position"#
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        let mut items_by_comanda: HashMap<String, Vec<ComandaItem>> = HashMap::new();
        for row in item_rows {
            let item = ComandaItem::try_from(row)?;
            items_by_comanda
                .entry(item.comanda_id.clone())
                .or_default()
                .push(item);
        }

        debug!(count = rows.len(), "Listed comandas in window");

        rows.into_iter()
            .map(|row| {
                let items = items_by_comanda.remove(&row.id).unwrap_or_default();
                row.into_comanda(items)
            })
            .collect()
    }
}

/// Attaches the items of `row`, read on the caller's connection.
async fn with_items(
    conn: &mut SqliteConnection,
    row: Option<ComandaRow>,
) -> DbResult<Option<Comanda>> {
    let Some(row) = row else {
        return Ok(None);
    };

    let item_rows: Vec<ItemRow> = sqlx::query_as(&format!(
        "{SELECT_ITEM} WHERE i.comanda_id = ?1 ORDER BY i.position"
    ))
    .bind(&row.id)
    .fetch_all(&mut *conn)
    .await?;
    let items = item_rows
        .into_iter()
        .map(ComandaItem::try_from)
        .collect::<DbResult<Vec<_>>>()?;

    Ok(Some(row.into_comanda(items)?))
}

async fn insert_items(tx: &mut Transaction<'_, Sqlite>, comanda: &Comanda) -> DbResult<()> {
    for (position, item) in comanda.items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO comanda_items (
                id, comanda_id, product_id, name,
                quantity, price_cents, weight_grams, observation,
                position, created_at_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&item.id)
        .bind(&comanda.id)
        .bind(&item.product_id)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.price.cents())
        .bind(item.weight_grams)
        .bind(&item.observation)
        .bind(position as i64)
        .bind(to_millis(item.created_at))
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::{DateTime, Duration, Offset, TimeZone, Utc};
    use comanda_core::clock::day_window;
    use comanda_core::{NewItem, PricingMode, Product};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, h, m, 0).unwrap()
    }

    fn soda() -> Product {
        Product {
            id: "soda".to_string(),
            name: "Refrigerante".to_string(),
            category: "Bebidas".to_string(),
            pricing: PricingMode::Unit {
                price: Money::from_cents(950),
            },
            active: true,
            created_at: at(8, 0),
            updated_at: at(8, 0),
        }
    }

    async fn repo() -> ComandaRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.comandas()
    }

    fn open(number: i64, created: DateTime<Utc>) -> Comanda {
        Comanda::open(number, created, created.date_naive()).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let repo = repo().await;
        let mut c = open(5, at(12, 0));
        c.add_item(&soda(), &NewItem::units(2).with_observation("gelado"), at(12, 1))
            .unwrap();
        repo.insert(&c).await.unwrap();

        let loaded = repo.get_by_id(&c.id).await.unwrap().unwrap();
        assert_eq!(loaded, c);
        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_reads_never_mix_two_saves() {
        let path = std::env::temp_dir().join(format!("comanda-{}.db", uuid::Uuid::new_v4()));
        let writer = Database::new(DbConfig::new(&path)).await.unwrap().comandas();
        let reader = Database::new(DbConfig::new(&path)).await.unwrap().comandas();

        let c = open(1, at(12, 0));
        writer.insert(&c).await.unwrap();
        let id = c.id.clone();

        let writes = tokio::spawn(async move {
            for minute in 0..40 {
                let mut current = writer.get_by_id(&id).await.unwrap().unwrap();
                current
                    .add_item(&soda(), &NewItem::default(), at(12, minute))
                    .unwrap();
                writer.save(&current, current.version).await.unwrap();
            }
        });

        while !writes.is_finished() {
            let seen = reader.get_by_id(&c.id).await.unwrap().unwrap();
            let quantity: i64 = seen.items.iter().map(|i| i.quantity).sum();
            assert_eq!(seen.items_count, quantity);
            assert_eq!(seen.total, Money::from_cents(950 * quantity));
        }
        writes.await.unwrap();

        let last = reader.get_by_id(&c.id).await.unwrap().unwrap();
        assert_eq!(last.items_count, 40);
        assert_eq!(last.version, 40);

        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }

    #[tokio::test]
    async fn test_same_number_same_day_violates_unique() {
        let repo = repo().await;
        repo.insert(&open(7, at(10, 0))).await.unwrap();

        let err = repo.insert(&open(7, at(11, 0))).await.unwrap_err();
        assert!(err.is_unique_violation());

        // Another day is fine
        repo.insert(&open(7, at(10, 0) + Duration::days(1)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_save_bumps_version_and_replaces_items() {
        let repo = repo().await;
        let mut c = open(1, at(12, 0));
        repo.insert(&c).await.unwrap();

        c.add_item(&soda(), &NewItem::units(3), at(12, 5)).unwrap();
        let version = repo.save(&c, c.version).await.unwrap();
        assert_eq!(version, 1);

        let loaded = repo.get_by_id(&c.id).await.unwrap().unwrap();
        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.items_count, 3);
        assert_eq!(loaded.total, Money::from_cents(2850));
        assert_eq!(loaded.items.len(), 1);

        let mut next = loaded.clone();
        let item_id = next.items[0].id.clone();
        next.adjust_quantity(&item_id, -3).unwrap();
        repo.save(&next, loaded.version).await.unwrap();

        let loaded = repo.get_by_id(&c.id).await.unwrap().unwrap();
        assert!(loaded.items.is_empty());
        assert_eq!(loaded.total, Money::zero());
    }

    #[tokio::test]
    async fn test_stale_save_conflicts() {
        let repo = repo().await;
        let mut c = open(1, at(12, 0));
        repo.insert(&c).await.unwrap();

        c.add_item(&soda(), &NewItem::default(), at(12, 1)).unwrap();
        repo.save(&c, 0).await.unwrap();

        let err = repo.save(&c, 0).await.unwrap_err();
        assert!(matches!(err, DbError::VersionConflict { expected: 0, .. }));

        let unknown = open(2, at(12, 0));
        assert!(matches!(
            repo.save(&unknown, 0).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_closed_comanda_is_immutable() {
        let repo = repo().await;
        let mut c = open(1, at(12, 0));
        c.add_item(&soda(), &NewItem::default(), at(12, 1)).unwrap();
        repo.insert(&c).await.unwrap();

        c.close(PaymentMethod::Cash, Some(Money::from_cents(1000)), at(13, 0))
            .unwrap();
        let version = repo.save(&c, 0).await.unwrap();

        let loaded = repo.get_by_id(&c.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, ComandaStatus::Closed);
        assert_eq!(loaded.payment_method, Some(PaymentMethod::Cash));
        assert_eq!(loaded.change, Some(Money::from_cents(50)));
        assert_eq!(loaded.closed_at, Some(at(13, 0)));

        // Even with the right version, a closed row does not accept writes
        assert!(matches!(
            repo.save(&loaded, version).await,
            Err(DbError::VersionConflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_window_queries() {
        let repo = repo().await;
        let window = day_window(at(0, 0).date_naive(), Utc.fix());

        let mut closed = open(1, at(9, 0));
        closed.add_item(&soda(), &NewItem::default(), at(9, 1)).unwrap();
        closed.close(PaymentMethod::Pix, None, at(9, 30)).unwrap();
        repo.insert(&closed).await.unwrap();

        let older_open = open(2, at(10, 0));
        let newer_open = open(3, at(11, 0));
        repo.insert(&older_open).await.unwrap();
        repo.insert(&newer_open).await.unwrap();
        repo.insert(&open(4, at(10, 0) - Duration::days(1)))
            .await
            .unwrap();

        let listed: Vec<i64> = repo
            .list_created_between(&window)
            .await
            .unwrap()
            .iter()
            .map(|c| c.number)
            .collect();
        assert_eq!(listed, vec![3, 2, 1]);

        let found = repo.find_by_number_between(1, &window).await.unwrap().unwrap();
        assert_eq!(found.items.len(), 1);
        assert!(repo
            .find_by_number_between(4, &window)
            .await
            .unwrap()
            .is_none());
    }
}
