use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};

use crate::domain::{InventoryItem, ItemId};
use crate::ingest::{FailedRow, truncate_error};

fn map_row(row: &PgRow) -> InventoryItem {
    InventoryItem {
        id: ItemId::from_uuid(row.get("id")),
        title: row.get("title"),
        description: row.get("description"),
        remaining_count: row.get("remaining_count"),
        expiration_date: row.get("expiration_date"),
    }
}

fn row_fields(item: &InventoryItem) -> std::collections::BTreeMap<String, String> {
    [
        ("title".to_string(), item.title.clone()),
        ("description".to_string(), item.description.clone()),
        ("remaining_count".to_string(), item.remaining_count.to_string()),
        ("expiration_date".to_string(), item.expiration_date.to_rfc3339()),
    ]
    .into()
}

/// PostgreSQL repository for inventory items
///
/// Natural-key and point lookups lock the returned row so that concurrent
/// booking transactions against the same item serialize.
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Look up an item by title, acquiring a row-level write lock.
    pub async fn find_by_title(
        &self,
        conn: &mut PgConnection,
        title: &str,
    ) -> Result<Option<InventoryItem>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, remaining_count, expiration_date
            FROM inventory
            WHERE title = $1
            FOR UPDATE
            "#,
        )
        .bind(title)
        .fetch_optional(conn)
        .await?;

        Ok(row.as_ref().map(map_row))
    }

    /// Look up an item by id, acquiring a row-level write lock.
    ///
    /// Used during cancellation, where the item is resolved from the booking
    /// record and may legitimately no longer exist.
    pub async fn find_by_id(
        &self,
        conn: &mut PgConnection,
        id: ItemId,
    ) -> Result<Option<InventoryItem>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, remaining_count, expiration_date
            FROM inventory
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.value())
        .fetch_optional(conn)
        .await?;

        Ok(row.as_ref().map(map_row))
    }

    /// Adjust remaining_count by a signed delta within the caller's transaction.
    pub async fn adjust_remaining_count(
        &self,
        conn: &mut PgConnection,
        id: ItemId,
        delta: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE inventory SET remaining_count = remaining_count + $2 WHERE id = $1")
            .bind(id.value())
            .bind(delta)
            .execute(conn)
            .await?;

        Ok(())
    }

    pub async fn list_all(&self) -> Result<Vec<InventoryItem>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, description, remaining_count, expiration_date
            FROM inventory
            ORDER BY title
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_row).collect())
    }

    /// All-or-nothing batch insert (UNNEST batch INSERT in one transaction).
    pub async fn insert_bulk(&self, items: &[InventoryItem]) -> Result<(), sqlx::Error> {
        if items.is_empty() {
            return Ok(());
        }

        let ids: Vec<_> = items.iter().map(|i| i.id.value()).collect();
        let titles: Vec<_> = items.iter().map(|i| i.title.clone()).collect();
        let descriptions: Vec<_> = items.iter().map(|i| i.description.clone()).collect();
        let counts: Vec<_> = items.iter().map(|i| i.remaining_count).collect();
        let expirations: Vec<_> = items.iter().map(|i| i.expiration_date).collect();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO inventory (id, title, description, remaining_count, expiration_date)
            SELECT * FROM UNNEST($1::uuid[], $2::varchar[], $3::varchar[], $4::int[], $5::timestamptz[])
            "#,
        )
        .bind(&ids)
        .bind(&titles)
        .bind(&descriptions)
        .bind(&counts)
        .bind(&expirations)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Best-effort per-row insert; failures are reported, not propagated.
    pub async fn insert_each(&self, items: &[InventoryItem]) -> Vec<FailedRow> {
        let mut failures = Vec::new();

        for item in items {
            let result = sqlx::query(
                r#"
                INSERT INTO inventory (id, title, description, remaining_count, expiration_date)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(item.id.value())
            .bind(&item.title)
            .bind(&item.description)
            .bind(item.remaining_count)
            .bind(item.expiration_date)
            .execute(&self.pool)
            .await;

            if let Err(err) = result {
                tracing::error!("failed to insert inventory row {:?}: {}", item.title, err);
                failures.push(FailedRow::new(
                    row_fields(item),
                    format!("failed to insert row: {}", truncate_error(&err.to_string())),
                ));
            }
        }

        failures
    }
}
