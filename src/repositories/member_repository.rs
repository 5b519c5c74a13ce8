use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};

use crate::domain::{Member, MemberId};
use crate::ingest::{FailedRow, truncate_error};

fn map_row(row: &PgRow) -> Member {
    Member {
        id: MemberId::from_uuid(row.get("id")),
        name: row.get("name"),
        surname: row.get("surname"),
        booking_count: row.get("booking_count"),
        date_joined: row.get("date_joined"),
    }
}

fn row_fields(member: &Member) -> std::collections::BTreeMap<String, String> {
    [
        ("name".to_string(), member.name.clone()),
        ("surname".to_string(), member.surname.clone()),
        ("booking_count".to_string(), member.booking_count.to_string()),
        ("date_joined".to_string(), member.date_joined.to_rfc3339()),
    ]
    .into()
}

/// PostgreSQL repository for members
///
/// Constructed once at startup and shared; natural-key lookups lock the
/// returned row so that concurrent booking transactions against the same
/// member serialize.
pub struct MemberRepository {
    pool: PgPool,
}

impl MemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Look up a member by name + surname, acquiring a row-level write lock.
    ///
    /// Runs on the caller's connection so the lock is held for the duration
    /// of the enclosing transaction.
    pub async fn find_by_name(
        &self,
        conn: &mut PgConnection,
        name: &str,
        surname: &str,
    ) -> Result<Option<Member>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, name, surname, booking_count, date_joined
            FROM members
            WHERE name = $1 AND surname = $2
            FOR UPDATE
            "#,
        )
        .bind(name)
        .bind(surname)
        .fetch_optional(conn)
        .await?;

        Ok(row.as_ref().map(map_row))
    }

    /// Adjust booking_count by a signed delta within the caller's transaction.
    ///
    /// The CHECK constraint on the column rejects any adjustment that would
    /// drive the count negative.
    pub async fn adjust_booking_count(
        &self,
        conn: &mut PgConnection,
        id: MemberId,
        delta: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE members SET booking_count = booking_count + $2 WHERE id = $1")
            .bind(id.value())
            .bind(delta)
            .execute(conn)
            .await?;

        Ok(())
    }

    pub async fn list_all(&self) -> Result<Vec<Member>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, surname, booking_count, date_joined
            FROM members
            ORDER BY surname, name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_row).collect())
    }

    /// All-or-nothing batch insert.
    ///
    /// Uses a batch INSERT with UNNEST inside one transaction; any failure
    /// rolls back the entire batch.
    pub async fn insert_bulk(&self, members: &[Member]) -> Result<(), sqlx::Error> {
        if members.is_empty() {
            return Ok(());
        }

        let ids: Vec<_> = members.iter().map(|m| m.id.value()).collect();
        let names: Vec<_> = members.iter().map(|m| m.name.clone()).collect();
        let surnames: Vec<_> = members.iter().map(|m| m.surname.clone()).collect();
        let counts: Vec<_> = members.iter().map(|m| m.booking_count).collect();
        let joined: Vec<_> = members.iter().map(|m| m.date_joined).collect();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO members (id, name, surname, booking_count, date_joined)
            SELECT * FROM UNNEST($1::uuid[], $2::varchar[], $3::varchar[], $4::int[], $5::timestamptz[])
            "#,
        )
        .bind(&ids)
        .bind(&names)
        .bind(&surnames)
        .bind(&counts)
        .bind(&joined)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Best-effort per-row insert.
    ///
    /// Each row is attempted independently; a failure (typically a natural-key
    /// collision with an existing member) is reported and does not prevent
    /// insertion of the remaining rows.
    pub async fn insert_each(&self, members: &[Member]) -> Vec<FailedRow> {
        let mut failures = Vec::new();

        for member in members {
            let result = sqlx::query(
                r#"
                INSERT INTO members (id, name, surname, booking_count, date_joined)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(member.id.value())
            .bind(&member.name)
            .bind(&member.surname)
            .bind(member.booking_count)
            .bind(member.date_joined)
            .execute(&self.pool)
            .await;

            if let Err(err) = result {
                tracing::error!("failed to insert member row {:?}: {}", member.name, err);
                failures.push(FailedRow::new(
                    row_fields(member),
                    format!("failed to insert row: {}", truncate_error(&err.to_string())),
                ));
            }
        }

        failures
    }
}
