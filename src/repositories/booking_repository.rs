use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};

use crate::domain::{Booking, BookingId, BookingReference, ItemId, MemberId};

fn map_row(row: &PgRow) -> Booking {
    Booking {
        id: BookingId::from_uuid(row.get("id")),
        reference: BookingReference::from_uuid(row.get("booking_reference")),
        member_id: MemberId::from_uuid(row.get("member_id")),
        inventory_id: ItemId::from_uuid(row.get("inventory_id")),
        booked_at: row.get("booked_at"),
    }
}

/// PostgreSQL repository for bookings
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Look up a booking by its external reference on the caller's connection.
    ///
    /// No explicit lock: cancellation already serializes on the member row,
    /// and the subsequent DELETE is guarded by rows_affected.
    pub async fn find_by_reference(
        &self,
        conn: &mut PgConnection,
        reference: BookingReference,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, booking_reference, member_id, inventory_id, booked_at
            FROM bookings
            WHERE booking_reference = $1
            "#,
        )
        .bind(reference.value())
        .fetch_optional(conn)
        .await?;

        Ok(row.as_ref().map(map_row))
    }

    /// Insert a booking row within the caller's transaction.
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        booking: &Booking,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, booking_reference, member_id, inventory_id, booked_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(booking.id.value())
        .bind(booking.reference.value())
        .bind(booking.member_id.value())
        .bind(booking.inventory_id.value())
        .bind(booking.booked_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Delete a booking row within the caller's transaction.
    ///
    /// Returns whether a row was actually removed, so the caller can detect a
    /// booking that vanished between lookup and delete.
    pub async fn delete(
        &self,
        conn: &mut PgConnection,
        id: BookingId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id.value())
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_all(&self) -> Result<Vec<Booking>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, booking_reference, member_id, inventory_id, booked_at
            FROM bookings
            ORDER BY booked_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_row).collect())
    }
}
