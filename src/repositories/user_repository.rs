use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::{User, UserId};

fn map_row(row: &PgRow) -> User {
    User {
        id: UserId::from_uuid(row.get("id")),
        username: row.get("username"),
        fullname: row.get("fullname"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
    }
}

/// PostgreSQL repository for authentication users
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, username, fullname, email, password_hash
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_row))
    }

    pub async fn insert(&self, user: &User) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, fullname, email, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id.value())
        .bind(&user.username)
        .bind(&user.fullname)
        .bind(&user.email)
        .bind(&user.password_hash)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
