use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::auth::responses::Role;
use crate::auth::{AuthError, AuthResult};
use crate::users::store::{NewUser, UserRecord, UserStore, UserUpdate};

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, refresh_token_hash, created_at, updated_at";

/// [`UserStore`] backed by the `users` table.
///
/// Refresh-token rotation relies on a conditional `UPDATE ... WHERE
/// refresh_token_hash = $expected`, which Postgres applies atomically per row.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: &PgRow) -> AuthResult<UserRecord> {
    let role_str: String = row.try_get("role")?;
    let role = role_str
        .parse::<Role>()
        .map_err(AuthError::StoreUnavailable)?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    Ok(UserRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role,
        refresh_token_hash: row.try_get("refresh_token_hash")?,
        created_at,
        updated_at,
    })
}

#[rocket::async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: i32) -> AuthResult<Option<UserRecord>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(record_from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<UserRecord>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(record_from_row).transpose()
    }

    async fn list(&self) -> AuthResult<Vec<UserRecord>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(record_from_row).collect()
    }

    async fn create(&self, user: NewUser) -> AuthResult<UserRecord> {
        let sql = format!(
            "INSERT INTO users (name, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .fetch_one(&self.pool)
            .await?;
        record_from_row(&row)
    }

    async fn update(&self, id: i32, update: UserUpdate) -> AuthResult<UserRecord> {
        let sql = format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                role = COALESCE($5, role),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(update.name)
            .bind(update.email)
            .bind(update.password_hash)
            .bind(update.role.map(|role| role.as_str()))
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => record_from_row(&row),
            None => Err(AuthError::NotFound),
        }
    }

    async fn delete(&self, id: i32) -> AuthResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound);
        }
        Ok(())
    }

    async fn set_refresh_token_hash(&self, id: i32, hash: Option<String>) -> AuthResult<()> {
        let result = sqlx::query("UPDATE users SET refresh_token_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(hash)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound);
        }
        Ok(())
    }

    async fn swap_refresh_token_hash(
        &self,
        id: i32,
        expected: &str,
        replacement: Option<String>,
    ) -> AuthResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token_hash = $3 WHERE id = $1 AND refresh_token_hash = $2",
        )
        .bind(id)
        .bind(expected)
        .bind(replacement)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
