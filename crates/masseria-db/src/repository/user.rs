//! # User Repository
//!
//! Accounts are owned by the authentication subsystem. This repository only
//! covers what orders and reservations need: existence, active flag, and
//! the contact details used to fill order snapshots.

use sqlx::SqlitePool;
use tracing::debug;

use masseria_core::validation::{validate_required_max, validate_uuid};
use masseria_core::{CoreError, User};

use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, email, phone, address, role, is_active, created_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by ID, failing with `UserNotFound` if absent.
    pub async fn find(&self, id: &str) -> DbResult<User> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(id.to_string()).into())
    }

    /// Inserts a user record.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - email already registered
    pub async fn insert(&self, user: &User) -> DbResult<()> {
        validate_uuid(&user.id)?;
        validate_required_max("full name", &user.full_name, 100)?;
        validate_required_max("email", &user.email, 100)?;

        debug!(id = %user.id, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (id, full_name, email, phone, address, role, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&user.id)
        .bind(user.full_name.trim())
        .bind(user.email.trim())
        .bind(&user.phone)
        .bind(&user.address)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::UserNotFound(id.to_string()).into());
        }
        Ok(())
    }
}
