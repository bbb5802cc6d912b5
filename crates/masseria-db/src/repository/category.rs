//! # Category Repository
//!
//! Menu categories. Names are unique ignoring case, and a category cannot
//! be deleted while any product still points at it.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use masseria_core::validation::{normalize_optional, validate_category_name};
use masseria_core::{Category, CoreError, ValidationError};

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, created_at FROM categories WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Gets a category by ID, failing with `NotFound` if absent.
    pub async fn find(&self, id: &str) -> DbResult<Category> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    /// Looks a category up by name, ignoring case.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, created_at FROM categories WHERE name = ?1 COLLATE NOCASE",
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, created_at FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Creates a category.
    ///
    /// ## Returns
    /// * `Err(Duplicate)` - a category with that name (any case) exists
    pub async fn insert(&self, name: &str, description: Option<&str>) -> DbResult<Category> {
        let name = validate_category_name(name)?;
        let description = normalize_optional("description", description, 255)?;
        self.ensure_unique(&name, None).await?;

        let category = Category {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            created_at: Utc::now(),
        };

        debug!(id = %category.id, name = %category.name, "Inserting category");

        sqlx::query(
            "INSERT INTO categories (id, name, description, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.created_at)
        .execute(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn rename(&self, id: &str, name: &str) -> DbResult<Category> {
        let name = validate_category_name(name)?;
        self.ensure_unique(&name, Some(id)).await?;

        let result = sqlx::query("UPDATE categories SET name = ?2 WHERE id = ?1")
            .bind(id)
            .bind(&name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }
        self.find(id).await
    }

    /// Deletes a category that no product references.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let products: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = ?1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        if products > 0 {
            return Err(CoreError::InUse {
                entity: "Category".to_string(),
                id: id.to_string(),
                count: products,
            }
            .into());
        }

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        info!(id = %id, "Category deleted");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn ensure_unique(&self, name: &str, except_id: Option<&str>) -> DbResult<()> {
        if let Some(existing) = self.get_by_name(name).await? {
            if except_id != Some(existing.id.as_str()) {
                return Err(ValidationError::Duplicate {
                    field: "category name".to_string(),
                    value: name.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}
