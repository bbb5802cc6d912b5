//! # Product Repository
//!
//! Menu items and their stock.
//!
//! Order placement only reads products: the price is snapshotted into the
//! line item and stock is left untouched. Stock moves only through
//! [`ProductRepository::adjust_stock`].

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use masseria_core::validation::{
    validate_price_cents, validate_product_name, validate_search_query, validate_stock,
};
use masseria_core::{CoreError, Money, Product, ValidationError};

use super::contains_pattern;
use crate::error::DbResult;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
/// let results = repo.search("ceviche", 20).await?;
/// let product = repo.find("uuid-here").await?;
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
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, category_id, name, description, price_cents, stock,
                   is_featured, is_active, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by ID, failing with `ProductNotFound` if absent.
    pub async fn find(&self, id: &str) -> DbResult<Product> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()).into())
    }

    /// Inserts a new product (id generated beforehand).
    ///
    /// ## Returns
    /// * `Err(DbError::Domain)` - name, price or stock invalid
    /// * `Err(DbError::ForeignKeyViolation)` - unknown category
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        validate_product(product)?;
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, category_id, name, description, price_cents, stock,
                is_featured, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.category_id)
        .bind(product.name.trim())
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.is_featured)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        let mut inserted = product.clone();
        inserted.name = product.name.trim().to_string();
        Ok(inserted)
    }

    /// Updates an existing product.
    ///
    /// Price edits never touch existing orders; their line items keep the
    /// price they were created with.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        validate_product(product)?;
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                category_id = ?2,
                name = ?3,
                description = ?4,
                price_cents = ?5,
                stock = ?6,
                is_featured = ?7,
                is_active = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.category_id)
        .bind(product.name.trim())
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.is_featured)
        .bind(product.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(product.id.clone()).into());
        }

        Ok(())
    }

    /// Lists active products by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, category_id, name, description, price_cents, stock,
                   is_featured, is_active, created_at, updated_at
            FROM products
            WHERE is_active = 1
            ORDER BY name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists every product, active or not (admin view).
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, category_id, name, description, price_cents, stock,
                   is_featured, is_active, created_at, updated_at
            FROM products
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists active, featured products for the home page.
    pub async fn list_featured(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, category_id, name, description, price_cents, stock,
                   is_featured, is_active, created_at, updated_at
            FROM products
            WHERE is_active = 1 AND is_featured = 1
            ORDER BY name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists active products in a category.
    pub async fn list_by_category(&self, category_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, category_id, name, description, price_cents, stock,
                   is_featured, is_active, created_at, updated_at
            FROM products
            WHERE category_id = ?1 AND is_active = 1
            ORDER BY name
            "#,
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Searches active products by name (case-insensitive substring).
    /// An empty query returns active products.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = validate_search_query(query)?;

        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list_active(limit).await;
        }

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, category_id, name, description, price_cents, stock,
                   is_featured, is_active, created_at, updated_at
            FROM products
            WHERE is_active = 1 AND name LIKE ?1 ESCAPE '\'
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(contains_pattern(&query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Lists active products priced within `[min, max]`, cheapest first.
    pub async fn list_by_price_range(&self, min: Money, max: Money) -> DbResult<Vec<Product>> {
        if min > max {
            return Err(ValidationError::InvalidRange {
                field: "price".to_string(),
                start: min.to_string(),
                end: max.to_string(),
            }
            .into());
        }

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, category_id, name, description, price_cents, stock,
                   is_featured, is_active, created_at, updated_at
            FROM products
            WHERE is_active = 1 AND price_cents BETWEEN ?1 AND ?2
            ORDER BY price_cents, name
            "#,
        )
        .bind(min.cents())
        .bind(max.cents())
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Shows or hides a product on the menu.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        debug!(id = %id, active, "Setting product active flag");
        self.set_flag("UPDATE products SET is_active = ?2, updated_at = ?3 WHERE id = ?1", id, active)
            .await
    }

    pub async fn set_featured(&self, id: &str, featured: bool) -> DbResult<()> {
        debug!(id = %id, featured, "Setting product featured flag");
        self.set_flag("UPDATE products SET is_featured = ?2, updated_at = ?3 WHERE id = ?1", id, featured)
            .await
    }

    async fn set_flag(&self, sql: &str, id: &str, value: bool) -> DbResult<()> {
        let result = sqlx::query(sql)
            .bind(id)
            .bind(value)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(id.to_string()).into());
        }
        Ok(())
    }

    /// Adds `delta` units to stock (negative to take them out).
    ///
    /// The update is a single conditional statement, so concurrent
    /// adjustments can never drive stock below zero.
    ///
    /// ## Returns
    /// * `Ok(Product)` - the product with its new stock
    /// * `Err(InsufficientStock)` - the adjustment would go below zero
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<Product> {
        debug!(id = %id, delta = %delta, "Adjusting stock");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + ?2, updated_at = ?3
            WHERE id = ?1 AND stock + ?2 >= 0
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let product = self.find(id).await?;
            return Err(CoreError::InsufficientStock {
                product: product.name,
                available: product.stock,
                requested: -delta,
            }
            .into());
        }

        let product = self.find(id).await?;
        info!(id = %id, stock = product.stock, "Stock adjusted");
        Ok(product)
    }

    /// Counts active products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn validate_product(product: &Product) -> Result<(), ValidationError> {
    validate_product_name(&product.name)?;
    validate_price_cents(product.price_cents)?;
    validate_stock(product.stock)?;
    Ok(())
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::testing::{sample_product, test_db};

    #[tokio::test]
    async fn test_insert_and_find() {
        let db = test_db().await;
        let repo = db.products();
        let product = repo.insert(&sample_product("Ají de Gallina", 2800)).await.unwrap();

        let found = repo.find(&product.id).await.unwrap();
        assert_eq!(found.name, "Ají de Gallina");
        assert_eq!(found.price(), Money::from_cents(2800));
        assert!(found.is_active);

        let err = repo.find("missing").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn test_insert_rejects_negative_price() {
        let db = test_db().await;
        let err = db
            .products()
            .insert(&sample_product("Gratis", -1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_active_only() {
        let db = test_db().await;
        let repo = db.products();
        repo.insert(&sample_product("Lomo Saltado", 3200)).await.unwrap();
        let hidden = repo.insert(&sample_product("Lomo a lo Pobre", 3500)).await.unwrap();
        repo.insert(&sample_product("Causa Limeña", 1800)).await.unwrap();
        repo.set_active(&hidden.id, false).await.unwrap();

        let results = repo.search("LOMO", 20).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Lomo Saltado");

        assert_eq!(repo.search("", 20).await.unwrap().len(), 2);
        assert_eq!(repo.list_all().await.unwrap().len(), 3);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_featured_and_price_range() {
        let db = test_db().await;
        let repo = db.products();
        let ceviche = repo.insert(&sample_product("Ceviche", 3000)).await.unwrap();
        repo.insert(&sample_product("Chicha Morada", 800)).await.unwrap();
        repo.set_featured(&ceviche.id, true).await.unwrap();

        let featured = repo.list_featured(10).await.unwrap();
        assert_eq!(featured.len(), 1);
        assert_eq!(featured[0].id, ceviche.id);

        let cheap = repo
            .list_by_price_range(Money::zero(), Money::from_cents(1000))
            .await
            .unwrap();
        assert_eq!(cheap.len(), 1);
        assert_eq!(cheap[0].name, "Chicha Morada");

        let err = repo
            .list_by_price_range(Money::from_cents(1000), Money::zero())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::InvalidRange { .. }))
        ));
    }

    #[tokio::test]
    async fn test_adjust_stock_never_below_zero() {
        let db = test_db().await;
        let repo = db.products();
        let product = repo.insert(&sample_product("Anticuchos", 2200)).await.unwrap();

        let updated = repo.adjust_stock(&product.id, -4).await.unwrap();
        assert_eq!(updated.stock, 6);

        let err = repo.adjust_stock(&product.id, -7).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 6, requested: 7, .. })
        ));
        assert_eq!(repo.find(&product.id).await.unwrap().stock, 6);

        assert!(repo.adjust_stock("missing", 1).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let db = test_db().await;
        let err = db
            .products()
            .update(&sample_product("Fantasma", 100))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
