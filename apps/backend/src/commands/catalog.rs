//! # Catalog Commands
//!
//! Menu browsing for customers and catalog upkeep for staff.
//!
//! Prices travel as cents plus a display string; the client never does
//! money arithmetic on floats.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use masseria_core::{Category, Money, Product};
use masseria_db::repository::product::generate_product_id;

use crate::error::ApiResult;
use crate::state::AppState;

/// Default page size for menu listings.
const MENU_LIMIT: u32 = 200;

/// Product DTO for the client.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductDto {
    pub id: String,
    pub category_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    /// e.g. "S/ 18.50"
    pub price_display: String,
    pub stock: i64,
    pub in_stock: bool,
    pub is_featured: bool,
    pub is_active: bool,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        ProductDto {
            price_display: p.price().to_string(),
            in_stock: p.has_stock(),
            id: p.id,
            category_id: p.category_id,
            name: p.name,
            description: p.description,
            price_cents: p.price_cents,
            stock: p.stock,
            is_featured: p.is_featured,
            is_active: p.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CategoryDto {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

impl From<Category> for CategoryDto {
    fn from(c: Category) -> Self {
        CategoryDto {
            id: c.id,
            name: c.name,
            description: c.description,
        }
    }
}

/// New menu item. `price` is a decimal string such as `"18.50"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateProductRequest {
    pub category_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub stock: i64,
    #[serde(default)]
    pub is_featured: bool,
}

fn to_dtos(products: Vec<Product>) -> Vec<ProductDto> {
    products.into_iter().map(ProductDto::from).collect()
}

// =============================================================================
// Menu
// =============================================================================

/// Active products, optionally narrowed to one category.
pub async fn list_menu(state: &AppState, category_id: Option<&str>) -> ApiResult<Vec<ProductDto>> {
    let repo = state.db.products();
    let products = match category_id {
        Some(id) => {
            state.db.categories().find(id).await?;
            repo.list_by_category(id).await?
        }
        None => repo.list_active(MENU_LIMIT).await?,
    };
    Ok(to_dtos(products))
}

pub async fn featured_products(state: &AppState, limit: Option<u32>) -> ApiResult<Vec<ProductDto>> {
    let products = state.db.products().list_featured(limit.unwrap_or(8)).await?;
    Ok(to_dtos(products))
}

/// Case-insensitive name search over active products.
pub async fn search_menu(
    state: &AppState,
    query: &str,
    limit: Option<u32>,
) -> ApiResult<Vec<ProductDto>> {
    debug!(query = %query, "search_menu command");
    let products = state
        .db
        .products()
        .search(query, limit.unwrap_or(MENU_LIMIT))
        .await?;
    Ok(to_dtos(products))
}

/// Active products priced within `[min, max]`, both decimal strings.
pub async fn menu_by_price(state: &AppState, min: &str, max: &str) -> ApiResult<Vec<ProductDto>> {
    let (min, max) = (Money::parse(min)?, Money::parse(max)?);
    let products = state.db.products().list_by_price_range(min, max).await?;
    Ok(to_dtos(products))
}

pub async fn get_product(state: &AppState, id: &str) -> ApiResult<ProductDto> {
    Ok(ProductDto::from(state.db.products().find(id).await?))
}

// =============================================================================
// Catalog upkeep
// =============================================================================

pub async fn create_product(state: &AppState, request: CreateProductRequest) -> ApiResult<ProductDto> {
    let price = Money::parse(&request.price)?;
    let now = Utc::now();
    let product = Product {
        id: generate_product_id(),
        category_id: request.category_id,
        name: request.name,
        description: request.description,
        price_cents: price.cents(),
        stock: request.stock,
        is_featured: request.is_featured,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    let product = state.db.products().insert(&product).await?;
    info!(product_id = %product.id, name = %product.name, price = %price, "Product created");
    Ok(ProductDto::from(product))
}

/// Sets a new price. Existing orders keep the price they were placed at.
pub async fn change_price(state: &AppState, id: &str, price: &str) -> ApiResult<ProductDto> {
    let price = Money::parse(price)?;
    let repo = state.db.products();
    let mut product = repo.find(id).await?;
    product.price_cents = price.cents();
    product.updated_at = Utc::now();
    repo.update(&product).await?;
    Ok(ProductDto::from(product))
}

pub async fn set_product_active(state: &AppState, id: &str, active: bool) -> ApiResult<ProductDto> {
    let repo = state.db.products();
    repo.set_active(id, active).await?;
    Ok(ProductDto::from(repo.find(id).await?))
}

pub async fn set_product_featured(
    state: &AppState,
    id: &str,
    featured: bool,
) -> ApiResult<ProductDto> {
    let repo = state.db.products();
    repo.set_featured(id, featured).await?;
    Ok(ProductDto::from(repo.find(id).await?))
}

/// Adds (or with a negative delta, removes) units of stock.
pub async fn adjust_stock(state: &AppState, id: &str, delta: i64) -> ApiResult<ProductDto> {
    debug!(product_id = %id, delta, "adjust_stock command");
    Ok(ProductDto::from(
        state.db.products().adjust_stock(id, delta).await?,
    ))
}

// =============================================================================
// Categories
// =============================================================================

pub async fn list_categories(state: &AppState) -> ApiResult<Vec<CategoryDto>> {
    let categories = state.db.categories().list().await?;
    Ok(categories.into_iter().map(CategoryDto::from).collect())
}

pub async fn create_category(
    state: &AppState,
    name: &str,
    description: Option<&str>,
) -> ApiResult<CategoryDto> {
    let category = state.db.categories().insert(name, description).await?;
    info!(category_id = %category.id, name = %category.name, "Category created");
    Ok(CategoryDto::from(category))
}

pub async fn rename_category(state: &AppState, id: &str, name: &str) -> ApiResult<CategoryDto> {
    Ok(CategoryDto::from(
        state.db.categories().rename(id, name).await?,
    ))
}

/// Deletes an unused category. Fails with `CONFLICT` while products use it.
pub async fn delete_category(state: &AppState, id: &str) -> ApiResult<()> {
    state.db.categories().delete(id).await?;
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::seed_product;
    use crate::error::ErrorCode;

    fn request(name: &str, price: &str, category_id: Option<String>) -> CreateProductRequest {
        CreateProductRequest {
            category_id,
            name: name.to_string(),
            description: None,
            price: price.to_string(),
            stock: 5,
            is_featured: false,
        }
    }

    #[tokio::test]
    async fn test_create_and_browse() {
        let state = AppState::in_memory().await.unwrap();
        let fondos = create_category(&state, "Fondos", Some("Platos de fondo"))
            .await
            .unwrap();

        let lomo = create_product(&state, request("Lomo Saltado", "32.90", Some(fondos.id.clone())))
            .await
            .unwrap();
        assert_eq!(lomo.price_cents, 3290);
        assert_eq!(lomo.price_display, "S/ 32.90");
        assert!(lomo.in_stock);

        seed_product(&state, "Chicha Morada", 600).await;

        assert_eq!(list_menu(&state, None).await.unwrap().len(), 2);
        let fondos_menu = list_menu(&state, Some(&fondos.id)).await.unwrap();
        assert_eq!(fondos_menu.len(), 1);
        assert_eq!(fondos_menu[0].name, "Lomo Saltado");
        assert_eq!(
            list_menu(&state, Some("missing")).await.unwrap_err().code,
            ErrorCode::NotFound
        );

        let found = search_menu(&state, "LOMO", None).await.unwrap();
        assert_eq!(found.len(), 1);

        let cheap = menu_by_price(&state, "0", "10.00").await.unwrap();
        assert_eq!(cheap.len(), 1);
        assert_eq!(cheap[0].name, "Chicha Morada");
        assert_eq!(
            menu_by_price(&state, "20", "10").await.unwrap_err().code,
            ErrorCode::ValidationError
        );

        assert_eq!(
            create_product(&state, request("Caro", "1.234", None))
                .await
                .unwrap_err()
                .code,
            ErrorCode::ValidationError
        );
    }

    #[tokio::test]
    async fn test_flags_price_and_stock() {
        let state = AppState::in_memory().await.unwrap();
        let id = seed_product(&state, "Ceviche", 2800).await;

        assert!(featured_products(&state, None).await.unwrap().is_empty());
        set_product_featured(&state, &id, true).await.unwrap();
        assert_eq!(featured_products(&state, None).await.unwrap().len(), 1);

        let hidden = set_product_active(&state, &id, false).await.unwrap();
        assert!(!hidden.is_active);
        assert!(list_menu(&state, None).await.unwrap().is_empty());
        set_product_active(&state, &id, true).await.unwrap();

        let repriced = change_price(&state, &id, "30").await.unwrap();
        assert_eq!(repriced.price_display, "S/ 30.00");

        assert_eq!(adjust_stock(&state, &id, -4).await.unwrap().stock, 6);
        assert_eq!(
            adjust_stock(&state, &id, -7).await.unwrap_err().code,
            ErrorCode::Conflict
        );
        assert_eq!(get_product(&state, &id).await.unwrap().stock, 6);
    }

    #[tokio::test]
    async fn test_category_rules() {
        let state = AppState::in_memory().await.unwrap();
        let entradas = create_category(&state, "Entradas", None).await.unwrap();

        assert_eq!(
            create_category(&state, "ENTRADAS", None).await.unwrap_err().code,
            ErrorCode::Conflict
        );
        assert_eq!(
            create_category(&state, "   ", None).await.unwrap_err().code,
            ErrorCode::ValidationError
        );

        create_product(&state, request("Papa a la Huancaína", "14", Some(entradas.id.clone())))
            .await
            .unwrap();
        assert_eq!(
            delete_category(&state, &entradas.id).await.unwrap_err().code,
            ErrorCode::Conflict
        );

        let postres = create_category(&state, "Postres", None).await.unwrap();
        let renamed = rename_category(&state, &postres.id, "Dulces").await.unwrap();
        assert_eq!(renamed.name, "Dulces");
        delete_category(&state, &postres.id).await.unwrap();

        let names: Vec<String> = list_categories(&state)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Entradas".to_string()]);
    }
}
