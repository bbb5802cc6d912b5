//! # Backend Commands
//!
//! The operations HTTP controllers call into. Each command takes the shared
//! [`AppState`](crate::state::AppState), decodes its request DTO, calls the
//! database layer and returns a camelCase DTO or an [`ApiError`](crate::error::ApiError).
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs          ◄─── You are here (exports)
//! ├── catalog.rs      ◄─── Menu browsing, products, categories
//! ├── order.rs        ◄─── Placement, line items, status, customer cancel
//! ├── reservation.rs  ◄─── Availability, booking, confirmation
//! ├── dashboard.rs    ◄─── Staff dashboard counters
//! └── history.rs      ◄─── Customer order / reservation history
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /pedidos { items: [...], deliveryType: "PICKUP", ... }           │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  controller resolves the signed-in user                                 │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  commands::order::place_order(&state, user_id, request)                 │
//! │         │                                                               │
//! │         ├──► Ok(OrderDetailDto)  ──► 201 + JSON                         │
//! │         └──► Err(ApiError)       ──► code.http_status() + JSON          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod dashboard;
pub mod history;
pub mod order;
pub mod reservation;

#[cfg(test)]
pub(crate) mod testing {
    use chrono::Utc;
    use uuid::Uuid;

    use masseria_core::{Product, Role, User};

    use crate::state::AppState;

    /// Inserts an active customer with phone and address, returning its id.
    pub async fn seed_customer(state: &AppState) -> String {
        let id = Uuid::new_v4().to_string();
        let user = User {
            id: id.clone(),
            full_name: "Lucía Quispe".to_string(),
            email: format!("{}@example.com", id),
            phone: Some("987654321".to_string()),
            address: Some("Jr. Junín 455, Lima".to_string()),
            role: Role::Cliente,
            is_active: true,
            created_at: Utc::now(),
        };
        state.db.users().insert(&user).await.expect("seed customer");
        id
    }

    /// Inserts an active, uncategorised product with 10 in stock.
    pub async fn seed_product(state: &AppState, name: &str, price_cents: i64) -> String {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            category_id: None,
            name: name.to_string(),
            description: None,
            price_cents,
            stock: 10,
            is_featured: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state
            .db
            .products()
            .insert(&product)
            .await
            .expect("seed product")
            .id
    }
}
