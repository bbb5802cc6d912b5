//! # Order Commands
//!
//! Order placement, line-item edits and status changes.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Order Lifecycle                                      │
//! │                                                                         │
//! │  ┌───────────┐    ┌────────────┐    ┌─────────┐    ┌───────────┐       │
//! │  │ PENDIENTE │───►│ EN_PROCESO │───►│ ENVIADO │───►│ ENTREGADO │       │
//! │  └───────────┘    └────────────┘    └─────────┘    └───────────┘       │
//! │        │                │                                               │
//! │        │ cancel_own_order (customer, only in these two)                 │
//! │        ▼                ▼                                               │
//! │  ┌───────────────────────────┐                                          │
//! │  │        CANCELADO          │   staff: change_order_status, any → any │
//! │  └───────────────────────────┘                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use masseria_core::{
    CustomerSnapshot, DeliveryType, LineItem, NewOrder, Order, OrderAggregate, OrderLineRequest,
    OrderStatus, PaymentMethod,
};

use crate::error::ApiResult;
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: u32 = 50;
const MAX_LIST_LIMIT: u32 = 200;

// =============================================================================
// DTOs
// =============================================================================

/// Order placement payload.
///
/// Name, phone and email may be left blank; they are filled from the
/// customer's account. Enum fields arrive as strings so an unknown value
/// is reported back verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    pub customer_email: Option<String>,
    /// PICKUP / DELIVERY (RECOGER / DOMICILIO accepted)
    pub delivery_type: String,
    /// EFECTIVO / TARJETA / YAPE / PLIN
    pub payment_method: String,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<OrderLineRequest>,
}

impl PlaceOrderRequest {
    pub fn into_new_order(self) -> ApiResult<NewOrder> {
        let delivery_type: DeliveryType = self.delivery_type.parse()?;
        let payment_method: PaymentMethod = self.payment_method.parse()?;
        Ok(NewOrder {
            customer: CustomerSnapshot {
                name: self.customer_name,
                phone: self.customer_phone,
                email: self.customer_email,
            },
            delivery_type,
            payment_method,
            delivery_address: self.delivery_address,
            notes: self.notes,
            items: self.items,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineItemDto {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

impl From<LineItem> for LineItemDto {
    fn from(item: LineItem) -> Self {
        LineItemDto {
            id: item.id,
            product_id: item.product_id,
            name: item.name_snapshot,
            quantity: item.quantity,
            unit_price_cents: item.unit_price_cents,
            subtotal_cents: item.subtotal_cents,
        }
    }
}

/// Order header as the client sees it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderDto {
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub delivery_type: DeliveryType,
    pub payment_method: PaymentMethod,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
    pub total_cents: i64,
    /// e.g. "S/ 25.50"
    pub total_display: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Order> for OrderDto {
    fn from(o: Order) -> Self {
        let total_display = o.total().to_string();
        OrderDto {
            id: o.id,
            user_id: o.user_id,
            status: o.status,
            customer_name: o.customer_name,
            customer_phone: o.customer_phone,
            customer_email: o.customer_email,
            delivery_type: o.delivery_type,
            payment_method: o.payment_method,
            delivery_address: o.delivery_address,
            notes: o.notes,
            total_cents: o.total_cents,
            total_display,
            created_at: o.created_at.to_rfc3339(),
            updated_at: o.updated_at.to_rfc3339(),
        }
    }
}

/// Order with its lines, in the order they were added.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderDetailDto {
    pub order: OrderDto,
    pub items: Vec<LineItemDto>,
}

impl From<OrderAggregate> for OrderDetailDto {
    fn from(aggregate: OrderAggregate) -> Self {
        OrderDetailDto {
            order: OrderDto::from(aggregate.order),
            items: aggregate.items.into_iter().map(LineItemDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StatusCountDto {
    pub status: OrderStatus,
    pub count: i64,
}

// =============================================================================
// Commands
// =============================================================================

/// Places an order for the signed-in customer.
///
/// ## Arguments
/// * `user_id` - The customer placing the order
/// * `request` - Customer snapshot, delivery, payment and lines
///
/// ## Returns
/// The stored order with status PENDIENTE and its lines
pub async fn place_order(
    state: &AppState,
    user_id: &str,
    request: PlaceOrderRequest,
) -> ApiResult<OrderDetailDto> {
    debug!(user_id = %user_id, lines = request.items.len(), "place_order command");
    let new_order = request.into_new_order()?;
    let placed = state.db.orders().place(user_id, new_order).await?;
    Ok(OrderDetailDto::from(placed))
}

pub async fn get_order(state: &AppState, order_id: &str) -> ApiResult<OrderDetailDto> {
    debug!(order_id = %order_id, "get_order command");
    Ok(OrderDetailDto::from(state.db.orders().get(order_id).await?))
}

/// Staff status change. The status arrives as its wire name.
pub async fn change_order_status(
    state: &AppState,
    order_id: &str,
    status: &str,
) -> ApiResult<OrderDto> {
    debug!(order_id = %order_id, status = %status, "change_order_status command");
    let order = state.db.orders().change_status(order_id, status).await?;
    Ok(OrderDto::from(order))
}

/// Customer self-cancel.
pub async fn cancel_own_order(
    state: &AppState,
    user_id: &str,
    order_id: &str,
) -> ApiResult<OrderDto> {
    debug!(user_id = %user_id, order_id = %order_id, "cancel_own_order command");
    let order = state.db.orders().cancel_own(user_id, order_id).await?;
    Ok(OrderDto::from(order))
}

pub async fn can_cancel_order(state: &AppState, order_id: &str) -> ApiResult<bool> {
    Ok(state.db.orders().can_cancel(order_id).await?)
}

pub async fn add_order_item(
    state: &AppState,
    order_id: &str,
    line: OrderLineRequest,
) -> ApiResult<OrderDetailDto> {
    debug!(order_id = %order_id, product_id = %line.product_id, "add_order_item command");
    let aggregate = state
        .db
        .orders()
        .add_item(order_id, &line.product_id, line.quantity)
        .await?;
    Ok(OrderDetailDto::from(aggregate))
}

pub async fn update_order_item(
    state: &AppState,
    order_id: &str,
    item_id: &str,
    quantity: i64,
) -> ApiResult<OrderDetailDto> {
    debug!(order_id = %order_id, item_id = %item_id, quantity, "update_order_item command");
    let aggregate = state
        .db
        .orders()
        .update_item_quantity(order_id, item_id, quantity)
        .await?;
    Ok(OrderDetailDto::from(aggregate))
}

pub async fn remove_order_item(
    state: &AppState,
    order_id: &str,
    item_id: &str,
) -> ApiResult<OrderDetailDto> {
    debug!(order_id = %order_id, item_id = %item_id, "remove_order_item command");
    let aggregate = state.db.orders().remove_item(order_id, item_id).await?;
    Ok(OrderDetailDto::from(aggregate))
}

pub async fn change_delivery(
    state: &AppState,
    order_id: &str,
    delivery_type: &str,
    address: Option<&str>,
) -> ApiResult<OrderDto> {
    let delivery_type: DeliveryType = delivery_type.parse()?;
    let order = state
        .db
        .orders()
        .change_delivery(order_id, delivery_type, address)
        .await?;
    Ok(OrderDto::from(order))
}

/// Staff queue for one status, most recent first.
pub async fn list_orders_by_status(
    state: &AppState,
    status: &str,
    limit: Option<u32>,
) -> ApiResult<Vec<OrderDto>> {
    let status: OrderStatus = status.parse()?;
    let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);
    let orders = state.db.orders().list_by_status(status, limit).await?;
    Ok(orders.into_iter().map(OrderDto::from).collect())
}

pub async fn list_my_orders(
    state: &AppState,
    user_id: &str,
    limit: Option<u32>,
) -> ApiResult<Vec<OrderDto>> {
    let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);
    let orders = state.db.orders().list_by_user(user_id, limit).await?;
    Ok(orders.into_iter().map(OrderDto::from).collect())
}

pub async fn order_counts(state: &AppState) -> ApiResult<Vec<StatusCountDto>> {
    let counts = state.db.orders().count_by_status().await?;
    Ok(counts
        .into_iter()
        .map(|(status, count)| StatusCountDto { status, count })
        .collect())
}

pub async fn delete_order(state: &AppState, order_id: &str) -> ApiResult<()> {
    state.db.orders().delete(order_id).await?;
    info!(order_id = %order_id, "delete_order command");
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{seed_customer, seed_product};
    use crate::error::ErrorCode;

    fn request(items: Vec<OrderLineRequest>) -> PlaceOrderRequest {
        PlaceOrderRequest {
            customer_name: "Ana Torres".to_string(),
            customer_phone: "987654321".to_string(),
            delivery_type: "PICKUP".to_string(),
            payment_method: "YAPE".to_string(),
            items,
            ..Default::default()
        }
    }

    fn line(product_id: &str, quantity: i64) -> OrderLineRequest {
        OrderLineRequest {
            product_id: product_id.to_string(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_place_order_from_json_payload() {
        let state = AppState::in_memory().await.unwrap();
        let user_id = seed_customer(&state).await;
        let p1 = seed_product(&state, "Ceviche", 1000).await;
        let p2 = seed_product(&state, "Chicha Morada", 550).await;

        let payload = serde_json::json!({
            "deliveryType": "RECOGER",
            "paymentMethod": "EFECTIVO",
            "items": [
                { "productId": p1, "quantity": 2 },
                { "productId": p2, "quantity": 1 }
            ]
        });
        let request: PlaceOrderRequest = serde_json::from_value(payload).unwrap();
        let detail = place_order(&state, &user_id, request).await.unwrap();

        assert_eq!(detail.order.status, OrderStatus::Pendiente);
        assert_eq!(detail.order.delivery_type, DeliveryType::Pickup);
        assert_eq!(detail.order.total_display, "S/ 25.50");
        assert_eq!(detail.items.len(), 2);
        // Blank name was filled from the account.
        assert!(!detail.order.customer_name.is_empty());

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["order"]["totalCents"], 2550);
        assert_eq!(json["items"][0]["subtotalCents"], 2000);
    }

    #[tokio::test]
    async fn test_invalid_enum_values_are_reported() {
        let state = AppState::in_memory().await.unwrap();
        let user_id = seed_customer(&state).await;
        let p1 = seed_product(&state, "Ceviche", 1000).await;

        let mut bad = request(vec![line(&p1, 1)]);
        bad.payment_method = "BITCOIN".to_string();
        let err = place_order(&state, &user_id, bad).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("BITCOIN"));

        let placed = place_order(&state, &user_id, request(vec![line(&p1, 1)]))
            .await
            .unwrap();
        let err = change_order_status(&state, &placed.order.id, "PERDIDO")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("PERDIDO"));
        let unchanged = get_order(&state, &placed.order.id).await.unwrap();
        assert_eq!(unchanged.order.status, OrderStatus::Pendiente);

        let err = change_order_status(&state, "999", "ENTREGADO").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_empty_and_delivery_rules() {
        let state = AppState::in_memory().await.unwrap();
        let user_id = seed_customer(&state).await;
        let p1 = seed_product(&state, "Ceviche", 1000).await;

        let err = place_order(&state, &user_id, request(vec![])).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut delivery = request(vec![line(&p1, 1)]);
        delivery.delivery_type = "DELIVERY".to_string();
        delivery.delivery_address = Some("Calle Las Begonias 450".to_string());
        let placed = place_order(&state, &user_id, delivery).await.unwrap();
        assert_eq!(
            placed.order.delivery_address.as_deref(),
            Some("Calle Las Begonias 450")
        );

        let switched = change_delivery(&state, &placed.order.id, "PICKUP", None)
            .await
            .unwrap();
        assert!(switched.delivery_address.is_none());
    }

    #[tokio::test]
    async fn test_line_edits_and_customer_cancel() {
        let state = AppState::in_memory().await.unwrap();
        let user_id = seed_customer(&state).await;
        let p1 = seed_product(&state, "Lomo Saltado", 3800).await;
        let p2 = seed_product(&state, "Inca Kola", 600).await;

        let placed = place_order(&state, &user_id, request(vec![line(&p1, 1)]))
            .await
            .unwrap();
        let id = placed.order.id.clone();

        let detail = add_order_item(&state, &id, line(&p2, 2)).await.unwrap();
        assert_eq!(detail.order.total_cents, 3800 + 1200);

        let item_id = detail.items[1].id.clone();
        let detail = update_order_item(&state, &id, &item_id, 3).await.unwrap();
        assert_eq!(detail.order.total_cents, 3800 + 1800);

        let detail = remove_order_item(&state, &id, &item_id).await.unwrap();
        assert_eq!(detail.order.total_cents, 3800);

        let err = cancel_own_order(&state, "intruder", &id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        change_order_status(&state, &id, "ENVIADO").await.unwrap();
        assert!(!can_cancel_order(&state, &id).await.unwrap());
        let err = cancel_own_order(&state, &user_id, &id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);

        let queue = list_orders_by_status(&state, "ENVIADO", None).await.unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(list_my_orders(&state, &user_id, None).await.unwrap().len(), 1);

        let counts = order_counts(&state).await.unwrap();
        assert_eq!(counts.len(), 5);

        delete_order(&state, &id).await.unwrap();
        assert_eq!(get_order(&state, &id).await.unwrap_err().code, ErrorCode::NotFound);
    }
}
