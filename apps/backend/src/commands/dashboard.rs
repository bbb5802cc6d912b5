//! # Dashboard Commands
//!
//! Staff overview counters, computed on every call.

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use masseria_core::DashboardStats;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardDto {
    pub pending_orders: i64,
    pub orders_today: i64,
    pub sales_today_cents: i64,
    /// e.g. "S/ 44.00"
    pub sales_today_display: String,
    pub reservations_today: i64,
}

impl From<DashboardStats> for DashboardDto {
    fn from(stats: DashboardStats) -> Self {
        DashboardDto {
            pending_orders: stats.pending_orders,
            orders_today: stats.orders_today,
            sales_today_cents: stats.sales_today.cents(),
            sales_today_display: stats.sales_today.to_string(),
            reservations_today: stats.reservations_today,
        }
    }
}

/// Pending orders, today's orders and sales, today's reservations.
pub async fn dashboard(state: &AppState) -> ApiResult<DashboardDto> {
    debug!("dashboard command");
    let stats = state.db.fulfillment().dashboard_stats().await?;
    Ok(DashboardDto::from(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::order::{place_order, PlaceOrderRequest};
    use crate::commands::testing::{seed_customer, seed_product};
    use masseria_core::OrderLineRequest;

    #[tokio::test]
    async fn test_dashboard_reflects_todays_orders() {
        let state = AppState::in_memory().await.unwrap();
        let empty = dashboard(&state).await.unwrap();
        assert_eq!(empty.pending_orders, 0);
        assert_eq!(empty.sales_today_display, "S/ 0.00");

        let user_id = seed_customer(&state).await;
        let product = seed_product(&state, "Pisco Sour", 2200).await;
        let request = PlaceOrderRequest {
            delivery_type: "PICKUP".to_string(),
            payment_method: "TARJETA".to_string(),
            items: vec![OrderLineRequest {
                product_id: product,
                quantity: 2,
            }],
            ..Default::default()
        };
        place_order(&state, &user_id, request).await.unwrap();

        let stats = dashboard(&state).await.unwrap();
        assert_eq!(stats.pending_orders, 1);
        assert_eq!(stats.orders_today, 1);
        assert_eq!(stats.sales_today_cents, 4400);
        assert_eq!(stats.sales_today_display, "S/ 44.00");
    }
}
