//! # History Commands
//!
//! A customer's own orders and reservations. Filters are optional and
//! default instead of failing: no filters means today's orders and
//! upcoming reservations.

use tracing::debug;

use masseria_core::history::{OrderHistoryQuery, ReservationHistoryQuery};

use crate::commands::order::OrderDetailDto;
use crate::commands::reservation::ReservationDto;
use crate::error::ApiResult;
use crate::state::AppState;

/// Orders matching `query`, most recent first, capped at the history limit.
pub async fn order_history(
    state: &AppState,
    user_id: &str,
    query: OrderHistoryQuery,
) -> ApiResult<Vec<OrderDetailDto>> {
    debug!(user_id = %user_id, ?query, "order_history command");
    let history = state
        .db
        .fulfillment()
        .order_history(user_id, &query, state.config.history_limit)
        .await?;
    Ok(history.into_iter().map(OrderDetailDto::from).collect())
}

/// Reservations matching `query`, latest slot first.
pub async fn reservation_history(
    state: &AppState,
    user_id: &str,
    query: ReservationHistoryQuery,
) -> ApiResult<Vec<ReservationDto>> {
    debug!(user_id = %user_id, ?query, "reservation_history command");
    let history = state
        .db
        .fulfillment()
        .reservation_history(user_id, &query, state.config.history_limit)
        .await?;
    Ok(history.into_iter().map(ReservationDto::from).collect())
}
