//! # Fulfillment Coordinator
//!
//! Read projections for staff and customers: dashboard counters and the
//! per-user order and reservation histories.
//!
//! ## "Today"
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Order timestamps are stored in UTC. A calendar day is taken in the    │
//! │  restaurant's local time zone and converted to a half-open range:      │
//! │                                                                         │
//! │     2024-05-01 (America/Lima, UTC-5)                                   │
//! │        → [2024-05-01T05:00:00Z, 2024-05-02T05:00:00Z)                  │
//! │                                                                         │
//! │  Reservation dates are calendar dates already and compare directly.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here writes. Every `*_at` variant takes the zone and the current
//! date explicitly so tests can pin them.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use masseria_core::history::{day_bounds, OrderHistoryQuery, ReservationHistoryQuery};
use masseria_core::{DashboardStats, Money, Order, OrderAggregate, OrderStatus, Reservation};

use crate::error::{DbError, DbResult};
use crate::repository::contains_pattern;
use crate::repository::order::fetch_items;

#[derive(Debug, Clone)]
pub struct FulfillmentService {
    pool: SqlitePool,
}

impl FulfillmentService {
    pub fn new(pool: SqlitePool) -> Self {
        FulfillmentService { pool }
    }

    // -------------------------------------------------------------------------
    // Dashboard
    // -------------------------------------------------------------------------

    /// Dashboard counters as of now, in the server's local time zone.
    pub async fn dashboard_stats(&self) -> DbResult<DashboardStats> {
        let today = Local::now().date_naive();
        self.dashboard_stats_at(&Local, today).await
    }

    /// Dashboard counters for `today` as seen in `tz`.
    pub async fn dashboard_stats_at<Tz: TimeZone>(
        &self,
        tz: &Tz,
        today: NaiveDate,
    ) -> DbResult<DashboardStats> {
        let (from, until) = day_bounds(tz, today)
            .ok_or_else(|| DbError::Internal(format!("no local midnight on {today}")))?;

        let pending_orders = self.count_orders_with_status(OrderStatus::Pendiente).await?;
        let (orders_today, sales_today) = self.orders_between(from, until).await?;
        let reservations_today = self.count_reservations_on(today).await?;

        let stats = DashboardStats {
            pending_orders,
            orders_today,
            sales_today,
            reservations_today,
        };
        debug!(?stats, %today, "Dashboard stats");
        Ok(stats)
    }

    pub async fn count_orders_with_status(&self, status: OrderStatus) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status = ?1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Count and summed totals of orders created in `[from, until)`.
    pub async fn orders_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DbResult<(i64, Money)> {
        let (count, cents): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(total_cents), 0)
            FROM orders
            WHERE created_at >= ?1 AND created_at < ?2
            "#,
        )
        .bind(from)
        .bind(until)
        .fetch_one(&self.pool)
        .await?;

        Ok((count, Money::from_cents(cents)))
    }

    pub async fn count_reservations_on(&self, date: NaiveDate) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reservations WHERE date = ?1")
            .bind(date)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // -------------------------------------------------------------------------
    // History
    // -------------------------------------------------------------------------

    /// A user's orders matching `query`, most recent first.
    pub async fn order_history(
        &self,
        user_id: &str,
        query: &OrderHistoryQuery,
        limit: u32,
    ) -> DbResult<Vec<OrderAggregate>> {
        let today = Local::now().date_naive();
        self.order_history_at(&Local, today, user_id, query, limit)
            .await
    }

    pub async fn order_history_at<Tz: TimeZone>(
        &self,
        tz: &Tz,
        today: NaiveDate,
        user_id: &str,
        query: &OrderHistoryQuery,
        limit: u32,
    ) -> DbResult<Vec<OrderAggregate>> {
        let filter = query.resolve(today)?;
        let (from, until) = filter.window.to_utc_bounds(tz);
        let pattern = filter.product_name.as_deref().map(contains_pattern);

        debug!(
            user_id = %user_id,
            ?from,
            ?until,
            product = ?filter.product_name,
            "Order history"
        );

        let mut conn = self.pool.acquire().await?;
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, status, customer_name, customer_phone, customer_email,
                   delivery_type, payment_method, delivery_address, notes, total_cents,
                   created_at, updated_at
            FROM orders
            WHERE user_id = ?1
              AND (?2 IS NULL OR created_at >= ?2)
              AND (?3 IS NULL OR created_at < ?3)
              AND (?4 IS NULL OR EXISTS (
                    SELECT 1 FROM order_items oi
                    LEFT JOIN products p ON p.id = oi.product_id
                    WHERE oi.order_id = orders.id
                      AND (oi.name_snapshot LIKE ?4 ESCAPE '\' OR p.name LIKE ?4 ESCAPE '\')
              ))
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?5
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(until)
        .bind(pattern)
        .bind(limit)
        .fetch_all(&mut *conn)
        .await?;

        let mut history = Vec::with_capacity(orders.len());
        for order in orders {
            let items = fetch_items(&mut conn, &order.id).await?;
            history.push(OrderAggregate::from_parts(order, items));
        }
        Ok(history)
    }

    /// A user's reservations matching `query`, latest slot first.
    pub async fn reservation_history(
        &self,
        user_id: &str,
        query: &ReservationHistoryQuery,
        limit: u32,
    ) -> DbResult<Vec<Reservation>> {
        self.reservation_history_at(Local::now().date_naive(), user_id, query, limit)
            .await
    }

    pub async fn reservation_history_at(
        &self,
        today: NaiveDate,
        user_id: &str,
        query: &ReservationHistoryQuery,
        limit: u32,
    ) -> DbResult<Vec<Reservation>> {
        let filter = query.resolve(today)?;
        debug!(user_id = %user_id, window = ?filter.window, status = ?filter.status, "Reservation history");

        let reservations = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT id, user_id, name, email, phone, date, time, party_size,
                   notes, status, created_at
            FROM reservations
            WHERE user_id = ?1
              AND (?2 IS NULL OR date >= ?2)
              AND (?3 IS NULL OR date <= ?3)
              AND (?4 IS NULL OR status = ?4)
            ORDER BY date DESC, time DESC
            LIMIT ?5
            "#,
        )
        .bind(user_id)
        .bind(filter.window.start)
        .bind(filter.window.end)
        .bind(filter.status)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(reservations)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::order::pickup_request;
    use crate::testing::{sample_product, sample_user, test_db};
    use crate::Database;
    use chrono::{Duration, NaiveTime};
    use masseria_core::history::{OrderPeriod, ReservationPeriod};
    use masseria_core::{ContactSnapshot, NewReservation, ReservationStatus, ValidationError};

    fn today_utc() -> NaiveDate {
        Utc::now().date_naive()
    }

    fn booking(user_id: Option<&str>, date: NaiveDate, hour: u32) -> NewReservation {
        NewReservation {
            contact: ContactSnapshot {
                name: "Carmen".to_string(),
                email: "carmen@example.com".to_string(),
                phone: "999111222".to_string(),
            },
            date,
            time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            party_size: 2,
            notes: None,
            user_id: user_id.map(str::to_string),
        }
    }

    /// Moves an order's creation time back by `days`.
    async fn backdate(db: &Database, order_id: &str, days: i64) {
        let created = Utc::now() - Duration::days(days);
        sqlx::query("UPDATE orders SET created_at = ?2 WHERE id = ?1")
            .bind(order_id)
            .bind(created)
            .execute(db.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_dashboard_counts_today() {
        let db = test_db().await;
        let user = sample_user("dash@example.com");
        db.users().insert(&user).await.unwrap();
        let lomo = db.products().insert(&sample_product("Lomo Saltado", 3200)).await.unwrap();

        let a = db
            .orders()
            .place(&user.id, pickup_request("Ana", "9", &[(&lomo.id, 1)]))
            .await
            .unwrap();
        let b = db
            .orders()
            .place(&user.id, pickup_request("Ana", "9", &[(&lomo.id, 2)]))
            .await
            .unwrap();
        let old = db
            .orders()
            .place(&user.id, pickup_request("Ana", "9", &[(&lomo.id, 1)]))
            .await
            .unwrap();
        db.orders().set_status(&b.order.id, OrderStatus::EnProceso).await.unwrap();
        backdate(&db, &old.order.id, 3).await;

        let today = today_utc();
        db.reservations().create(booking(None, today, 19)).await.unwrap();
        db.reservations().create(booking(None, today, 20)).await.unwrap();
        db.reservations()
            .create(booking(None, today + Duration::days(1), 19))
            .await
            .unwrap();

        let stats = db.fulfillment().dashboard_stats_at(&Utc, today).await.unwrap();
        assert_eq!(stats.pending_orders, 2);
        assert_eq!(stats.orders_today, 2);
        assert_eq!(stats.sales_today, a.total() + b.total());
        assert_eq!(stats.sales_today.cents(), 9600);
        assert_eq!(stats.reservations_today, 2);

        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["pendingOrders"], 2);
        assert_eq!(json["reservationsToday"], 2);
    }

    #[tokio::test]
    async fn test_dashboard_empty_store() {
        let db = test_db().await;
        let stats = db.fulfillment().dashboard_stats().await.unwrap();
        assert_eq!(stats.pending_orders, 0);
        assert_eq!(stats.orders_today, 0);
        assert_eq!(stats.sales_today, Money::zero());
        assert_eq!(stats.reservations_today, 0);
    }

    #[tokio::test]
    async fn test_order_history_defaults_and_filters() {
        let db = test_db().await;
        let user = sample_user("historial@example.com");
        let other = sample_user("otro@example.com");
        db.users().insert(&user).await.unwrap();
        db.users().insert(&other).await.unwrap();
        let ceviche = db.products().insert(&sample_product("Ceviche Clásico", 2500)).await.unwrap();
        let chicha = db.products().insert(&sample_product("Chicha Morada", 600)).await.unwrap();

        let recent = db
            .orders()
            .place(&user.id, pickup_request("Ana", "9", &[(&ceviche.id, 1)]))
            .await
            .unwrap();
        let week_old = db
            .orders()
            .place(&user.id, pickup_request("Ana", "9", &[(&chicha.id, 1)]))
            .await
            .unwrap();
        let ancient = db
            .orders()
            .place(&user.id, pickup_request("Ana", "9", &[(&ceviche.id, 2)]))
            .await
            .unwrap();
        db.orders()
            .place(&other.id, pickup_request("Otro", "9", &[(&ceviche.id, 1)]))
            .await
            .unwrap();
        backdate(&db, &week_old.order.id, 5).await;
        backdate(&db, &ancient.order.id, 60).await;

        let service = db.fulfillment();
        let today = today_utc();
        let ids = |h: &[OrderAggregate]| h.iter().map(|a| a.order.id.clone()).collect::<Vec<_>>();

        // No filters: today only.
        let history = service
            .order_history_at(&Utc, today, &user.id, &OrderHistoryQuery::default(), 100)
            .await
            .unwrap();
        assert_eq!(ids(&history), vec![recent.order.id.clone()]);
        assert_eq!(history[0].items.len(), 1);

        let week = OrderHistoryQuery {
            period: Some(OrderPeriod::SieteDias),
            ..Default::default()
        };
        let history = service.order_history_at(&Utc, today, &user.id, &week, 100).await.unwrap();
        assert_eq!(ids(&history), vec![recent.order.id.clone(), week_old.order.id.clone()]);

        let all = OrderHistoryQuery {
            period: Some(OrderPeriod::Todos),
            ..Default::default()
        };
        let history = service.order_history_at(&Utc, today, &user.id, &all, 100).await.unwrap();
        assert_eq!(history.len(), 3);
        let capped = service.order_history_at(&Utc, today, &user.id, &all, 2).await.unwrap();
        assert_eq!(capped.len(), 2);

        // A product-name filter widens the period to everything.
        let by_name = OrderHistoryQuery {
            period: Some(OrderPeriod::Hoy),
            product_name: Some("CEVICHE".to_string()),
            ..Default::default()
        };
        let history = service.order_history_at(&Utc, today, &user.id, &by_name, 100).await.unwrap();
        assert_eq!(ids(&history), vec![recent.order.id.clone(), ancient.order.id.clone()]);

        // Open-ended range.
        let since = OrderHistoryQuery {
            from: Some(today - Duration::days(10)),
            ..Default::default()
        };
        let history = service.order_history_at(&Utc, today, &user.id, &since, 100).await.unwrap();
        assert_eq!(history.len(), 2);

        let inverted = OrderHistoryQuery {
            from: Some(today),
            to: Some(today - Duration::days(1)),
            ..Default::default()
        };
        let err = service
            .order_history_at(&Utc, today, &user.id, &inverted, 100)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(masseria_core::CoreError::Validation(ValidationError::InvalidRange { .. }))
        ));
    }

    #[tokio::test]
    async fn test_reservation_history_periods() {
        let db = test_db().await;
        let user = sample_user("mesa@example.com");
        db.users().insert(&user).await.unwrap();

        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let past = db
            .reservations()
            .create(booking(Some(&user.id), today - Duration::days(3), 13))
            .await
            .unwrap();
        let today_r = db
            .reservations()
            .create(booking(Some(&user.id), today, 20))
            .await
            .unwrap();
        let future = db
            .reservations()
            .create(booking(Some(&user.id), today + Duration::days(2), 19))
            .await
            .unwrap();
        db.reservations().create(booking(None, today, 20)).await.unwrap();
        db.reservations().confirm(&future.id).await.unwrap();

        let service = db.fulfillment();
        let ids = |h: &[Reservation]| h.iter().map(|r| r.id.clone()).collect::<Vec<_>>();

        let upcoming = service
            .reservation_history_at(today, &user.id, &ReservationHistoryQuery::default(), 100)
            .await
            .unwrap();
        assert_eq!(ids(&upcoming), vec![future.id.clone(), today_r.id.clone()]);

        let past_q = ReservationHistoryQuery {
            period: Some(ReservationPeriod::Pasadas),
            ..Default::default()
        };
        let history = service.reservation_history_at(today, &user.id, &past_q, 100).await.unwrap();
        assert_eq!(ids(&history), vec![past.id.clone()]);

        let confirmed = ReservationHistoryQuery {
            period: Some(ReservationPeriod::Pasadas),
            status: Some(ReservationStatus::Confirmada),
            ..Default::default()
        };
        let history = service
            .reservation_history_at(today, &user.id, &confirmed, 100)
            .await
            .unwrap();
        assert_eq!(ids(&history), vec![future.id.clone()]);

        let everything = ReservationHistoryQuery {
            period: Some(ReservationPeriod::Todas),
            ..Default::default()
        };
        let history = service
            .reservation_history_at(today, &user.id, &everything, 100)
            .await
            .unwrap();
        assert_eq!(history.len(), 3);
    }
}
