//! # Order Repository
//!
//! Persistence for the order aggregate (an order plus its line items).
//!
//! ## Transaction Boundaries
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  place / add_item / update_item_quantity / remove_item                  │
//! │                                                                         │
//! │  BEGIN IMMEDIATE                      (write lock taken up front)       │
//! │    load order header + items          (inside the transaction)          │
//! │    OrderAggregate applies the change  (subtotals, total recomputed)     │
//! │    write changed item rows                                              │
//! │    write header total / updated_at                                      │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction, which rolls it back:   │
//! │  an order is never visible without its lines or with a stale total.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Concurrent writers to the same order queue on the write lock (up to the
//! pool's busy timeout) and each sees the previous writer's committed state.
//!
//! ## Status Changes
//! Staff may move an order between any two statuses. Customers may only
//! cancel their own orders, and only while PENDIENTE or EN_PROCESO.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use masseria_core::{
    CoreError, DeliveryType, LineItem, NewOrder, Order, OrderAggregate, OrderStatus, Product,
    ValidationError,
};

use super::begin_write;
use crate::error::{DbError, DbResult};

/// Repository for the order aggregate.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Placement
    // -------------------------------------------------------------------------

    /// Places an order for `user_id`.
    ///
    /// ## What This Does
    /// 1. Loads the user; blank snapshot fields are filled from the account
    /// 2. Validates the request (name, phone, address for DELIVERY, items)
    /// 3. Resolves every product and snapshots its current price
    /// 4. Writes the order and all of its lines in one transaction
    ///
    /// ## Returns
    /// * `Ok(OrderAggregate)` - status PENDIENTE, total = Σ subtotals
    /// * `Err(UserNotFound / ProductNotFound)` - unknown reference
    /// * `Err(Validation)` - bad request; nothing is written
    pub async fn place(&self, user_id: &str, mut request: NewOrder) -> DbResult<OrderAggregate> {
        debug!(user_id = %user_id, lines = request.items.len(), "Placing order");

        let mut tx = begin_write(&self.pool).await?;

        let user = fetch_user_active(&mut tx, user_id).await?;
        request.fill_from_user(&user);
        request.validate()?;

        let mut products: Vec<Product> = Vec::with_capacity(request.items.len());
        for line in &request.items {
            if products.iter().any(|p| p.id == line.product_id) {
                continue;
            }
            let product = fetch_product(&mut tx, &line.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;
            products.push(product);
        }

        let aggregate = OrderAggregate::place(user_id, &request, &products, Utc::now())?;

        insert_order(&mut tx, &aggregate.order).await?;
        for item in &aggregate.items {
            insert_item(&mut tx, item).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            order_id = %aggregate.order.id,
            user_id = %user_id,
            items = aggregate.items.len(),
            total = %aggregate.total(),
            "Order placed"
        );

        Ok(aggregate)
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Gets an order header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        fetch_order(&mut conn, id).await
    }

    /// Gets an order with its line items, in insertion order.
    pub async fn get(&self, id: &str) -> DbResult<OrderAggregate> {
        let mut conn = self.pool.acquire().await?;
        load_aggregate(&mut conn, id).await
    }

    /// Gets the line items of an order, in insertion order.
    pub async fn items(&self, order_id: &str) -> DbResult<Vec<LineItem>> {
        let mut conn = self.pool.acquire().await?;
        fetch_items(&mut conn, order_id).await
    }

    /// Lists orders in a status, most recent first.
    pub async fn list_by_status(&self, status: OrderStatus, limit: u32) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, status, customer_name, customer_phone, customer_email,
                   delivery_type, payment_method, delivery_address, notes, total_cents,
                   created_at, updated_at
            FROM orders
            WHERE status = ?1
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(status)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Lists a user's orders, most recent first.
    pub async fn list_by_user(&self, user_id: &str, limit: u32) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, status, customer_name, customer_phone, customer_email,
                   delivery_type, payment_method, delivery_address, notes, total_cents,
                   created_at, updated_at
            FROM orders
            WHERE user_id = ?1
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Counts orders in every status, including statuses with none.
    pub async fn count_by_status(&self) -> DbResult<Vec<(OrderStatus, i64)>> {
        let rows: Vec<(OrderStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM orders GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        Ok(OrderStatus::ALL
            .iter()
            .map(|status| {
                let count = rows
                    .iter()
                    .find(|(s, _)| s == status)
                    .map_or(0, |(_, count)| *count);
                (*status, count)
            })
            .collect())
    }

    /// Whether the owning customer could still cancel the order.
    /// Unknown orders are not cancelable.
    pub async fn can_cancel(&self, id: &str) -> DbResult<bool> {
        Ok(self
            .get_by_id(id)
            .await?
            .is_some_and(|order| order.status.is_cancelable_by_customer()))
    }

    // -------------------------------------------------------------------------
    // Status
    // -------------------------------------------------------------------------

    /// Changes the status from a wire name (staff action).
    ///
    /// ## Returns
    /// * `Err(Validation(NotAllowed))` - not one of the five statuses; the
    ///   rejected value is reported and the order is left untouched
    /// * `Err(OrderNotFound)` - no such order
    pub async fn change_status(&self, id: &str, status: &str) -> DbResult<Order> {
        let status: OrderStatus = status.parse()?;
        self.set_status(id, status).await
    }

    /// Sets the status. Any status may move to any other (staff override).
    pub async fn set_status(&self, id: &str, status: OrderStatus) -> DbResult<Order> {
        debug!(order_id = %id, status = %status, "Changing order status");

        let mut tx = begin_write(&self.pool).await?;
        let mut aggregate = load_aggregate(&mut tx, id).await?;
        let previous = aggregate.order.status;
        aggregate.change_status(status, Utc::now());
        write_header(&mut tx, &aggregate.order).await?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(order_id = %id, from = %previous, to = %status, "Order status changed");
        Ok(aggregate.order)
    }

    /// Cancels an order (staff action).
    pub async fn cancel(&self, id: &str) -> DbResult<Order> {
        self.set_status(id, OrderStatus::Cancelado).await
    }

    /// Cancels an order on behalf of its owner.
    ///
    /// ## Returns
    /// * `Err(NotOwner)` - the order belongs to someone else
    /// * `Err(NotCancelable)` - already ENVIADO, ENTREGADO or CANCELADO
    pub async fn cancel_own(&self, user_id: &str, id: &str) -> DbResult<Order> {
        let mut tx = begin_write(&self.pool).await?;
        let mut aggregate = load_aggregate(&mut tx, id).await?;
        aggregate.order.check_customer_cancel(user_id)?;
        aggregate.change_status(OrderStatus::Cancelado, Utc::now());
        write_header(&mut tx, &aggregate.order).await?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(order_id = %id, user_id = %user_id, "Order cancelled by customer");
        Ok(aggregate.order)
    }

    // -------------------------------------------------------------------------
    // Line Items
    // -------------------------------------------------------------------------

    /// Adds a line for `product_id` at the product's current price.
    pub async fn add_item(
        &self,
        order_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<OrderAggregate> {
        let mut tx = begin_write(&self.pool).await?;
        let mut aggregate = load_aggregate(&mut tx, order_id).await?;
        let product = fetch_product(&mut tx, product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        let item = aggregate.add_line(&product, quantity, Utc::now())?.clone();
        insert_item(&mut tx, &item).await?;
        write_header(&mut tx, &aggregate.order).await?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(order_id = %order_id, item_id = %item.id, total = %aggregate.total(), "Line added");
        Ok(aggregate)
    }

    /// Changes a line's quantity; subtotal and total follow.
    pub async fn update_item_quantity(
        &self,
        order_id: &str,
        item_id: &str,
        quantity: i64,
    ) -> DbResult<OrderAggregate> {
        let mut tx = begin_write(&self.pool).await?;
        let mut aggregate = load_aggregate(&mut tx, order_id).await?;

        let item = aggregate
            .set_line_quantity(item_id, quantity, Utc::now())?
            .clone();
        sqlx::query(
            "UPDATE order_items SET quantity = ?2, subtotal_cents = ?3 WHERE id = ?1",
        )
        .bind(&item.id)
        .bind(item.quantity)
        .bind(item.subtotal_cents)
        .execute(&mut *tx)
        .await?;
        write_header(&mut tx, &aggregate.order).await?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(order_id = %order_id, item_id = %item_id, quantity, total = %aggregate.total(), "Line quantity changed");
        Ok(aggregate)
    }

    /// Removes a line. The last line of an order cannot be removed.
    pub async fn remove_item(&self, order_id: &str, item_id: &str) -> DbResult<OrderAggregate> {
        let mut tx = begin_write(&self.pool).await?;
        let mut aggregate = load_aggregate(&mut tx, order_id).await?;

        let removed = aggregate.remove_line(item_id, Utc::now())?;
        sqlx::query("DELETE FROM order_items WHERE id = ?1")
            .bind(&removed.id)
            .execute(&mut *tx)
            .await?;
        write_header(&mut tx, &aggregate.order).await?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(order_id = %order_id, item_id = %item_id, total = %aggregate.total(), "Line removed");
        Ok(aggregate)
    }

    // -------------------------------------------------------------------------
    // Delivery & Deletion
    // -------------------------------------------------------------------------

    /// Switches between PICKUP and DELIVERY. DELIVERY needs an address.
    pub async fn change_delivery(
        &self,
        order_id: &str,
        delivery_type: DeliveryType,
        address: Option<&str>,
    ) -> DbResult<Order> {
        let mut tx = begin_write(&self.pool).await?;
        let mut aggregate = load_aggregate(&mut tx, order_id).await?;
        aggregate.change_delivery(delivery_type, address, Utc::now())?;
        write_header(&mut tx, &aggregate.order).await?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(order_id = %order_id, delivery_type = %delivery_type, "Delivery changed");
        Ok(aggregate.order)
    }

    /// Deletes an order; its line items go with it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::OrderNotFound(id.to_string()).into());
        }

        info!(order_id = %id, "Order deleted");
        Ok(())
    }
}

// =============================================================================
// Connection-level helpers
// =============================================================================
// These take a bare connection so they run inside whichever transaction the
// caller holds.

async fn fetch_user_active(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> DbResult<masseria_core::User> {
    let user = sqlx::query_as::<_, masseria_core::User>(
        r#"
        SELECT id, full_name, email, phone, address, role, is_active, created_at
        FROM users
        WHERE id = ?1
        "#,
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| CoreError::UserNotFound(user_id.to_string()))?;

    if !user.is_active {
        return Err(ValidationError::InvalidFormat {
            field: "user".to_string(),
            reason: "account is inactive".to_string(),
        }
        .into());
    }
    Ok(user)
}

async fn fetch_product(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, category_id, name, description, price_cents, stock,
               is_featured, is_active, created_at, updated_at
        FROM products
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}

async fn fetch_order(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
        r#"
        SELECT id, user_id, status, customer_name, customer_phone, customer_email,
               delivery_type, payment_method, delivery_address, notes, total_cents,
               created_at, updated_at
        FROM orders
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(order)
}

pub(crate) async fn fetch_items(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Vec<LineItem>> {
    let items = sqlx::query_as::<_, LineItem>(
        r#"
        SELECT id, order_id, product_id, name_snapshot, quantity,
               unit_price_cents, subtotal_cents, created_at
        FROM order_items
        WHERE order_id = ?1
        ORDER BY created_at, rowid
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

async fn load_aggregate(conn: &mut SqliteConnection, id: &str) -> DbResult<OrderAggregate> {
    let order = fetch_order(conn, id)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(id.to_string()))?;
    let items = fetch_items(conn, id).await?;
    Ok(OrderAggregate::from_parts(order, items))
}

async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO orders (
            id, user_id, status, customer_name, customer_phone, customer_email,
            delivery_type, payment_method, delivery_address, notes, total_cents,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
    )
    .bind(&order.id)
    .bind(&order.user_id)
    .bind(order.status)
    .bind(&order.customer_name)
    .bind(&order.customer_phone)
    .bind(&order.customer_email)
    .bind(order.delivery_type)
    .bind(order.payment_method)
    .bind(&order.delivery_address)
    .bind(&order.notes)
    .bind(order.total_cents)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_item(conn: &mut SqliteConnection, item: &LineItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO order_items (
            id, order_id, product_id, name_snapshot, quantity,
            unit_price_cents, subtotal_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&item.id)
    .bind(&item.order_id)
    .bind(&item.product_id)
    .bind(&item.name_snapshot)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.subtotal_cents)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Writes the mutable header fields the aggregate owns.
async fn write_header(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE orders SET
            status = ?2,
            delivery_type = ?3,
            delivery_address = ?4,
            total_cents = ?5,
            updated_at = ?6
        WHERE id = ?1
        "#,
    )
    .bind(&order.id)
    .bind(order.status)
    .bind(order.delivery_type)
    .bind(&order.delivery_address)
    .bind(order.total_cents)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::OrderNotFound(order.id.clone()).into());
    }
    Ok(())
}

/// Helper to build an order request quickly in tests and the seed binary.
pub fn pickup_request(
    name: &str,
    phone: &str,
    items: &[(&str, i64)],
) -> NewOrder {
    NewOrder {
        customer: masseria_core::CustomerSnapshot {
            name: name.to_string(),
            phone: phone.to_string(),
            email: None,
        },
        delivery_type: DeliveryType::Pickup,
        payment_method: masseria_core::PaymentMethod::Efectivo,
        delivery_address: None,
        notes: None,
        items: items
            .iter()
            .map(|(product_id, quantity)| masseria_core::OrderLineRequest {
                product_id: product_id.to_string(),
                quantity: *quantity,
            })
            .collect(),
    }
}

// =============================================================================
// Tests
// =============================================================================
