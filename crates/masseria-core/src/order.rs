//! # Order Aggregate
//!
//! An order together with the line items it exclusively owns.
//!
//! ## Consistency Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        OrderAggregate                                   │
//! │                                                                         │
//! │   LineItem.subtotal == LineItem.unit_price × LineItem.quantity          │
//! │   Order.total       == Σ LineItem.subtotal                              │
//! │                                                                         │
//! │   add_line ─────┐                                                       │
//! │   set_quantity ─┼──► recompute subtotal ──► recompute total             │
//! │   remove_line ──┘                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The total is never assigned from outside. Every mutation goes through the
//! aggregate, and the database layer only persists what the aggregate
//! computed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{DeliveryType, LineItem, Order, OrderStatus, PaymentMethod, Product, User};
use crate::validation::{
    normalize_optional, validate_line_count, validate_price_cents,
    validate_quantity, validate_required_max, ValidationResult,
};

const MAX_NAME_LEN: usize = 100;
const MAX_PHONE_LEN: usize = 20;
const MAX_EMAIL_LEN: usize = 100;
const MAX_ADDRESS_LEN: usize = 255;
const MAX_NOTES_LEN: usize = 500;

// =============================================================================
// Order Requests
// =============================================================================

/// Customer details captured when the order is placed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerSnapshot {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

/// One requested `(product, quantity)` pair.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderLineRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// A validated-on-demand order placement request.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer: CustomerSnapshot,
    pub delivery_type: DeliveryType,
    pub payment_method: PaymentMethod,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<OrderLineRequest>,
}

impl NewOrder {
    /// Fills blank snapshot fields from the user's account.
    pub fn fill_from_user(&mut self, user: &User) {
        if self.customer.name.trim().is_empty() {
            self.customer.name = user.full_name.clone();
        }
        if self.customer.phone.trim().is_empty() {
            if let Some(phone) = &user.phone {
                self.customer.phone = phone.clone();
            }
        }
        if self.customer.email.as_deref().map_or(true, |e| e.trim().is_empty()) {
            self.customer.email = Some(user.email.clone());
        }
        if self.delivery_type.requires_address()
            && self.delivery_address.as_deref().map_or(true, |a| a.trim().is_empty())
        {
            self.delivery_address = user.address.clone();
        }
    }

    /// Checks every field rule that does not need the catalog.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_required_max("customer name", &self.customer.name, MAX_NAME_LEN)?;
        validate_required_max("customer phone", &self.customer.phone, MAX_PHONE_LEN)?;
        normalize_optional("customer email", self.customer.email.as_deref(), MAX_EMAIL_LEN)?;

        if self.delivery_type.requires_address() {
            validate_required_max(
                "delivery address",
                self.delivery_address.as_deref().unwrap_or(""),
                MAX_ADDRESS_LEN,
            )?;
        }
        normalize_optional("notes", self.notes.as_deref(), MAX_NOTES_LEN)?;

        validate_line_count(self.items.len())?;
        for line in &self.items {
            if line.product_id.trim().is_empty() {
                return Err(ValidationError::required("product id"));
            }
            validate_quantity(line.quantity)?;
        }
        Ok(())
    }
}

// =============================================================================
// Line Item Rules
// =============================================================================

impl LineItem {
    /// Creates a line item, snapshotting the product's current name and price.
    pub fn new(
        order_id: &str,
        product: &Product,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        validate_quantity(quantity)?;
        validate_price_cents(product.price_cents)?;

        let mut item = LineItem {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            product_id: product.id.clone(),
            name_snapshot: product.name.clone(),
            quantity,
            unit_price_cents: product.price_cents,
            subtotal_cents: 0,
            created_at: now,
        };
        item.recompute_subtotal()?;
        Ok(item)
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    pub fn set_quantity(&mut self, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;
        self.quantity = quantity;
        self.recompute_subtotal()
    }

    pub fn set_unit_price(&mut self, price: Money) -> CoreResult<()> {
        validate_price_cents(price.cents())?;
        self.unit_price_cents = price.cents();
        self.recompute_subtotal()
    }

    fn recompute_subtotal(&mut self) -> CoreResult<()> {
        let subtotal = self
            .unit_price()
            .checked_multiply_quantity(self.quantity)
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "subtotal".to_string(),
                reason: "amount overflows".to_string(),
            })?;
        self.subtotal_cents = subtotal.cents();
        Ok(())
    }

    /// Whether the stored subtotal agrees with price × quantity.
    pub fn is_consistent(&self) -> bool {
        self.quantity > 0
            && self.unit_price_cents >= 0
            && self.unit_price().checked_multiply_quantity(self.quantity)
                == Some(self.subtotal())
    }
}

// =============================================================================
// Order Aggregate
// =============================================================================

/// An order with its line items, in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderAggregate {
    pub order: Order,
    pub items: Vec<LineItem>,
}

impl OrderAggregate {
    /// Builds a new PENDIENTE order from a request.
    ///
    /// Every requested product must appear in `products`; a missing one fails
    /// with [`CoreError::ProductNotFound`].
    ///
    /// ## Example
    /// ```text
    /// items:  P1 (S/ 10.00) × 2,  P2 (S/ 5.50) × 1
    /// lines:  S/ 20.00,           S/ 5.50
    /// total:  S/ 25.50
    /// ```
    pub fn place(
        user_id: &str,
        request: &NewOrder,
        products: &[Product],
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        request.validate()?;

        let customer_name = request.customer.name.trim().to_string();
        let customer_phone = request.customer.phone.trim().to_string();
        let customer_email =
            normalize_optional("customer email", request.customer.email.as_deref(), MAX_EMAIL_LEN)?;
        let delivery_address = if request.delivery_type.requires_address() {
            normalize_optional(
                "delivery address",
                request.delivery_address.as_deref(),
                MAX_ADDRESS_LEN,
            )?
        } else {
            None
        };
        let notes = normalize_optional("notes", request.notes.as_deref(), MAX_NOTES_LEN)?;

        let mut aggregate = OrderAggregate {
            order: Order {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                status: OrderStatus::Pendiente,
                customer_name,
                customer_phone,
                customer_email,
                delivery_type: request.delivery_type,
                payment_method: request.payment_method,
                delivery_address,
                notes,
                total_cents: 0,
                created_at: now,
                updated_at: now,
            },
            items: Vec::with_capacity(request.items.len()),
        };

        for line in &request.items {
            let product = products
                .iter()
                .find(|p| p.id == line.product_id)
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;
            let item = LineItem::new(&aggregate.order.id, product, line.quantity, now)?;
            aggregate.items.push(item);
        }
        aggregate.recompute_total()?;

        Ok(aggregate)
    }

    /// Reassembles an aggregate from stored rows.
    pub fn from_parts(order: Order, items: Vec<LineItem>) -> Self {
        OrderAggregate { order, items }
    }

    #[inline]
    pub fn total(&self) -> Money {
        self.order.total()
    }

    /// Whether every subtotal and the total agree with the line items.
    pub fn is_consistent(&self) -> bool {
        self.items.iter().all(LineItem::is_consistent)
            && self.items.iter().map(LineItem::subtotal).sum::<Money>() == self.total()
    }

    pub fn find_line(&self, item_id: &str) -> CoreResult<&LineItem> {
        self.items
            .iter()
            .find(|i| i.id == item_id)
            .ok_or_else(|| self.line_not_found(item_id))
    }

    /// Appends a line for `product` and recomputes the total.
    pub fn add_line(
        &mut self,
        product: &Product,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> CoreResult<&LineItem> {
        validate_line_count(self.items.len() + 1)?;
        let item = LineItem::new(&self.order.id, product, quantity, now)?;
        self.items.push(item);
        self.recompute_total()?;
        self.touch(now);
        let index = self.items.len() - 1;
        Ok(&self.items[index])
    }

    /// Changes a line's quantity and recomputes its subtotal and the total.
    pub fn set_line_quantity(
        &mut self,
        item_id: &str,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> CoreResult<&LineItem> {
        let index = self.line_index(item_id)?;
        self.items[index].set_quantity(quantity)?;
        self.recompute_total()?;
        self.touch(now);
        Ok(&self.items[index])
    }

    /// Removes a line. An order always keeps at least one line.
    pub fn remove_line(&mut self, item_id: &str, now: DateTime<Utc>) -> CoreResult<LineItem> {
        let index = self.line_index(item_id)?;
        if self.items.len() == 1 {
            return Err(ValidationError::OutOfRange {
                field: "order lines".to_string(),
                min: 1,
                max: crate::MAX_ORDER_LINES as i64,
            }
            .into());
        }
        let removed = self.items.remove(index);
        self.recompute_total()?;
        self.touch(now);
        Ok(removed)
    }

    /// Switches delivery type. DELIVERY needs a non-empty address; PICKUP
    /// drops any stored address.
    pub fn change_delivery(
        &mut self,
        delivery_type: DeliveryType,
        address: Option<&str>,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        let address = if delivery_type.requires_address() {
            let address = validate_required_max(
                "delivery address",
                address.unwrap_or(""),
                MAX_ADDRESS_LEN,
            )?;
            Some(address)
        } else {
            None
        };
        self.order.delivery_type = delivery_type;
        self.order.delivery_address = address;
        self.touch(now);
        Ok(())
    }

    /// Sets the status. Staff may move an order between any two statuses.
    pub fn change_status(&mut self, status: OrderStatus, now: DateTime<Utc>) {
        self.order.status = status;
        self.touch(now);
    }

    fn recompute_total(&mut self) -> CoreResult<()> {
        let mut total = Money::zero();
        for item in &self.items {
            total = Money::from_cents(total.cents().checked_add(item.subtotal_cents).ok_or_else(
                || ValidationError::InvalidFormat {
                    field: "total".to_string(),
                    reason: "amount overflows".to_string(),
                },
            )?);
        }
        self.order.total_cents = total.cents();
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.order.updated_at = now;
    }

    fn line_index(&self, item_id: &str) -> CoreResult<usize> {
        self.items
            .iter()
            .position(|i| i.id == item_id)
            .ok_or_else(|| self.line_not_found(item_id))
    }

    fn line_not_found(&self, item_id: &str) -> CoreError {
        CoreError::LineItemNotFound {
            order_id: self.order.id.clone(),
            item_id: item_id.to_string(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn product(id: &str, name: &str, cents: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            category_id: None,
            name: name.to_string(),
            description: None,
            price_cents: cents,
            stock: 10,
            is_featured: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn request(items: Vec<(&str, i64)>) -> NewOrder {
        NewOrder {
            customer: CustomerSnapshot {
                name: "Ana Torres".to_string(),
                phone: "987654321".to_string(),
                email: None,
            },
            delivery_type: DeliveryType::Pickup,
            payment_method: PaymentMethod::Efectivo,
            delivery_address: None,
            notes: None,
            items: items
                .into_iter()
                .map(|(id, qty)| OrderLineRequest {
                    product_id: id.to_string(),
                    quantity: qty,
                })
                .collect(),
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("p1", "Ceviche", 1000),
            product("p2", "Chicha Morada", 550),
        ]
    }

    #[test]
    fn test_place_computes_snapshot_total() {
        let agg = OrderAggregate::place(
            "u1",
            &request(vec![("p1", 2), ("p2", 1)]),
            &catalog(),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(agg.order.status, OrderStatus::Pendiente);
        assert_eq!(agg.items.len(), 2);
        assert_eq!(agg.items[0].subtotal_cents, 2000);
        assert_eq!(agg.items[1].subtotal_cents, 550);
        assert_eq!(agg.total(), Money::from_cents(2550));
        assert_eq!(agg.total().to_string(), "S/ 25.50");
        assert!(agg.items.iter().all(|i| i.order_id == agg.order.id));
        assert!(agg.is_consistent());
    }

    #[test]
    fn test_place_rejects_empty_items() {
        let err = OrderAggregate::place("u1", &request(vec![]), &catalog(), Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::Required { .. })));
    }

    #[test]
    fn test_place_rejects_delivery_without_address() {
        let mut req = request(vec![("p1", 1)]);
        req.delivery_type = DeliveryType::Delivery;
        req.delivery_address = Some("   ".to_string());
        let err = OrderAggregate::place("u1", &req, &catalog(), Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        req.delivery_address = Some("Av. Larco 123, Miraflores".to_string());
        let agg = OrderAggregate::place("u1", &req, &catalog(), Utc::now()).unwrap();
        assert_eq!(agg.order.delivery_address.as_deref(), Some("Av. Larco 123, Miraflores"));
    }

    #[test]
    fn test_pickup_drops_address() {
        let mut req = request(vec![("p1", 1)]);
        req.delivery_address = Some("Jr. Azángaro 400".to_string());
        let agg = OrderAggregate::place("u1", &req, &catalog(), Utc::now()).unwrap();
        assert!(agg.order.delivery_address.is_none());
    }

    #[test]
    fn test_place_rejects_missing_name_phone_and_bad_quantity() {
        let mut req = request(vec![("p1", 1)]);
        req.customer.name = String::new();
        assert!(OrderAggregate::place("u1", &req, &catalog(), Utc::now()).is_err());

        let mut req = request(vec![("p1", 1)]);
        req.customer.phone = " ".to_string();
        assert!(OrderAggregate::place("u1", &req, &catalog(), Utc::now()).is_err());

        let req = request(vec![("p1", 0)]);
        assert!(OrderAggregate::place("u1", &req, &catalog(), Utc::now()).is_err());
    }

    #[test]
    fn test_place_unknown_product_is_not_found() {
        let err = OrderAggregate::place("u1", &request(vec![("nope", 1)]), &catalog(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(id) if id == "nope"));
    }

    #[test]
    fn test_snapshot_ignores_later_price_changes() {
        let mut products = catalog();
        let agg =
            OrderAggregate::place("u1", &request(vec![("p1", 3)]), &products, Utc::now()).unwrap();
        products[0].price_cents = 9999;
        assert_eq!(agg.items[0].unit_price_cents, 1000);
        assert_eq!(agg.total().cents(), 3000);
    }

    #[test]
    fn test_line_mutations_keep_total_consistent() {
        let now = Utc::now();
        let products = catalog();
        let mut agg = OrderAggregate::place("u1", &request(vec![("p1", 2)]), &products, now).unwrap();

        let added_id = agg.add_line(&products[1], 3, now).unwrap().id.clone();
        assert_eq!(agg.total().cents(), 2000 + 1650);
        assert!(agg.is_consistent());

        let first_id = agg.items[0].id.clone();
        let line = agg.set_line_quantity(&first_id, 5, now).unwrap();
        assert_eq!(line.subtotal_cents, 5000);
        assert_eq!(agg.total().cents(), 5000 + 1650);

        assert!(agg.set_line_quantity(&first_id, 0, now).is_err());
        assert_eq!(agg.total().cents(), 5000 + 1650);

        let removed = agg.remove_line(&added_id, now).unwrap();
        assert_eq!(removed.product_id, "p2");
        assert_eq!(agg.total().cents(), 5000);
        assert!(agg.is_consistent());
    }

    #[test]
    fn test_remove_last_line_is_rejected() {
        let now = Utc::now();
        let mut agg =
            OrderAggregate::place("u1", &request(vec![("p1", 1)]), &catalog(), now).unwrap();
        let id = agg.items[0].id.clone();
        assert!(agg.remove_line(&id, now).is_err());
        assert_eq!(agg.items.len(), 1);
        assert_eq!(agg.total().cents(), 1000);
    }

    #[test]
    fn test_unknown_line_is_reported() {
        let now = Utc::now();
        let mut agg =
            OrderAggregate::place("u1", &request(vec![("p1", 1)]), &catalog(), now).unwrap();
        let err = agg.set_line_quantity("missing", 2, now).unwrap_err();
        assert!(matches!(err, CoreError::LineItemNotFound { .. }));
    }

    #[test]
    fn test_line_item_set_unit_price_recomputes() {
        let p = product("p1", "Ceviche", 1000);
        let mut item = LineItem::new("o1", &p, 3, Utc::now()).unwrap();
        item.set_unit_price(Money::from_cents(1250)).unwrap();
        assert_eq!(item.subtotal_cents, 3750);
        assert!(item.is_consistent());
        assert!(item.set_unit_price(Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_change_delivery() {
        let now = Utc::now();
        let mut agg =
            OrderAggregate::place("u1", &request(vec![("p1", 1)]), &catalog(), now).unwrap();
        assert!(agg.change_delivery(DeliveryType::Delivery, None, now).is_err());
        assert_eq!(agg.order.delivery_type, DeliveryType::Pickup);

        agg.change_delivery(DeliveryType::Delivery, Some("Calle Lima 12"), now)
            .unwrap();
        assert!(agg.order.is_delivery());

        agg.change_delivery(DeliveryType::Pickup, Some("ignored"), now)
            .unwrap();
        assert!(agg.order.delivery_address.is_none());
    }

    #[test]
    fn test_fill_from_user() {
        let user = User {
            id: "u1".to_string(),
            full_name: "Luis Quispe".to_string(),
            email: "luis@example.com".to_string(),
            phone: Some("912345678".to_string()),
            address: Some("Av. Arequipa 500".to_string()),
            role: Role::Cliente,
            is_active: true,
            created_at: Utc::now(),
        };
        let mut req = request(vec![("p1", 1)]);
        req.customer = CustomerSnapshot::default();
        req.delivery_type = DeliveryType::Delivery;
        req.fill_from_user(&user);

        assert_eq!(req.customer.name, "Luis Quispe");
        assert_eq!(req.customer.phone, "912345678");
        assert_eq!(req.customer.email.as_deref(), Some("luis@example.com"));
        assert_eq!(req.delivery_address.as_deref(), Some("Av. Arequipa 500"));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_customer_cancel_window() {
        let now = Utc::now();
        let mut agg =
            OrderAggregate::place("u1", &request(vec![("p1", 1)]), &catalog(), now).unwrap();
        assert!(agg.order.check_customer_cancel("u1").is_ok());
        assert!(matches!(
            agg.order.check_customer_cancel("u2"),
            Err(CoreError::NotOwner { .. })
        ));

        agg.change_status(OrderStatus::Enviado, now);
        assert!(matches!(
            agg.order.check_customer_cancel("u1"),
            Err(CoreError::NotCancelable { .. })
        ));
    }
}
