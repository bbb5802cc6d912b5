//! # Domain Types
//!
//! Core domain types used throughout Masseria.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │◄──│    Product      │◄──│    LineItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  order_id (FK)  │       │
//! │  │  name (unique)  │   │  price_cents    │   │  unit_price     │       │
//! │  └─────────────────┘   │  stock          │   │  (snapshot)     │       │
//! │                        └─────────────────┘   └────────┬────────┘       │
//! │                                                       │ owned by       │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌────────▼────────┐       │
//! │  │      User       │◄──│   Reservation   │   │      Order      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  role           │   │  date + time    │   │  status         │       │
//! │  │  is_active      │   │  (the slot)     │   │  total_cents    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │           ▲                                           │                 │
//! │           └───────────────── user_id ─────────────────┘                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Relationships
//! Every relation is an explicit foreign-key field holding the other
//! entity's id. There are no object back-references: a line item's
//! `order_id` is a lookup key, and ownership (cascading delete) is declared
//! by the schema, not implied by the field.
//!
//! ## Closed Enumerations
//! Status, delivery type, payment method and role are closed enums. Their
//! wire names (`PENDIENTE`, `PICKUP`, `EFECTIVO`, ...) are shared by serde,
//! the database column values and [`FromStr`].

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

/// Parses a wire name against a closed set of variants.
fn parse_wire<T: Copy>(
    field: &str,
    value: &str,
    all: &[T],
    name: fn(&T) -> &'static str,
) -> Result<T, ValidationError> {
    all.iter()
        .copied()
        .find(|variant| name(variant) == value)
        .ok_or_else(|| ValidationError::NotAllowed {
            field: field.to_string(),
            value: value.to_string(),
            allowed: all.iter().map(|v| name(v).to_string()).collect(),
        })
}

/// Deserializes a string through the type's `FromStr`, so serde accepts the
/// same spellings as query strings and form fields do.
pub(crate) fn deserialize_parsed<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr<Err = ValidationError>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

// =============================================================================
// Order Status
// =============================================================================

/// The fulfillment status of an order.
///
/// ## State Machine
/// ```text
///              ┌──────────────────── staff override: any → any ────────────┐
///              │                                                            │
///  PENDIENTE ──┴──► EN_PROCESO ──► ENVIADO ──► ENTREGADO                   │
///      │                │                                                   │
///      └────────────────┴──► CANCELADO   (customer self-cancel window)     │
/// ```
/// ENTREGADO and CANCELADO are terminal in practice; staff may still move an
/// order out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Received, not yet started.
    Pendiente,
    /// Kitchen is preparing the order.
    EnProceso,
    /// Out for delivery (or ready at the counter).
    Enviado,
    /// Handed to the customer.
    Entregado,
    /// Cancelled by staff or customer.
    Cancelado,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pendiente,
        OrderStatus::EnProceso,
        OrderStatus::Enviado,
        OrderStatus::Entregado,
        OrderStatus::Cancelado,
    ];

    /// Returns the wire name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pendiente => "PENDIENTE",
            OrderStatus::EnProceso => "EN_PROCESO",
            OrderStatus::Enviado => "ENVIADO",
            OrderStatus::Entregado => "ENTREGADO",
            OrderStatus::Cancelado => "CANCELADO",
        }
    }

    /// Whether the owning customer may still cancel the order.
    pub const fn is_cancelable_by_customer(&self) -> bool {
        matches!(self, OrderStatus::Pendiente | OrderStatus::EnProceso)
    }

    /// Whether the order has reached the end of its normal lifecycle.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Entregado | OrderStatus::Cancelado)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pendiente
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_wire("status", s, &OrderStatus::ALL, OrderStatus::as_str)
    }
}

// =============================================================================
// Delivery Type
// =============================================================================

/// How the customer receives the order.
///
/// Deserializes through [`FromStr`], which also takes the client's Spanish
/// names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryType {
    /// Customer collects at the restaurant.
    Pickup,
    /// Delivered to an address (address mandatory).
    Delivery,
}

impl DeliveryType {
    pub const ALL: [DeliveryType; 2] = [DeliveryType::Pickup, DeliveryType::Delivery];

    pub const fn as_str(&self) -> &'static str {
        match self {
            DeliveryType::Pickup => "PICKUP",
            DeliveryType::Delivery => "DELIVERY",
        }
    }

    pub const fn requires_address(&self) -> bool {
        matches!(self, DeliveryType::Delivery)
    }
}

impl fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryType {
    type Err = ValidationError;

    /// Accepts the wire names plus the Spanish names the web client sends.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RECOGER" => Ok(DeliveryType::Pickup),
            "DOMICILIO" => Ok(DeliveryType::Delivery),
            other => parse_wire("delivery type", other, &DeliveryType::ALL, DeliveryType::as_str),
        }
    }
}

impl<'de> Deserialize<'de> for DeliveryType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_parsed(deserializer)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash on pickup/delivery.
    Efectivo,
    /// Card on a terminal.
    Tarjeta,
    /// Yape mobile wallet.
    Yape,
    /// Plin mobile wallet.
    Plin,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Efectivo,
        PaymentMethod::Tarjeta,
        PaymentMethod::Yape,
        PaymentMethod::Plin,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Efectivo => "EFECTIVO",
            PaymentMethod::Tarjeta => "TARJETA",
            PaymentMethod::Yape => "YAPE",
            PaymentMethod::Plin => "PLIN",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_wire("payment method", s, &PaymentMethod::ALL, PaymentMethod::as_str)
    }
}

// =============================================================================
// Reservation Status
// =============================================================================

/// The status of a table reservation.
///
/// ```text
///  PENDIENTE ──┬──► CONFIRMADA
///              └──► CANCELADA
/// ```
/// No terminality is enforced for staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pendiente,
    Confirmada,
    Cancelada,
}

impl ReservationStatus {
    pub const ALL: [ReservationStatus; 3] = [
        ReservationStatus::Pendiente,
        ReservationStatus::Confirmada,
        ReservationStatus::Cancelada,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pendiente => "PENDIENTE",
            ReservationStatus::Confirmada => "CONFIRMADA",
            ReservationStatus::Cancelada => "CANCELADA",
        }
    }
}

impl Default for ReservationStatus {
    fn default() -> Self {
        ReservationStatus::Pendiente
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_wire("status", s, &ReservationStatus::ALL, ReservationStatus::as_str)
    }
}

// =============================================================================
// Role
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Cliente,
}

impl Default for Role {
    fn default() -> Self {
        Role::Cliente
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered user. Owned by the account subsystem; orders and
/// reservations only reference it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Role,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// =============================================================================
// Category
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    /// Unique, compared case-insensitively.
    pub name: String,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A menu item.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Category this product is listed under.
    pub category_id: Option<String>,

    /// Display name shown on the menu.
    pub name: String,

    pub description: Option<String>,

    /// Price in cents (smallest currency unit), never negative.
    pub price_cents: i64,

    /// Units on hand, never negative.
    pub stock: i64,

    /// Shown on the home page.
    pub is_featured: bool,

    /// Inactive products are hidden from the menu.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    pub fn has_stock(&self) -> bool {
        self.stock > 0
    }

    pub fn has_sufficient_stock(&self, quantity: i64) -> bool {
        self.has_stock() && self.stock >= quantity
    }

    /// Takes `quantity` units out of stock.
    pub fn reduce_stock(&mut self, quantity: i64) -> CoreResult<()> {
        if quantity < 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }
        if self.stock < quantity {
            return Err(CoreError::InsufficientStock {
                product: self.name.clone(),
                available: self.stock,
                requested: quantity,
            });
        }
        self.stock -= quantity;
        Ok(())
    }

    /// Puts `quantity` units back into stock.
    pub fn increase_stock(&mut self, quantity: i64) -> CoreResult<()> {
        if quantity < 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }
        self.stock += quantity;
        Ok(())
    }
}

// =============================================================================
// Order
// =============================================================================

/// Order header. The line items live in [`crate::order::OrderAggregate`].
///
/// `total_cents` is only ever written by the aggregate, as the sum of its
/// line-item subtotals.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,
    /// Customer snapshot, captured at order time.
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub delivery_type: DeliveryType,
    pub payment_method: PaymentMethod,
    /// Present iff `delivery_type` is DELIVERY.
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    pub fn is_delivery(&self) -> bool {
        self.delivery_type == DeliveryType::Delivery
    }

    /// Checks that `user_id` may cancel this order themselves.
    pub fn check_customer_cancel(&self, user_id: &str) -> CoreResult<()> {
        if self.user_id != user_id {
            return Err(CoreError::NotOwner {
                entity: "Order".to_string(),
                id: self.id.clone(),
                user_id: user_id.to_string(),
            });
        }
        if !self.status.is_cancelable_by_customer() {
            return Err(CoreError::NotCancelable {
                entity: "Order".to_string(),
                id: self.id.clone(),
                status: self.status.to_string(),
            });
        }
        Ok(())
    }

    /// One-line summary, e.g. `Order #… - PENDIENTE - Total: S/ 25.50`.
    pub fn summary(&self) -> String {
        format!("Order #{} - {} - Total: {}", self.id, self.status, self.total())
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// A line of an order. Uses the snapshot pattern: the product's name and
/// price are copied at creation and never follow later catalog edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LineItem {
    pub id: String,
    /// Lookup key of the owning order.
    pub order_id: String,
    pub product_id: String,
    /// Product name at time of order (frozen).
    pub name_snapshot: String,
    pub quantity: i64,
    /// Unit price in cents at time of order (frozen).
    pub unit_price_cents: i64,
    /// unit_price × quantity.
    pub subtotal_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Reservation
// =============================================================================

/// A table reservation. `(date, time)` is its slot.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Reservation {
    pub id: String,
    pub user_id: Option<String>,
    /// Contact snapshot.
    pub name: String,
    pub email: String,
    pub phone: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[ts(as = "String")]
    pub time: NaiveTime,
    pub party_size: i64,
    pub notes: Option<String>,
    pub status: ReservationStatus,
    /// Stamped when the row is written.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// Checks that `user_id` may cancel this reservation themselves:
    /// only the owner, and only while it is still PENDIENTE.
    pub fn check_customer_cancel(&self, user_id: &str) -> CoreResult<()> {
        if self.user_id.as_deref() != Some(user_id) {
            return Err(CoreError::NotOwner {
                entity: "Reservation".to_string(),
                id: self.id.clone(),
                user_id: user_id.to_string(),
            });
        }
        if self.status != ReservationStatus::Pendiente {
            return Err(CoreError::NotCancelable {
                entity: "Reservation".to_string(),
                id: self.id.clone(),
                status: self.status.to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Dashboard
// =============================================================================

/// Operational counters, computed at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardStats {
    pub pending_orders: i64,
    pub orders_today: i64,
    pub sales_today: Money,
    pub reservations_today: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
