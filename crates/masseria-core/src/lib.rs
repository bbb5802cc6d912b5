//! # masseria-core: Pure Business Logic for Masseria
//!
//! The order-aggregate and reservation-slot rules of the restaurant backend,
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Masseria Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            HTTP controllers (external collaborators)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/backend commands                        │   │
//! │  │   place_order, change_order_status, book_table, dashboard ...  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ masseria-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌───────────┐ ┌────────┐ │   │
//! │  │   │  types  │ │  money  │ │  order  │ │reservation│ │history │ │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └───────────┘ └────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                masseria-db (Database Layer)                     │   │
//! │  │     SQLite repositories, transactions, fulfillment queries      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities and closed enums (Order, Reservation, OrderStatus, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`order`] - The order aggregate: line items, subtotals, total
//! - [`reservation`] - Slots, opening hours, capacity
//! - [`history`] - History periods and filter defaulting
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level rules
//!
//! ## Design Principles
//!
//! 1. **No I/O**: the clock is passed in as `now` / `today`
//! 2. **Integer Money**: all monetary values are in cents (i64)
//! 3. **Explicit Errors**: all errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use masseria_core::money::Money;
//!
//! let ceviche = Money::from_cents(1000);
//! let chicha = Money::from_cents(550);
//! let total = ceviche.multiply_quantity(2) + chicha;
//! assert_eq!(total.to_string(), "S/ 25.50");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod history;
pub mod money;
pub mod order;
pub mod reservation;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use order::{CustomerSnapshot, NewOrder, OrderAggregate, OrderLineRequest};
pub use reservation::{ContactSnapshot, NewReservation, Slot};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Reservations a single slot can hold unless configured otherwise.
pub const DEFAULT_SLOT_CAPACITY: i64 = 5;

/// Maximum lines on a single order.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity on a single line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (typing 100 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;
