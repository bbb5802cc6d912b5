//! # Error Types
//!
//! Domain-specific error types for masseria-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  masseria-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations, missing entities     │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  masseria-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  backend app errors                                                    │
//! │  └── ApiError         - What request handlers see (serialized)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (ID, status, slot)
//! 3. Errors are enum variants, never String
//! 4. Slot conflicts are their own variant so callers can say "fully booked"

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Order cannot be found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Line item does not belong to the order (or does not exist).
    #[error("Line item {item_id} not found in order {order_id}")]
    LineItemNotFound { order_id: String, item_id: String },

    /// Reservation cannot be found.
    #[error("Reservation not found: {0}")]
    ReservationNotFound(String),

    /// User referenced by an order or reservation cannot be found.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// The reservation slot is at capacity.
    ///
    /// ## User Workflow
    /// ```text
    /// Book table (2024-05-01 19:00)
    ///      │
    ///      ▼
    /// Occupancy of slot: 5 / 5
    ///      │
    ///      ▼
    /// SlotUnavailable { date, time, capacity: 5 }
    ///      │
    ///      ▼
    /// UI shows: "That time is fully booked"
    /// ```
    #[error("Slot {date} {time} is fully booked (capacity {capacity})")]
    SlotUnavailable {
        date: String,
        time: String,
        capacity: i64,
    },

    /// Stock adjustment would leave a product below zero.
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// The customer may no longer cancel this entity.
    #[error("{entity} {id} is {status} and can no longer be cancelled")]
    NotCancelable {
        entity: String,
        id: String,
        status: String,
    },

    /// The acting user does not own the entity.
    #[error("{entity} {id} does not belong to user {user_id}")]
    NotOwner {
        entity: String,
        id: String,
        user_id: String,
    },

    /// The entity is still referenced and cannot be removed.
    #[error("{entity} {id} is still referenced by {count} records")]
    InUse {
        entity: String,
        id: String,
        count: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// They are always reported, never retried.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, malformed amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in the allowed set. The rejected value is reported.
    #[error("invalid {field}: '{value}' (allowed: {})", .allowed.join(", "))]
    NotAllowed {
        field: String,
        value: String,
        allowed: Vec<String>,
    },

    /// Duplicate value (e.g., duplicate category name).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// A range whose start lies after its end.
    #[error("{field}: start {start} is after end {end}")]
    InvalidRange {
        field: String,
        start: String,
        end: String,
    },
}

impl ValidationError {
    /// Creates a `Required` error for the given field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
