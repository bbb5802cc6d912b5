//! # masseria-db: Database Layer for Masseria
//!
//! This crate provides database access for the Masseria restaurant backend.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Masseria Data Flow                               │
//! │                                                                         │
//! │  Backend command (place_order, create_reservation, ...)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   masseria-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │   │   │
//! │  │   │               │    │ OrderRepo      │   │              │   │   │
//! │  │   │ SqlitePool    │◄───│ ReservationRepo│   │ 001_init.sql │   │   │
//! │  │   │ Slot capacity │    │ ProductRepo    │   │              │   │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘   │   │
//! │  │            ▲                                                    │   │
//! │  │            └──── FulfillmentService (dashboard, history)        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (./masseria.db)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`fulfillment`] - Dashboard counters and customer histories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use masseria_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./masseria.db")).await?;
//!
//! let order = db.orders().place(&user_id, request).await?;
//! let stats = db.fulfillment().dashboard_stats().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod fulfillment;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use fulfillment::FulfillmentService;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
pub use repository::reservation::ReservationRepository;
pub use repository::user::UserRepository;

// =============================================================================
// Test Support
// =============================================================================
