//! # Masseria Backend
//!
//! The command layer HTTP controllers call into: configuration, shared
//! state, request/response DTOs and the serializable error type.
//!
//! ## Module Organization
//! ```text
//! masseria_backend/
//! ├── lib.rs          ◄─── You are here (tracing setup)
//! ├── config.rs       ◄─── Environment configuration
//! ├── state.rs        ◄─── AppState (database + config)
//! ├── error.rs        ◄─── ApiError with machine-readable codes
//! └── commands/
//!     ├── catalog.rs
//!     ├── order.rs
//!     ├── reservation.rs
//!     ├── dashboard.rs
//!     └── history.rs
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. init_tracing()        EnvFilter, RUST_LOG overrides the default    │
//! │  2. AppConfig::load()     MASSERIA_* variables with defaults           │
//! │  3. AppState::connect()   SQLite (WAL, foreign keys) + migrations      │
//! │  4. Hand AppState to the HTTP layer                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod state;

use tracing_subscriber::EnvFilter;

pub use config::{AppConfig, ConfigError};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=masseria=trace` - Show trace for masseria crates only
/// - Default: `info,masseria=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,masseria=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
