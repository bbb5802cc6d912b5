//! # Repository Module
//!
//! Database repository implementations for Masseria.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Backend command                                                        │
//! │       │   db.orders().place(user_id, request)                           │
//! │       ▼                                                                 │
//! │  OrderRepository                                                        │
//! │  ├── BEGIN IMMEDIATE                                                    │
//! │  ├── load rows ──► masseria-core aggregate applies the rules            │
//! │  ├── write what the aggregate computed                                  │
//! │  └── commit (or roll back on any error)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Menu items, stock, search
//! - [`CategoryRepository`](category::CategoryRepository) - Menu categories
//! - [`UserRepository`](user::UserRepository) - User lookups for snapshots and ownership
//! - [`OrderRepository`](order::OrderRepository) - The order aggregate
//! - [`ReservationRepository`](reservation::ReservationRepository) - Slot-guarded bookings

pub mod category;
pub mod order;
pub mod product;
pub mod reservation;
pub mod user;

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::error::DbResult;

/// Begins a transaction that holds SQLite's write lock from its first
/// statement.
///
/// A deferred `BEGIN` reads under a shared lock and upgrades on the first
/// write; in WAL mode a losing upgrade fails with `database is locked`
/// instead of waiting. Read-modify-write sequences use this so concurrent
/// writers wait their turn on the busy timeout.
pub(crate) async fn begin_write(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    let tx = pool.begin_with("BEGIN IMMEDIATE").await?;
    Ok(tx)
}

/// Builds a `LIKE` pattern matching `term` anywhere, escaping `%`, `_` and
/// `\`. Use with `ESCAPE '\'`.
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("lomo"), "%lomo%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }
}
