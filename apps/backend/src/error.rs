//! # API Error Type
//!
//! Unified error type for backend commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Masseria                               │
//! │                                                                         │
//! │  HTTP controller             Rust backend                               │
//! │  ───────────────             ────────────                               │
//! │                                                                         │
//! │  POST /reservas                                                         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Slot full? ─── CoreError::SlotUnavailable ─── SLOT_UNAVAILABLE ►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Bad input? ─── ValidationError ────────────── VALIDATION_ERROR ►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Database? ──── DbError::QueryFailed ───────── DATABASE_ERROR ──►│  │
//! │  │         │       (logged, generic message)                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  { "code": "SLOT_UNAVAILABLE",                                          │
//! │    "message": "Slot 2024-05-01 19:00 is fully booked (capacity 5)" }   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use ts_rs::TS;

use masseria_core::{CoreError, ValidationError};
use masseria_db::DbError;

/// API error returned from commands.
///
/// ## Serialization
/// This is what the client receives when a command fails:
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Order not found: 0b6f..."
/// }
/// ```
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
///
/// ## Usage in the client
/// ```typescript
/// const res = await fetch('/api/reservas', { method: 'POST', body });
/// if (!res.ok) {
///   const e = await res.json();
///   switch (e.code) {
///     case 'SLOT_UNAVAILABLE':
///       showNotice('Ese horario está lleno');
///       break;
///     case 'VALIDATION_ERROR':
///       showForm(e.message);
///       break;
///   }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Reservation slot is fully booked (409)
    SlotUnavailable,

    /// Conflicts with current state: duplicates, references, closed orders (409)
    Conflict,

    /// Acting user does not own the resource (403)
    Forbidden,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    /// Suggested HTTP status for controllers.
    pub const fn http_status(&self) -> u16 {
        match self {
            ErrorCode::NotFound => 404,
            ErrorCode::ValidationError => 400,
            ErrorCode::SlotUnavailable | ErrorCode::Conflict => 409,
            ErrorCode::Forbidden => 403,
            ErrorCode::DatabaseError | ErrorCode::Internal => 500,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(core) => ApiError::from(core),
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::Conflict, "Invalid or still-referenced record")
            }
            DbError::CheckViolation { message } => {
                tracing::error!("Check constraint violation: {}", message);
                ApiError::validation("Value rejected by a data constraint")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::ProductNotFound(_)
            | CoreError::OrderNotFound(_)
            | CoreError::LineItemNotFound { .. }
            | CoreError::ReservationNotFound(_)
            | CoreError::UserNotFound(_) => ApiError::new(ErrorCode::NotFound, message),
            CoreError::SlotUnavailable { .. } => ApiError::new(ErrorCode::SlotUnavailable, message),
            CoreError::InsufficientStock { .. }
            | CoreError::NotCancelable { .. }
            | CoreError::InUse { .. } => ApiError::new(ErrorCode::Conflict, message),
            CoreError::NotOwner { .. } => ApiError::new(ErrorCode::Forbidden, message),
            CoreError::Validation(e) => ApiError::from(e),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let code = match err {
            ValidationError::Duplicate { .. } => ErrorCode::Conflict,
            _ => ErrorCode::ValidationError,
        };
        ApiError::new(code, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for commands.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_unavailable_is_distinct_from_validation() {
        let err = ApiError::from(DbError::Domain(CoreError::SlotUnavailable {
            date: "2024-05-01".to_string(),
            time: "19:00".to_string(),
            capacity: 5,
        }));
        assert_eq!(err.code, ErrorCode::SlotUnavailable);
        assert_eq!(err.code.http_status(), 409);

        let err = ApiError::from(DbError::from(ValidationError::required("phone")));
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "phone is required");
    }

    #[test]
    fn test_code_mapping() {
        let cases = [
            (CoreError::OrderNotFound("x".into()), ErrorCode::NotFound),
            (
                CoreError::NotOwner {
                    entity: "Order".into(),
                    id: "x".into(),
                    user_id: "u".into(),
                },
                ErrorCode::Forbidden,
            ),
            (
                CoreError::InUse {
                    entity: "Category".into(),
                    id: "c".into(),
                    count: 2,
                },
                ErrorCode::Conflict,
            ),
        ];
        for (core, code) in cases {
            assert_eq!(ApiError::from(core).code, code);
        }
    }

    #[test]
    fn test_database_details_are_hidden() {
        let err = ApiError::from(DbError::QueryFailed("near \"SELEC\": syntax error".into()));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.message, "Database operation failed");

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "DATABASE_ERROR");
    }
}
