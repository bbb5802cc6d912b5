//! # Reservation Commands
//!
//! Table booking, availability checks and staff confirmation.
//!
//! ## Booking Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Form loads ──► opening_slots() ──► 09:00 … 21:00                      │
//! │                                                                         │
//! │  User picks 2024-05-01 19:00                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  check_availability ──► { available: true, occupancy: 3, capacity: 5 } │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  create_reservation ─┬─► PENDIENTE                                      │
//! │                      └─► SLOT_UNAVAILABLE (filled meanwhile)            │
//! │                                                                         │
//! │  Staff: confirm_reservation / cancel_reservation                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use masseria_core::reservation::opening_slots;
use masseria_core::{
    ContactSnapshot, NewReservation, Reservation, ReservationStatus, ValidationError,
};

use crate::error::ApiResult;
use crate::state::AppState;

// =============================================================================
// DTOs
// =============================================================================

/// Reservation payload. Date is `YYYY-MM-DD`, time `HH:MM`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateReservationRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date: String,
    pub time: String,
    pub party_size: i64,
    pub notes: Option<String>,
}

impl CreateReservationRequest {
    pub fn into_new_reservation(self, user_id: Option<&str>) -> ApiResult<NewReservation> {
        Ok(NewReservation {
            contact: ContactSnapshot {
                name: self.name,
                email: self.email,
                phone: self.phone,
            },
            date: parse_date(&self.date)?,
            time: parse_time(&self.time)?,
            party_size: self.party_size,
            notes: self.notes,
            user_id: user_id.map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReservationDto {
    pub id: String,
    pub user_id: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date: String,
    pub time: String,
    pub party_size: i64,
    pub notes: Option<String>,
    pub status: ReservationStatus,
    pub created_at: String,
}

impl From<Reservation> for ReservationDto {
    fn from(r: Reservation) -> Self {
        ReservationDto {
            id: r.id,
            user_id: r.user_id,
            name: r.name,
            email: r.email,
            phone: r.phone,
            date: r.date.format("%Y-%m-%d").to_string(),
            time: r.time.format("%H:%M").to_string(),
            party_size: r.party_size,
            notes: r.notes,
            status: r.status,
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AvailabilityDto {
    pub available: bool,
    pub occupancy: i64,
    pub capacity: i64,
}

// =============================================================================
// Parsing
// =============================================================================

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ValidationError::InvalidFormat {
        field: "date".to_string(),
        reason: format!("expected YYYY-MM-DD, got '{}'", raw),
    })
}

pub(crate) fn parse_time(raw: &str) -> Result<NaiveTime, ValidationError> {
    let raw_trimmed = raw.trim();
    NaiveTime::parse_from_str(raw_trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw_trimmed, "%H:%M:%S"))
        .map_err(|_| ValidationError::InvalidFormat {
            field: "time".to_string(),
            reason: format!("expected HH:MM, got '{}'", raw),
        })
}

// =============================================================================
// Commands
// =============================================================================

/// The hourly slots the restaurant takes bookings for.
pub fn list_opening_slots() -> Vec<String> {
    opening_slots()
        .iter()
        .map(|t| t.format("%H:%M").to_string())
        .collect()
}

pub async fn check_availability(
    state: &AppState,
    date: &str,
    time: &str,
) -> ApiResult<AvailabilityDto> {
    let (date, time) = (parse_date(date)?, parse_time(time)?);
    let repo = state.db.reservations();
    let occupancy = repo.occupancy(date, time).await?;
    let capacity = repo.capacity();
    Ok(AvailabilityDto {
        available: occupancy < capacity,
        occupancy,
        capacity,
    })
}

/// Books a table. `user_id` is set when the guest is signed in.
///
/// ## Returns
/// * `Err(SLOT_UNAVAILABLE)` - the slot is full
/// * `Err(VALIDATION_ERROR)` - missing contact data, party size ≤ 0, closed hour
pub async fn create_reservation(
    state: &AppState,
    user_id: Option<&str>,
    request: CreateReservationRequest,
) -> ApiResult<ReservationDto> {
    debug!(date = %request.date, time = %request.time, party_size = request.party_size, "create_reservation command");
    let new_reservation = request.into_new_reservation(user_id)?;
    let reservation = state.db.reservations().create(new_reservation).await?;
    Ok(ReservationDto::from(reservation))
}

pub async fn get_reservation(state: &AppState, id: &str) -> ApiResult<ReservationDto> {
    Ok(ReservationDto::from(state.db.reservations().get(id).await?))
}

pub async fn confirm_reservation(state: &AppState, id: &str) -> ApiResult<ReservationDto> {
    debug!(reservation_id = %id, "confirm_reservation command");
    Ok(ReservationDto::from(state.db.reservations().confirm(id).await?))
}

pub async fn cancel_reservation(state: &AppState, id: &str) -> ApiResult<ReservationDto> {
    debug!(reservation_id = %id, "cancel_reservation command");
    Ok(ReservationDto::from(state.db.reservations().cancel(id).await?))
}

pub async fn cancel_own_reservation(
    state: &AppState,
    user_id: &str,
    id: &str,
) -> ApiResult<ReservationDto> {
    debug!(reservation_id = %id, user_id = %user_id, "cancel_own_reservation command");
    Ok(ReservationDto::from(
        state.db.reservations().cancel_own(user_id, id).await?,
    ))
}

/// Reservations from `from` (default: today) onwards, earliest first.
pub async fn upcoming_reservations(
    state: &AppState,
    from: Option<&str>,
) -> ApiResult<Vec<ReservationDto>> {
    let from = match from {
        Some(raw) => parse_date(raw)?,
        None => Local::now().date_naive(),
    };
    let reservations = state.db.reservations().upcoming(from).await?;
    Ok(reservations.into_iter().map(ReservationDto::from).collect())
}

pub async fn reservations_on(state: &AppState, date: &str) -> ApiResult<Vec<ReservationDto>> {
    let date = parse_date(date)?;
    let reservations = state.db.reservations().list_by_date(date).await?;
    Ok(reservations.into_iter().map(ReservationDto::from).collect())
}

// =============================================================================
// Tests
// =============================================================================
