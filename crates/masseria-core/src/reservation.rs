//! # Reservation Slots
//!
//! Slot rules for table reservations.
//!
//! A reservation's `(date, time)` pair is its **slot**. Each slot holds at
//! most `capacity` reservations, counted whatever their status. The
//! restaurant offers hourly slots from 09:00 to 21:00.
//!
//! ```text
//!   request (2024-05-01 19:00, party of 4)
//!        │
//!        ▼
//!   NewReservation::validate()     contact, party size, opening hours
//!        │
//!        ▼
//!   occupancy(slot) < capacity ?   checked by the store in the same
//!        │                         statement that inserts the row
//!        ├── no  → SlotUnavailable
//!        └── yes → PENDIENTE reservation
//! ```

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{Reservation, ReservationStatus};
use crate::validation::{validate_party_size, validate_required_max, normalize_optional, ValidationResult};

/// First and last bookable hour.
pub const FIRST_SLOT_HOUR: u32 = 9;
pub const LAST_SLOT_HOUR: u32 = 21;

const MAX_NOTES_LEN: usize = 500;

// =============================================================================
// Slot
// =============================================================================

/// The `(date, time)` pair that groups competing reservations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Slot {
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[ts(as = "String")]
    pub time: NaiveTime,
}

impl Slot {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Slot { date, time }
    }

    /// Whether the restaurant offers this time at all.
    pub fn is_offered(&self) -> bool {
        is_opening_slot(self.time)
    }

    /// Builds the error returned when the slot is full.
    pub fn unavailable(&self, capacity: i64) -> CoreError {
        CoreError::SlotUnavailable {
            date: self.date.to_string(),
            time: self.time.format("%H:%M").to_string(),
            capacity,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date, self.time.format("%H:%M"))
    }
}

/// The hourly times offered for booking, 09:00 through 21:00.
pub fn opening_slots() -> Vec<NaiveTime> {
    (FIRST_SLOT_HOUR..=LAST_SLOT_HOUR)
        .filter_map(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
        .collect()
}

pub fn is_opening_slot(time: NaiveTime) -> bool {
    time.minute() == 0
        && time.second() == 0
        && time.nanosecond() == 0
        && (FIRST_SLOT_HOUR..=LAST_SLOT_HOUR).contains(&time.hour())
}

/// Whether a slot with `occupancy` live reservations can take one more.
#[inline]
pub fn has_capacity(occupancy: i64, capacity: i64) -> bool {
    occupancy < capacity
}

// =============================================================================
// New Reservation
// =============================================================================

/// Contact details captured with the reservation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContactSnapshot {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// A booking request.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub contact: ContactSnapshot,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub party_size: i64,
    pub notes: Option<String>,
    pub user_id: Option<String>,
}

impl NewReservation {
    pub fn slot(&self) -> Slot {
        Slot::new(self.date, self.time)
    }

    pub fn validate(&self) -> ValidationResult<()> {
        validate_required_max("name", &self.contact.name, 100)?;
        validate_required_max("email", &self.contact.email, 100)?;
        validate_required_max("phone", &self.contact.phone, 20)?;
        validate_party_size(self.party_size)?;
        normalize_optional("notes", self.notes.as_deref(), MAX_NOTES_LEN)?;

        if !self.slot().is_offered() {
            return Err(ValidationError::NotAllowed {
                field: "time".to_string(),
                value: self.time.format("%H:%M").to_string(),
                allowed: opening_slots()
                    .iter()
                    .map(|t| t.format("%H:%M").to_string())
                    .collect(),
            });
        }
        Ok(())
    }

    /// Validates the request and builds the PENDIENTE record to insert.
    pub fn into_reservation(self, now: DateTime<Utc>) -> CoreResult<Reservation> {
        self.validate()?;
        let notes = normalize_optional("notes", self.notes.as_deref(), MAX_NOTES_LEN)?;
        Ok(Reservation {
            id: Uuid::new_v4().to_string(),
            user_id: self.user_id,
            name: self.contact.name.trim().to_string(),
            email: self.contact.email.trim().to_string(),
            phone: self.contact.phone.trim().to_string(),
            date: self.date,
            time: self.time,
            party_size: self.party_size,
            notes,
            status: ReservationStatus::Pendiente,
            created_at: now,
        })
    }
}

impl Reservation {
    pub fn slot(&self) -> Slot {
        Slot::new(self.date, self.time)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn request() -> NewReservation {
        NewReservation {
            contact: ContactSnapshot {
                name: "María Flores".to_string(),
                email: "maria@example.com".to_string(),
                phone: "955111222".to_string(),
            },
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            time: at(19, 0),
            party_size: 4,
            notes: Some("  cumpleaños ".to_string()),
            user_id: Some("u1".to_string()),
        }
    }

    #[test]
    fn test_opening_slots() {
        let slots = opening_slots();
        assert_eq!(slots.len(), 13);
        assert_eq!(slots[0], at(9, 0));
        assert_eq!(slots[12], at(21, 0));
        assert!(is_opening_slot(at(13, 0)));
        assert!(!is_opening_slot(at(13, 30)));
        assert!(!is_opening_slot(at(8, 0)));
        assert!(!is_opening_slot(at(22, 0)));
    }

    #[test]
    fn test_capacity_boundary() {
        assert!(has_capacity(4, 5));
        assert!(!has_capacity(5, 5));
        assert!(!has_capacity(6, 5));
    }

    #[test]
    fn test_into_reservation_starts_pending() {
        let r = request().into_reservation(Utc::now()).unwrap();
        assert_eq!(r.status, ReservationStatus::Pendiente);
        assert_eq!(r.notes.as_deref(), Some("cumpleaños"));
        assert_eq!(r.slot().to_string(), "2024-05-01 19:00");
    }

    #[test]
    fn test_validation_failures() {
        let mut req = request();
        req.party_size = 0;
        assert!(req.validate().is_err());

        let mut req = request();
        req.contact.email = "".to_string();
        assert!(req.validate().is_err());

        let mut req = request();
        req.time = at(19, 15);
        assert!(matches!(req.validate(), Err(ValidationError::NotAllowed { .. })));
    }

    #[test]
    fn test_slot_unavailable_error() {
        let err = request().slot().unavailable(5);
        assert_eq!(err.to_string(), "Slot 2024-05-01 19:00 is fully booked (capacity 5)");
    }

    #[test]
    fn test_customer_cancel_rules() {
        let mut r = request().into_reservation(Utc::now()).unwrap();
        assert!(r.check_customer_cancel("u1").is_ok());
        assert!(matches!(r.check_customer_cancel("u2"), Err(CoreError::NotOwner { .. })));

        r.status = ReservationStatus::Confirmada;
        assert!(matches!(
            r.check_customer_cancel("u1"),
            Err(CoreError::NotCancelable { .. })
        ));

        r.user_id = None;
        assert!(r.check_customer_cancel("u1").is_err());
    }
}
