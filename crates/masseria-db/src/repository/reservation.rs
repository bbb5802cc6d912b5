//! # Reservation Repository
//!
//! Table reservations and per-slot capacity.
//!
//! ## Capacity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Slot 2024-05-01 19:00, capacity 5                                      │
//! │                                                                         │
//! │  occupancy = COUNT(*) WHERE date AND time match                        │
//! │                                                                         │
//! │  create:                                                                │
//! │    INSERT INTO reservations (...)                                       │
//! │    SELECT ...                                                           │
//! │    WHERE (occupancy) < capacity        ← one statement, one write lock │
//! │                                                                         │
//! │    1 row  → booked                                                      │
//! │    0 rows → SlotUnavailable                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every reservation in the slot counts, whatever its status: cancelling
//! does not give the place back. Count and insert run as a single
//! statement, so two concurrent requests for the last place cannot both
//! succeed. `check_availability` is only a read-only check for forms.

use chrono::{NaiveDate, NaiveTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use masseria_core::reservation::has_capacity;
use masseria_core::{CoreError, NewReservation, Reservation, ReservationStatus};

use crate::error::DbResult;

const SELECT_COLUMNS: &str = "SELECT id, user_id, name, email, phone, date, time, party_size, \
                              notes, status, created_at FROM reservations";

/// Repository for reservations.
#[derive(Debug, Clone)]
pub struct ReservationRepository {
    pool: SqlitePool,
    capacity: i64,
}

impl ReservationRepository {
    /// Creates a repository enforcing `capacity` reservations per slot.
    pub fn new(pool: SqlitePool, capacity: i64) -> Self {
        ReservationRepository { pool, capacity }
    }

    pub fn capacity(&self) -> i64 {
        self.capacity
    }

    // -------------------------------------------------------------------------
    // Availability
    // -------------------------------------------------------------------------

    /// Number of reservations booked into the slot.
    pub async fn occupancy(&self, date: NaiveDate, time: NaiveTime) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reservations WHERE date = ?1 AND time = ?2",
        )
        .bind(date)
        .bind(time)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Whether the slot still has room.
    pub async fn check_availability(&self, date: NaiveDate, time: NaiveTime) -> DbResult<bool> {
        let occupancy = self.occupancy(date, time).await?;
        debug!(%date, %time, occupancy, capacity = self.capacity, "Slot availability");
        Ok(has_capacity(occupancy, self.capacity))
    }

    // -------------------------------------------------------------------------
    // Create
    // -------------------------------------------------------------------------

    /// Books a reservation if its slot has room.
    ///
    /// ## Returns
    /// * `Ok(Reservation)` - status PENDIENTE
    /// * `Err(SlotUnavailable)` - the slot is at capacity
    /// * `Err(Validation)` - bad contact details, party size or time
    /// * `Err(UserNotFound)` - the owning user does not exist
    pub async fn create(&self, request: NewReservation) -> DbResult<Reservation> {
        let slot = request.slot();
        debug!(slot = %slot, party_size = request.party_size, "Creating reservation");

        let reservation = request.into_reservation(Utc::now())?;

        if let Some(user_id) = reservation.user_id.as_deref() {
            let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE id = ?1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
            if exists.is_none() {
                return Err(CoreError::UserNotFound(user_id.to_string()).into());
            }
        }

        let result = sqlx::query(
            r#"
            INSERT INTO reservations (
                id, user_id, name, email, phone, date, time,
                party_size, notes, status, created_at
            )
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11
            WHERE (
                SELECT COUNT(*) FROM reservations
                WHERE date = ?6 AND time = ?7
            ) < ?12
            "#,
        )
        .bind(&reservation.id)
        .bind(&reservation.user_id)
        .bind(&reservation.name)
        .bind(&reservation.email)
        .bind(&reservation.phone)
        .bind(reservation.date)
        .bind(reservation.time)
        .bind(reservation.party_size)
        .bind(&reservation.notes)
        .bind(reservation.status)
        .bind(reservation.created_at)
        .bind(self.capacity)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            warn!(slot = %slot, capacity = self.capacity, "Slot fully booked");
            return Err(slot.unavailable(self.capacity).into());
        }

        info!(
            reservation_id = %reservation.id,
            slot = %slot,
            party_size = reservation.party_size,
            "Reservation created"
        );
        Ok(reservation)
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Reservation>> {
        let reservation = sqlx::query_as::<_, Reservation>(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(reservation)
    }

    /// Gets a reservation, failing with `ReservationNotFound` if absent.
    pub async fn get(&self, id: &str) -> DbResult<Reservation> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ReservationNotFound(id.to_string()).into())
    }

    /// Reservations on or after `from`, earliest first.
    pub async fn upcoming(&self, from: NaiveDate) -> DbResult<Vec<Reservation>> {
        let reservations = sqlx::query_as::<_, Reservation>(&format!(
            "{SELECT_COLUMNS} WHERE date >= ?1 ORDER BY date, time, created_at"
        ))
        .bind(from)
        .fetch_all(&self.pool)
        .await?;

        Ok(reservations)
    }

    /// Reservations on one day, by time.
    pub async fn list_by_date(&self, date: NaiveDate) -> DbResult<Vec<Reservation>> {
        let reservations = sqlx::query_as::<_, Reservation>(&format!(
            "{SELECT_COLUMNS} WHERE date = ?1 ORDER BY time, created_at"
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(reservations)
    }

    /// A user's reservations, latest slot first.
    pub async fn list_by_user(&self, user_id: &str, limit: u32) -> DbResult<Vec<Reservation>> {
        let reservations = sqlx::query_as::<_, Reservation>(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ?1 ORDER BY date DESC, time DESC LIMIT ?2"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(reservations)
    }

    /// Number of reservations dated `date`, cancelled ones included.
    pub async fn count_on(&self, date: NaiveDate) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reservations WHERE date = ?1")
            .bind(date)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // -------------------------------------------------------------------------
    // Status
    // -------------------------------------------------------------------------

    /// Sets a reservation's status (staff action). Any status may follow
    /// any other.
    pub async fn set_status(&self, id: &str, status: ReservationStatus) -> DbResult<Reservation> {
        let result = sqlx::query("UPDATE reservations SET status = ?2 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ReservationNotFound(id.to_string()).into());
        }

        info!(reservation_id = %id, status = %status, "Reservation status changed");
        self.get(id).await
    }

    /// Confirms a reservation. Confirming twice is harmless.
    pub async fn confirm(&self, id: &str) -> DbResult<Reservation> {
        self.set_status(id, ReservationStatus::Confirmada).await
    }

    /// Cancels a reservation. It still counts towards its slot.
    pub async fn cancel(&self, id: &str) -> DbResult<Reservation> {
        self.set_status(id, ReservationStatus::Cancelada).await
    }

    /// Cancels a reservation on behalf of its owner, only while PENDIENTE.
    pub async fn cancel_own(&self, user_id: &str, id: &str) -> DbResult<Reservation> {
        let reservation = self.get(id).await?;
        reservation.check_customer_cancel(user_id)?;

        let result = sqlx::query(
            "UPDATE reservations SET status = 'CANCELADA' WHERE id = ?1 AND status = 'PENDIENTE'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        // Lost a race with staff confirming or cancelling it.
        if result.rows_affected() == 0 {
            let current = self.get(id).await?;
            return Err(CoreError::NotCancelable {
                entity: "Reservation".to_string(),
                id: id.to_string(),
                status: current.status.to_string(),
            }
            .into());
        }

        info!(reservation_id = %id, user_id = %user_id, "Reservation cancelled by customer");
        self.get(id).await
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::testing::{file_db, sample_user, test_db};
    use masseria_core::ContactSnapshot;

    fn slot_1900() -> (NaiveDate, NaiveTime) {
        (
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
        )
    }

    fn request(name: &str, date: NaiveDate, time: NaiveTime) -> NewReservation {
        NewReservation {
            contact: ContactSnapshot {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                phone: "987654321".to_string(),
            },
            date,
            time,
            party_size: 4,
            notes: None,
            user_id: None,
        }
    }

    #[tokio::test]
    async fn test_capacity_of_five_per_slot() {
        let db = test_db().await;
        let repo = db.reservations();
        let (date, time) = slot_1900();

        for i in 0..4 {
            repo.create(request(&format!("Guest{i}"), date, time)).await.unwrap();
        }
        assert!(repo.check_availability(date, time).await.unwrap());

        let fifth = repo.create(request("Guest4", date, time)).await.unwrap();
        assert_eq!(fifth.status, ReservationStatus::Pendiente);
        assert!(!repo.check_availability(date, time).await.unwrap());

        let err = repo.create(request("Guest5", date, time)).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::SlotUnavailable { capacity: 5, .. })
        ));
        assert_eq!(repo.occupancy(date, time).await.unwrap(), 5);

        // Neighbouring slot is unaffected.
        let later = NaiveTime::from_hms_opt(20, 0, 0).unwrap();
        assert!(repo.check_availability(date, later).await.unwrap());
    }

    #[tokio::test]
    async fn test_cancelled_reservation_keeps_its_place() {
        let db = test_db().await;
        let repo = db.reservations();
        let (date, time) = slot_1900();

        let mut booked = Vec::new();
        for i in 0..5 {
            booked.push(repo.create(request(&format!("Guest{i}"), date, time)).await.unwrap());
        }
        let cancelled = repo.cancel(&booked[0].id).await.unwrap();
        assert_eq!(cancelled.status, ReservationStatus::Cancelada);

        assert_eq!(repo.occupancy(date, time).await.unwrap(), 5);
        assert!(!repo.check_availability(date, time).await.unwrap());
        let err = repo.create(request("Late", date, time)).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::SlotUnavailable { .. })));

        // Staff may move it back; the slot size does not change.
        let revived = repo.confirm(&booked[0].id).await.unwrap();
        assert_eq!(revived.status, ReservationStatus::Confirmada);
        assert_eq!(repo.occupancy(date, time).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_smaller_capacity_is_honoured() {
        let db = test_db().await.with_slot_capacity(1);
        let repo = db.reservations();
        let (date, time) = slot_1900();

        repo.create(request("Solo", date, time)).await.unwrap();
        assert!(repo.create(request("Second", date, time)).await.is_err());
    }

    #[tokio::test]
    async fn test_confirm_is_idempotent_and_missing_is_not_found() {
        let db = test_db().await;
        let repo = db.reservations();
        let (date, time) = slot_1900();
        let r = repo.create(request("Lucia", date, time)).await.unwrap();

        let confirmed = repo.confirm(&r.id).await.unwrap();
        assert_eq!(confirmed.status, ReservationStatus::Confirmada);
        let again = repo.confirm(&r.id).await.unwrap();
        assert_eq!(again.status, ReservationStatus::Confirmada);

        let err = repo.confirm("missing").await.unwrap_err();
        assert!(err.is_not_found());
        let err = repo.cancel("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_rejects_invalid_requests() {
        let db = test_db().await;
        let repo = db.reservations();
        let (date, time) = slot_1900();

        let mut bad = request("Pedro", date, time);
        bad.party_size = 0;
        assert!(matches!(
            repo.create(bad).await.unwrap_err(),
            DbError::Domain(CoreError::Validation(_))
        ));

        let closed = NaiveTime::from_hms_opt(3, 0, 0).unwrap();
        assert!(matches!(
            repo.create(request("Pedro", date, closed)).await.unwrap_err(),
            DbError::Domain(CoreError::Validation(_))
        ));

        let mut ghost = request("Pedro", date, time);
        ghost.user_id = Some("ghost".to_string());
        assert!(matches!(
            repo.create(ghost).await.unwrap_err(),
            DbError::Domain(CoreError::UserNotFound(_))
        ));

        assert_eq!(repo.occupancy(date, time).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_listing_order_and_customer_cancel() {
        let db = test_db().await;
        let user = sample_user("reserva@example.com");
        db.users().insert(&user).await.unwrap();
        let repo = db.reservations();

        let d1 = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let t13 = NaiveTime::from_hms_opt(13, 0, 0).unwrap();
        let t20 = NaiveTime::from_hms_opt(20, 0, 0).unwrap();

        let mut mine = request("Mia", d2, t13);
        mine.user_id = Some(user.id.clone());
        let mine = repo.create(mine).await.unwrap();
        repo.create(request("Ana", d1, t20)).await.unwrap();
        repo.create(request("Leo", d1, t13)).await.unwrap();

        let upcoming = repo.upcoming(d1).await.unwrap();
        let names: Vec<&str> = upcoming.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Leo", "Ana", "Mia"]);
        assert_eq!(repo.upcoming(d2).await.unwrap().len(), 1);
        assert_eq!(repo.list_by_date(d1).await.unwrap().len(), 2);
        assert_eq!(repo.count_on(d1).await.unwrap(), 2);

        let err = repo.cancel_own("someone-else", &mine.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::NotOwner { .. })));

        let cancelled = repo.cancel_own(&user.id, &mine.id).await.unwrap();
        assert_eq!(cancelled.status, ReservationStatus::Cancelada);
        let err = repo.cancel_own(&user.id, &mine.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::NotCancelable { .. })));

        let history = repo.list_by_user(&user.id, 10).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_bookings_never_exceed_capacity() {
        let file = file_db(8).await;
        let db = file.db.clone();
        let (date, time) = slot_1900();

        let mut handles = Vec::new();
        for i in 0..12 {
            let repo = db.reservations();
            handles.push(tokio::spawn(async move {
                repo.create(request(&format!("Guest{i}"), date, time)).await
            }));
        }

        let mut booked = 0;
        let mut refused = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => booked += 1,
                Err(DbError::Domain(CoreError::SlotUnavailable { capacity: 5, .. })) => refused += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(booked, 5);
        assert_eq!(refused, 7);
        assert_eq!(db.reservations().occupancy(date, time).await.unwrap(), 5);
        assert_eq!(db.reservations().list_by_date(date).await.unwrap().len(), 5);

        db.close().await;
    }
}
