//! # History Filters
//!
//! Resolves the loosely-specified filters a customer sends for their order
//! and reservation history into concrete date windows.
//!
//! ## Defaulting
//! ```text
//!   explicit from/to, product name or status given?
//!        │
//!        ├── yes → period = all, bounds = what was given (open ends allowed)
//!        └── no  → requested period, or HOY (orders) / PROXIMAS (reservations)
//! ```
//! Nothing is ever rejected for being under-specified. The only hard error
//! is an inverted explicit range.

use chrono::{DateTime, Days, Months, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::{deserialize_parsed, ReservationStatus};
use crate::validation::{validate_date_range, validate_search_query, ValidationResult};

// =============================================================================
// Periods
// =============================================================================

/// Preset windows for order history. Also parsed from the short client names
/// (`hoy`, `7dias`, `1mes`, `todos`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum OrderPeriod {
    Hoy,
    SieteDias,
    UnMes,
    Todos,
}

impl OrderPeriod {
    pub const ALL: [OrderPeriod; 4] = [
        OrderPeriod::Hoy,
        OrderPeriod::SieteDias,
        OrderPeriod::UnMes,
        OrderPeriod::Todos,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderPeriod::Hoy => "HOY",
            OrderPeriod::SieteDias => "SIETE_DIAS",
            OrderPeriod::UnMes => "UN_MES",
            OrderPeriod::Todos => "TODOS",
        }
    }

    /// Inclusive date window for this period, relative to `today`.
    pub fn window(&self, today: NaiveDate) -> DateWindow {
        match self {
            OrderPeriod::Hoy => DateWindow::between(today, today),
            OrderPeriod::SieteDias => {
                DateWindow::between(today.checked_sub_days(Days::new(7)).unwrap_or(today), today)
            }
            OrderPeriod::UnMes => DateWindow::between(
                today.checked_sub_months(Months::new(1)).unwrap_or(today),
                today,
            ),
            OrderPeriod::Todos => DateWindow::unbounded(),
        }
    }
}

impl fmt::Display for OrderPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderPeriod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hoy" => return Ok(OrderPeriod::Hoy),
            "7dias" => return Ok(OrderPeriod::SieteDias),
            "1mes" => return Ok(OrderPeriod::UnMes),
            "todos" => return Ok(OrderPeriod::Todos),
            _ => {}
        }
        OrderPeriod::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "period".to_string(),
                value: s.to_string(),
                allowed: OrderPeriod::ALL.iter().map(|p| p.as_str().to_string()).collect(),
            })
    }
}

impl<'de> Deserialize<'de> for OrderPeriod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_parsed(deserializer)
    }
}

/// Preset windows for reservation history. Parsed case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ReservationPeriod {
    /// Today and later.
    Proximas,
    /// Before today.
    Pasadas,
    Todas,
}

impl ReservationPeriod {
    pub const ALL: [ReservationPeriod; 3] = [
        ReservationPeriod::Proximas,
        ReservationPeriod::Pasadas,
        ReservationPeriod::Todas,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ReservationPeriod::Proximas => "PROXIMAS",
            ReservationPeriod::Pasadas => "PASADAS",
            ReservationPeriod::Todas => "TODAS",
        }
    }

    pub fn window(&self, today: NaiveDate) -> DateWindow {
        match self {
            ReservationPeriod::Proximas => DateWindow {
                start: Some(today),
                end: None,
            },
            ReservationPeriod::Pasadas => DateWindow {
                start: None,
                end: today.pred_opt(),
            },
            ReservationPeriod::Todas => DateWindow::unbounded(),
        }
    }
}

impl FromStr for ReservationPeriod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReservationPeriod::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "period".to_string(),
                value: s.to_string(),
                allowed: ReservationPeriod::ALL
                    .iter()
                    .map(|p| p.as_str().to_string())
                    .collect(),
            })
    }
}

impl<'de> Deserialize<'de> for ReservationPeriod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_parsed(deserializer)
    }
}

// =============================================================================
// Date Window
// =============================================================================

/// An inclusive range of calendar days; either end may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        DateWindow {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn unbounded() -> Self {
        DateWindow::default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }

    /// Converts the window into a half-open `[from, until)` instant range,
    /// taking each calendar day in `tz`.
    pub fn to_utc_bounds<Tz: TimeZone>(
        &self,
        tz: &Tz,
    ) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let from = self.start.and_then(|d| day_start(tz, d));
        let until = self
            .end
            .and_then(|d| d.succ_opt())
            .and_then(|d| day_start(tz, d));
        (from, until)
    }
}

/// The first instant of `date` in `tz`, as UTC.
///
/// On a day whose midnight is skipped by a DST change the earliest valid
/// local time is used.
pub fn day_start<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Utc>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            midnight
                .checked_add_signed(chrono::Duration::hours(1))
                .and_then(|t| tz.from_local_datetime(&t).earliest())
        })
        .map(|dt| dt.with_timezone(&Utc))
}

/// `[midnight, next midnight)` of `date` in `tz`.
pub fn day_bounds<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let (from, until) = DateWindow::between(date, date).to_utc_bounds(tz);
    Some((from?, until?))
}

// =============================================================================
// Queries
// =============================================================================

/// Filters for a user's order history.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderHistoryQuery {
    pub period: Option<OrderPeriod>,
    #[ts(as = "Option<String>")]
    pub from: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub to: Option<NaiveDate>,
    /// Case-insensitive substring of a product name on the order.
    pub product_name: Option<String>,
}

/// The resolved form of [`OrderHistoryQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderHistoryFilter {
    pub window: DateWindow,
    pub product_name: Option<String>,
}

impl OrderHistoryQuery {
    pub fn resolve(&self, today: NaiveDate) -> ValidationResult<OrderHistoryFilter> {
        validate_date_range("date range", self.from, self.to)?;
        let product_name = match self.product_name.as_deref() {
            Some(term) => Some(validate_search_query(term)?).filter(|t| !t.is_empty()),
            None => None,
        };

        let has_filters = self.from.is_some() || self.to.is_some() || product_name.is_some();
        let window = if has_filters {
            DateWindow {
                start: self.from,
                end: self.to,
            }
        } else {
            self.period.unwrap_or(OrderPeriod::Hoy).window(today)
        };

        Ok(OrderHistoryFilter {
            window,
            product_name,
        })
    }
}

/// Filters for a user's reservation history.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReservationHistoryQuery {
    pub period: Option<ReservationPeriod>,
    #[ts(as = "Option<String>")]
    pub from: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub to: Option<NaiveDate>,
    pub status: Option<ReservationStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationHistoryFilter {
    pub window: DateWindow,
    pub status: Option<ReservationStatus>,
}

impl ReservationHistoryQuery {
    pub fn resolve(&self, today: NaiveDate) -> ValidationResult<ReservationHistoryFilter> {
        validate_date_range("date range", self.from, self.to)?;

        let has_filters = self.from.is_some() || self.to.is_some() || self.status.is_some();
        let window = if has_filters {
            DateWindow {
                start: self.from,
                end: self.to,
            }
        } else {
            self.period.unwrap_or(ReservationPeriod::Proximas).window(today)
        };

        Ok(ReservationHistoryFilter {
            window,
            status: self.status,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
