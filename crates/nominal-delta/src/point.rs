//! Calendar points: the values a [`NominalDelta`] shifts and diffs.
//!
//! A point is either a pure date or a zoned timestamp. The variant is fixed
//! when the point is built; the engine never inspects a value to guess which
//! one it is. Operators are provided for both the tagged [`CalendarPoint`]
//! and the bare chrono types, in either operand order for addition.

use std::fmt;
use std::ops::{Add, Sub};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::delta::NominalDelta;
use crate::dst::DstPolicy;
use crate::shift::{shift_date, shift_datetime_with, shift_point};

/// Which variant a [`CalendarPoint`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PointKind {
    Date,
    DateTime,
}

impl fmt::Display for PointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointKind::Date => f.write_str("date"),
            PointKind::DateTime => f.write_str("datetime"),
        }
    }
}

/// A date or a zoned timestamp.
///
/// `Tz` is any chrono time zone: `Utc`, `FixedOffset`, or an IANA zone from
/// `chrono-tz`. The zone is only ever queried, never changed.
#[derive(Debug, Clone)]
pub enum CalendarPoint<Tz: TimeZone = Utc> {
    Date(NaiveDate),
    DateTime(DateTime<Tz>),
}

impl<Tz: TimeZone> CalendarPoint<Tz> {
    pub fn kind(&self) -> PointKind {
        match self {
            CalendarPoint::Date(_) => PointKind::Date,
            CalendarPoint::DateTime(_) => PointKind::DateTime,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CalendarPoint::Date(date) => Some(*date),
            CalendarPoint::DateTime(_) => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<Tz>> {
        match self {
            CalendarPoint::Date(_) => None,
            CalendarPoint::DateTime(dt) => Some(dt),
        }
    }
}

impl<Tz: TimeZone> PartialEq for CalendarPoint<Tz> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CalendarPoint::Date(a), CalendarPoint::Date(b)) => a == b,
            (CalendarPoint::DateTime(a), CalendarPoint::DateTime(b)) => a == b,
            _ => false,
        }
    }
}

impl<Tz: TimeZone> From<NaiveDate> for CalendarPoint<Tz> {
    fn from(date: NaiveDate) -> Self {
        CalendarPoint::Date(date)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for CalendarPoint<Tz> {
    fn from(dt: DateTime<Tz>) -> Self {
        CalendarPoint::DateTime(dt)
    }
}

// ── Operators ───────────────────────────────────────────────────────────────
//
// These panic when the result leaves chrono's supported range, as chrono's
// own `NaiveDate + Months` does. The checked forms live in `shift`.

/// # Panics
///
/// Panics if the resulting date is out of range.
impl Add<NominalDelta> for NaiveDate {
    type Output = NaiveDate;

    fn add(self, delta: NominalDelta) -> NaiveDate {
        shift_date(self, &delta).expect("`NaiveDate + NominalDelta` out of range")
    }
}

impl Sub<NominalDelta> for NaiveDate {
    type Output = NaiveDate;

    fn sub(self, delta: NominalDelta) -> NaiveDate {
        self + -delta
    }
}

impl Add<NaiveDate> for NominalDelta {
    type Output = NaiveDate;

    fn add(self, date: NaiveDate) -> NaiveDate {
        date + self
    }
}

/// Resolves skipped or repeated local times with [`DstPolicy::Directional`].
///
/// # Panics
///
/// Panics if the resulting timestamp is out of range.
impl<Tz: TimeZone> Add<NominalDelta> for DateTime<Tz> {
    type Output = DateTime<Tz>;

    fn add(self, delta: NominalDelta) -> DateTime<Tz> {
        shift_datetime_with(&self, &delta, DstPolicy::default())
            .expect("`DateTime + NominalDelta` out of range")
    }
}

impl<Tz: TimeZone> Sub<NominalDelta> for DateTime<Tz> {
    type Output = DateTime<Tz>;

    fn sub(self, delta: NominalDelta) -> DateTime<Tz> {
        self + -delta
    }
}

impl<Tz: TimeZone> Add<DateTime<Tz>> for NominalDelta {
    type Output = DateTime<Tz>;

    fn add(self, dt: DateTime<Tz>) -> DateTime<Tz> {
        dt + self
    }
}

impl<Tz: TimeZone> Add<NominalDelta> for CalendarPoint<Tz> {
    type Output = CalendarPoint<Tz>;

    fn add(self, delta: NominalDelta) -> CalendarPoint<Tz> {
        shift_point(&self, &delta, DstPolicy::default())
            .expect("`CalendarPoint + NominalDelta` out of range")
    }
}

impl<Tz: TimeZone> Sub<NominalDelta> for CalendarPoint<Tz> {
    type Output = CalendarPoint<Tz>;

    fn sub(self, delta: NominalDelta) -> CalendarPoint<Tz> {
        self + -delta
    }
}

impl<Tz: TimeZone> Add<CalendarPoint<Tz>> for NominalDelta {
    type Output = CalendarPoint<Tz>;

    fn add(self, point: CalendarPoint<Tz>) -> CalendarPoint<Tz> {
        point + self
    }
}
