//! Calendar addition: point + delta.
//!
//! The month component is applied first, with month-end clipping, then the
//! day component as a plain ordinal offset. For zoned timestamps the seconds
//! component is added to the wall-clock value, and only then is the result
//! mapped back to an instant, so offset resolution happens exactly once.
//!
//! # Functions
//!
//! - [`add_months_clipped`] — Month arithmetic with month-end clipping
//! - [`shift_date`] — Apply a delta to a date
//! - [`shift_datetime`] / [`shift_datetime_with`] — Apply a delta to a zoned timestamp
//! - [`shift_point`] — Dispatch on a [`CalendarPoint`]

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, TimeZone};

use crate::delta::NominalDelta;
use crate::dst::{resolve_local, DstPolicy};
use crate::error::{DeltaError, Result};
use crate::point::CalendarPoint;

/// Move `date` by `months` calendar months.
///
/// The day-of-month is kept when it exists in the target month and otherwise
/// clipped down to the month's last day: January 31 plus one month is
/// February 28 (29 in a leap year), never March.
///
/// # Errors
///
/// Returns [`DeltaError::OutOfRange`] if the target month is outside chrono's
/// supported years.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use nominal_delta::shift::add_months_clipped;
///
/// let leap_day = NaiveDate::from_ymd_opt(2000, 2, 29).unwrap();
/// let next_year = add_months_clipped(leap_day, 12).unwrap();
/// assert_eq!(next_year, NaiveDate::from_ymd_opt(2001, 2, 28).unwrap());
/// ```
pub fn add_months_clipped(date: NaiveDate, months: i64) -> Result<NaiveDate> {
    let out_of_range = || DeltaError::OutOfRange(format!("{date} + {months} months"));

    // Zero-based month index, so Euclidean division never yields month 0.
    let total = (i64::from(date.year()) * 12 + i64::from(date.month0()))
        .checked_add(months)
        .ok_or_else(out_of_range)?;
    let year = i32::try_from(total.div_euclid(12)).map_err(|_| out_of_range())?;
    let month = total.rem_euclid(12) as u32 + 1;

    (1..=date.day())
        .rev()
        .find_map(|day| NaiveDate::from_ymd_opt(year, month, day))
        .ok_or_else(out_of_range)
}

/// Apply the month and day components of `delta` to `date`.
///
/// The seconds component has no effect on a pure date.
///
/// # Errors
///
/// Returns [`DeltaError::OutOfRange`] if the result is not representable.
pub fn shift_date(date: NaiveDate, delta: &NominalDelta) -> Result<NaiveDate> {
    let clipped = add_months_clipped(date, delta.months())?;
    if delta.days() == 0 {
        return Ok(clipped);
    }
    TimeDelta::try_days(delta.days())
        .and_then(|days| clipped.checked_add_signed(days))
        .ok_or_else(|| DeltaError::OutOfRange(format!("{date} + {delta}")))
}

/// Apply `delta` to a zoned timestamp using [`DstPolicy::Directional`].
///
/// # Errors
///
/// Returns [`DeltaError::OutOfRange`] if the result is not representable.
pub fn shift_datetime<Tz: TimeZone>(
    dt: &DateTime<Tz>,
    delta: &NominalDelta,
) -> Result<DateTime<Tz>> {
    shift_datetime_with(dt, delta, DstPolicy::default())
}

/// Apply `delta` to a zoned timestamp.
///
/// The new date keeps the original local time-of-day, the seconds component
/// is added in wall-clock time, and the resulting local value is resolved in
/// the original zone with `policy`. Two hours added at 01:30 on a night when
/// clocks jump from 02:00 to 03:00 land at 03:30, one hour later in absolute
/// time. [`DstPolicy::Directional`] resolves in the direction the wall clock
/// moved.
///
/// # Errors
///
/// Returns [`DeltaError::OutOfRange`] if the result is not representable, and
/// [`DeltaError::NonexistentLocalTime`] / [`DeltaError::AmbiguousLocalTime`]
/// under [`DstPolicy::Reject`].
pub fn shift_datetime_with<Tz: TimeZone>(
    dt: &DateTime<Tz>,
    delta: &NominalDelta,
    policy: DstPolicy,
) -> Result<DateTime<Tz>> {
    let local = dt.naive_local();
    let date = shift_date(local.date(), delta)?;
    let wall = date
        .and_time(local.time())
        .checked_add_signed(delta.seconds())
        .ok_or_else(|| DeltaError::OutOfRange(format!("{local} + {delta}")))?;

    // An unchanged wall clock keeps its instant, even inside a fold.
    if wall == local {
        return Ok(dt.clone());
    }
    resolve_local(&dt.timezone(), wall, policy.toward(wall > local))
}

/// Apply `delta` to either kind of point.
///
/// # Errors
///
/// See [`shift_date`] and [`shift_datetime_with`].
pub fn shift_point<Tz: TimeZone>(
    point: &CalendarPoint<Tz>,
    delta: &NominalDelta,
    policy: DstPolicy,
) -> Result<CalendarPoint<Tz>> {
    match point {
        CalendarPoint::Date(date) => shift_date(*date, delta).map(CalendarPoint::Date),
        CalendarPoint::DateTime(dt) => {
            shift_datetime_with(dt, delta, policy).map(CalendarPoint::DateTime)
        }
    }
}

impl NominalDelta {
    /// Checked `point + self`.
    ///
    /// # Errors
    ///
    /// Returns [`DeltaError::OutOfRange`] if the result is not representable.
    pub fn add_to_point<Tz: TimeZone>(
        &self,
        point: &CalendarPoint<Tz>,
    ) -> Result<CalendarPoint<Tz>> {
        shift_point(point, self, DstPolicy::default())
    }

    /// Checked `point + self` with an explicit DST policy.
    pub fn add_to_point_with<Tz: TimeZone>(
        &self,
        point: &CalendarPoint<Tz>,
        policy: DstPolicy,
    ) -> Result<CalendarPoint<Tz>> {
        shift_point(point, self, policy)
    }

    /// Checked `point - self`, the same as adding `-self`.
    pub fn subtract_from_point<Tz: TimeZone>(
        &self,
        point: &CalendarPoint<Tz>,
    ) -> Result<CalendarPoint<Tz>> {
        shift_point(point, &-*self, DstPolicy::default())
    }
}

/// A point the diff search can step through.
pub(crate) trait Shift: Sized + PartialOrd {
    fn shifted(&self, delta: &NominalDelta, policy: DstPolicy) -> Result<Self>;

    /// Calendar days from `self`'s local date to `later`'s, both read in
    /// `self`'s zone.
    fn days_until(&self, later: &Self) -> i64;
}

impl Shift for NaiveDate {
    fn shifted(&self, delta: &NominalDelta, _policy: DstPolicy) -> Result<Self> {
        shift_date(*self, delta)
    }

    fn days_until(&self, later: &Self) -> i64 {
        later.signed_duration_since(*self).num_days()
    }
}

impl<Tz: TimeZone> Shift for DateTime<Tz> {
    fn shifted(&self, delta: &NominalDelta, policy: DstPolicy) -> Result<Self> {
        shift_datetime_with(self, delta, policy)
    }

    fn days_until(&self, later: &Self) -> i64 {
        let later = later.with_timezone(&self.timezone()).date_naive();
        later.signed_duration_since(self.date_naive()).num_days()
    }
}
