//! Calendar difference: the nominal delta between two points.
//!
//! For `a <= b` the result `d` is built greedily: as many whole months as fit
//! (`a + d.months <= b`), then as many whole days as fit, then, for zoned
//! timestamps, the sub-day remainder. Timestamps are compared as calendar
//! values in `a`'s zone, and the remainder is chosen so that `a + d == b`
//! whenever `b`'s local time is not repeated by a fold. `a > b` is handled
//! by diffing `(b, a)` and negating, so `diff(a, b) == -diff(b, a)`.
//!
//! The month count is found with an exponential-then-binary search, which
//! takes a logarithmic number of probes even for spans of many centuries.

use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::delta::NominalDelta;
use crate::dst::DstPolicy;
use crate::error::{DeltaError, Result};
use crate::point::CalendarPoint;
use crate::shift::{shift_date, Shift};

/// Options for [`NominalDelta::diff_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    /// Allow a month component in the result. When false, the whole gap is
    /// expressed in days (and seconds).
    pub allow_months: bool,
    /// How intermediate timestamps that land in a DST gap or fold resolve.
    pub dst_policy: DstPolicy,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            allow_months: true,
            dst_policy: DstPolicy::default(),
        }
    }
}

impl NominalDelta {
    /// The nominal delta from `a` to `b`, with default [`DiffOptions`].
    ///
    /// # Errors
    ///
    /// Returns [`DeltaError::MismatchedPoints`] if one point is a date and the
    /// other a timestamp.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use nominal_delta::{CalendarPoint, NominalDelta};
    ///
    /// let a: CalendarPoint = Utc.with_ymd_and_hms(2003, 1, 31, 23, 59, 59).unwrap().into();
    /// let b: CalendarPoint = Utc.with_ymd_and_hms(2003, 3, 1, 0, 0, 0).unwrap().into();
    /// let delta = NominalDelta::diff(&a, &b).unwrap();
    /// assert_eq!(delta, NominalDelta::builder().months(1).seconds(1).build());
    /// ```
    pub fn diff<Tz: TimeZone>(a: &CalendarPoint<Tz>, b: &CalendarPoint<Tz>) -> Result<Self> {
        Self::diff_with(a, b, &DiffOptions::default())
    }

    /// The nominal delta from `a` to `b`.
    ///
    /// # Errors
    ///
    /// Returns [`DeltaError::MismatchedPoints`] if one point is a date and the
    /// other a timestamp, and propagates errors from the intermediate shifts
    /// (only possible under [`DstPolicy::Reject`]).
    pub fn diff_with<Tz: TimeZone>(
        a: &CalendarPoint<Tz>,
        b: &CalendarPoint<Tz>,
        options: &DiffOptions,
    ) -> Result<Self> {
        match (a, b) {
            (CalendarPoint::Date(a), CalendarPoint::Date(b)) => diff_dates(*a, *b, options),
            (CalendarPoint::DateTime(a), CalendarPoint::DateTime(b)) => {
                diff_datetimes(a, b, options)
            }
            _ => Err(DeltaError::MismatchedPoints {
                left: a.kind(),
                right: b.kind(),
            }),
        }
    }
}

/// The nominal delta (months and days) from date `a` to date `b`.
///
/// # Errors
///
/// Never fails for dates chrono can represent; the `Result` mirrors
/// [`diff_datetimes`].
pub fn diff_dates(a: NaiveDate, b: NaiveDate, options: &DiffOptions) -> Result<NominalDelta> {
    if a > b {
        return diff_dates(b, a, options).map(|delta| -delta);
    }
    let months = month_span(&a, &b, options)?;
    let reached = a.shifted(&months_delta(months), options.dst_policy)?;
    let delta = NominalDelta::new(months, reached.days_until(&b), TimeDelta::zero());
    trace!(%a, %b, %delta, "diffed dates");
    Ok(delta)
}

/// The nominal delta from timestamp `a` to timestamp `b`.
///
/// The day count is the largest one that keeps `a + d <= b`. The seconds
/// component is the wall-clock time left, measured in `a`'s zone, so that
/// adding `d` back to `a` lands on `b`. When a DST transition between the two
/// makes that remainder miss `b` or reach a full day, the absolute time left
/// is used instead. For `a <= b` the remainder is never negative.
///
/// # Errors
///
/// Propagates errors from the intermediate shifts, which only happen under
/// [`DstPolicy::Reject`].
pub fn diff_datetimes<Tz: TimeZone>(
    a: &DateTime<Tz>,
    b: &DateTime<Tz>,
    options: &DiffOptions,
) -> Result<NominalDelta> {
    if a > b {
        return diff_datetimes(b, a, options).map(|delta| -delta);
    }
    let policy = options.dst_policy;
    let months = month_span(a, b, options)?;
    let reached = a.shifted(&months_delta(months), policy)?;
    let mut whole = NominalDelta::new(months, reached.days_until(b), TimeDelta::zero());

    // Local dates can be a day off either way from what fits: the day step
    // keeps `a`'s time-of-day, and gaps move the result.
    while whole.days() > 0 && !fits(a, &whole, b, policy)? {
        debug!(%whole, "day step overshoots; giving one day back");
        whole -= one_day();
    }
    while fits(a, &(whole + one_day()), b, policy)? {
        debug!(%whole, "day step falls short; taking one more day");
        whole += one_day();
    }

    let local = a.naive_local();
    let start = shift_date(local.date(), &whole)?.and_time(local.time());
    let wall = b
        .with_timezone(&a.timezone())
        .naive_local()
        .signed_duration_since(start);
    let absolute = b.clone().signed_duration_since(a.shifted(&whole, policy)?);

    let lands_on_b = |residual: TimeDelta| {
        let delta = whole + NominalDelta::new(0, 0, residual);
        matches!(a.shifted(&delta, policy), Ok(end) if end == *b)
    };
    let sub_day = |residual: TimeDelta| {
        residual >= TimeDelta::zero() && residual < TimeDelta::days(1)
    };
    let residual = [wall, absolute]
        .into_iter()
        .find(|&r| lands_on_b(r) && sub_day(r))
        .or_else(|| [wall, absolute].into_iter().find(|&r| lands_on_b(r)))
        .unwrap_or(absolute);
    if residual != wall {
        debug!(%wall, %absolute, "wall-clock remainder misses; using absolute time");
    }

    let delta = whole + NominalDelta::new(0, 0, residual);
    trace!(%delta, "diffed timestamps");
    Ok(delta)
}

fn months_delta(months: i64) -> NominalDelta {
    NominalDelta::new(months, 0, TimeDelta::zero())
}

fn one_day() -> NominalDelta {
    NominalDelta::new(0, 1, TimeDelta::zero())
}

/// Whether `a + delta <= b`. Beyond the representable range is beyond `b`.
fn fits<P: Shift>(a: &P, delta: &NominalDelta, b: &P, policy: DstPolicy) -> Result<bool> {
    match a.shifted(delta, policy) {
        Ok(end) => Ok(end <= *b),
        Err(DeltaError::OutOfRange(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Largest `k` with `a + k months <= b`, for `a <= b`.
fn month_span<P: Shift>(a: &P, b: &P, options: &DiffOptions) -> Result<i64> {
    if !options.allow_months {
        return Ok(0);
    }
    let months_fit = |k: i64| fits(a, &months_delta(k), b, options.dst_policy);

    if !months_fit(1)? {
        return Ok(0);
    }
    let (mut lower, mut upper) = (1_i64, 2_i64);
    while months_fit(upper)? {
        lower = upper;
        upper = upper.saturating_mul(2);
        trace!(lower, upper, "widening month bracket");
    }
    while lower + 1 < upper {
        let mid = lower + (upper - lower) / 2;
        if months_fit(mid)? {
            lower = mid;
        } else {
            upper = mid;
        }
    }
    trace!(months = lower, "month search converged");
    Ok(lower)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dst::zone;
    use crate::point::PointKind;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn opts() -> DiffOptions {
        DiffOptions::default()
    }

    // ── dates ───────────────────────────────────────────────────────────

    #[test]
    fn test_diff_dates_one_month() {
        let d = diff_dates(date(1970, 1, 15), date(1970, 2, 15), &opts()).unwrap();
        assert_eq!(d, NominalDelta::builder().months(1).build());
    }

    #[test]
    fn test_diff_dates_negative() {
        let d = diff_dates(date(1970, 2, 15), date(1970, 1, 15), &opts()).unwrap();
        assert_eq!(d, NominalDelta::builder().months(-1).build());
    }

    #[test]
    fn test_diff_dates_one_day() {
        let d = diff_dates(date(1970, 1, 15), date(1970, 1, 16), &opts()).unwrap();
        assert_eq!(d, NominalDelta::builder().days(1).build());
    }

    #[test]
    fn test_diff_dates_equal_is_zero() {
        let d = diff_dates(date(1970, 1, 15), date(1970, 1, 15), &opts()).unwrap();
        assert!(d.is_zero());
    }

    #[test]
    fn test_diff_dates_millennium() {
        let d = diff_dates(date(1000, 1, 1), date(2000, 1, 1), &opts()).unwrap();
        assert_eq!(d, NominalDelta::builder().months(12_000).build());
    }

    #[test]
    fn test_diff_dates_less_than_a_month_skips_search() {
        // Jan 31 + 1 month = Feb 28 > Feb 27
        let d = diff_dates(date(2021, 1, 31), date(2021, 2, 27), &opts()).unwrap();
        assert_eq!(d, NominalDelta::builder().days(27).build());
    }

    #[test]
    fn test_diff_dates_clipped_month() {
        let d = diff_dates(date(2021, 1, 31), date(2021, 3, 1), &opts()).unwrap();
        assert_eq!(d, NominalDelta::builder().months(1).days(1).build());
    }

    #[test]
    fn test_diff_dates_without_months() {
        let options = DiffOptions {
            allow_months: false,
            ..DiffOptions::default()
        };
        let d = diff_dates(date(2021, 1, 15), date(2021, 3, 20), &options).unwrap();
        assert_eq!(d, NominalDelta::builder().days(64).build());
    }

    #[test]
    fn test_diff_dates_near_range_limit() {
        let a = NaiveDate::MIN;
        let b = NaiveDate::MAX;
        let d = diff_dates(a, b, &opts()).unwrap();
        assert_eq!(a + d, b);
    }

    // ── timestamps ──────────────────────────────────────────────────────

    #[test]
    fn test_diff_datetimes_components() {
        let a = utc(2001, 1, 1, 0, 0, 0);
        let b = utc(2003, 9, 17, 20, 54, 47);
        let expected = NominalDelta::builder()
            .years(2)
            .months(8)
            .days(16)
            .hours(20)
            .minutes(54)
            .seconds(47)
            .build();
        assert_eq!(diff_datetimes(&a, &b, &opts()).unwrap(), expected);
    }

    #[test]
    fn test_diff_datetimes_sub_day() {
        let a = utc(1970, 1, 30, 13, 0, 0);
        assert_eq!(
            diff_datetimes(&a, &utc(1970, 1, 30, 15, 0, 0), &opts()).unwrap(),
            NominalDelta::builder().hours(2).build()
        );
        assert_eq!(
            diff_datetimes(&a, &utc(1970, 1, 30, 13, 1, 20), &opts()).unwrap(),
            NominalDelta::builder().seconds(80).build()
        );
    }

    #[test]
    fn test_diff_datetimes_clipped_month() {
        let a = utc(1970, 1, 30, 13, 0, 0);
        let b = utc(1970, 2, 28, 13, 0, 0);
        assert_eq!(
            diff_datetimes(&a, &b, &opts()).unwrap(),
            NominalDelta::builder().months(1).build()
        );
    }

    #[test]
    fn test_diff_full_month_gives_back_day() {
        let a = utc(2003, 1, 31, 23, 59, 59);
        let b = utc(2003, 3, 1, 0, 0, 0);
        assert_eq!(
            diff_datetimes(&a, &b, &opts()).unwrap(),
            NominalDelta::builder().months(1).seconds(1).build()
        );
        assert_eq!(
            diff_datetimes(&b, &a, &opts()).unwrap(),
            NominalDelta::builder().months(-1).seconds(-1).build()
        );
    }

    #[test]
    fn test_diff_full_month_leap_year() {
        let a = utc(2004, 1, 31, 23, 59, 59);
        let b = utc(2004, 3, 1, 0, 0, 0);
        assert_eq!(
            diff_datetimes(&a, &b, &opts()).unwrap(),
            NominalDelta::builder().months(1).seconds(1).build()
        );
    }

    #[test]
    fn test_diff_datetimes_across_spring_forward_is_one_day() {
        let tz = zone("Europe/Berlin").unwrap();
        let a = tz.with_ymd_and_hms(2019, 3, 30, 12, 0, 0).unwrap();
        let b = tz.with_ymd_and_hms(2019, 3, 31, 12, 0, 0).unwrap();
        assert_eq!(
            diff_datetimes(&a, &b, &opts()).unwrap(),
            NominalDelta::builder().days(1).build()
        );
    }

    #[test]
    fn test_diff_datetimes_mixed_fixed_offsets() {
        use chrono::FixedOffset;
        let east = FixedOffset::east_opt(10 * 3600).unwrap();
        let west = FixedOffset::west_opt(10 * 3600).unwrap();
        // 2021-01-01 15:00 UTC → 2021-01-01 20:00 UTC
        let a = east.with_ymd_and_hms(2021, 1, 2, 1, 0, 0).unwrap();
        let b = west.with_ymd_and_hms(2021, 1, 1, 10, 0, 0).unwrap();
        assert!(a <= b);

        let d = diff_datetimes(&a, &b, &opts()).unwrap();
        assert_eq!(d, NominalDelta::builder().hours(5).build());
        assert_eq!(a + d, b);
        assert_eq!(diff_datetimes(&b, &a, &opts()).unwrap(), -d);
    }

    #[test]
    fn test_diff_datetimes_mixed_fixed_offsets_over_days() {
        use chrono::FixedOffset;
        let east = FixedOffset::east_opt(14 * 3600).unwrap();
        let west = FixedOffset::west_opt(12 * 3600).unwrap();
        let a = east.with_ymd_and_hms(2021, 3, 1, 23, 0, 0).unwrap();
        let b = west.with_ymd_and_hms(2021, 3, 3, 1, 0, 0).unwrap();

        let d = diff_datetimes(&a, &b, &opts()).unwrap();
        assert!(d.days() >= 0);
        assert!(d.seconds() >= TimeDelta::zero() && d.seconds() < TimeDelta::days(1));
        assert_eq!(a + d, b);
    }

    #[test]
    fn test_diff_datetimes_remainder_is_wall_clock() {
        // Berlin skips 02:00-03:00 on 2019-03-31: three wall-clock hours,
        // two hours of absolute time.
        let tz = zone("Europe/Berlin").unwrap();
        let a = tz.with_ymd_and_hms(2019, 3, 31, 1, 0, 0).unwrap();
        let b = tz.with_ymd_and_hms(2019, 3, 31, 4, 0, 0).unwrap();
        let d = diff_datetimes(&a, &b, &opts()).unwrap();
        assert_eq!(d, NominalDelta::builder().hours(3).build());
        assert_eq!(a + d, b);
    }

    #[test]
    fn test_diff_datetimes_remainder_falls_back_near_gap() {
        // A day after 02:30 is inside the gap and resolves past `b`, so no
        // whole day fits; the wall-clock remainder would be over a day.
        let tz = zone("Europe/Berlin").unwrap();
        let a = tz.with_ymd_and_hms(2019, 3, 30, 2, 30, 0).unwrap();
        let b = tz.with_ymd_and_hms(2019, 3, 31, 3, 10, 0).unwrap();
        let d = diff_datetimes(&a, &b, &opts()).unwrap();
        assert_eq!(d, NominalDelta::builder().hours(23).minutes(40).build());
        assert_eq!(a + d, b);
    }

    #[test]
    fn test_diff_datetimes_without_months() {
        let options = DiffOptions {
            allow_months: false,
            ..DiffOptions::default()
        };
        let a = utc(2021, 1, 1, 6, 0, 0);
        let b = utc(2021, 2, 1, 5, 0, 0);
        assert_eq!(
            diff_datetimes(&a, &b, &options).unwrap(),
            NominalDelta::builder().days(30).hours(23).build()
        );
    }

    // ── tagged points ───────────────────────────────────────────────────

    #[test]
    fn test_diff_rejects_mixed_points() {
        let d: CalendarPoint = date(2018, 1, 2).into();
        let t: CalendarPoint = utc(2018, 1, 1, 0, 0, 0).into();
        assert_eq!(
            NominalDelta::diff(&d, &t).unwrap_err(),
            DeltaError::MismatchedPoints {
                left: PointKind::Date,
                right: PointKind::DateTime,
            }
        );
        assert!(NominalDelta::diff(&t, &d).is_err());
    }

    #[test]
    fn test_diff_dispatches_on_variant() {
        let a: CalendarPoint = date(2020, 1, 1).into();
        let b: CalendarPoint = date(2021, 2, 3).into();
        assert_eq!(
            NominalDelta::diff(&a, &b).unwrap(),
            NominalDelta::builder().years(1).months(1).days(2).build()
        );
    }

    #[test]
    fn test_diff_options_from_json() {
        let options: DiffOptions = serde_json::from_str(r#"{"allow_months": false}"#).unwrap();
        assert!(!options.allow_months);
        assert_eq!(options.dst_policy, DstPolicy::Directional);

        let options: DiffOptions = serde_json::from_str(r#"{"dst_policy": "reject"}"#).unwrap();
        assert!(options.allow_months);
        assert_eq!(options.dst_policy, DstPolicy::Reject);
    }
}
