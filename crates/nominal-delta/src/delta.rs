//! The [`NominalDelta`] value type.
//!
//! A nominal delta is a span measured on the calendar rather than on the
//! clock: "one month" is 28 to 31 days depending on where it is applied, and
//! "one day" may be 23 or 25 hours across a DST transition. The value keeps
//! three independent fields and never converts between them:
//!
//! - `months` — years are folded in as `years * 12`
//! - `days` — weeks are folded in as `weeks * 7`
//! - `seconds` — hours and minutes are folded in, with nanosecond precision
//!
//! Two deltas are equal only when all three fields are equal, so
//! `days = 365` is not the same delta as `years = 1`.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use chrono::TimeDelta;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{DeltaError, Result};

const SECS_PER_MINUTE: i64 = 60;
const SECS_PER_HOUR: i64 = 3600;
const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Largest magnitude an `f64` carries without losing integer precision (2^53).
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

// ── NominalDelta ────────────────────────────────────────────────────────────

/// A calendar-relative span of months, days and seconds.
///
/// Build one with [`NominalDelta::builder`], from already-normalized parts
/// with [`NominalDelta::new`], or from dynamically-typed input with
/// [`Components`] (which is also what deserialization goes through).
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use nominal_delta::NominalDelta;
///
/// let delta = NominalDelta::builder().months(1).build();
/// let jan31 = NaiveDate::from_ymd_opt(2021, 1, 31).unwrap();
/// // Month-end clipping: there is no February 31st.
/// assert_eq!(jan31 + delta, NaiveDate::from_ymd_opt(2021, 2, 28).unwrap());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "Components")]
pub struct NominalDelta {
    months: i64,
    days: i64,
    seconds: TimeDelta,
}

impl NominalDelta {
    /// The empty delta, identity for addition.
    pub const ZERO: Self = Self {
        months: 0,
        days: 0,
        seconds: TimeDelta::zero(),
    };

    /// Create a delta from already-normalized fields.
    pub const fn new(months: i64, days: i64, seconds: TimeDelta) -> Self {
        Self {
            months,
            days,
            seconds,
        }
    }

    /// Start building a delta from named quantities, all defaulting to zero.
    pub fn builder() -> DeltaBuilder {
        DeltaBuilder::default()
    }

    /// Total months, including folded years.
    pub fn months(&self) -> i64 {
        self.months
    }

    /// Total days, including folded weeks.
    pub fn days(&self) -> i64 {
        self.days
    }

    /// Sub-day part, including folded hours and minutes.
    pub fn seconds(&self) -> TimeDelta {
        self.seconds
    }

    /// The sub-day part as (possibly fractional) seconds.
    pub fn seconds_f64(&self) -> f64 {
        self.seconds.num_seconds() as f64 + f64::from(self.seconds.subsec_nanos()) / NANOS_PER_SEC
    }

    /// True when every field is zero.
    pub fn is_zero(&self) -> bool {
        self.months == 0 && self.days == 0 && self.seconds.is_zero()
    }

    /// Scale every field by `factor`.
    ///
    /// # Errors
    ///
    /// Returns [`DeltaError::OutOfRange`] if a field overflows.
    pub fn checked_scale(self, factor: i64) -> Result<Self> {
        let overflow = || DeltaError::OutOfRange(format!("{self} * {factor}"));
        let months = self.months.checked_mul(factor).ok_or_else(overflow)?;
        let days = self.days.checked_mul(factor).ok_or_else(overflow)?;
        let seconds = self
            .seconds
            .num_seconds()
            .checked_mul(factor)
            .and_then(TimeDelta::try_seconds)
            .zip(i64::from(self.seconds.subsec_nanos()).checked_mul(factor))
            .and_then(|(whole, nanos)| whole.checked_add(&TimeDelta::nanoseconds(nanos)))
            .ok_or_else(overflow)?;
        Ok(Self {
            months,
            days,
            seconds,
        })
    }

    /// Scale by a real-valued factor that must be integral.
    ///
    /// # Errors
    ///
    /// Returns [`DeltaError::NonIntegralFactor`] for fractional, non-finite
    /// or imprecisely large factors, and [`DeltaError::OutOfRange`] if a
    /// field overflows.
    pub fn try_scale(self, factor: f64) -> Result<Self> {
        if factor.is_finite() && factor.fract() == 0.0 && factor.abs() <= MAX_EXACT_INTEGER {
            self.checked_scale(factor as i64)
        } else {
            Err(DeltaError::NonIntegralFactor(factor))
        }
    }
}

// ── Operators ───────────────────────────────────────────────────────────────

impl Add for NominalDelta {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            months: self.months + rhs.months,
            days: self.days + rhs.days,
            seconds: self.seconds + rhs.seconds,
        }
    }
}

impl Sub for NominalDelta {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            months: self.months - rhs.months,
            days: self.days - rhs.days,
            seconds: self.seconds - rhs.seconds,
        }
    }
}

impl AddAssign for NominalDelta {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for NominalDelta {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for NominalDelta {
    type Output = Self;

    fn neg(self) -> Self {
        Self::ZERO - self
    }
}

/// # Panics
///
/// Panics if a field overflows. See [`NominalDelta::checked_scale`].
impl Mul<i64> for NominalDelta {
    type Output = Self;

    fn mul(self, factor: i64) -> Self {
        self.checked_scale(factor).expect("`NominalDelta * i64` overflowed")
    }
}

impl Mul<NominalDelta> for i64 {
    type Output = NominalDelta;

    fn mul(self, delta: NominalDelta) -> NominalDelta {
        delta * self
    }
}

impl Sum for NominalDelta {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |total, delta| total + delta)
    }
}

impl fmt::Display for NominalDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NominalDelta(months={}, days={}, seconds=",
            self.months, self.days
        )?;
        if self.seconds.subsec_nanos() == 0 {
            write!(f, "{}", self.seconds.num_seconds())?;
        } else {
            write!(f, "{}", self.seconds_f64())?;
        }
        f.write_str(")")
    }
}

// ── Builder ─────────────────────────────────────────────────────────────────

/// Accumulates named quantities into a [`NominalDelta`].
///
/// Each setter adds to the running total, so `.weeks(2).days(-1)` is 13 days.
/// Quantities are `i64`, which keeps every component but the sub-second part
/// integral by construction.
#[derive(Debug, Clone, Copy, Default)]
#[must_use]
pub struct DeltaBuilder {
    months: i64,
    days: i64,
    seconds: TimeDelta,
}

impl DeltaBuilder {
    pub fn years(mut self, years: i64) -> Self {
        self.months += years * 12;
        self
    }

    pub fn months(mut self, months: i64) -> Self {
        self.months += months;
        self
    }

    pub fn weeks(mut self, weeks: i64) -> Self {
        self.days += weeks * 7;
        self
    }

    pub fn days(mut self, days: i64) -> Self {
        self.days += days;
        self
    }

    pub fn hours(mut self, hours: i64) -> Self {
        self.seconds += TimeDelta::seconds(hours * SECS_PER_HOUR);
        self
    }

    pub fn minutes(mut self, minutes: i64) -> Self {
        self.seconds += TimeDelta::seconds(minutes * SECS_PER_MINUTE);
        self
    }

    pub fn seconds(mut self, seconds: i64) -> Self {
        self.seconds += TimeDelta::seconds(seconds);
        self
    }

    pub fn milliseconds(mut self, milliseconds: i64) -> Self {
        self.seconds += TimeDelta::milliseconds(milliseconds);
        self
    }

    pub fn nanoseconds(mut self, nanoseconds: i64) -> Self {
        self.seconds += TimeDelta::nanoseconds(nanoseconds);
        self
    }

    /// Add an arbitrary sub-day span.
    pub fn time(mut self, time: TimeDelta) -> Self {
        self.seconds += time;
        self
    }

    pub fn build(self) -> NominalDelta {
        NominalDelta::new(self.months, self.days, self.seconds)
    }
}

// ── Dynamic construction ────────────────────────────────────────────────────

/// Named quantities as plain numbers, for input that is not typed ahead of
/// time (JSON payloads, scripting bridges).
///
/// Converting to a [`NominalDelta`] checks that every field except `seconds`
/// is integral. Unknown field names are rejected on deserialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Components {
    pub years: f64,
    pub months: f64,
    pub weeks: f64,
    pub days: f64,
    pub hours: f64,
    pub minutes: f64,
    pub seconds: f64,
}

impl TryFrom<Components> for NominalDelta {
    type Error = DeltaError;

    fn try_from(c: Components) -> Result<Self> {
        let years = integral("years", c.years)?;
        let months = integral("months", c.months)?;
        let weeks = integral("weeks", c.weeks)?;
        let days = integral("days", c.days)?;
        let hours = integral("hours", c.hours)?;
        let minutes = integral("minutes", c.minutes)?;

        // Bounded by 2^53 per field, so these cannot overflow i64.
        let months = years * 12 + months;
        let days = weeks * 7 + days;

        let whole = i128::from(hours) * i128::from(SECS_PER_HOUR)
            + i128::from(minutes) * i128::from(SECS_PER_MINUTE);
        let whole = i64::try_from(whole)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(|| {
                DeltaError::InvalidSeconds(format!("{hours} hours and {minutes} minutes"))
            })?;
        let seconds = whole
            .checked_add(&seconds_from_f64(c.seconds)?)
            .ok_or_else(|| DeltaError::InvalidSeconds(format!("total exceeds range: {c:?}")))?;

        Ok(Self::new(months, days, seconds))
    }
}

fn integral(field: &'static str, value: f64) -> Result<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGER {
        Ok(value as i64)
    } else {
        Err(DeltaError::NonIntegral { field, value })
    }
}

fn seconds_from_f64(value: f64) -> Result<TimeDelta> {
    if !value.is_finite() {
        return Err(DeltaError::InvalidSeconds(value.to_string()));
    }
    let whole = value.trunc();
    let nanos = ((value - whole) * NANOS_PER_SEC).round() as i64;
    TimeDelta::try_seconds(whole as i64)
        .and_then(|secs| secs.checked_add(&TimeDelta::nanoseconds(nanos)))
        .ok_or_else(|| DeltaError::InvalidSeconds(value.to_string()))
}

/// Wire form: the normalized triple, seconds as a number.
#[derive(Serialize)]
struct Normalized {
    months: i64,
    days: i64,
    seconds: f64,
}

impl Serialize for NominalDelta {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        Normalized {
            months: self.months,
            days: self.days,
            seconds: self.seconds_f64(),
        }
        .serialize(serializer)
    }
}
