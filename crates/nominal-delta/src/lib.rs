//! # nominal-delta
//!
//! Calendar-aware time deltas.
//!
//! A [`NominalDelta`] is a span of months, days and seconds that means what a
//! person means by "one month and two days": adding it to a date respects
//! month lengths and leap years, and adding it to a zoned timestamp respects
//! DST transitions. [`NominalDelta::diff`] goes the other way and breaks the
//! gap between two points into years, months, days, hours, minutes and
//! seconds.
//!
//! ## Modules
//!
//! - [`delta`] — The `NominalDelta` value type, its builder and validated construction
//! - [`point`] — `CalendarPoint`: a date or a zoned timestamp, plus operators
//! - [`shift`] — Point + delta, with month-end clipping
//! - [`diff`] — Nominal delta between two points
//! - [`dst`] — DST transition policies (gap/fold resolution)
//! - [`error`] — Error types
//!
//! ## Example
//!
//! ```
//! use chrono::{NaiveDate, TimeZone};
//! use nominal_delta::{zone, NominalDelta};
//!
//! let one_month = NominalDelta::builder().months(1).build();
//! let jan31 = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
//! assert_eq!(jan31 + one_month, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
//!
//! // 01:59 + 2 minutes on the night Berlin skips 02:00–03:00.
//! let berlin = zone("Europe/Berlin").unwrap();
//! let before = berlin.with_ymd_and_hms(2019, 3, 31, 1, 59, 0).unwrap();
//! let after = before + NominalDelta::builder().minutes(2).build();
//! assert_eq!(after, berlin.with_ymd_and_hms(2019, 3, 31, 3, 1, 0).unwrap());
//! ```

pub mod delta;
pub mod diff;
pub mod dst;
pub mod error;
pub mod point;
pub mod shift;

pub use delta::{Components, DeltaBuilder, NominalDelta};
pub use diff::{diff_dates, diff_datetimes, DiffOptions};
pub use dst::{resolve_local, zone, DstPolicy};
pub use error::DeltaError;
pub use point::{CalendarPoint, PointKind};
pub use shift::{add_months_clipped, shift_date, shift_datetime, shift_datetime_with, shift_point};
