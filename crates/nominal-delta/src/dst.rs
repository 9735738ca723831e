//! DST transition policies.
//!
//! Shifting a zoned timestamp composes a new wall-clock value and maps it
//! back to an instant exactly once. That wall-clock value may not exist (it
//! falls in a spring-forward gap) or may exist twice (it falls in a
//! fall-back fold). A [`DstPolicy`] decides which instant to use.

use chrono::{DateTime, LocalResult, NaiveDateTime, Offset, TimeDelta, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DeltaError, Result};

/// How to resolve a local time that a zone transition skips or repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DstPolicy {
    /// Follow the direction the wall clock moved: [`PreTransition`] when the
    /// shift moved it forward, [`PostTransition`] when it moved it back.
    ///
    /// A shifted timestamp never ends up on the far side of where it started:
    /// 01:59 plus two minutes across a 02:00→03:00 gap is 03:01, and 03:01
    /// minus two minutes is 01:59.
    ///
    /// [`PreTransition`]: DstPolicy::PreTransition
    /// [`PostTransition`]: DstPolicy::PostTransition
    #[default]
    Directional,
    /// Use the offset in force before the transition.
    ///
    /// A repeated time takes its earlier instant; a skipped time is pushed
    /// forward by the length of the gap (02:30 in a 02:00→03:00 gap becomes
    /// 03:30).
    PreTransition,
    /// Use the offset in force after the transition.
    ///
    /// A repeated time takes its later instant; a skipped time is pulled
    /// back by the length of the gap (02:30 becomes 01:30).
    PostTransition,
    /// Fail instead of choosing.
    Reject,
}

impl DstPolicy {
    /// The fixed policy to use for a wall clock moving forward (`true`) or
    /// back. Only [`DstPolicy::Directional`] depends on the direction.
    pub fn toward(self, forward: bool) -> Self {
        match self {
            DstPolicy::Directional if forward => DstPolicy::PreTransition,
            DstPolicy::Directional => DstPolicy::PostTransition,
            fixed => fixed,
        }
    }
}

/// Map a wall-clock value in `tz` to an instant, applying `policy` to gaps
/// and folds. With no direction to follow, [`DstPolicy::Directional`]
/// resolves like [`DstPolicy::PreTransition`].
///
/// # Errors
///
/// Returns [`DeltaError::NonexistentLocalTime`] or
/// [`DeltaError::AmbiguousLocalTime`] under [`DstPolicy::Reject`], and
/// [`DeltaError::OutOfRange`] when the probe for the surrounding offset leaves
/// chrono's supported range.
pub fn resolve_local<T: TimeZone>(
    tz: &T,
    local: NaiveDateTime,
    policy: DstPolicy,
) -> Result<DateTime<T>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, latest) => {
            debug!(%local, ?policy, "local time falls in a fold");
            match policy {
                DstPolicy::Directional | DstPolicy::PreTransition => Ok(earliest),
                DstPolicy::PostTransition => Ok(latest),
                DstPolicy::Reject => Err(DeltaError::AmbiguousLocalTime(local.to_string())),
            }
        }
        LocalResult::None => {
            debug!(%local, ?policy, "local time falls in a gap");
            // Offsets never exceed a day, so a day either side of `local` is
            // clear of the transition that makes it invalid.
            let probe = match policy {
                DstPolicy::Directional | DstPolicy::PreTransition => {
                    local.checked_sub_signed(TimeDelta::days(1))
                }
                DstPolicy::PostTransition => local.checked_add_signed(TimeDelta::days(1)),
                DstPolicy::Reject => {
                    return Err(DeltaError::NonexistentLocalTime(local.to_string()))
                }
            };
            let probe = probe.ok_or_else(|| DeltaError::OutOfRange(local.to_string()))?;
            let offset = tz.offset_from_utc_datetime(&probe).fix();
            let utc = local
                .checked_sub_signed(TimeDelta::seconds(i64::from(offset.local_minus_utc())))
                .ok_or_else(|| DeltaError::OutOfRange(local.to_string()))?;
            Ok(tz.from_utc_datetime(&utc))
        }
    }
}

/// Look up an IANA zone by name (e.g. `"Europe/Berlin"`).
///
/// # Errors
///
/// Returns [`DeltaError::InvalidTimezone`] if the name is not in the bundled
/// time zone database.
pub fn zone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| DeltaError::InvalidTimezone(format!("'{}'", name)))
}
