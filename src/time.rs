use std::convert::TryFrom;
use std::fmt::Debug;
use std::time::Duration;

use chrono::Utc;

use crate::DEFAULT_BUCKET_WIDTH;

/// Source of the current Unix time in seconds.
///
/// The interceptor reads the clock exactly once per request, so the
/// timestamp header and the signed bucket can never disagree.
pub trait Clock: Debug + Send + Sync + 'static {
    /// Current Unix time, in whole seconds.
    fn now(&self) -> i64;
}

/// The system wall clock.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// A clock stuck at a fixed instant.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}

/// Rounds `now` down to the start of its bucket.
///
/// Rounds towards negative infinity, so instants before the epoch still land
/// on the bucket that contains them. Returns `None` when that bucket would
/// start before `i64::MIN`.
pub fn bucket(now: i64, width: i64) -> Option<i64> {
    let width = width.max(1);
    now.checked_sub(now.rem_euclid(width))
}

/// Rounds `now` down to the start of its 60 second bucket.
pub fn default_bucket(now: i64) -> Option<i64> {
    bucket(now, DEFAULT_BUCKET_WIDTH)
}

/// Converts a configured bucket width to whole seconds, at least one.
pub(crate) fn width_secs(width: Duration) -> i64 {
    i64::try_from(width.as_secs()).unwrap_or(i64::MAX).max(1)
}
