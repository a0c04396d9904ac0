use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::time::{DEFAULT_EPOCH, TimeSource};

/// A wall-clock time source offset from a user-defined epoch.
///
/// Every call reads `SystemTime::now()`, so NTP steps and manual adjustments
/// are visible to the generator and a backward step surfaces as
/// [`Error::ClockRegression`].
///
/// Wall time earlier than the epoch reads as `0`.
///
/// [`Error::ClockRegression`]: crate::Error::ClockRegression
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SystemClock {
    epoch_millis: u64,
}

impl Default for SystemClock {
    /// Constructs a clock aligned to [`DEFAULT_EPOCH`].
    fn default() -> Self {
        Self::with_epoch(DEFAULT_EPOCH)
    }
}

impl SystemClock {
    /// Constructs a clock using `epoch` (a [`Duration`] since 1970-01-01 UTC)
    /// as the origin (t = 0).
    ///
    /// # Example
    ///
    /// ```
    /// use snowlease::{SystemClock, TimeSource, TWITTER_EPOCH};
    ///
    /// let clock = SystemClock::with_epoch(TWITTER_EPOCH);
    /// assert!(clock.current_millis() > 0);
    /// ```
    #[must_use]
    pub const fn with_epoch(epoch: Duration) -> Self {
        Self {
            epoch_millis: epoch.as_millis() as u64,
        }
    }

    /// The epoch as milliseconds since the Unix epoch.
    #[must_use]
    pub const fn epoch_millis(&self) -> u64 {
        self.epoch_millis
    }

    /// Milliseconds since the Unix epoch, per the system clock.
    #[must_use]
    pub fn unix_millis() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64)
    }
}

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        Self::unix_millis().saturating_sub(self.epoch_millis)
    }
}
