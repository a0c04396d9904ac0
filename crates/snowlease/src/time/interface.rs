use core::time::Duration;

/// Default epoch: Monday, July 15, 2024 00:00:00 UTC
pub const DEFAULT_EPOCH: Duration = Duration::from_millis(1_721_001_600_000);

/// Twitter epoch: Thursday, November 4, 2010 1:42:54.657 UTC
pub const TWITTER_EPOCH: Duration = Duration::from_millis(1_288_834_974_657);

/// A trait for time sources that return a wall-clock timestamp.
///
/// This abstraction allows you to plug in a real system clock or a mocked time
/// source in tests.
///
/// The unit is expected to be **milliseconds** relative to a configurable
/// origin. Implementations are allowed to go backward; the generator detects
/// and reports that case instead of masking it.
///
/// # Example
///
/// ```
/// use snowlease::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_millis(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since the configured epoch.
    fn current_millis(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for std::sync::Arc<T> {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}
