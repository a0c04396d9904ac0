use crate::{error::Result, generator::IdGenStatus, id::SnowflakeId, time::TimeSource};

/// A minimal interface for generating Snowflake IDs with a fixed worker ID.
pub trait SnowflakeGenerator<ID, T>
where
    ID: SnowflakeId,
    T: TimeSource,
{
    /// Creates a new generator.
    fn new(worker_id: u64, time: T) -> Self;

    /// Returns the worker ID embedded in every issued ID.
    fn worker_id(&self) -> u64;

    /// Attempts to generate the next ID without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockRegression`] if the time source is behind the
    /// last issued timestamp.
    ///
    /// [`Error::ClockRegression`]: crate::Error::ClockRegression
    fn try_poll_id(&self) -> Result<IdGenStatus<ID>>;

    /// Generates the next ID, spinning until the next millisecond if the
    /// current one is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockRegression`] if the time source is behind the
    /// last issued timestamp.
    ///
    /// [`Error::ClockRegression`]: crate::Error::ClockRegression
    fn try_next_id(&self) -> Result<ID>;
}
