use likely_stable::unlikely;

use crate::error::{InvalidArgument, Reason};

const SECONDS_PER_MINUTE: f64 = 60.0;
const SECONDS_PER_HOUR: f64 = 3600.0;

/// Capacity and leak rate shared by every bucket of a [`Store`](crate::Store).
///
/// A bucket admits a request while its level is below `capacity`, and drains
/// continuously at `leak_rate` units per second.
///
/// # Examples
///
/// ```rust
/// use dripline::Limit;
///
/// // holds 10 requests, drains 2 per second
/// let limit = Limit::per_second(10, 2.0).unwrap();
/// assert_eq!(limit.capacity(), 10);
/// assert_eq!(limit.leak_rate(), 2.0);
///
/// // holds 60 requests, drains 60 per minute (1 per second)
/// let limit = Limit::per_minute(60, 60.0).unwrap();
/// assert_eq!(limit.leak_rate(), 1.0);
/// ```
#[derive(Clone, Copy, PartialEq)]
pub struct Limit {
    pub(crate) capacity: u32,
    pub(crate) leak_rate: f64,
}

impl std::fmt::Debug for Limit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Limit(capacity={}, leak_rate_per_second={})",
            self.capacity, self.leak_rate
        )
    }
}

impl Limit {
    /// Creates a limit with the given capacity and leak rate in units per second.
    ///
    /// # Errors
    ///
    /// Fails with [`InvalidArgument`] when `capacity` is zero or `leak_rate`
    /// is not a positive, finite number.
    pub fn new(capacity: u32, leak_rate: f64) -> Result<Self, InvalidArgument> {
        if unlikely(capacity == 0) {
            return Err(InvalidArgument::new(Reason::NonPositiveCapacity));
        }
        if unlikely(!leak_rate.is_finite() || leak_rate <= 0.0) {
            return Err(InvalidArgument::new(Reason::InvalidLeakRate));
        }
        Ok(Self {
            capacity,
            leak_rate,
        })
    }

    /// Same as [`new`](Self::new); reads better next to the other unit constructors.
    pub fn per_second(capacity: u32, drained: f64) -> Result<Self, InvalidArgument> {
        Self::new(capacity, drained)
    }

    /// Creates a limit that drains `drained` units every minute.
    ///
    /// ```rust
    /// use dripline::Limit;
    ///
    /// let limit = Limit::per_minute(5, 30.0).unwrap();
    /// assert_eq!(limit.leak_rate(), 0.5);
    /// assert_eq!(limit.leak_rate_per_minute(), 30.0);
    /// ```
    pub fn per_minute(capacity: u32, drained: f64) -> Result<Self, InvalidArgument> {
        Self::new(capacity, drained / SECONDS_PER_MINUTE)
    }

    /// Creates a limit that drains `drained` units every hour.
    ///
    /// ```rust
    /// use dripline::Limit;
    ///
    /// let limit = Limit::per_hour(100, 3600.0).unwrap();
    /// assert_eq!(limit.leak_rate(), 1.0);
    /// ```
    pub fn per_hour(capacity: u32, drained: f64) -> Result<Self, InvalidArgument> {
        Self::new(capacity, drained / SECONDS_PER_HOUR)
    }

    /// Maximum level before requests are rejected.
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Units drained per second.
    pub const fn leak_rate(&self) -> f64 {
        self.leak_rate
    }

    /// Units drained per minute.
    pub const fn leak_rate_per_minute(&self) -> f64 {
        self.leak_rate * SECONDS_PER_MINUTE
    }

    /// Units drained per hour.
    pub const fn leak_rate_per_hour(&self) -> f64 {
        self.leak_rate * SECONDS_PER_HOUR
    }
}
