use std::fmt::{Display, Formatter};

use crate::Limit;

/// The fill state of one key's leaky bucket.
///
/// A bucket is a plain value: every transition returns a new bucket and leaves
/// the original untouched. The level is never negative. It can sit above
/// capacity by less than one unit right after an admission, because capacity
/// gates admission rather than capping the stored level.
///
/// # Examples
///
/// ```rust
/// use dripline::{Admission, Bucket, Limit};
///
/// let limit = Limit::new(2, 1.0).unwrap();
/// let bucket = Bucket::empty(limit, 0.0);
///
/// let Admission::Admitted(bucket) = bucket.try_admit() else { unreachable!() };
/// let Admission::Admitted(bucket) = bucket.try_admit() else { unreachable!() };
/// assert!(bucket.try_admit().is_rejected());
///
/// // half a second later one half of a unit has drained
/// let bucket = bucket.drain(0.5);
/// assert_eq!(1.5, bucket.level());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    level: f64,
    capacity: u32,
    leak_rate: f64,
    last_update: f64,
}

/// Outcome of [`Bucket::try_admit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Admission {
    /// The request fits; carries the bucket with one more unit in it.
    Admitted(Bucket),
    /// The bucket was already at or above capacity.
    Rejected,
}

impl Admission {
    pub const fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted(_))
    }

    pub const fn is_rejected(&self) -> bool {
        matches!(self, Admission::Rejected)
    }

    /// The admitted bucket, if any.
    pub const fn bucket(self) -> Option<Bucket> {
        match self {
            Admission::Admitted(bucket) => Some(bucket),
            Admission::Rejected => None,
        }
    }
}

impl Bucket {
    /// A bucket holding `level` units as of `last_update`. Negative levels are
    /// clamped to zero.
    pub fn new(level: f64, limit: Limit, last_update: f64) -> Self {
        Self {
            level: level.max(0.0),
            capacity: limit.capacity,
            leak_rate: limit.leak_rate,
            last_update,
        }
    }

    /// The bucket a key gets the first time it is seen.
    pub fn empty(limit: Limit, at: f64) -> Self {
        Self::new(0.0, limit, at)
    }

    pub const fn level(&self) -> f64 {
        self.level
    }

    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    pub const fn leak_rate(&self) -> f64 {
        self.leak_rate
    }

    pub const fn last_update(&self) -> f64 {
        self.last_update
    }

    /// Returns the bucket as it would be at `at`, having leaked
    /// `leak_rate * (at - last_update)` units.
    ///
    /// Time going backwards is tolerated: if `at` is earlier than
    /// `last_update` (or is NaN) the bucket is returned unchanged, so no
    /// recorded level is ever lost to clock skew.
    #[must_use]
    pub fn drain(self, at: f64) -> Self {
        if at.is_nan() || at < self.last_update {
            return self;
        }
        let elapsed = at - self.last_update;
        let drained = self.leak_rate * elapsed;
        Self {
            level: (self.level - drained).max(0.0),
            last_update: at,
            ..self
        }
    }

    /// Adds one unit if the bucket is below capacity.
    #[must_use]
    pub fn try_admit(self) -> Admission {
        if self.level >= self.capacity as f64 {
            return Admission::Rejected;
        }
        Admission::Admitted(Self {
            level: self.level + 1.0,
            ..self
        })
    }

    /// Whether [`try_admit`](Self::try_admit) would succeed right now.
    pub fn can_admit(&self) -> bool {
        self.level < self.capacity as f64
    }

    /// Headroom left below capacity. Goes negative after an overshooting
    /// admission.
    pub fn available(&self) -> f64 {
        self.capacity as f64 - self.level
    }
}

impl Display for Bucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Bucket{{level={:.2}/{}, leak_rate={:.2}/s, last_update={:.2}}}",
            self.level, self.capacity, self.leak_rate, self.last_update
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(capacity: u32, leak_rate: f64) -> Limit {
        Limit::new(capacity, leak_rate).unwrap()
    }

    #[test]
    fn negative_level_is_clamped() {
        let bucket = Bucket::new(-3.0, limit(5, 1.0), 1.0);
        assert_eq!(0.0, bucket.level());
        assert_eq!(5, bucket.capacity());
        assert_eq!(1.0, bucket.leak_rate());
        assert_eq!(1.0, bucket.last_update());
    }

    #[test]
    fn drain_is_linear_and_floored() {
        let bucket = Bucket::new(3.0, limit(5, 1.5), 10.0);
        let drained = bucket.drain(11.0);
        assert_eq!(1.5, drained.level());
        assert_eq!(11.0, drained.last_update());
        // the original is untouched
        assert_eq!(3.0, bucket.level());
        assert_eq!(10.0, bucket.last_update());

        let drained = bucket.drain(100.0);
        assert_eq!(0.0, drained.level());
        assert_eq!(100.0, drained.last_update());

        // fractional elapsed time
        let drained = Bucket::new(1.0, limit(5, 1.0), 0.0).drain(0.25);
        assert_eq!(0.75, drained.level());
    }

    #[test]
    fn drain_backwards_is_noop() {
        let bucket = Bucket::new(2.0, limit(5, 1.0), 10.0);
        assert_eq!(bucket, bucket.drain(5.0));
        assert_eq!(bucket, bucket.drain(f64::NAN));
    }

    #[test]
    fn drain_same_time_is_identity() {
        let bucket = Bucket::new(2.5, limit(5, 3.0), 7.0);
        assert_eq!(bucket, bucket.drain(bucket.last_update()));
    }

    #[test]
    fn drain_never_goes_negative() {
        let mut bucket = Bucket::new(4.0, limit(5, 2.0), 0.0);
        for step in 1..50 {
            bucket = bucket.drain(step as f64 * 0.37);
            assert!(bucket.level() >= 0.0);
        }
        assert_eq!(0.0, bucket.level());
    }

    #[test]
    fn admit_below_capacity() {
        let bucket = Bucket::new(2.0, limit(5, 1.0), 3.0);
        let admitted = bucket.try_admit().bucket().unwrap();
        assert_eq!(3.0, admitted.level());
        assert_eq!(3.0, admitted.last_update());
        assert_eq!(bucket.capacity(), admitted.capacity());
        assert_eq!(bucket.leak_rate(), admitted.leak_rate());
    }

    #[test]
    fn reject_at_or_above_capacity() {
        assert!(Bucket::new(5.0, limit(5, 1.0), 0.0).try_admit().is_rejected());
        assert!(Bucket::new(5.5, limit(5, 1.0), 0.0).try_admit().is_rejected());
        assert!(!Bucket::new(5.0, limit(5, 1.0), 0.0).can_admit());
    }

    #[test]
    fn admission_may_overshoot_capacity() {
        let bucket = Bucket::new(4.5, limit(5, 1.0), 0.0);
        assert!(bucket.can_admit());
        let admitted = bucket.try_admit().bucket().unwrap();
        assert_eq!(5.5, admitted.level());
        assert_eq!(-0.5, admitted.available());
        assert!(admitted.try_admit().is_rejected());
    }

    #[test]
    fn available_and_display() {
        let bucket = Bucket::new(1.0, limit(5, 1.0), 10.0);
        assert_eq!(4.0, bucket.available());
        assert_eq!(
            "Bucket{level=1.00/5, leak_rate=1.00/s, last_update=10.00}",
            bucket.to_string()
        );
    }

    #[test]
    fn equality_is_field_wise() {
        let a = Bucket::new(1.0, limit(5, 1.0), 10.0);
        assert_eq!(a, Bucket::new(1.0, limit(5, 1.0), 10.0));
        assert_ne!(a, Bucket::new(1.5, limit(5, 1.0), 10.0));
        assert_ne!(a, Bucket::new(1.0, limit(6, 1.0), 10.0));
        assert_ne!(a, Bucket::new(1.0, limit(5, 2.0), 10.0));
        assert_ne!(a, Bucket::new(1.0, limit(5, 1.0), 11.0));
    }
}
