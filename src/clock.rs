use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// A source of timestamps for a [`Limiter`](crate::Limiter).
///
/// The [`Store`](crate::Store) never reads a clock; callers pass timestamps
/// explicitly. A `Clock` is only the convenience used by the shared limiter
/// when the caller wants "now".
pub trait Clock {
    /// Current time in seconds since an arbitrary epoch. Must be non-negative
    /// and should not decrease, although buckets tolerate it if it does.
    fn now(&self) -> f64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> f64 {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> f64 {
        (**self).now()
    }
}

/// Monotonic clock measuring seconds since it was created, backed by
/// [`std::time::Instant`].
#[derive(Clone)]
pub struct StdClock {
    origin: std::time::Instant,
}

impl Default for StdClock {
    fn default() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

impl Clock for StdClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Wall clock returning seconds since the Unix epoch.
///
/// Useful when timestamps must agree across processes or be logged. Wall time
/// can jump backwards; buckets treat that as "no time passed".
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
    }
}

/// Clock backed by the `quanta` crate. Requires the "quanta" feature.
#[cfg(feature = "quanta")]
#[derive(Clone)]
pub struct QuantaClock {
    origin: quanta::Instant,
}

#[cfg(feature = "quanta")]
impl Default for QuantaClock {
    fn default() -> Self {
        Self::new(quanta::Clock::new())
    }
}

#[cfg(feature = "quanta")]
impl QuantaClock {
    pub fn new(clock: quanta::Clock) -> Self {
        Self {
            origin: clock.now(),
        }
    }
}

#[cfg(feature = "quanta")]
impl Clock for QuantaClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Clock backed by [`tokio::time::Instant`], so it follows tokio's paused
/// test clock. Requires the "tokio" feature.
#[cfg(feature = "tokio")]
#[derive(Clone)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

#[cfg(feature = "tokio")]
impl Default for TokioClock {
    fn default() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

#[cfg(feature = "tokio")]
impl Clock for TokioClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Manually driven clock for tests and simulations.
///
/// The time is held as the bits of an `f64` in an atomic, so one clock can be
/// shared by reference (or through an `Arc`) with a [`Limiter`](crate::Limiter)
/// while the test moves it from another thread.
///
/// ```rust
/// use std::sync::Arc;
///
/// use dripline::{Limiter, ManualClock, Store};
///
/// let clock = Arc::new(ManualClock::new(0.0));
/// let limiter = Limiter::with_clock(Store::new(1, 1.0).unwrap(), Arc::clone(&clock));
///
/// assert!(limiter.check("alice").unwrap().is_admitted());
/// assert!(limiter.check("alice").unwrap().is_rejected());
///
/// clock.advance(1.0);
/// assert!(limiter.check("alice").unwrap().is_admitted());
/// ```
pub struct ManualClock {
    bits: AtomicU64,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl ManualClock {
    pub fn new(now: f64) -> Self {
        Self {
            bits: AtomicU64::new(now.to_bits()),
        }
    }

    /// Jumps to `now`, which may be earlier than the current value to
    /// simulate clock skew.
    pub fn set(&self, now: f64) {
        self.bits.store(now.to_bits(), Ordering::Release);
    }

    /// Moves the clock by `delta` seconds and returns the new time.
    pub fn advance(&self, delta: f64) -> f64 {
        let mut current = self.bits.load(Ordering::Acquire);
        loop {
            let next = (f64::from_bits(current) + delta).to_bits();
            match self
                .bits
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return f64::from_bits(next),
                Err(actual) => current = actual,
            }
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_moves_both_ways() {
        let clock = ManualClock::default();
        assert_eq!(0.0, clock.now());
        assert_eq!(2.5, clock.advance(2.5));
        assert_eq!(2.5, clock.now());
        clock.set(1.0);
        assert_eq!(1.0, (&clock).now());
        assert_eq!(1.0, Arc::new(clock).now());
    }

    #[test]
    fn manual_clock_concurrent_advance() {
        let clock = ManualClock::default();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..1000 {
                        clock.advance(0.5);
                    }
                });
            }
        });
        // halves are exact in f64
        assert_eq!(2000.0, clock.now());
    }

    #[test]
    fn system_clock_is_past_epoch() {
        // 2020-01-01
        assert!(SystemClock.now() > 1_577_836_800.0);
    }

    #[test]
    fn std_clock_is_monotonic() {
        let clock = StdClock::default();
        let a = clock.now();
        let b = clock.now();
        assert!(a >= 0.0);
        assert!(b >= a);
    }

    #[cfg(feature = "tokio")]
    #[tokio::test(start_paused = true)]
    async fn tokio_clock_follows_paused_time() {
        let clock = TokioClock::default();
        tokio::time::advance(std::time::Duration::from_secs(3)).await;
        assert!((clock.now() - 3.0).abs() < 1e-6);
    }
}
