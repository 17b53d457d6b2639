use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{Bucket, Clock, Decision, InvalidArgument, StdClock, Store};

/// A [`Store`] shared in place by many callers.
///
/// Every call holds one mutex across drain, admit and write-back, so two
/// concurrent checks on the same key are always serialized. The guarded value
/// is an immutable snapshot that is replaced whole, so a panic while the lock
/// is held can never leave a half-applied update behind and a poisoned lock
/// is safe to recover.
///
/// # Examples
///
/// ```rust
/// use dripline::{Limiter, Store};
///
/// let limiter = Limiter::new(Store::new(10, 5.0).unwrap());
/// std::thread::scope(|s| {
///     for _ in 0..4 {
///         s.spawn(|| {
///             let _ = limiter.check("shared-key");
///         });
///     }
/// });
/// assert_eq!(1, limiter.active_count());
/// ```
pub struct Limiter<C = StdClock> {
    store: Mutex<Store>,
    clock: C,
}

impl Limiter<StdClock> {
    /// Wraps `store`, reading time from a [`StdClock`] started now.
    pub fn new(store: Store) -> Self {
        Self::with_clock(store, StdClock::default())
    }
}

impl<C: Clock> Limiter<C> {
    pub fn with_clock(store: Store, clock: C) -> Self {
        Self {
            store: Mutex::new(store),
            clock,
        }
    }

    /// Evaluates a request for `key` at the clock's current time.
    pub fn check(&self, key: &str) -> Result<Decision, InvalidArgument> {
        self.check_at(key, self.clock.now())
    }

    /// Evaluates a request for `key` at an explicit timestamp.
    pub fn check_at(&self, key: &str, timestamp: f64) -> Result<Decision, InvalidArgument> {
        let mut guard = self.lock();
        let (decision, next) = guard.evaluate(key, timestamp)?;
        *guard = next;
        Ok(decision)
    }

    /// The current state as an independent snapshot.
    pub fn snapshot(&self) -> Store {
        self.lock().clone()
    }

    pub fn lookup(&self, key: &str) -> Option<Bucket> {
        self.lock().lookup(key)
    }

    /// The bucket for `key` drained to the clock's current time.
    pub fn lookup_now(&self, key: &str) -> Option<Bucket> {
        let now = self.clock.now();
        self.lock().lookup_drained(key, now)
    }

    pub fn active_count(&self) -> usize {
        self.lock().active_count()
    }

    /// Drops expired entries, measuring age against the clock's current time.
    pub fn evict(&self) {
        let now = self.clock.now();
        let mut guard = self.lock();
        *guard = guard.evict_at(now);
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            tracing::warn!("limiter lock poisoned, recovering last snapshot");
            poisoned.into_inner()
        })
    }
}

impl<C> std::fmt::Debug for Limiter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.store.try_lock() {
            Ok(store) => write!(f, "Limiter({store:?})"),
            Err(_) => f.write_str("Limiter(<locked>)"),
        }
    }
}
