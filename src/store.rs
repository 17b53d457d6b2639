use std::sync::Arc;
use std::time::Duration;

use im::{HashMap, OrdMap};
use likely_stable::unlikely;

use crate::bucket::{Admission, Bucket};
use crate::error::{InvalidArgument, Reason};
use crate::Limit;

/// Default time an untouched key is retained.
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);
/// Default bound on the number of keys retained.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Whether [`Store::evaluate`] admitted the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Admitted,
    Rejected,
}

impl Decision {
    pub const fn is_admitted(&self) -> bool {
        matches!(self, Decision::Admitted)
    }

    pub const fn is_rejected(&self) -> bool {
        matches!(self, Decision::Rejected)
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    bucket: Bucket,
    // position in the write-order index
    seq: u64,
    // store reference time when the slot was written
    written_at: f64,
}

/// A snapshot of every key's bucket.
///
/// A `Store` is a value. [`evaluate`](Self::evaluate) never changes the store
/// it is called on; it returns the next snapshot. Both maps inside are
/// persistent, so a new snapshot shares almost all of its structure with the
/// previous one, and cloning a store is O(1).
///
/// An entry expires once it has not been written for longer than the TTL. Age
/// is counted from the store's reference time at the write (the largest
/// timestamp evaluated so far) to the current reference time, so one key's
/// timestamps can never expire another key's freshly written bucket. Expired
/// entries are removed lazily on write or by [`evict`](Self::evict). The
/// number of retained keys is bounded by `max_entries`; when exceeded, the
/// least recently written keys go first.
///
/// # Examples
///
/// ```rust
/// use dripline::Store;
///
/// let store = Store::new(2, 1.0).unwrap();
/// let (first, store) = store.evaluate("alice", 0.0).unwrap();
/// let (second, store) = store.evaluate("alice", 0.0).unwrap();
/// let (third, store) = store.evaluate("alice", 0.0).unwrap();
/// assert!(first.is_admitted() && second.is_admitted());
/// assert!(third.is_rejected());
///
/// // one second later one unit has drained
/// let (fourth, _) = store.evaluate("alice", 1.0).unwrap();
/// assert!(fourth.is_admitted());
/// ```
#[derive(Clone)]
pub struct Store {
    limit: Limit,
    ttl: Duration,
    max_entries: usize,
    entries: HashMap<Arc<str>, Slot>,
    written: OrdMap<u64, Arc<str>>,
    next_seq: u64,
    high_water: f64,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Store(capacity={}, leak_rate_per_second={}, ttl={:?}, max_entries={}, active={})",
            self.limit.capacity,
            self.limit.leak_rate,
            self.ttl,
            self.max_entries,
            self.entries.len()
        )
    }
}

impl Store {
    /// Creates an empty store with the default TTL of ten minutes.
    ///
    /// # Errors
    ///
    /// [`InvalidArgument`] if `capacity` is zero or `leak_rate` is not positive.
    pub fn new(capacity: u32, leak_rate: f64) -> Result<Self, InvalidArgument> {
        Self::with_ttl(capacity, leak_rate, DEFAULT_TTL)
    }

    /// Creates an empty store with a custom TTL.
    ///
    /// # Errors
    ///
    /// [`InvalidArgument`] if `capacity` is zero, `leak_rate` is not positive
    /// or `ttl` is zero.
    pub fn with_ttl(capacity: u32, leak_rate: f64, ttl: Duration) -> Result<Self, InvalidArgument> {
        Self::from_limit(Limit::new(capacity, leak_rate)?, ttl)
    }

    /// Creates an empty store from an already validated [`Limit`].
    ///
    /// # Errors
    ///
    /// [`InvalidArgument`] if `ttl` is zero.
    pub fn from_limit(limit: Limit, ttl: Duration) -> Result<Self, InvalidArgument> {
        if unlikely(ttl.is_zero()) {
            return Err(InvalidArgument::new(Reason::NonPositiveTtl));
        }
        Ok(Self {
            limit,
            ttl,
            max_entries: DEFAULT_MAX_ENTRIES,
            entries: HashMap::new(),
            written: OrdMap::new(),
            next_seq: 0,
            high_water: 0.0,
        })
    }

    /// Returns this store with a different bound on retained keys. If the
    /// store already holds more, the least recently written are dropped.
    ///
    /// # Errors
    ///
    /// [`InvalidArgument`] if `max_entries` is zero.
    pub fn with_max_entries(mut self, max_entries: usize) -> Result<Self, InvalidArgument> {
        if unlikely(max_entries == 0) {
            return Err(InvalidArgument::new(Reason::NonPositiveMaxEntries));
        }
        self.max_entries = max_entries;
        let overflow = self.trim_to_max();
        if overflow > 0 {
            tracing::debug!(overflow, max_entries, "trimmed store to new bound");
        }
        Ok(self)
    }

    pub const fn limit(&self) -> Limit {
        self.limit
    }

    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    pub const fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// The largest timestamp this store has been evaluated (or evicted) at.
    /// Entry ages are measured on this reference clock.
    pub const fn latest_timestamp(&self) -> f64 {
        self.high_water
    }

    /// Decides whether a request for `key` at `timestamp` is admitted.
    ///
    /// The key's bucket (or a fresh empty one) is drained to `timestamp`. If it
    /// is below capacity, one unit is added. The resulting bucket, admitted or
    /// merely drained, is written into the returned snapshot, so a rejection
    /// still moves the bucket's clock forward. `self` is left as it was.
    ///
    /// # Errors
    ///
    /// [`InvalidArgument`] if `key` is empty or whitespace, or if `timestamp`
    /// is negative or not finite. Nothing is read or written in that case.
    pub fn evaluate(&self, key: &str, timestamp: f64) -> Result<(Decision, Store), InvalidArgument> {
        validate_key(key)?;
        validate_timestamp(timestamp)?;

        let mut next = self.clone();
        next.high_water = next.high_water.max(timestamp);

        let current = next
            .live(key)
            .unwrap_or_else(|| Bucket::empty(next.limit, timestamp));
        let drained = current.drain(timestamp);
        let (decision, bucket) = match drained.try_admit() {
            Admission::Admitted(admitted) => (Decision::Admitted, admitted),
            Admission::Rejected => (Decision::Rejected, drained),
        };
        tracing::trace!(
            key,
            timestamp,
            level = bucket.level(),
            admitted = decision.is_admitted(),
            "evaluated request"
        );

        next.write(key, bucket);
        Ok((decision, next))
    }

    /// The last written bucket for `key`, without draining. Expired and
    /// absent keys (and empty keys) yield `None`.
    pub fn lookup(&self, key: &str) -> Option<Bucket> {
        if key.trim().is_empty() {
            return None;
        }
        self.live(key)
    }

    /// The bucket for `key` as it would be at `as_of`. Nothing is written back.
    pub fn lookup_drained(&self, key: &str, as_of: f64) -> Option<Bucket> {
        self.lookup(key).map(|bucket| bucket.drain(as_of))
    }

    /// Number of retained entries. Approximate, since expired entries count
    /// until they have been swept.
    pub fn active_count(&self) -> usize {
        self.entries.len()
    }

    /// Every retained entry, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bucket)> {
        self.entries.iter().map(|(key, slot)| (&**key, &slot.bucket))
    }

    /// Removes every expired entry and enforces `max_entries`.
    #[must_use]
    pub fn evict(&self) -> Store {
        self.evict_at(self.high_water)
    }

    /// Like [`evict`](Self::evict), but measures expiry against `now` when it
    /// is later than any timestamp seen so far.
    #[must_use]
    pub fn evict_at(&self, now: f64) -> Store {
        let mut next = self.clone();
        if now.is_finite() {
            next.high_water = next.high_water.max(now);
        }
        let stale: Vec<u64> = next
            .entries
            .values()
            .filter(|slot| next.is_expired(slot))
            .map(|slot| slot.seq)
            .collect();
        for seq in &stale {
            next.remove_seq(*seq);
        }
        let overflow = next.trim_to_max();
        if !stale.is_empty() || overflow > 0 {
            tracing::debug!(expired = stale.len(), overflow, "evicted entries");
        }
        next
    }

    fn is_expired(&self, slot: &Slot) -> bool {
        self.high_water - slot.written_at > self.ttl.as_secs_f64()
    }

    fn live(&self, key: &str) -> Option<Bucket> {
        self.entries
            .get(key)
            .filter(|slot| !self.is_expired(slot))
            .map(|slot| slot.bucket)
    }

    fn write(&mut self, key: &str, bucket: Bucket) {
        let seq = self.next_seq;
        self.next_seq += 1;

        let key: Arc<str> = match self.entries.remove(key) {
            Some(old) => self
                .written
                .remove(&old.seq)
                .unwrap_or_else(|| Arc::from(key)),
            None => Arc::from(key),
        };
        let slot = Slot {
            bucket,
            seq,
            written_at: self.high_water,
        };
        self.entries.insert(Arc::clone(&key), slot);
        self.written.insert(seq, key);

        let expired = self.sweep_expired_head();
        let overflow = self.trim_to_max();
        if expired > 0 || overflow > 0 {
            tracing::debug!(expired, overflow, "evicted entries on write");
        }
    }

    /// Removes expired entries from the least recently written end until a
    /// live one is found. Write times never decrease along the index, so
    /// this finds every expired entry.
    fn sweep_expired_head(&mut self) -> usize {
        let mut removed = 0;
        while let Some((seq, key)) = self.written.get_min().cloned() {
            let expired = self
                .entries
                .get(&*key)
                .is_none_or(|slot| self.is_expired(slot));
            if !expired {
                break;
            }
            self.remove_seq(seq);
            removed += 1;
        }
        removed
    }

    fn trim_to_max(&mut self) -> usize {
        let mut removed = 0;
        while self.entries.len() > self.max_entries {
            let Some((seq, _)) = self.written.get_min().cloned() else {
                break;
            };
            self.remove_seq(seq);
            removed += 1;
        }
        removed
    }

    fn remove_seq(&mut self, seq: u64) {
        if let Some(key) = self.written.remove(&seq) {
            self.entries.remove(&*key);
        }
    }
}

fn validate_key(key: &str) -> Result<(), InvalidArgument> {
    if unlikely(key.trim().is_empty()) {
        return Err(InvalidArgument::new(Reason::EmptyKey));
    }
    Ok(())
}

fn validate_timestamp(timestamp: f64) -> Result<(), InvalidArgument> {
    if unlikely(!timestamp.is_finite() || timestamp < 0.0) {
        return Err(InvalidArgument::new(Reason::InvalidTimestamp));
    }
    Ok(())
}
