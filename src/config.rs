use std::time::Duration;

use crate::store::{DEFAULT_MAX_ENTRIES, DEFAULT_TTL};
use crate::{InvalidArgument, Limit, Store};

/// Plain configuration for building a [`Store`], e.g. from a service's config
/// file. With the "serde" feature enabled it can be deserialized; `ttl_seconds`
/// and `max_entries` fall back to their defaults when omitted.
///
/// ```toml
/// capacity = 20
/// leak_rate = 2.5
/// ttl_seconds = 300
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StoreConfig {
    pub capacity: u32,
    /// Units drained per second.
    pub leak_rate: f64,
    pub ttl_seconds: u64,
    pub max_entries: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: 0,
            leak_rate: 0.0,
            ttl_seconds: DEFAULT_TTL.as_secs(),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl StoreConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl Store {
    /// Builds an empty store, validating every field of `config`.
    pub fn from_config(config: &StoreConfig) -> Result<Self, InvalidArgument> {
        let limit = Limit::new(config.capacity, config.leak_rate)?;
        Store::from_limit(limit, config.ttl())?.with_max_entries(config.max_entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Reason;

    #[test]
    fn default_config_is_rejected() {
        // capacity and leak rate have no sensible default
        let err = Store::from_config(&StoreConfig::default()).unwrap_err();
        assert_eq!(Reason::NonPositiveCapacity, err.reason());
    }

    #[test]
    fn builds_store() {
        let config = StoreConfig {
            capacity: 3,
            leak_rate: 0.5,
            ttl_seconds: 90,
            max_entries: 16,
        };
        let store = Store::from_config(&config).unwrap();
        assert_eq!(3, store.limit().capacity());
        assert_eq!(0.5, store.limit().leak_rate());
        assert_eq!(Duration::from_secs(90), store.ttl());
        assert_eq!(16, store.max_entries());

        let err = Store::from_config(&StoreConfig {
            ttl_seconds: 0,
            ..config
        })
        .unwrap_err();
        assert_eq!(Reason::NonPositiveTtl, err.reason());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserializes_with_defaults() {
        let config: StoreConfig = toml::from_str(
            r#"
            capacity = 20
            leak_rate = 2.5
            "#,
        )
        .unwrap();
        assert_eq!(20, config.capacity);
        assert_eq!(2.5, config.leak_rate);
        assert_eq!(600, config.ttl_seconds);
        assert_eq!(10_000, config.max_entries);
        assert!(Store::from_config(&config).is_ok());
    }
}
