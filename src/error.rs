use std::fmt::{Display, Formatter};

/// The specific constraint an [`InvalidArgument`] violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    NonPositiveCapacity,
    InvalidLeakRate,
    NonPositiveTtl,
    NonPositiveMaxEntries,
    EmptyKey,
    InvalidTimestamp,
}

impl Display for Reason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Reason::NonPositiveCapacity => "capacity must be positive",
            Reason::InvalidLeakRate => "leak rate must be a positive, finite number",
            Reason::NonPositiveTtl => "ttl must be positive",
            Reason::NonPositiveMaxEntries => "max entries must be positive",
            Reason::EmptyKey => "key cannot be empty",
            Reason::InvalidTimestamp => "timestamp must be a finite, non-negative number",
        };
        f.write_str(msg)
    }
}

/// A caller supplied a value outside the accepted range.
///
/// This is the only error the crate produces. It is always raised before any
/// bucket is read or written, so a failed call never leaves partial state behind.
/// Clock skew (a timestamp earlier than one already seen) is *not* an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid argument: {reason}")]
pub struct InvalidArgument {
    reason: Reason,
}

impl InvalidArgument {
    pub(crate) const fn new(reason: Reason) -> Self {
        Self { reason }
    }

    /// Which constraint was violated.
    pub const fn reason(&self) -> Reason {
        self.reason
    }
}
