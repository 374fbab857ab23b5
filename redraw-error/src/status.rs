//! Error status: can the failed operation be attempted again?

use std::fmt;

/// How an error should be treated by whoever receives it.
///
/// redraw itself never retries; the status is carried so callers embedding
/// the loop can make that decision themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorStatus {
    /// Trying again will not help
    Permanent,
    /// Trying again may succeed (network hiccup, rate limit)
    Temporary,
    /// Was temporary, but still failed after being tried again
    Persistent,
}

impl ErrorStatus {
    /// Temporary becomes Persistent; everything else is unchanged
    pub fn persist(self) -> Self {
        match self {
            ErrorStatus::Temporary => ErrorStatus::Persistent,
            other => other,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorStatus::Temporary)
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorStatus::Permanent => write!(f, "permanent"),
            ErrorStatus::Temporary => write!(f, "temporary"),
            ErrorStatus::Persistent => write!(f, "persistent"),
        }
    }
}
