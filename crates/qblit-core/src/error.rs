//! Error types for qblit-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Chip-select handle does not name a line configured on this engine
    InvalidChipSelect,
    /// The engine cannot hold another chip-select line
    TooManyChipSelects,
    /// The confirmation channel closed mid-transaction
    ///
    /// The engine has already deasserted chip-select and returned the clock
    /// to idle; the in-flight transaction's result is discarded and the
    /// caller may retry.
    Aborted,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChipSelect => write!(f, "chip-select handle not configured on this bus"),
            Self::TooManyChipSelects => write!(f, "too many chip-select lines"),
            Self::Aborted => write!(f, "stepping session aborted mid-transaction"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
