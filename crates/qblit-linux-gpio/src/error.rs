//! Error types for Linux GPIO bus operations

use thiserror::Error;

/// Linux GPIO specific errors
#[derive(Debug, Error)]
pub enum LinuxGpioError {
    /// Failed to request a GPIO line
    #[error("failed to request GPIO line {name} (offset {offset}): {source}")]
    LineRequestFailed {
        /// Role the line was meant to play (sclk, cs0, d0, ...)
        name: &'static str,
        /// GPIO line offset
        offset: u32,
        /// Underlying gpiocdev error
        #[source]
        source: gpiocdev::Error,
    },

    /// One GPIO offset assigned to two bus roles
    #[error("GPIO offset {offset} assigned to both {first} and {second}")]
    DuplicatePin {
        /// The offending offset
        offset: u32,
        /// First role using it
        first: &'static str,
        /// Second role using it
        second: &'static str,
    },

    /// GPIO chip or device not specified
    #[error("no GPIO chip specified. Use dev=/dev/gpiochipN or gpiochip=N")]
    NoDevice,

    /// Invalid parameter value
    #[error("invalid {key} value: {value}")]
    InvalidParameter {
        /// Option key
        key: &'static str,
        /// Rejected value
        value: String,
    },

    /// Missing required parameter
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// Conflicting options given
    #[error("{0}")]
    ConflictingOptions(&'static str),

    /// The engine rejected the assembled configuration
    #[error(transparent)]
    Bus(#[from] qblit_core::Error),
}

/// Result type for Linux GPIO bus operations
pub type Result<T> = std::result::Result<T, LinuxGpioError>;
