//! Error types for controller-level operations

use thiserror::Error;

/// Controller operation errors
#[derive(Debug, Error)]
pub enum GpuError {
    /// Write or read would run past the end of the framebuffer
    #[error("pixel range {start}+{len} outside the 76800-pixel framebuffer")]
    PixelOutOfRange {
        /// First pixel index of the rejected access
        start: u32,
        /// Length of the rejected access
        len: usize,
    },

    /// Palette buffer is not exactly 256 RGB triples
    #[error("palette must be 768 bytes, got {found}")]
    BadPaletteLength {
        /// Length of the rejected buffer
        found: usize,
    },

    /// The target answered the magic-number probe with the wrong value
    #[error("controller magic mismatch: expected 0xA5C3, found {found:#06x}")]
    MagicMismatch {
        /// Value the target returned
        found: u16,
    },

    /// Bus-level failure
    #[error(transparent)]
    Bus(#[from] qblit_core::Error),
}
