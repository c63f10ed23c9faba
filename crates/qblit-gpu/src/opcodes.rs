//! Display controller command opcodes
//!
//! Bit 7 of an opcode marks a payload (send) phase, bit 6 a response
//! (receive) phase; the low bits select the operation. The engine does not
//! interpret any of this - the split matters only to the controller.

/// Continuous framebuffer write: 3 packed address bytes, then pixel data
/// until the master ends the transaction
pub const FRAMEBUFFER_WRITE: u8 = 0b1000_0010;

/// Continuous framebuffer read: 3 packed address bytes, then pixel data
/// driven back until the master ends the transaction
pub const FRAMEBUFFER_READ: u8 = 0b1100_0010;

/// Load the full 768-byte palette, starting from entry 0
pub const SET_PALETTE: u8 = 0b1000_0011;

/// Read the full 768-byte palette back
pub const GET_PALETTE: u8 = 0b0100_0011;

/// Read the STATUS0 register (1 byte)
pub const READ_STATUS0: u8 = 0b0100_0000;

/// Read the 16-bit magic number; presence and init check
pub const READ_MAGIC: u8 = 0b0110_0000;

/// Disable video output
pub const DISABLE_OUTPUT: u8 = 0b0000_0000;

/// Enable video output
pub const ENABLE_OUTPUT: u8 = 0b0000_0001;
