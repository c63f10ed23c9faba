//! QSPI transaction description
//!
//! A transaction is created per call, consumed entirely within one
//! `execute`, and never persisted. Designed to avoid allocation - borrows
//! the payload and the receive buffer.

/// Handle naming one of the engine's registered chip-select lines
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChipSelect(usize);

impl ChipSelect {
    /// Handle for the chip-select line registered at `index`
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Index into the engine's chip-select lines
    pub const fn index(&self) -> usize {
        self.0
    }
}

/// A single QSPI transaction
///
/// The command byte is clocked out first, then the payload, then the bus
/// turns around and the target drives `receive.len()` response bytes. Send
/// and receive are independent: a transaction may do either, both, or
/// neither.
pub struct Transaction<'a> {
    /// Target chip select
    pub cs: ChipSelect,
    /// Command byte
    pub command: u8,
    /// Payload sent after the command
    pub send: &'a [u8],
    /// Response buffer; its length is the number of bytes read back
    pub receive: &'a mut [u8],
}

impl<'a> Transaction<'a> {
    /// Command-only transaction with no payload or response
    pub fn simple(cs: ChipSelect, command: u8) -> Self {
        Self {
            cs,
            command,
            send: &[],
            receive: &mut [],
        }
    }

    /// Send a payload with no response
    pub fn write(cs: ChipSelect, command: u8, send: &'a [u8]) -> Self {
        Self {
            cs,
            command,
            send,
            receive: &mut [],
        }
    }

    /// Read a response with no payload
    pub fn read(cs: ChipSelect, command: u8, receive: &'a mut [u8]) -> Self {
        Self {
            cs,
            command,
            send: &[],
            receive,
        }
    }

    /// Send a payload, then read a response after the turnaround
    pub fn transfer(cs: ChipSelect, command: u8, send: &'a [u8], receive: &'a mut [u8]) -> Self {
        Self {
            cs,
            command,
            send,
            receive,
        }
    }

    /// Returns true if this transaction carries a payload
    pub fn has_send(&self) -> bool {
        !self.send.is_empty()
    }

    /// Returns true if this transaction reads a response
    pub fn has_receive(&self) -> bool {
        !self.receive.is_empty()
    }
}
