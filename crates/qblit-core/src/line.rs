//! Digital line abstraction
//!
//! The engine's only window onto the hardware is a set of binary,
//! direction-configurable lines. Backends (Linux GPIO character device,
//! in-memory simulator, microcontroller HALs) implement [`DigitalLine`] and
//! the engine never touches anything lower level.

/// Line direction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Driven by this side of the bus
    Output,
    /// Released; the target drives it
    Input,
}

/// A binary-state, direction-configurable GPIO line
///
/// Line access is treated as always succeeding at this layer: backends are
/// expected to log their own I/O failures and carry on, the way a stuck or
/// miswired pin would simply produce wrong data on a real bus.
///
/// `read` on an output line returns the currently driven level.
pub trait DigitalLine {
    /// Reconfigure the line direction
    fn set_direction(&mut self, direction: Direction);

    /// Drive the line to a level (meaningful for outputs)
    fn write(&mut self, level: bool);

    /// Sample the current line level
    fn read(&self) -> bool;
}

// Blanket impl so callers can erase the backend type (alloc only)
#[cfg(feature = "alloc")]
impl DigitalLine for alloc::boxed::Box<dyn DigitalLine> {
    fn set_direction(&mut self, direction: Direction) {
        (**self).set_direction(direction)
    }

    fn write(&mut self, level: bool) {
        (**self).write(level)
    }

    fn read(&self) -> bool {
        (**self).read()
    }
}
