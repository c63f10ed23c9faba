//! CLI command implementations
//!
//! Every command works against the type-erased engine from programmer
//! dispatch, so the same implementations run on real GPIO pins and on the
//! simulated controller.

pub mod display;
mod list;
pub mod probe;
pub mod xfer;

pub use list::list_programmers;

use qblit_core::debug::{ConfirmSource, DebugSession, FreeRun};
use qblit_core::engine::QspiEngine;
use qblit_core::line::DigitalLine;

use crate::step::StdinConfirm;

/// Engine with the line backend erased
pub type Engine = QspiEngine<Box<dyn DigitalLine>>;

/// Stepping session with the confirmation source erased
pub type Session = DebugSession<Box<dyn ConfirmSource>>;

/// Build the session for the requested stepping mode
pub fn session_for(step: bool) -> Session {
    let source: Box<dyn ConfirmSource> = if step {
        Box::new(StdinConfirm)
    } else {
        Box::new(FreeRun)
    };
    DebugSession::new(source)
}
