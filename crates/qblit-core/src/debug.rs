//! Single-step debugging of bus transactions
//!
//! The engine pauses at defined checkpoints (each rising edge of an output
//! nibble, each output edge between payload nibbles, each sampled input
//! nibble) and reports the checkpoint label plus the current data line
//! levels to a [`ConfirmSource`]. The source decides whether to advance one
//! step or release the session into free run.
//!
//! The skip state is a two-state machine: STEPPING (initial) and FREE_RUN.
//! FREE_RUN is terminal for the session; only an explicit [`rearm`] returns
//! to STEPPING.
//!
//! [`rearm`]: DebugSession::rearm

use crate::error::Result;

/// Operator response to a checkpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepAction {
    /// Advance past this checkpoint only
    Advance,
    /// Stop pausing for the remainder of the session
    SkipAll,
}

/// Source of checkpoint confirmations
///
/// `confirm` reports a checkpoint to an external observer and blocks until
/// it answers; there is no timeout. An `Err` means the channel is gone and
/// surfaces from the engine as [`Error::Aborted`](crate::Error::Aborted)
/// after the bus has been returned to idle.
pub trait ConfirmSource {
    /// Report `label` and the four data line levels, wait for a decision
    fn confirm(&mut self, label: &str, lines: [bool; 4]) -> Result<StepAction>;
}

/// Fixed headless policy: release immediately, never block
pub struct FreeRun;

impl ConfirmSource for FreeRun {
    fn confirm(&mut self, _label: &str, _lines: [bool; 4]) -> Result<StepAction> {
        Ok(StepAction::SkipAll)
    }
}

#[cfg(feature = "alloc")]
impl ConfirmSource for alloc::boxed::Box<dyn ConfirmSource> {
    fn confirm(&mut self, label: &str, lines: [bool; 4]) -> Result<StepAction> {
        (**self).confirm(label, lines)
    }
}

/// Stepping state threaded through transactions
///
/// Purely observational - a session never alters bus state. Callers
/// construct one explicitly and pass it by reference into the engine; there
/// is no ambient global.
pub struct DebugSession<S> {
    source: S,
    free_run: bool,
}

impl DebugSession<FreeRun> {
    /// A session that never pauses
    pub fn free_run() -> Self {
        Self {
            source: FreeRun,
            free_run: true,
        }
    }
}

impl<S: ConfirmSource> DebugSession<S> {
    /// New session in the STEPPING state
    pub fn new(source: S) -> Self {
        Self {
            source,
            free_run: false,
        }
    }

    /// True once the operator has released the session
    pub fn is_free_running(&self) -> bool {
        self.free_run
    }

    /// Return a released session to STEPPING before the next transaction
    pub fn rearm(&mut self) {
        self.free_run = false;
    }

    /// The underlying confirmation source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Pause at a checkpoint unless the session is free-running
    pub fn checkpoint(&mut self, label: &str, lines: [bool; 4]) -> Result<()> {
        if self.free_run {
            return Ok(());
        }
        match self.source.confirm(label, lines)? {
            StepAction::Advance => {}
            StepAction::SkipAll => self.free_run = true,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    /// Counts confirm calls, answering from a script
    struct Script {
        answers: std::vec::Vec<Result<StepAction>>,
        calls: usize,
    }

    impl ConfirmSource for Script {
        fn confirm(&mut self, _label: &str, _lines: [bool; 4]) -> Result<StepAction> {
            let answer = self.answers[self.calls.min(self.answers.len() - 1)];
            self.calls += 1;
            answer
        }
    }

    #[test]
    fn test_skip_flag_is_monotone() {
        let mut session = DebugSession::new(Script {
            answers: std::vec![Ok(StepAction::Advance), Ok(StepAction::SkipAll)],
            calls: 0,
        });

        session.checkpoint("a", [false; 4]).unwrap();
        assert!(!session.is_free_running());
        session.checkpoint("b", [false; 4]).unwrap();
        assert!(session.is_free_running());

        // No further source traffic once released
        for _ in 0..10 {
            session.checkpoint("c", [false; 4]).unwrap();
        }
        assert_eq!(session.source.calls, 2);
    }

    #[test]
    fn test_rearm_returns_to_stepping() {
        let mut session = DebugSession::new(Script {
            answers: std::vec![Ok(StepAction::SkipAll)],
            calls: 0,
        });

        session.checkpoint("a", [false; 4]).unwrap();
        assert!(session.is_free_running());

        session.rearm();
        assert!(!session.is_free_running());
        session.checkpoint("b", [false; 4]).unwrap();
        assert_eq!(session.source.calls, 2);
    }

    #[test]
    fn test_closed_channel_aborts() {
        let mut session = DebugSession::new(Script {
            answers: std::vec![Err(Error::Aborted)],
            calls: 0,
        });

        assert_eq!(session.checkpoint("a", [false; 4]), Err(Error::Aborted));
    }

    #[test]
    fn test_free_run_session_never_calls_source() {
        let mut session = DebugSession::free_run();
        session.checkpoint("a", [true; 4]).unwrap();
        assert!(session.is_free_running());
    }
}
