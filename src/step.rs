//! Interactive single-stepping over stdin
//!
//! The confirmation convention follows the controller bring-up workflow:
//! every checkpoint prints its label and the four data line levels, then
//! waits for a line of input. An empty line (or anything else) advances one
//! step, `f` releases the session into free run, and EOF aborts the
//! transaction - the engine deasserts chip-select before surfacing that.

use std::io::{self, BufRead, Write};

use qblit_core::debug::{ConfirmSource, StepAction};
use qblit_core::error::{Error, Result};

/// Checkpoint confirmations read from the terminal
pub struct StdinConfirm;

impl ConfirmSource for StdinConfirm {
    fn confirm(&mut self, label: &str, lines: [bool; 4]) -> Result<StepAction> {
        println!(
            "{}: {}{}{}{}",
            label, lines[0] as u8, lines[1] as u8, lines[2] as u8, lines[3] as u8
        );
        print!("> ");
        io::stdout().flush().ok();

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => Err(Error::Aborted),
            Ok(_) => {
                if answer.trim() == "f" {
                    Ok(StepAction::SkipAll)
                } else {
                    Ok(StepAction::Advance)
                }
            }
        }
    }
}
