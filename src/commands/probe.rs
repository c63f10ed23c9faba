//! Controller presence and status commands

use qblit_core::transaction::ChipSelect;
use qblit_gpu::{GpuError, MAGIC, STATUS0_HBLANK, STATUS0_VBLANK};

use super::{Engine, Session};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Read the magic number and report whether a controller is present
pub fn run_probe(engine: &mut Engine, cs: ChipSelect, session: &mut Session) -> CmdResult {
    match qblit_gpu::probe(engine, cs, session) {
        Ok(magic) => {
            println!("Controller found (magic {:#06x})", magic);
            Ok(())
        }
        Err(GpuError::MagicMismatch { found }) => Err(format!(
            "no controller on this bus: magic read {:#06x}, expected {:#06x}\n\
             Check the wiring - a mirrored board needs order=reversed.",
            found, MAGIC
        )
        .into()),
        Err(e) => Err(e.into()),
    }
}

/// Read and decode STATUS0
pub fn run_status(engine: &mut Engine, cs: ChipSelect, session: &mut Session) -> CmdResult {
    let status = qblit_gpu::read_status0(engine, cs, session)?;
    println!("STATUS0: {:#010b}", status);
    println!("  hblank: {}", status & STATUS0_HBLANK != 0);
    println!("  vblank: {}", status & STATUS0_VBLANK != 0);
    Ok(())
}
