//! Controller operations over the transaction engine
//!
//! Thin wrappers that frame one transaction each. All of them thread the
//! caller's [`DebugSession`] through so single-stepping works at any level.

use qblit_core::debug::{ConfirmSource, DebugSession};
use qblit_core::engine::QspiEngine;
use qblit_core::line::DigitalLine;
use qblit_core::transaction::{ChipSelect, Transaction};

use crate::error::GpuError;
use crate::{opcodes, pack_pixel_address, MAGIC, PALETTE_LEN, PIXELS};

type Result<T> = core::result::Result<T, GpuError>;

/// Read the magic number and check that a controller is present
///
/// Returns the raw value on success; a wrong value is an error because
/// every later operation would silently corrupt the display.
pub fn probe<L, S>(
    engine: &mut QspiEngine<L>,
    cs: ChipSelect,
    session: &mut DebugSession<S>,
) -> Result<u16>
where
    L: DigitalLine,
    S: ConfirmSource,
{
    let mut buf = [0u8; 2];
    let mut txn = Transaction::read(cs, opcodes::READ_MAGIC, &mut buf);
    engine.execute(&mut txn, session)?;

    let magic = u16::from_be_bytes(buf);
    if magic != MAGIC {
        return Err(GpuError::MagicMismatch { found: magic });
    }
    log::debug!("controller present, magic {:#06x}", magic);
    Ok(magic)
}

/// Read the STATUS0 register
pub fn read_status0<L, S>(
    engine: &mut QspiEngine<L>,
    cs: ChipSelect,
    session: &mut DebugSession<S>,
) -> Result<u8>
where
    L: DigitalLine,
    S: ConfirmSource,
{
    let mut buf = [0u8; 1];
    let mut txn = Transaction::read(cs, opcodes::READ_STATUS0, &mut buf);
    engine.execute(&mut txn, session)?;
    Ok(buf[0])
}

/// Enable video output
pub fn enable_output<L, S>(
    engine: &mut QspiEngine<L>,
    cs: ChipSelect,
    session: &mut DebugSession<S>,
) -> Result<()>
where
    L: DigitalLine,
    S: ConfirmSource,
{
    let mut txn = Transaction::simple(cs, opcodes::ENABLE_OUTPUT);
    engine.execute(&mut txn, session)?;
    Ok(())
}

/// Disable video output
pub fn disable_output<L, S>(
    engine: &mut QspiEngine<L>,
    cs: ChipSelect,
    session: &mut DebugSession<S>,
) -> Result<()>
where
    L: DigitalLine,
    S: ConfirmSource,
{
    let mut txn = Transaction::simple(cs, opcodes::DISABLE_OUTPUT);
    engine.execute(&mut txn, session)?;
    Ok(())
}

/// Load the full palette (256 RGB triples)
pub fn set_palette<L, S>(
    engine: &mut QspiEngine<L>,
    cs: ChipSelect,
    palette: &[u8],
    session: &mut DebugSession<S>,
) -> Result<()>
where
    L: DigitalLine,
    S: ConfirmSource,
{
    if palette.len() != PALETTE_LEN {
        return Err(GpuError::BadPaletteLength {
            found: palette.len(),
        });
    }
    let mut txn = Transaction::write(cs, opcodes::SET_PALETTE, palette);
    engine.execute(&mut txn, session)?;
    Ok(())
}

/// Read the full palette back
pub fn get_palette<L, S>(
    engine: &mut QspiEngine<L>,
    cs: ChipSelect,
    palette: &mut [u8],
    session: &mut DebugSession<S>,
) -> Result<()>
where
    L: DigitalLine,
    S: ConfirmSource,
{
    if palette.len() != PALETTE_LEN {
        return Err(GpuError::BadPaletteLength {
            found: palette.len(),
        });
    }
    let mut txn = Transaction::read(cs, opcodes::GET_PALETTE, palette);
    engine.execute(&mut txn, session)?;
    Ok(())
}

/// Write pixels into the framebuffer starting at `start`
pub fn framebuffer_write<L, S>(
    engine: &mut QspiEngine<L>,
    cs: ChipSelect,
    start: u32,
    pixels: &[u8],
    session: &mut DebugSession<S>,
) -> Result<()>
where
    L: DigitalLine,
    S: ConfirmSource,
{
    check_pixel_range(start, pixels.len())?;

    let mut send = Vec::with_capacity(3 + pixels.len());
    send.extend_from_slice(&pack_pixel_address(start));
    send.extend_from_slice(pixels);

    let mut txn = Transaction::write(cs, opcodes::FRAMEBUFFER_WRITE, &send);
    engine.execute(&mut txn, session)?;
    Ok(())
}

/// Read pixels back from the framebuffer starting at `start`
pub fn framebuffer_read<L, S>(
    engine: &mut QspiEngine<L>,
    cs: ChipSelect,
    start: u32,
    pixels: &mut [u8],
    session: &mut DebugSession<S>,
) -> Result<()>
where
    L: DigitalLine,
    S: ConfirmSource,
{
    check_pixel_range(start, pixels.len())?;

    let address = pack_pixel_address(start);
    let mut txn = Transaction::transfer(cs, opcodes::FRAMEBUFFER_READ, &address, pixels);
    engine.execute(&mut txn, session)?;
    Ok(())
}

fn check_pixel_range(start: u32, len: usize) -> Result<()> {
    if (start as usize) >= PIXELS || len > PIXELS - start as usize {
        return Err(GpuError::PixelOutOfRange { start, len });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_range_check() {
        assert!(check_pixel_range(0, PIXELS).is_ok());
        assert!(check_pixel_range(76799, 1).is_ok());
        assert!(check_pixel_range(76800, 0).is_err());
        assert!(check_pixel_range(0, PIXELS + 1).is_err());
        assert!(check_pixel_range(76799, 2).is_err());
    }
}
