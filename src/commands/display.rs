//! Display content commands

use indicatif::{ProgressBar, ProgressStyle};
use qblit_core::transaction::ChipSelect;
use qblit_gpu::pattern;
use qblit_gpu::{HEIGHT, WIDTH};

use super::{Engine, Session};
use crate::cli::OutputState;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Switch video output on or off
pub fn run_output(
    engine: &mut Engine,
    cs: ChipSelect,
    state: OutputState,
    session: &mut Session,
) -> CmdResult {
    match state {
        OutputState::On => {
            qblit_gpu::enable_output(engine, cs, session)?;
            println!("Video output enabled");
        }
        OutputState::Off => {
            qblit_gpu::disable_output(engine, cs, session)?;
            println!("Video output disabled");
        }
    }
    Ok(())
}

/// Load the grayscale ramp palette
pub fn run_palette(engine: &mut Engine, cs: ChipSelect, session: &mut Session) -> CmdResult {
    qblit_gpu::set_palette(engine, cs, &pattern::grayscale_palette(), session)?;
    println!("Loaded grayscale palette");
    Ok(())
}

/// Fill one scanline with a palette index
pub fn run_fill(
    engine: &mut Engine,
    cs: ChipSelect,
    y: u32,
    color: u8,
    session: &mut Session,
) -> CmdResult {
    if y >= HEIGHT as u32 {
        return Err(format!("scanline {} out of range (0-{})", y, HEIGHT - 1).into());
    }
    qblit_gpu::framebuffer_write(engine, cs, y * WIDTH as u32, &pattern::solid_line(color), session)?;
    println!("Filled line {} with {:#04x}", y, color);
    Ok(())
}

/// Write the 256-step gradient at a pixel position
pub fn run_gradient(
    engine: &mut Engine,
    cs: ChipSelect,
    x: u32,
    y: u32,
    session: &mut Session,
) -> CmdResult {
    let start = x + y * WIDTH as u32;
    qblit_gpu::framebuffer_write(engine, cs, start, &pattern::gradient(), session)?;
    println!("Wrote gradient at ({}, {})", x, y);
    Ok(())
}

/// Write the full-frame test pattern, one scanline per transaction
pub fn run_pattern(engine: &mut Engine, cs: ChipSelect, session: &mut Session) -> CmdResult {
    let frame = pattern::test_frame();
    let bar = ProgressBar::new(HEIGHT as u64);
    bar.set_style(ProgressStyle::with_template(
        "{bar:40} {pos}/{len} lines",
    )?);

    for (y, row) in frame.chunks(WIDTH).enumerate() {
        qblit_gpu::framebuffer_write(engine, cs, (y * WIDTH) as u32, row, session)?;
        bar.inc(1);
    }
    bar.finish();
    println!("Test pattern written");
    Ok(())
}
