//! qblit - Bit-banged QSPI display controller driver
//!
//! Drives a memory-mapped FPGA display controller over four data lines, a
//! clock line, and one or two chip selects, entirely in software. Every
//! edge on the bus is produced by a GPIO write, which is what makes
//! single-stepping a live transaction possible (`--step`).
//!
//! # Architecture
//!
//! - `qblit-core` - the protocol engine (nibble shifting, turnaround,
//!   chip-select framing); command bytes are opaque to it
//! - `qblit-gpu` - the controller's command vocabulary and content
//!   generators
//! - backends - `qblit-linux-gpio` for real pins, `qblit-sim` for an
//!   in-memory controller

mod cli;
mod commands;
mod programmers;
mod step;

use clap::Parser;
use cli::{Cli, Commands};
use qblit_core::transaction::ChipSelect;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match cli.command {
        Commands::Probe { bus } => with_bus(&bus, commands::probe::run_probe),
        Commands::Status { bus } => with_bus(&bus, commands::probe::run_status),
        Commands::Output { bus, state } => with_bus(&bus, |engine, cs, session| {
            commands::display::run_output(engine, cs, state, session)
        }),
        Commands::Palette { bus } => with_bus(&bus, commands::display::run_palette),
        Commands::Fill { bus, y, color } => with_bus(&bus, |engine, cs, session| {
            commands::display::run_fill(engine, cs, y, color, session)
        }),
        Commands::Gradient { bus, x, y } => with_bus(&bus, |engine, cs, session| {
            commands::display::run_gradient(engine, cs, x, y, session)
        }),
        Commands::Pattern { bus } => with_bus(&bus, commands::display::run_pattern),
        Commands::Xfer {
            bus,
            command,
            send,
            receive,
        } => with_bus(&bus, |engine, cs, session| {
            commands::xfer::run_xfer(engine, cs, command, send.as_deref(), receive, session)
        }),
        Commands::Reset { programmer } => {
            let mut bus = programmers::open_bus(&programmer)?;
            commands::xfer::run_reset(&mut bus.engine)
        }
        Commands::ListProgrammers => {
            commands::list_programmers();
            Ok(())
        }
    }
}

/// Open the bus, resolve the chip select, run one command against it
fn with_bus<F>(args: &cli::BusArgs, f: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(
        &mut commands::Engine,
        ChipSelect,
        &mut commands::Session,
    ) -> Result<(), Box<dyn std::error::Error>>,
{
    let mut bus = programmers::open_bus(&args.programmer)?;
    let cs = chip_select(&bus, args.cs)?;
    let mut session = commands::session_for(args.step);
    f(&mut bus.engine, cs, &mut session)
}

fn chip_select(
    bus: &programmers::OpenBus,
    index: usize,
) -> Result<ChipSelect, Box<dyn std::error::Error>> {
    bus.chip_selects.get(index).copied().ok_or_else(|| {
        format!(
            "chip-select {} not configured (bus has {})",
            index,
            bus.chip_selects.len()
        )
        .into()
    })
}
