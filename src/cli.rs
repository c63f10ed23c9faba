//! CLI argument parsing

use crate::programmers;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Parse a string as a hex or decimal u8
fn parse_hex_u8(s: &str) -> Result<u8, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u8>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Generate dynamic help text for the programmer argument
fn programmer_help() -> String {
    format!(
        "Programmer to use [available: {}]",
        programmers::programmer_names_short()
    )
}

#[derive(Parser)]
#[command(name = "qblit")]
#[command(author, version, about = "Bit-banged QSPI display controller driver", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Bus options shared across commands
#[derive(Args, Debug, Clone)]
pub struct BusArgs {
    /// Programmer to use
    #[arg(short, long, help = programmer_help())]
    pub programmer: String,

    /// Chip-select index on the bus
    #[arg(long, default_value_t = 0)]
    pub cs: usize,

    /// Pause at each bus checkpoint and wait on stdin
    /// (enter = advance one step, 'f' = run free)
    #[arg(long)]
    pub step: bool,
}

/// Desired video output state
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OutputState {
    /// Enable video output
    On,
    /// Disable video output
    Off,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that a controller answers with the right magic number
    Probe {
        #[command(flatten)]
        bus: BusArgs,
    },

    /// Read and decode the STATUS0 register
    Status {
        #[command(flatten)]
        bus: BusArgs,
    },

    /// Enable or disable video output
    Output {
        #[command(flatten)]
        bus: BusArgs,

        /// Desired state
        #[arg(value_enum)]
        state: OutputState,
    },

    /// Load the grayscale ramp palette
    Palette {
        #[command(flatten)]
        bus: BusArgs,
    },

    /// Fill one scanline with a palette index
    Fill {
        #[command(flatten)]
        bus: BusArgs,

        /// Scanline index (0-239)
        #[arg(short, long)]
        y: u32,

        /// Palette index to fill with
        #[arg(short, long, value_parser = parse_hex_u8)]
        color: u8,
    },

    /// Write a 256-step gradient starting at a pixel position
    Gradient {
        #[command(flatten)]
        bus: BusArgs,

        /// Horizontal start position
        #[arg(short, long, default_value_t = 0)]
        x: u32,

        /// Vertical start position
        #[arg(short, long, default_value_t = 0)]
        y: u32,
    },

    /// Write the full-frame test pattern, one scanline at a time
    Pattern {
        #[command(flatten)]
        bus: BusArgs,
    },

    /// Run a raw transaction and print the response
    Xfer {
        #[command(flatten)]
        bus: BusArgs,

        /// Command byte (hex or decimal)
        #[arg(short, long, value_parser = parse_hex_u8)]
        command: u8,

        /// Payload as a hex string (e.g. 00a5ff)
        #[arg(short, long)]
        send: Option<String>,

        /// Number of response bytes to read
        #[arg(short, long, default_value_t = 0)]
        receive: usize,
    },

    /// Drive the bus to its idle posture
    Reset {
        /// Programmer to use
        #[arg(short, long, help = programmer_help())]
        programmer: String,
    },

    /// List available programmers
    ListProgrammers,
}
