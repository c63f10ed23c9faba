//! qblit-linux-gpio - Linux GPIO line backend
//!
//! This crate drives the QSPI bus through ordinary GPIO pins using the
//! Linux character device interface (gpiocdev), the modern replacement for
//! the deprecated sysfs interface. No SPI controller is needed; every edge
//! is produced in software, which is exactly what makes the bus steppable
//! one checkpoint at a time.
//!
//! # Example
//!
//! ```no_run
//! use qblit_core::debug::DebugSession;
//! use qblit_core::transaction::Transaction;
//! use qblit_linux_gpio::LinuxGpioQspiConfig;
//!
//! let config = LinuxGpioQspiConfig::new("/dev/gpiochip0", 2, 41, [5, 7, 16, 18])
//!     .with_cs1(39);
//! let (mut engine, cs0, _cs1) = qblit_linux_gpio::open(&config)?;
//! engine.reset();
//!
//! let mut session = DebugSession::free_run();
//! let mut magic = [0u8; 2];
//! let mut txn = Transaction::read(cs0, 0x60, &mut magic);
//! engine.execute(&mut txn, &mut session)?;
//! println!("magic: {:02X} {:02X}", magic[0], magic[1]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with the qblit CLI
//!
//! ```bash
//! qblit probe -p linux_gpio:dev=/dev/gpiochip0,sclk=2,cs0=41,cs1=39,d0=5,d1=7,d2=16,d3=18
//!
//! # Older boards with the mirrored data wiring
//! qblit probe -p linux_gpio:gpiochip=0,sclk=2,cs0=41,d0=5,d1=7,d2=16,d3=18,order=reversed
//! ```
//!
//! # Wiring
//!
//! | Controller pin | Role          | Direction                 |
//! |----------------|---------------|---------------------------|
//! | SCLK           | clock         | output                    |
//! | CS0#           | chip select   | output (active low)       |
//! | CS1#           | chip select   | output (active low, opt.) |
//! | D0..D3         | data          | bidirectional             |
//!
//! # System Requirements
//!
//! - Linux kernel 4.8+ with GPIO character device support
//! - Access to `/dev/gpiochipN` (may require root or udev rules)

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod device;
pub mod error;

pub use device::{open, open_boxed, parse_options, LinuxGpioLine, LinuxGpioQspiConfig};
pub use error::{LinuxGpioError, Result};

use qblit_core::engine::QspiEngine;
use qblit_core::line::DigitalLine;
use qblit_core::transaction::ChipSelect;

/// Open a Linux GPIO bus from parsed programmer options
///
/// Convenience entry point for CLI programmer dispatch; returns a
/// type-erased engine plus the configured chip-select handles.
pub fn open_linux_gpio_qspi(
    options: &[(&str, &str)],
) -> std::result::Result<
    (
        QspiEngine<Box<dyn DigitalLine>>,
        Vec<ChipSelect>,
    ),
    Box<dyn std::error::Error>,
> {
    let config = parse_options(options)?;
    let (engine, cs0, cs1) = open_boxed(&config)?;
    let mut chip_selects = vec![cs0];
    chip_selects.extend(cs1);
    Ok((engine, chip_selects))
}
