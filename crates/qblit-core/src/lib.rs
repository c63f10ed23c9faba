//! qblit-core - Bit-banged Quad-SPI bus master
//!
//! This crate implements a software QSPI master: the exact sequence of line
//! direction changes, clock edges, and nibble-level shifting needed to run a
//! command/payload/response transaction against a memory-mapped target over
//! four data lines, a clock line, and one or more chip-select lines. It is
//! designed to be `no_std` compatible for use on microcontrollers that lack
//! (or bypass) a hardware SPI peripheral.
//!
//! The engine knows nothing about the target's command set: command and
//! payload bytes are opaque. Device vocabularies live in higher layers.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Enable heap allocation (boxed trait objects)
//!
//! # Example
//!
//! ```ignore
//! use qblit_core::debug::DebugSession;
//! use qblit_core::engine::{EngineConfig, QspiEngine};
//! use qblit_core::transaction::Transaction;
//!
//! let mut engine = QspiEngine::new(sclk, [d0, d1, d2, d3], EngineConfig::default());
//! let cs = engine.add_chip_select(cs_line)?;
//! engine.reset();
//!
//! let mut session = DebugSession::free_run();
//! let mut id = [0u8; 2];
//! let mut txn = Transaction::read(cs, 0x60, &mut id);
//! engine.execute(&mut txn, &mut session)?;
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

#[cfg(all(test, not(feature = "std")))]
extern crate std;

#[cfg(all(test, not(feature = "alloc")))]
extern crate alloc;

pub mod debug;
pub mod engine;
pub mod error;
pub mod line;
pub mod nibble;
pub mod transaction;

pub use error::{Error, Result};
