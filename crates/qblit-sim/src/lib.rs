//! qblit-sim - In-memory display controller emulator
//!
//! This crate provides a simulated QSPI target that behaves like the FPGA
//! display controller at the edge level: it samples one nibble per rising
//! clock edge while the master drives the data lines, prepares its response
//! when the lines are released, sits out the turnaround cycles, then drives
//! one response nibble per rising edge. Write-type commands commit when
//! chip-select deasserts, matching the controller's "until the master stops
//! the transaction" semantics.
//!
//! It's useful for testing and development without real hardware, and for
//! checking the bus-level framing invariants via [`SimStats`].

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

use std::cell::RefCell;
use std::rc::Rc;

use qblit_core::engine::{EngineConfig, QspiEngine};
use qblit_core::line::{DigitalLine, Direction};
use qblit_core::nibble::{high_nibble, low_nibble, BitOrder};
use qblit_core::transaction::ChipSelect;
use qblit_gpu::{opcodes, MAGIC, PALETTE_LEN, PIXELS};

/// Number of chip-select lines the simulated bus exposes
///
/// The controller itself answers on cs0; cs1 is wired but unpopulated.
pub const CS_LINES: usize = 2;

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Wiring policy the emulated controller assumes on its data pins
    pub bit_order: BitOrder,
    /// Turnaround cycles the controller waits before driving data
    pub dummy_cycles: u8,
    /// Initial STATUS0 value
    pub status0: u8,
}

impl Default for SimConfig {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            bit_order: engine.bit_order,
            dummy_cycles: engine.dummy_cycles,
            status0: 0,
        }
    }
}

/// Counters for protocol-level assertions in tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimStats {
    /// Chip-select assert transitions seen
    pub cs_asserts: u32,
    /// Chip-select deassert transitions seen
    pub cs_deasserts: u32,
    /// Rising edges sampled while the master drove the data lines
    pub output_rising_edges: u32,
    /// Rising edges while the lines were released (turnaround included)
    pub input_rising_edges: u32,
    /// Rising edges consumed as turnaround
    pub turnaround_cycles: u32,
}

#[derive(Clone, Copy)]
enum Role {
    Sclk,
    Cs(usize),
    Data(usize),
}

struct Controller {
    vram: Vec<u8>,
    palette: [u8; PALETTE_LEN],
    output_enabled: bool,
    status0: u8,
}

struct SimState {
    config: SimConfig,
    sclk: bool,
    cs_levels: [bool; CS_LINES],
    data_levels: [bool; 4],
    data_dirs: [Direction; 4],
    active_cs: Option<usize>,
    nibbles: Vec<u8>,
    response: Vec<u8>,
    response_pos: usize,
    response_ready: bool,
    input_edges: u32,
    stats: SimStats,
    controller: Controller,
}

impl SimState {
    fn new(config: SimConfig) -> Self {
        let status0 = config.status0;
        Self {
            config,
            sclk: false,
            cs_levels: [true; CS_LINES],
            data_levels: [false; 4],
            data_dirs: [Direction::Input; 4],
            active_cs: None,
            nibbles: Vec::new(),
            response: Vec::new(),
            response_pos: 0,
            response_ready: false,
            input_edges: 0,
            stats: SimStats::default(),
            controller: Controller {
                vram: vec![0; PIXELS],
                palette: [0; PALETTE_LEN],
                output_enabled: false,
                status0,
            },
        }
    }

    fn on_cs_write(&mut self, index: usize, level: bool) {
        if self.cs_levels[index] == level {
            return;
        }
        self.cs_levels[index] = level;

        if !level {
            // Assert: a new transaction starts
            if self.active_cs.is_some() {
                log::warn!("sim: cs{} asserted while another cs is active", index);
                return;
            }
            self.active_cs = Some(index);
            self.nibbles.clear();
            self.response.clear();
            self.response_pos = 0;
            self.response_ready = false;
            self.input_edges = 0;
            self.stats.cs_asserts += 1;
        } else if self.active_cs == Some(index) {
            self.finalize();
            self.active_cs = None;
            self.stats.cs_deasserts += 1;
        }
    }

    fn on_sclk_write(&mut self, level: bool) {
        let rising = level && !self.sclk;
        self.sclk = level;
        if !rising || self.active_cs.is_none() {
            return;
        }

        if self.data_dirs == [Direction::Input; 4] {
            // Master is listening: turnaround first, then drive the response
            self.stats.input_rising_edges += 1;
            self.input_edges += 1;
            if self.input_edges <= self.config.dummy_cycles as u32 {
                self.stats.turnaround_cycles += 1;
            } else {
                let nibble = self
                    .response
                    .get(self.response_pos)
                    .copied()
                    .unwrap_or(0);
                self.response_pos += 1;
                self.data_levels = self.config.bit_order.levels(nibble);
            }
        } else {
            // Master is driving: sample one nibble
            self.stats.output_rising_edges += 1;
            let nibble = self.config.bit_order.nibble(self.data_levels);
            self.nibbles.push(nibble);
        }
    }

    fn on_data_write(&mut self, index: usize, level: bool) {
        if self.data_dirs[index] == Direction::Output {
            self.data_levels[index] = level;
        }
    }

    fn on_data_direction(&mut self, index: usize, direction: Direction) {
        self.data_dirs[index] = direction;
        if direction == Direction::Input
            && self.data_dirs == [Direction::Input; 4]
            && self.active_cs.is_some()
            && !self.response_ready
        {
            self.prepare_response();
            self.response_ready = true;
        }
    }

    /// Split the sampled nibble stream into command byte and payload
    fn transaction_bytes(&self) -> (Option<u8>, Vec<u8>) {
        let mut bytes = Vec::with_capacity(self.nibbles.len() / 2);
        for pair in self.nibbles.chunks_exact(2) {
            bytes.push((pair[0] << 4) | pair[1]);
        }
        match bytes.split_first() {
            Some((&command, payload)) => (Some(command), payload.to_vec()),
            None => (None, Vec::new()),
        }
    }

    fn prepare_response(&mut self) {
        if self.active_cs != Some(0) {
            self.response.clear();
            return;
        }

        let (command, payload) = self.transaction_bytes();
        let bytes: Vec<u8> = match command {
            Some(opcodes::READ_MAGIC) => MAGIC.to_be_bytes().to_vec(),
            Some(opcodes::READ_STATUS0) => vec![self.controller.status0],
            Some(opcodes::GET_PALETTE) => self.controller.palette.to_vec(),
            Some(opcodes::FRAMEBUFFER_READ) if payload.len() >= 3 => {
                let start = unpack_pixel_address(&payload[..3]) as usize;
                if start < PIXELS {
                    self.controller.vram[start..].to_vec()
                } else {
                    Vec::new()
                }
            }
            _ => Vec::new(),
        };

        self.response.clear();
        for byte in bytes {
            self.response.push(high_nibble(byte));
            self.response.push(low_nibble(byte));
        }
        self.response_pos = 0;
    }

    /// Commit write-type commands; runs at chip-select deassert
    fn finalize(&mut self) {
        if self.active_cs != Some(0) {
            return;
        }

        let (command, payload) = self.transaction_bytes();
        match command {
            Some(opcodes::FRAMEBUFFER_WRITE) if payload.len() >= 3 => {
                let start = unpack_pixel_address(&payload[..3]) as usize;
                let pixels = &payload[3..];
                if start < PIXELS {
                    let end = (start + pixels.len()).min(PIXELS);
                    self.controller.vram[start..end].copy_from_slice(&pixels[..end - start]);
                }
            }
            Some(opcodes::SET_PALETTE) => {
                let len = payload.len().min(PALETTE_LEN);
                self.controller.palette[..len].copy_from_slice(&payload[..len]);
            }
            Some(opcodes::ENABLE_OUTPUT) => self.controller.output_enabled = true,
            Some(opcodes::DISABLE_OUTPUT) => self.controller.output_enabled = false,
            _ => {}
        }
    }
}

fn unpack_pixel_address(bytes: &[u8]) -> u32 {
    ((bytes[0] as u32) << 12) | ((bytes[1] as u32) << 4) | ((bytes[2] as u32) >> 4)
}

/// Handle onto a simulated bus
///
/// Hands out [`SimLine`]s for the engine and exposes the controller state
/// for assertions.
pub struct SimBus {
    state: Rc<RefCell<SimState>>,
}

impl SimBus {
    /// Create a simulated bus with an attached controller on cs0
    pub fn new(config: SimConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(SimState::new(config))),
        }
    }

    fn line(&self, role: Role) -> SimLine {
        SimLine {
            state: Rc::clone(&self.state),
            role,
        }
    }

    /// The clock line
    pub fn sclk(&self) -> SimLine {
        self.line(Role::Sclk)
    }

    /// The four data lines
    pub fn data_lines(&self) -> [SimLine; 4] {
        [
            self.line(Role::Data(0)),
            self.line(Role::Data(1)),
            self.line(Role::Data(2)),
            self.line(Role::Data(3)),
        ]
    }

    /// A chip-select line; the controller answers on index 0
    pub fn chip_select(&self, index: usize) -> Option<SimLine> {
        (index < CS_LINES).then(|| self.line(Role::Cs(index)))
    }

    /// Protocol counters accumulated so far
    pub fn stats(&self) -> SimStats {
        self.state.borrow().stats
    }

    /// Copy of the framebuffer contents
    pub fn vram(&self) -> Vec<u8> {
        self.state.borrow().controller.vram.clone()
    }

    /// Copy of the palette contents
    pub fn palette(&self) -> Vec<u8> {
        self.state.borrow().controller.palette.to_vec()
    }

    /// Whether video output is currently enabled
    pub fn output_enabled(&self) -> bool {
        self.state.borrow().controller.output_enabled
    }

    /// Set the STATUS0 value the controller reports
    pub fn set_status0(&self, status0: u8) {
        self.state.borrow_mut().controller.status0 = status0;
    }

    /// Preload framebuffer contents
    pub fn load_vram(&self, start: usize, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        let end = (start + data.len()).min(PIXELS);
        state.controller.vram[start..end].copy_from_slice(&data[..end - start]);
    }
}

/// One line of the simulated bus
pub struct SimLine {
    state: Rc<RefCell<SimState>>,
    role: Role,
}

impl DigitalLine for SimLine {
    fn set_direction(&mut self, direction: Direction) {
        if let Role::Data(i) = self.role {
            self.state.borrow_mut().on_data_direction(i, direction);
        }
    }

    fn write(&mut self, level: bool) {
        let mut state = self.state.borrow_mut();
        match self.role {
            Role::Sclk => state.on_sclk_write(level),
            Role::Cs(i) => state.on_cs_write(i, level),
            Role::Data(i) => state.on_data_write(i, level),
        }
    }

    fn read(&self) -> bool {
        let state = self.state.borrow();
        match self.role {
            Role::Sclk => state.sclk,
            Role::Cs(i) => state.cs_levels[i],
            Role::Data(i) => state.data_levels[i],
        }
    }
}

/// Assemble an engine wired to a fresh simulated controller
///
/// Master and controller share the same wiring policy and turnaround count
/// from `config`; use [`SimBus::new`] and wire an engine by hand to test a
/// mismatched pair.
pub fn open_sim(
    config: SimConfig,
) -> qblit_core::Result<(QspiEngine<SimLine>, [ChipSelect; CS_LINES], SimBus)> {
    let engine_config = EngineConfig::default()
        .with_bit_order(config.bit_order)
        .with_dummy_cycles(config.dummy_cycles);

    let bus = SimBus::new(config);
    let mut engine = QspiEngine::new(bus.sclk(), bus.data_lines(), engine_config);
    let cs0 = engine.add_chip_select(bus.line(Role::Cs(0)))?;
    let cs1 = engine.add_chip_select(bus.line(Role::Cs(1)))?;
    Ok((engine, [cs0, cs1], bus))
}

/// Like [`open_sim`], but with the line type erased for CLI dispatch
pub fn open_sim_boxed(
    config: SimConfig,
) -> qblit_core::Result<(
    QspiEngine<Box<dyn DigitalLine>>,
    [ChipSelect; CS_LINES],
    SimBus,
)> {
    let engine_config = EngineConfig::default()
        .with_bit_order(config.bit_order)
        .with_dummy_cycles(config.dummy_cycles);

    let bus = SimBus::new(config);
    let mut engine = QspiEngine::new(
        Box::new(bus.sclk()) as Box<dyn DigitalLine>,
        bus.data_lines()
            .map(|line| Box::new(line) as Box<dyn DigitalLine>),
        engine_config,
    );
    let cs0 = engine.add_chip_select(Box::new(bus.line(Role::Cs(0))))?;
    let cs1 = engine.add_chip_select(Box::new(bus.line(Role::Cs(1))))?;
    Ok((engine, [cs0, cs1], bus))
}
