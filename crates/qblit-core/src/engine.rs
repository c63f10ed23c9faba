//! Transaction engine and phase sequencer
//!
//! [`QspiEngine`] owns the clock, the four data lines, and the chip-select
//! lines, and runs complete transactions against them: assert chip-select,
//! clock out the command and payload one nibble per rising edge, release the
//! data lines, emit the turnaround cycles, sample the response, deassert.
//!
//! Edge discipline: during output, data lines are set to the next nibble's
//! levels while the clock is low, then the clock is raised - that rising
//! edge is the target's sampling edge. The falling edge that follows (an
//! "output edge") only prepares the next level change and never samples.
//! During input, data is sampled on the rising edge and the clock is
//! lowered before the next nibble.
//!
//! The engine is the only writer on the bus for the duration of a
//! transaction; exclusivity is by construction (`execute` takes `&mut self`
//! on a single-threaded engine), not by a runtime busy flag.

use crate::debug::{ConfirmSource, DebugSession};
use crate::error::{Error, Result};
use crate::line::{DigitalLine, Direction};
use crate::nibble::{high_nibble, low_nibble, BitOrder};
use crate::transaction::{ChipSelect, Transaction};

/// Maximum number of chip-select lines an engine can own
pub const MAX_CHIP_SELECTS: usize = 4;

/// Engine configuration, immutable once the engine is built
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Data line wiring policy
    pub bit_order: BitOrder,
    /// Turnaround clock cycles between the direction switch and the first
    /// sampled nibble; applied once per transaction
    pub dummy_cycles: u8,
    /// Clock level outside a transaction
    pub clock_idle: bool,
    /// Chip-select level when the target is not addressed
    pub cs_idle: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bit_order: BitOrder::default(),
            dummy_cycles: 2,
            clock_idle: false,
            cs_idle: true,
        }
    }
}

impl EngineConfig {
    /// Set the data line wiring policy
    pub fn with_bit_order(mut self, bit_order: BitOrder) -> Self {
        self.bit_order = bit_order;
        self
    }

    /// Set the number of turnaround cycles
    pub fn with_dummy_cycles(mut self, cycles: u8) -> Self {
        self.dummy_cycles = cycles;
        self
    }
}

/// Bit-banged QSPI bus master
///
/// Generic over the line backend; see [`DigitalLine`]. The engine assumes
/// the data lines start configured as inputs (the released state).
pub struct QspiEngine<L: DigitalLine> {
    sclk: L,
    data: [L; 4],
    cs: heapless::Vec<L, MAX_CHIP_SELECTS>,
    config: EngineConfig,
    data_direction: Direction,
}

impl<L: DigitalLine> QspiEngine<L> {
    /// Build an engine from a clock line and the four data lines
    ///
    /// Chip-select lines are registered separately with
    /// [`add_chip_select`](Self::add_chip_select).
    pub fn new(sclk: L, data: [L; 4], config: EngineConfig) -> Self {
        Self {
            sclk,
            data,
            cs: heapless::Vec::new(),
            config,
            data_direction: Direction::Input,
        }
    }

    /// Register a chip-select line, returning the handle transactions use
    pub fn add_chip_select(&mut self, line: L) -> Result<ChipSelect> {
        let index = self.cs.len();
        self.cs
            .push(line)
            .map_err(|_| Error::TooManyChipSelects)?;
        Ok(ChipSelect::new(index))
    }

    /// Number of registered chip-select lines
    pub fn chip_select_count(&self) -> usize {
        self.cs.len()
    }

    /// The engine's configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Drive the bus to its idle posture
    ///
    /// Clock at idle level, every chip-select deasserted. Idempotent and
    /// safe at any time, including after a fault or an aborted session.
    pub fn reset(&mut self) {
        log::debug!("bus reset: clock idle, chip selects deasserted");
        self.sclk.write(self.config.clock_idle);
        for cs in self.cs.iter_mut() {
            cs.write(self.config.cs_idle);
        }
    }

    /// Run one complete transaction
    ///
    /// Clocks out the command and payload, turns the bus around, and fills
    /// `txn.receive` with the response. Chip-select is deasserted and the
    /// clock returned to idle on every exit path, including an aborted
    /// stepping session.
    pub fn execute<S: ConfirmSource>(
        &mut self,
        txn: &mut Transaction<'_>,
        session: &mut DebugSession<S>,
    ) -> Result<()> {
        let index = txn.cs.index();
        if index >= self.cs.len() {
            return Err(Error::InvalidChipSelect);
        }

        log::trace!(
            "qspi cs{}: command {:#04x}, send {}, receive {}",
            index,
            txn.command,
            txn.send.len(),
            txn.receive.len()
        );

        self.set_data_direction(Direction::Output);
        self.cs[index].write(!self.config.cs_idle);

        let result = self.run_phases(txn, session);

        // The target must never be left selected, whatever happened above.
        self.sclk.write(self.config.clock_idle);
        self.cs[index].write(self.config.cs_idle);

        result
    }

    fn run_phases<S: ConfirmSource>(
        &mut self,
        txn: &mut Transaction<'_>,
        session: &mut DebugSession<S>,
    ) -> Result<()> {
        self.clock_out_nibble(high_nibble(txn.command), "command[7:4]", session)?;
        self.sclk.write(false);
        self.clock_out_nibble(low_nibble(txn.command), "command[3:0]", session)?;

        for &byte in txn.send.iter() {
            self.output_edge(session)?;
            self.clock_out_nibble(high_nibble(byte), "send[7:4]", session)?;
            self.output_edge(session)?;
            self.clock_out_nibble(low_nibble(byte), "send[3:0]", session)?;
        }

        // Turnaround: release the data lines, then give the target's output
        // drivers time to settle before the first sample.
        self.set_data_direction(Direction::Input);
        self.sclk.write(false);
        for _ in 0..self.config.dummy_cycles {
            self.dummy_cycle();
        }

        for slot in txn.receive.iter_mut() {
            let high = self.clock_in_nibble("receive[7:4]", session)?;
            let low = self.clock_in_nibble("receive[3:0]", session)?;
            *slot = (high << 4) | low;
            log::trace!("read: {:#010b}", *slot);
        }

        Ok(())
    }

    /// Drive a nibble onto the data lines while the clock is low, then
    /// raise the clock. The clock is left high; the caller lowers it before
    /// the next level change.
    fn clock_out_nibble<S: ConfirmSource>(
        &mut self,
        nibble: u8,
        label: &'static str,
        session: &mut DebugSession<S>,
    ) -> Result<()> {
        let levels = self.config.bit_order.levels(nibble);
        for (line, &level) in self.data.iter_mut().zip(levels.iter()) {
            line.write(level);
        }
        self.sclk.write(true);
        session.checkpoint(label, levels)
    }

    /// Falling edge between output nibbles; never samples
    fn output_edge<S: ConfirmSource>(&mut self, session: &mut DebugSession<S>) -> Result<()> {
        self.sclk.write(false);
        let snapshot = self.line_snapshot();
        session.checkpoint("output edge", snapshot)
    }

    /// Raise the clock, sample all four lines, lower the clock
    fn clock_in_nibble<S: ConfirmSource>(
        &mut self,
        label: &'static str,
        session: &mut DebugSession<S>,
    ) -> Result<u8> {
        self.sclk.write(true);
        let levels = self.line_snapshot();
        self.sclk.write(false);
        session.checkpoint(label, levels)?;
        Ok(self.config.bit_order.nibble(levels))
    }

    /// One turnaround clock pulse, no sampling
    fn dummy_cycle(&mut self) {
        self.sclk.write(true);
        self.sclk.write(false);
    }

    fn set_data_direction(&mut self, direction: Direction) {
        if self.data_direction == direction {
            return;
        }
        for line in self.data.iter_mut() {
            line.set_direction(direction);
        }
        self.data_direction = direction;
    }

    fn line_snapshot(&self) -> [bool; 4] {
        [
            self.data[0].read(),
            self.data[1].read(),
            self.data[2].read(),
            self.data[3].read(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::{FreeRun, StepAction};
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;
    use std::string::String;
    use std::vec;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Event {
        Cs(bool),
        Sclk(bool),
        Dir(Direction),
    }

    /// Shared bus double: records events and plays a scripted target
    struct BusState {
        sclk: bool,
        cs_level: bool,
        data_levels: [bool; 4],
        data_dirs: [Direction; 4],
        events: Vec<Event>,
        dummy_cycles: u32,
        input_script: Vec<[bool; 4]>,
        input_edges: u32,
    }

    impl BusState {
        fn on_sclk(&mut self, level: bool) {
            let rising = level && !self.sclk;
            self.sclk = level;
            self.events.push(Event::Sclk(level));
            if rising && !self.cs_level && self.data_dirs == [Direction::Input; 4] {
                self.input_edges += 1;
                if self.input_edges > self.dummy_cycles {
                    let i = (self.input_edges - self.dummy_cycles - 1) as usize;
                    self.data_levels = self.input_script.get(i).copied().unwrap_or([false; 4]);
                }
            }
        }
    }

    #[derive(Clone, Copy)]
    enum Role {
        Sclk,
        Cs,
        Data(usize),
    }

    struct TestLine {
        state: Rc<RefCell<BusState>>,
        role: Role,
    }

    impl DigitalLine for TestLine {
        fn set_direction(&mut self, direction: Direction) {
            let mut state = self.state.borrow_mut();
            if let Role::Data(i) = self.role {
                state.data_dirs[i] = direction;
                state.events.push(Event::Dir(direction));
            }
        }

        fn write(&mut self, level: bool) {
            let mut state = self.state.borrow_mut();
            match self.role {
                Role::Sclk => state.on_sclk(level),
                Role::Cs => {
                    state.cs_level = level;
                    state.events.push(Event::Cs(level));
                }
                Role::Data(i) => {
                    if state.data_dirs[i] == Direction::Output {
                        state.data_levels[i] = level;
                    }
                }
            }
        }

        fn read(&self) -> bool {
            let state = self.state.borrow();
            match self.role {
                Role::Sclk => state.sclk,
                Role::Cs => state.cs_level,
                Role::Data(i) => state.data_levels[i],
            }
        }
    }

    fn engine_with_script(
        config: EngineConfig,
        input: &[u8],
    ) -> (QspiEngine<TestLine>, ChipSelect, Rc<RefCell<BusState>>) {
        let mut script = Vec::new();
        for &byte in input {
            script.push(config.bit_order.levels(high_nibble(byte)));
            script.push(config.bit_order.levels(low_nibble(byte)));
        }
        let state = Rc::new(RefCell::new(BusState {
            sclk: false,
            cs_level: true,
            data_levels: [false; 4],
            data_dirs: [Direction::Input; 4],
            events: Vec::new(),
            dummy_cycles: config.dummy_cycles as u32,
            input_script: script,
            input_edges: 0,
        }));
        let line = |role| TestLine {
            state: Rc::clone(&state),
            role,
        };
        let mut engine = QspiEngine::new(
            line(Role::Sclk),
            [
                line(Role::Data(0)),
                line(Role::Data(1)),
                line(Role::Data(2)),
                line(Role::Data(3)),
            ],
            config,
        );
        let cs = engine.add_chip_select(line(Role::Cs)).unwrap();
        (engine, cs, state)
    }

    /// (asserts, deasserts, rising edges while asserted, of which before
    /// the direction switch)
    fn framing(events: &[Event]) -> (usize, usize, usize, usize) {
        let mut sclk = false;
        let mut asserted = false;
        let mut turned = false;
        let (mut asserts, mut deasserts, mut risings, mut output_risings) = (0, 0, 0, 0);
        for event in events {
            match *event {
                Event::Cs(level) => {
                    if !level && !asserted {
                        asserted = true;
                        asserts += 1;
                    } else if level && asserted {
                        asserted = false;
                        deasserts += 1;
                    }
                }
                Event::Sclk(level) => {
                    if level && !sclk && asserted {
                        risings += 1;
                        if !turned {
                            output_risings += 1;
                        }
                    }
                    sclk = level;
                }
                Event::Dir(Direction::Input) => turned = true,
                Event::Dir(Direction::Output) => turned = false,
            }
        }
        (asserts, deasserts, risings, output_risings)
    }

    #[test]
    fn test_write_only_transaction_framing() {
        let (mut engine, cs, state) = engine_with_script(EngineConfig::default(), &[]);
        let mut session = DebugSession::free_run();

        let mut txn = Transaction::write(cs, 0b1000_0010, &[0x00, 0x01, 0x02]);
        engine.execute(&mut txn, &mut session).unwrap();

        let state = state.borrow();
        let (asserts, deasserts, risings, output_risings) = framing(&state.events);
        assert_eq!(asserts, 1);
        assert_eq!(deasserts, 1);
        // 2 command nibbles + 6 payload nibbles, then 2 dummy cycles
        assert_eq!(output_risings, 8);
        assert_eq!(risings, 10);
        assert!(state.cs_level, "cs must end deasserted");
        assert!(!state.sclk, "clock must end at idle");
    }

    #[test]
    fn test_receive_direct() {
        let config = EngineConfig::default();
        let (mut engine, cs, _state) = engine_with_script(config, &[0xA5, 0x00, 0xFF]);
        let mut session = DebugSession::free_run();

        let mut buf = [0u8; 3];
        let mut txn = Transaction::read(cs, 0b1000_0011, &mut buf);
        engine.execute(&mut txn, &mut session).unwrap();

        assert_eq!(buf, [0xA5, 0x00, 0xFF]);
    }

    #[test]
    fn test_receive_reversed() {
        let config = EngineConfig::default().with_bit_order(BitOrder::Reversed);
        let (mut engine, cs, _state) = engine_with_script(config, &[0xA5, 0x3C, 0x81]);
        let mut session = DebugSession::free_run();

        let mut buf = [0u8; 3];
        let mut txn = Transaction::read(cs, 0x43, &mut buf);
        engine.execute(&mut txn, &mut session).unwrap();

        assert_eq!(buf, [0xA5, 0x3C, 0x81]);
    }

    #[test]
    fn test_send_and_receive_are_independent() {
        let (mut engine, cs, state) = engine_with_script(EngineConfig::default(), &[0x42]);
        let mut session = DebugSession::free_run();

        let mut buf = [0u8; 1];
        let mut txn = Transaction::transfer(cs, 0xC2, &[0x00, 0x3E, 0x80], &mut buf);
        engine.execute(&mut txn, &mut session).unwrap();

        assert_eq!(buf, [0x42]);
        let state = state.borrow();
        let (_, _, risings, output_risings) = framing(&state.events);
        assert_eq!(output_risings, 8);
        // 8 output + 2 dummy + 2 receive
        assert_eq!(risings, 12);
    }

    #[test]
    fn test_turnaround_runs_even_without_receive() {
        let (mut engine, cs, state) = engine_with_script(EngineConfig::default(), &[]);
        let mut session = DebugSession::free_run();

        let mut txn = Transaction::simple(cs, 0x01);
        engine.execute(&mut txn, &mut session).unwrap();

        // The direction switch and both dummy cycles happen regardless of
        // the receive count.
        assert_eq!(state.borrow().input_edges, 2);
    }

    #[test]
    fn test_dummy_cycle_count_is_configuration() {
        let config = EngineConfig::default().with_dummy_cycles(4);
        let (mut engine, cs, state) = engine_with_script(config, &[0xAB]);
        let mut session = DebugSession::free_run();

        let mut buf = [0u8; 1];
        let mut txn = Transaction::read(cs, 0x40, &mut buf);
        engine.execute(&mut txn, &mut session).unwrap();

        assert_eq!(buf, [0xAB]);
        assert_eq!(state.borrow().input_edges, 4 + 2);
    }

    struct FailAfter {
        remaining: usize,
    }

    impl ConfirmSource for FailAfter {
        fn confirm(&mut self, _label: &str, _lines: [bool; 4]) -> Result<StepAction> {
            if self.remaining == 0 {
                return Err(Error::Aborted);
            }
            self.remaining -= 1;
            Ok(StepAction::Advance)
        }
    }

    #[test]
    fn test_aborted_session_still_releases_bus() {
        let (mut engine, cs, state) = engine_with_script(EngineConfig::default(), &[]);
        let mut session = DebugSession::new(FailAfter { remaining: 3 });

        let mut txn = Transaction::write(cs, 0x82, &[0x10, 0x20]);
        let result = engine.execute(&mut txn, &mut session);
        assert_eq!(result, Err(Error::Aborted));

        let state = state.borrow();
        let (asserts, deasserts, _, _) = framing(&state.events);
        assert_eq!(asserts, 1);
        assert_eq!(deasserts, 1);
        assert!(state.cs_level, "cs left asserted after abort");
        assert!(!state.sclk, "clock not restored to idle after abort");
    }

    #[test]
    fn test_invalid_chip_select() {
        let (mut engine, _cs, state) = engine_with_script(EngineConfig::default(), &[]);
        let mut session = DebugSession::free_run();

        let mut txn = Transaction::simple(ChipSelect::new(3), 0x01);
        assert_eq!(
            engine.execute(&mut txn, &mut session),
            Err(Error::InvalidChipSelect)
        );
        assert!(state.borrow().events.is_empty(), "bus touched on bad handle");
    }

    #[test]
    fn test_reset_is_idempotent() {
        let (mut engine, _cs, state) = engine_with_script(EngineConfig::default(), &[]);

        engine.reset();
        let after_one = {
            let state = state.borrow();
            (state.sclk, state.cs_level)
        };
        engine.reset();
        let after_two = {
            let state = state.borrow();
            (state.sclk, state.cs_level)
        };
        assert_eq!(after_one, after_two);
        assert_eq!(after_two, (false, true));
    }

    struct Recorder {
        labels: Vec<String>,
    }

    impl ConfirmSource for Recorder {
        fn confirm(&mut self, label: &str, _lines: [bool; 4]) -> Result<StepAction> {
            self.labels.push(String::from(label));
            Ok(StepAction::Advance)
        }
    }

    #[test]
    fn test_checkpoint_sequence() {
        let (mut engine, cs, _state) = engine_with_script(EngineConfig::default(), &[0x55]);
        let mut session = DebugSession::new(Recorder { labels: Vec::new() });

        let mut buf = [0u8; 1];
        let mut txn = Transaction::transfer(cs, 0x82, &[0xAA], &mut buf);
        engine.execute(&mut txn, &mut session).unwrap();

        let labels: Vec<&str> = session.source().labels.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "command[7:4]",
                "command[3:0]",
                "output edge",
                "send[7:4]",
                "output edge",
                "send[3:0]",
                "receive[7:4]",
                "receive[3:0]",
            ]
        );
    }

    #[test]
    fn test_free_run_session_skips_checkpoints() {
        let (mut engine, cs, _state) = engine_with_script(EngineConfig::default(), &[]);
        let mut session = DebugSession::new(FreeRun);

        let mut txn = Transaction::write(cs, 0x82, &[0x01]);
        engine.execute(&mut txn, &mut session).unwrap();
        assert!(session.is_free_running());
    }
}
