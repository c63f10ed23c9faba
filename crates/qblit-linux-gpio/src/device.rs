//! Linux GPIO QSPI line backend
//!
//! Implements [`DigitalLine`] on top of the GPIO character device via
//! gpiocdev, one line request per bus role. Direction changes go through
//! `reconfigure`; write/read failures are logged and swallowed, since the
//! protocol layer treats line access as always succeeding.

use std::time::Duration;

use gpiocdev::line::{Offset, Value};
use gpiocdev::request::{Config, Request};

use qblit_core::engine::{EngineConfig, QspiEngine};
use qblit_core::line::{DigitalLine, Direction};
use qblit_core::nibble::BitOrder;
use qblit_core::transaction::ChipSelect;

use crate::error::{LinuxGpioError, Result};

/// Configuration for opening the GPIO bus
#[derive(Debug, Clone)]
pub struct LinuxGpioQspiConfig {
    /// Device path (e.g., "/dev/gpiochip0")
    pub device: String,
    /// Clock line offset
    pub sclk: Offset,
    /// Primary chip-select offset
    pub cs0: Offset,
    /// Secondary chip-select offset (optional)
    pub cs1: Option<Offset>,
    /// Data line offsets d0..d3
    pub data: [Offset; 4],
    /// Data line wiring policy
    pub bit_order: BitOrder,
    /// Turnaround clock cycles
    pub dummy_cycles: u8,
    /// Optional settle delay after every line update, in nanoseconds
    ///
    /// Zero (the default) means no explicit pacing; the syscall latency of
    /// the character device bounds the clock rate on its own.
    pub settle_ns: u64,
}

impl Default for LinuxGpioQspiConfig {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            device: String::new(),
            sclk: 0,
            cs0: 0,
            cs1: None,
            data: [0; 4],
            bit_order: engine.bit_order,
            dummy_cycles: engine.dummy_cycles,
            settle_ns: 0,
        }
    }
}

impl LinuxGpioQspiConfig {
    /// Create a new configuration with the required lines
    pub fn new(device: impl Into<String>, sclk: Offset, cs0: Offset, data: [Offset; 4]) -> Self {
        Self {
            device: device.into(),
            sclk,
            cs0,
            data,
            ..Default::default()
        }
    }

    /// Add a second chip-select line
    pub fn with_cs1(mut self, cs1: Offset) -> Self {
        self.cs1 = Some(cs1);
        self
    }

    /// Set the data line wiring policy
    pub fn with_bit_order(mut self, bit_order: BitOrder) -> Self {
        self.bit_order = bit_order;
        self
    }

    /// Set the per-update settle delay in nanoseconds
    pub fn with_settle_ns(mut self, ns: u64) -> Self {
        self.settle_ns = ns;
        self
    }

    fn roles(&self) -> Vec<(&'static str, Offset)> {
        let mut roles = vec![
            ("sclk", self.sclk),
            ("cs0", self.cs0),
            ("d0", self.data[0]),
            ("d1", self.data[1]),
            ("d2", self.data[2]),
            ("d3", self.data[3]),
        ];
        if let Some(cs1) = self.cs1 {
            roles.push(("cs1", cs1));
        }
        roles
    }

    /// Check the configuration is usable: a device is named and no GPIO
    /// offset serves two roles
    pub fn validate(&self) -> Result<()> {
        if self.device.is_empty() {
            return Err(LinuxGpioError::NoDevice);
        }
        let roles = self.roles();
        for (i, &(first, offset)) in roles.iter().enumerate() {
            for &(second, other) in &roles[i + 1..] {
                if offset == other {
                    return Err(LinuxGpioError::DuplicatePin {
                        offset,
                        first,
                        second,
                    });
                }
            }
        }
        Ok(())
    }
}

/// One GPIO line driven through its own character-device request
pub struct LinuxGpioLine {
    request: Request,
    offset: Offset,
    direction: Direction,
    settle_ns: u64,
}

impl LinuxGpioLine {
    fn request(
        device: &str,
        name: &'static str,
        offset: Offset,
        direction: Direction,
        initial: bool,
        settle_ns: u64,
    ) -> Result<Self> {
        let mut config = Config::default();
        match direction {
            Direction::Output => {
                config.with_line(offset).as_output(value_from(initial));
            }
            Direction::Input => {
                config.with_line(offset).as_input();
            }
        }

        let request = Request::from_config(config)
            .on_chip(device)
            .with_consumer("qblit")
            .request()
            .map_err(|source| LinuxGpioError::LineRequestFailed {
                name,
                offset,
                source,
            })?;

        Ok(Self {
            request,
            offset,
            direction,
            settle_ns,
        })
    }

    fn settle(&self) {
        if self.settle_ns > 0 {
            std::thread::sleep(Duration::from_nanos(self.settle_ns));
        }
    }
}

fn value_from(level: bool) -> Value {
    if level {
        Value::Active
    } else {
        Value::Inactive
    }
}

impl DigitalLine for LinuxGpioLine {
    fn set_direction(&mut self, direction: Direction) {
        if self.direction == direction {
            return;
        }

        let mut config = Config::default();
        match direction {
            Direction::Output => {
                config.with_line(self.offset).as_output(Value::Inactive);
            }
            Direction::Input => {
                config.with_line(self.offset).as_input();
            }
        }

        if let Err(e) = self.request.reconfigure(&config) {
            log::error!("failed to reconfigure GPIO line {}: {}", self.offset, e);
        }
        self.direction = direction;
    }

    fn write(&mut self, level: bool) {
        if let Err(e) = self.request.set_value(self.offset, value_from(level)) {
            log::error!("failed to set GPIO line {}: {}", self.offset, e);
        }
        self.settle();
    }

    fn read(&self) -> bool {
        match self.request.value(self.offset) {
            Ok(Value::Active) => true,
            Ok(Value::Inactive) => false,
            Err(e) => {
                log::error!("failed to read GPIO line {}: {}", self.offset, e);
                false
            }
        }
    }
}

struct OpenLines {
    sclk: LinuxGpioLine,
    data: [LinuxGpioLine; 4],
    cs0: LinuxGpioLine,
    cs1: Option<LinuxGpioLine>,
}

fn open_lines(config: &LinuxGpioQspiConfig) -> Result<OpenLines> {
    config.validate()?;
    log::debug!("linux_gpio: opening {}", config.device);

    let engine = engine_config(config);
    let line = |name, offset, direction, initial| {
        LinuxGpioLine::request(&config.device, name, offset, direction, initial, config.settle_ns)
    };

    // Initial state is the bus idle posture: clock low, chip selects high,
    // data lines released.
    let sclk = line("sclk", config.sclk, Direction::Output, engine.clock_idle)?;
    let data = [
        line("d0", config.data[0], Direction::Input, false)?,
        line("d1", config.data[1], Direction::Input, false)?,
        line("d2", config.data[2], Direction::Input, false)?,
        line("d3", config.data[3], Direction::Input, false)?,
    ];
    let cs0 = line("cs0", config.cs0, Direction::Output, engine.cs_idle)?;
    let cs1 = match config.cs1 {
        Some(offset) => Some(line("cs1", offset, Direction::Output, engine.cs_idle)?),
        None => None,
    };

    log::info!(
        "linux_gpio: opened {} (sclk={}, cs0={}{}, d0={}, d1={}, d2={}, d3={}, order={:?})",
        config.device,
        config.sclk,
        config.cs0,
        config
            .cs1
            .map(|cs1| format!(", cs1={}", cs1))
            .unwrap_or_default(),
        config.data[0],
        config.data[1],
        config.data[2],
        config.data[3],
        config.bit_order,
    );

    Ok(OpenLines {
        sclk,
        data,
        cs0,
        cs1,
    })
}

fn engine_config(config: &LinuxGpioQspiConfig) -> EngineConfig {
    EngineConfig::default()
        .with_bit_order(config.bit_order)
        .with_dummy_cycles(config.dummy_cycles)
}

/// Open the GPIO lines and assemble an engine
///
/// Returns the engine plus the chip-select handles for cs0 and (if
/// configured) cs1.
pub fn open(
    config: &LinuxGpioQspiConfig,
) -> Result<(QspiEngine<LinuxGpioLine>, ChipSelect, Option<ChipSelect>)> {
    let lines = open_lines(config)?;
    let mut engine = QspiEngine::new(lines.sclk, lines.data, engine_config(config));
    let cs0 = engine.add_chip_select(lines.cs0)?;
    let cs1 = match lines.cs1 {
        Some(line) => Some(engine.add_chip_select(line)?),
        None => None,
    };
    Ok((engine, cs0, cs1))
}

/// Like [`open`], but with the line type erased for CLI dispatch
pub fn open_boxed(
    config: &LinuxGpioQspiConfig,
) -> Result<(
    QspiEngine<Box<dyn DigitalLine>>,
    ChipSelect,
    Option<ChipSelect>,
)> {
    let lines = open_lines(config)?;
    let mut engine = QspiEngine::new(
        Box::new(lines.sclk) as Box<dyn DigitalLine>,
        lines.data.map(|line| Box::new(line) as Box<dyn DigitalLine>),
        engine_config(config),
    );
    let cs0 = engine.add_chip_select(Box::new(lines.cs0))?;
    let cs1 = match lines.cs1 {
        Some(line) => Some(engine.add_chip_select(Box::new(line) as Box<dyn DigitalLine>)?),
        None => None,
    };
    Ok((engine, cs0, cs1))
}

/// Parse programmer options from a list of key-value pairs
///
/// # Supported Options
///
/// - `dev=/dev/gpiochipN` - GPIO chip device path (required, or use gpiochip)
/// - `gpiochip=N` - GPIO chip number (alternative to dev)
/// - `sclk=N` - clock line offset (required)
/// - `cs0=N` or `cs=N` - primary chip-select offset (required)
/// - `cs1=N` - secondary chip-select offset (optional)
/// - `d0=N` .. `d3=N` - data line offsets (all four required)
/// - `order=direct|reversed` - data line wiring policy (default direct)
/// - `dummy=N` - turnaround cycles (default 2)
/// - `settle=NS` - settle delay after each line update, nanoseconds
pub fn parse_options(options: &[(&str, &str)]) -> Result<LinuxGpioQspiConfig> {
    fn offset(key: &'static str, value: &str) -> Result<Offset> {
        value.parse().map_err(|_| LinuxGpioError::InvalidParameter {
            key,
            value: value.to_string(),
        })
    }

    let mut config = LinuxGpioQspiConfig::default();
    let mut gpiochip: Option<u32> = None;
    let mut have_sclk = false;
    let mut have_cs0 = false;
    let mut have_data = [false; 4];

    for (key, value) in options {
        match *key {
            "dev" => config.device = value.to_string(),
            "gpiochip" => {
                gpiochip = Some(offset("gpiochip", value)?);
            }
            "sclk" => {
                config.sclk = offset("sclk", value)?;
                have_sclk = true;
            }
            "cs0" | "cs" => {
                config.cs0 = offset("cs0", value)?;
                have_cs0 = true;
            }
            "cs1" => {
                config.cs1 = Some(offset("cs1", value)?);
            }
            "d0" => {
                config.data[0] = offset("d0", value)?;
                have_data[0] = true;
            }
            "d1" => {
                config.data[1] = offset("d1", value)?;
                have_data[1] = true;
            }
            "d2" => {
                config.data[2] = offset("d2", value)?;
                have_data[2] = true;
            }
            "d3" => {
                config.data[3] = offset("d3", value)?;
                have_data[3] = true;
            }
            "order" => {
                config.bit_order = match *value {
                    "direct" => BitOrder::Direct,
                    "reversed" => BitOrder::Reversed,
                    _ => {
                        return Err(LinuxGpioError::InvalidParameter {
                            key: "order",
                            value: value.to_string(),
                        })
                    }
                };
            }
            "dummy" => {
                config.dummy_cycles =
                    value.parse().map_err(|_| LinuxGpioError::InvalidParameter {
                        key: "dummy",
                        value: value.to_string(),
                    })?;
            }
            "settle" => {
                config.settle_ns =
                    value.parse().map_err(|_| LinuxGpioError::InvalidParameter {
                        key: "settle",
                        value: value.to_string(),
                    })?;
            }
            _ => {
                log::warn!("linux_gpio: unknown option: {}={}", key, value);
            }
        }
    }

    // Handle dev vs gpiochip
    if config.device.is_empty() {
        match gpiochip {
            Some(n) if n > 9 => {
                return Err(LinuxGpioError::InvalidParameter {
                    key: "gpiochip",
                    value: n.to_string(),
                })
            }
            Some(n) => config.device = format!("/dev/gpiochip{}", n),
            None => return Err(LinuxGpioError::NoDevice),
        }
    } else if gpiochip.is_some() {
        return Err(LinuxGpioError::ConflictingOptions(
            "only one of 'dev' or 'gpiochip' can be specified",
        ));
    }

    if !have_sclk {
        return Err(LinuxGpioError::MissingParameter("sclk"));
    }
    if !have_cs0 {
        return Err(LinuxGpioError::MissingParameter("cs0 (or cs)"));
    }
    for (i, have) in have_data.iter().enumerate() {
        if !have {
            let name = ["d0", "d1", "d2", "d3"][i];
            return Err(LinuxGpioError::MissingParameter(name));
        }
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_options() -> Vec<(&'static str, &'static str)> {
        vec![
            ("dev", "/dev/gpiochip0"),
            ("sclk", "2"),
            ("cs0", "41"),
            ("cs1", "39"),
            ("d0", "5"),
            ("d1", "7"),
            ("d2", "16"),
            ("d3", "18"),
        ]
    }

    #[test]
    fn test_parse_full_options() {
        let config = parse_options(&full_options()).unwrap();
        assert_eq!(config.device, "/dev/gpiochip0");
        assert_eq!(config.sclk, 2);
        assert_eq!(config.cs0, 41);
        assert_eq!(config.cs1, Some(39));
        assert_eq!(config.data, [5, 7, 16, 18]);
        assert_eq!(config.bit_order, BitOrder::Direct);
        assert_eq!(config.dummy_cycles, 2);
    }

    #[test]
    fn test_parse_order_and_dummy() {
        let mut options = full_options();
        options.push(("order", "reversed"));
        options.push(("dummy", "4"));
        let config = parse_options(&options).unwrap();
        assert_eq!(config.bit_order, BitOrder::Reversed);
        assert_eq!(config.dummy_cycles, 4);
    }

    #[test]
    fn test_gpiochip_shorthand() {
        let mut options = full_options();
        options[0] = ("gpiochip", "1");
        let config = parse_options(&options).unwrap();
        assert_eq!(config.device, "/dev/gpiochip1");
    }

    #[test]
    fn test_missing_parameters() {
        let options: Vec<_> = full_options()
            .into_iter()
            .filter(|(k, _)| *k != "d2")
            .collect();
        assert!(matches!(
            parse_options(&options),
            Err(LinuxGpioError::MissingParameter("d2"))
        ));

        assert!(matches!(
            parse_options(&[("sclk", "2")]),
            Err(LinuxGpioError::NoDevice)
        ));
    }

    #[test]
    fn test_duplicate_pin_rejected() {
        let mut options = full_options();
        options[1] = ("sclk", "41"); // collides with cs0
        assert!(matches!(
            parse_options(&options),
            Err(LinuxGpioError::DuplicatePin { offset: 41, .. })
        ));
    }

    #[test]
    fn test_bad_order_value() {
        let mut options = full_options();
        options.push(("order", "sideways"));
        assert!(matches!(
            parse_options(&options),
            Err(LinuxGpioError::InvalidParameter { key: "order", .. })
        ));
    }
}
