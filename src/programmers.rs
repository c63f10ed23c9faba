//! Programmer registration and dispatch
//!
//! A "programmer" here is a line backend the CLI can assemble an engine
//! from. Backends are feature-gated; the programmer string selects one and
//! carries its options, e.g.
//! `linux_gpio:dev=/dev/gpiochip0,sclk=2,cs0=41,d0=5,d1=7,d2=16,d3=18`.

use qblit_core::engine::QspiEngine;
use qblit_core::line::DigitalLine;
use qblit_core::transaction::ChipSelect;

/// Information about a programmer backend
pub struct ProgrammerInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "linux-gpio")]
    programmers.push(ProgrammerInfo {
        name: "linux_gpio",
        aliases: &["linux-gpio", "gpio"],
        description: "Linux GPIO character device (dev=/dev/gpiochipN,sclk=,cs0=,d0=..d3=)",
    });

    #[cfg(feature = "sim")]
    programmers.push(ProgrammerInfo {
        name: "sim",
        aliases: &[],
        description: "In-memory display controller emulator (order=direct|reversed,dummy=N)",
    });

    programmers
}

/// Generate help text listing all available programmers
pub fn programmer_help() -> String {
    let programmers = available_programmers();

    if programmers.is_empty() {
        return "No programmers available (recompile with backend features enabled)".to_string();
    }

    let mut help = String::from("Available programmers:\n");
    for p in &programmers {
        help.push_str(&format!("  {:12} - {}\n", p.name, p.description));
    }
    help
}

/// Generate a short list of programmer names for CLI help
pub fn programmer_names_short() -> String {
    let programmers = available_programmers();
    let names: Vec<&str> = programmers.iter().map(|p| p.name).collect();
    names.join(", ")
}

/// Parse a programmer string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_programmer_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

/// A bus opened through one of the backends
pub struct OpenBus {
    /// Engine with the line backend erased
    pub engine: QspiEngine<Box<dyn DigitalLine>>,
    /// Chip-select handles in configuration order
    pub chip_selects: Vec<ChipSelect>,
}

/// Open the bus named by a programmer string
#[allow(unused_variables)]
pub fn open_bus(programmer: &str) -> Result<OpenBus, Box<dyn std::error::Error>> {
    let (name, options) = parse_programmer_string(programmer);

    match name {
        #[cfg(feature = "linux-gpio")]
        "linux_gpio" | "linux-gpio" | "gpio" => {
            log::info!("Opening Linux GPIO bus...");
            let (engine, chip_selects) = qblit_linux_gpio::open_linux_gpio_qspi(&options)?;
            Ok(OpenBus {
                engine,
                chip_selects,
            })
        }

        #[cfg(feature = "sim")]
        "sim" => {
            let config = parse_sim_options(&options)?;
            let (engine, chip_selects, _bus) = qblit_sim::open_sim_boxed(config)?;
            Ok(OpenBus {
                engine,
                chip_selects: chip_selects.to_vec(),
            })
        }

        _ => Err(unknown_programmer_error(name)),
    }
}

#[cfg(feature = "sim")]
fn parse_sim_options(
    options: &[(&str, &str)],
) -> Result<qblit_sim::SimConfig, Box<dyn std::error::Error>> {
    use qblit_core::nibble::BitOrder;

    let mut config = qblit_sim::SimConfig::default();
    for (key, value) in options {
        match *key {
            "order" => {
                config.bit_order = match *value {
                    "direct" => BitOrder::Direct,
                    "reversed" => BitOrder::Reversed,
                    _ => return Err(format!("Invalid order value: {}", value).into()),
                }
            }
            "dummy" => {
                config.dummy_cycles = value
                    .parse()
                    .map_err(|_| format!("Invalid dummy value: {}", value))?;
            }
            _ => log::warn!("sim: unknown option: {}={}", key, value),
        }
    }
    Ok(config)
}

fn unknown_programmer_error(name: &str) -> Box<dyn std::error::Error> {
    let mut msg = format!("Unknown programmer: {}\n\n", name);
    msg.push_str(&programmer_help());
    msg.push_str("\nUse 'qblit list-programmers' for more details");
    msg.into()
}
