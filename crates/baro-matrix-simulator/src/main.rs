//! Desktop simulator for the baro-matrix station.
//!
//! Runs the real station loop from baro-matrix-core against the virtual
//! BMP280 and MAX7219 chain, and prints the LED matrices to the terminal
//! every time the station holds a frame. The raw sensor samples drift from
//! cycle to cycle so the readouts change.
//!
//! # Usage
//!
//! ```text
//! baro-matrix-simulator [CYCLES] [--fast] [--near-first]
//! ```
//!
//! | Argument       | Effect                                         |
//! |----------------|------------------------------------------------|
//! | `CYCLES`       | Stop after this many cycles (default: forever) |
//! | `--fast`       | Do not sleep during hold and blank delays      |
//! | `--near-first` | Count places from the chain's data input       |
//!
//! Set `RUST_LOG=debug` to see every register write.

use std::io::Write;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use log::{error, info};

use baro_matrix_core::bus::{ChainOrder, SharedBus, ShiftRegisterExchange};
use baro_matrix_core::config::StationConfig;
use baro_matrix_core::sensor::RawSample;
use baro_matrix_core::sim::VirtualHardware;
use baro_matrix_core::station::Station;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Clock edges the shift peripheral may spend on one byte.
const EDGE_BUDGET: u32 = 256;

/// Raw samples of the datasheet's worked example (25.08 °C, 100.653 kPa).
const BASE_RAW_TEMPERATURE: f64 = 519_888.0;
const BASE_RAW_PRESSURE: f64 = 415_148.0;

const LIT: char = '█';
const DARK: char = '·';

// ---------------------------------------------------------------------------
// Terminal rendering
// ---------------------------------------------------------------------------

/// Delay that draws the chain before waiting.
struct TerminalDelay {
    hardware: VirtualHardware,
    order: ChainOrder,
    fast: bool,
    last_frame: Vec<[u8; 8]>,
}

impl TerminalDelay {
    fn new(hardware: &VirtualHardware, order: ChainOrder, fast: bool) -> Self {
        Self {
            hardware: hardware.clone(),
            order,
            fast,
            last_frame: Vec::new(),
        }
    }

    fn render(&self) -> String {
        let length = self.last_frame.len() as u8;
        let chips: Vec<_> = (0..length)
            .map(|place| self.hardware.chip_at(place, self.order))
            .collect();

        let mut out = String::new();
        // Register row 0 is the bottom row, bit 0 the leftmost column.
        for row in (0..8).rev() {
            for chip in &chips {
                out.push(' ');
                for bit in 0..8 {
                    out.push(if chip.lit(row, bit) { LIT } else { DARK });
                }
            }
            out.push('\n');
        }
        out
    }
}

impl DelayNs for TerminalDelay {
    fn delay_ns(&mut self, ns: u32) {
        if !self.fast {
            std::thread::sleep(Duration::from_nanos(ns as u64));
        }
    }

    fn delay_ms(&mut self, ms: u32) {
        let frame = self.hardware.frame(self.order);
        if frame != self.last_frame {
            self.last_frame = frame;
            let mut stdout = std::io::stdout().lock();
            let _ = writeln!(stdout, "{}", self.render());
            let _ = stdout.flush();
        }
        if !self.fast {
            std::thread::sleep(Duration::from_millis(ms as u64));
        }
    }
}

// ---------------------------------------------------------------------------
// Mock data generation
// ---------------------------------------------------------------------------

/// Slowly varying raw ADC samples around the worked example.
fn drifting_samples(cycle: u32) -> (RawSample, RawSample) {
    let t = cycle as f64;
    let temperature = BASE_RAW_TEMPERATURE + 12_000.0 * (t / 7.0).sin();
    let pressure = BASE_RAW_PRESSURE + 4_000.0 * (t / 11.0).cos();
    (
        RawSample::new(temperature as u32),
        RawSample::new(pressure as u32),
    )
}

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

struct Options {
    cycles: Option<u32>,
    fast: bool,
    order: ChainOrder,
}

fn parse_args() -> Options {
    let mut options = Options {
        cycles: None,
        fast: false,
        order: ChainOrder::FarFirst,
    };
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--fast" => options.fast = true,
            "--near-first" => options.order = ChainOrder::NearFirst,
            other => match other.parse() {
                Ok(cycles) => options.cycles = Some(cycles),
                Err(_) => error!("Ignoring unknown argument {:?}", other),
            },
        }
    }
    options
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    let options = parse_args();

    let mut config = StationConfig::default();
    config.display.order = options.order;
    config.bus.edge_budget = Some(EDGE_BUDGET);

    info!("Starting baro-matrix simulator");
    info!(
        "Chain: {} matrices, {:?}; hold {} ms, blank {} ms",
        config.display.chain_length,
        config.display.order,
        config.timing.hold_ms,
        config.timing.blank_ms
    );

    let hardware = VirtualHardware::new(config.display.chain_length as usize);
    let link = config
        .bus
        .apply(ShiftRegisterExchange::new(hardware.shift_register()));

    let bus = match SharedBus::new(link, hardware.sensor_select(), hardware.chain_select()) {
        Ok(bus) => bus,
        Err(e) => {
            error!("Bus setup failed: {}", e);
            return;
        }
    };
    let delay = TerminalDelay::new(&hardware, config.display.order, options.fast);

    let mut station = match Station::start(bus, delay, &config) {
        Ok(station) => station,
        Err(e) => {
            error!("Station failed to start: {}", e);
            return;
        }
    };

    loop {
        if options.cycles.is_some_and(|limit| station.cycles() >= limit) {
            break;
        }

        let (temperature, pressure) = drifting_samples(station.cycles());
        hardware.sensor(|sensor| {
            sensor.set_raw_temperature(temperature);
            sensor.set_raw_pressure(pressure);
        });

        if let Err(e) = station.run_cycle() {
            error!("Cycle failed: {}", e);
            break;
        }
    }

    info!("Simulator exiting after {} cycles", station.cycles());
}
