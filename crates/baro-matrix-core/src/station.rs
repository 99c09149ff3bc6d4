//! The station loop
//!
//! Owns the shared bus, the calibrated sensor and the LED chain. One cycle
//! measures temperature, shows it in Celsius then Fahrenheit, measures
//! pressure and shows it in kilopascal, blanking the chain between readouts.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{info, warn};
use thiserror_no_std::Error;

use crate::bus::{ByteExchange, SharedBus};
use crate::config::{ConfigError, StationConfig, TimingConfig};
use crate::display::{Cell, DisplayError, MatrixChain, readout};
use crate::sensor::{self, Bmp280, Calibrated, Pressure, SensorError, Temperature};

/// Time the sensor needs after a soft reset before it answers again.
const RESET_SETTLE_MS: u32 = 2;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),
    #[error("Display error: {0}")]
    Display(#[from] DisplayError),
}

/// Readings of one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub temperature: Temperature,
    /// `None` when the sensor could not produce a pressure this cycle.
    pub pressure: Option<Pressure>,
}

pub struct Station<X, S, D, Y> {
    bus: SharedBus<X, S, D>,
    delay: Y,
    sensor: Bmp280<Calibrated>,
    chain: MatrixChain,
    timing: TimingConfig,
    cycles: u32,
}

impl<X, S, D, Y> Station<X, S, D, Y>
where
    X: ByteExchange,
    S: OutputPin,
    D: OutputPin,
    Y: DelayNs,
{
    /// Bring up the LED chain and the sensor.
    ///
    /// The chain is set up first so a sensor failure leaves the matrices
    /// blank instead of showing power-on garbage.
    pub fn start(
        mut bus: SharedBus<X, S, D>,
        mut delay: Y,
        config: &StationConfig,
    ) -> Result<Self, StationError> {
        config.validate()?;

        let display = &config.display;
        let mut chain =
            MatrixChain::new(display.chain_length, display.order, display.intensity)?;
        chain.setup(&mut bus)?;

        if config.sensor.verify_chip_id {
            sensor::verify_chip_id(&mut bus)?;
        }
        if config.sensor.soft_reset {
            sensor::soft_reset(&mut bus)?;
            delay.delay_ms(RESET_SETTLE_MS);
        }

        let sensor = Bmp280::new(config.sensor.control).calibrate(&mut bus)?;
        sensor::write_config(&mut bus, config.sensor.config)?;

        info!(
            "Station started: {} matrices ({:?}), hold {} ms, blank {} ms",
            display.chain_length, display.order, config.timing.hold_ms, config.timing.blank_ms
        );

        Ok(Self {
            bus,
            delay,
            sensor,
            chain,
            timing: config.timing,
            cycles: 0,
        })
    }

    /// Number of completed cycles.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    pub fn sensor(&self) -> &Bmp280<Calibrated> {
        &self.sensor
    }

    pub fn run_cycle(&mut self) -> Result<CycleReport, StationError> {
        let (temperature, fine) = self.sensor.measure_temperature(&mut self.bus)?;
        self.present(&readout::celsius(temperature))?;
        self.present(&readout::fahrenheit(temperature))?;

        let pressure = self.sensor.measure_pressure(&mut self.bus, fine)?;
        if pressure.is_none() {
            warn!("Pressure unavailable this cycle");
        }
        self.present(&readout::pressure(pressure))?;

        self.cycles = self.cycles.wrapping_add(1);
        info!(
            "Cycle {}: {:.2} C, {:?} kPa",
            self.cycles,
            temperature.celsius(),
            pressure.map(Pressure::kilopascals)
        );

        Ok(CycleReport {
            temperature,
            pressure,
        })
    }

    /// Show `cells` for the hold time, then a blank chain for the blank time.
    fn present(&mut self, cells: &[Cell]) -> Result<(), StationError> {
        self.chain.show(&mut self.bus, cells)?;
        self.delay.delay_ms(self.timing.hold_ms);
        self.chain.blank(&mut self.bus)?;
        self.delay.delay_ms(self.timing.blank_ms);
        Ok(())
    }

    /// Give back the bus and the delay.
    pub fn release(self) -> (SharedBus<X, S, D>, Y) {
        (self.bus, self.delay)
    }
}
