//! Station configuration
//!
//! Plain serde structs with working defaults for the reference board: four
//! matrices, two seconds per readout. The firmware uses the defaults, the
//! simulator overrides a few fields from the command line.

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::bus::{ChainOrder, MAX_CHAIN_LENGTH, ShiftRegister, ShiftRegisterExchange};
use crate::display::registers::MAX_INTENSITY;
use crate::sensor::{ConfigRegister, ControlMeasurement};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Chain length must be between 1 and {max}, got {found}")]
    ChainLength { found: u8, max: u8 },
    #[error("Intensity must be at most {max}, got {found}")]
    Intensity { found: u8, max: u8 },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StationConfig {
    pub display: DisplayConfig,
    pub sensor: SensorConfig,
    pub timing: TimingConfig,
    pub bus: BusConfig,
}

impl StationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let length = self.display.chain_length;
        if length == 0 || length as usize > MAX_CHAIN_LENGTH {
            return Err(ConfigError::ChainLength {
                found: length,
                max: MAX_CHAIN_LENGTH as u8,
            });
        }
        if self.display.intensity > MAX_INTENSITY {
            return Err(ConfigError::Intensity {
                found: self.display.intensity,
                max: MAX_INTENSITY,
            });
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayConfig {
    /// Number of cascaded MAX7219s.
    pub chain_length: u8,
    pub order: ChainOrder,
    /// LED brightness, 0..=15.
    pub intensity: u8,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            chain_length: 4,
            order: ChainOrder::default(),
            intensity: MAX_INTENSITY / 2,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorConfig {
    pub control: ControlMeasurement,
    pub config: ConfigRegister,
    /// Check the chip id before touching the calibration data.
    pub verify_chip_id: bool,
    /// Reset the sensor to its power-on state at startup.
    pub soft_reset: bool,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            control: ControlMeasurement::default(),
            config: ConfigRegister::default(),
            verify_chip_id: true,
            soft_reset: false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    /// How long each readout stays on the matrices.
    pub hold_ms: u32,
    /// Dark gap between two readouts.
    pub blank_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            hold_ms: 2000,
            blank_ms: 100,
        }
    }
}

/// Settings for the byte link.
///
/// The link is built by the caller before [`Station::start`](crate::station::Station::start),
/// so these only take effect through [`BusConfig::apply`]. Bit-banged and SPI
/// links clock every byte to completion and have nothing to configure.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BusConfig {
    /// Clock edges a shift-register exchange may spend on one byte before
    /// giving up (None = spin forever).
    pub edge_budget: Option<u32>,
}

impl BusConfig {
    /// Set the edge budget of a shift-register link.
    pub fn apply<R>(&self, link: ShiftRegisterExchange<R>) -> ShiftRegisterExchange<R>
    where
        R: ShiftRegister,
    {
        match self.edge_budget {
            Some(edges) => link.with_edge_budget(edges),
            None => link,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{BusError, ByteExchange};
    use crate::sim::VirtualHardware;

    #[test]
    fn test_defaults_match_reference_board() {
        let config = StationConfig::default();

        assert_eq!(config.display.chain_length, 4);
        assert_eq!(config.display.order, ChainOrder::FarFirst);
        assert_eq!(config.timing.hold_ms, 2000);
        assert_eq!(config.timing.blank_ms, 100);
        assert_eq!(config.sensor.control.bits(), 0b0100_1111);
        assert_eq!(config.bus.edge_budget, None);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_chain_length() {
        let mut config = StationConfig::default();
        config.display.chain_length = 9;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ChainLength { found: 9, max: 8 })
        );

        config.display.chain_length = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_intensity() {
        let mut config = StationConfig::default();
        config.display.intensity = 16;
        assert_eq!(
            config.validate(),
            Err(ConfigError::Intensity { found: 16, max: 15 })
        );
    }

    #[test]
    fn test_bus_config_sets_edge_budget() {
        let hardware = VirtualHardware::new(1);
        hardware.set_clock_stuck(true);

        let unbounded = BusConfig::default().apply(ShiftRegisterExchange::new(
            hardware.shift_register(),
        ));
        assert_eq!(unbounded.edge_budget(), None);

        let bus = BusConfig {
            edge_budget: Some(32),
        };
        let mut link = bus.apply(ShiftRegisterExchange::new(hardware.shift_register()));
        assert_eq!(link.edge_budget(), Some(32));
        assert_eq!(
            link.exchange(0xD0),
            Err(BusError::ClockStalled { edges: 32 })
        );
    }
}
