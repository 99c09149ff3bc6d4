//! BMP280 register map, as SPI command bytes.
//!
//! In SPI mode bit 7 of the first byte selects read (1) or write (0); the
//! remaining bits are the register address. Reads auto-increment.

use serde::{Deserialize, Serialize};

/// Value of the `id` register on a genuine BMP280.
pub const CHIP_ID: u8 = 0x58;

/// Read the `id` register.
pub const READ_CHIP_ID: u8 = 0xD0;
/// Write `ctrl_meas` (register 0xF4).
pub const WRITE_CTRL_MEAS: u8 = 0x74;
/// Write `config` (register 0xF5).
pub const WRITE_CONFIG: u8 = 0x75;
/// Write `reset` (register 0xE0).
pub const WRITE_RESET: u8 = 0x60;
/// The only value `reset` acts on.
pub const RESET_COMMAND: u8 = 0xB6;
/// Read `dig_T1..dig_T3` (6 bytes from 0x88).
pub const READ_TEMPERATURE_CALIBRATION: u8 = 0x88;
/// Read `dig_P1..dig_P9` (18 bytes from 0x8E).
pub const READ_PRESSURE_CALIBRATION: u8 = 0x8E;
/// Read `temp_msb`, `temp_lsb`, `temp_xlsb`.
pub const READ_TEMPERATURE: u8 = 0xFA;
/// Read `press_msb`, `press_lsb`, `press_xlsb`.
pub const READ_PRESSURE: u8 = 0xF7;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Oversampling {
    Skipped = 0b000,
    X1 = 0b001,
    X2 = 0b010,
    X4 = 0b011,
    X8 = 0b100,
    X16 = 0b101,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PowerMode {
    Sleep = 0b00,
    Forced = 0b01,
    Normal = 0b11,
}

/// Contents of `ctrl_meas`: `osrs_t[7:5] osrs_p[4:2] mode[1:0]`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlMeasurement {
    pub temperature: Oversampling,
    pub pressure: Oversampling,
    pub mode: PowerMode,
}

impl Default for ControlMeasurement {
    /// Temperature x2, pressure x4, normal mode (`0b0100_1111`).
    fn default() -> Self {
        Self {
            temperature: Oversampling::X2,
            pressure: Oversampling::X4,
            mode: PowerMode::Normal,
        }
    }
}

impl ControlMeasurement {
    pub const fn bits(self) -> u8 {
        ((self.temperature as u8) << 5) | ((self.pressure as u8) << 2) | self.mode as u8
    }
}

/// Inactive time between two measurements in normal mode.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum StandbyTime {
    #[default]
    Ms0_5 = 0b000,
    Ms62_5 = 0b001,
    Ms125 = 0b010,
    Ms250 = 0b011,
    Ms500 = 0b100,
    Ms1000 = 0b101,
    Ms2000 = 0b110,
    Ms4000 = 0b111,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum IirFilter {
    #[default]
    Off = 0b000,
    X2 = 0b001,
    X4 = 0b010,
    X8 = 0b011,
    X16 = 0b100,
}

/// Contents of `config`: `t_sb[7:5] filter[4:2]`. 3-wire SPI stays off.
///
/// The default equals the power-on value.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfigRegister {
    pub standby: StandbyTime,
    pub filter: IirFilter,
}

impl ConfigRegister {
    pub const fn bits(self) -> u8 {
        ((self.standby as u8) << 5) | ((self.filter as u8) << 2)
    }
}
