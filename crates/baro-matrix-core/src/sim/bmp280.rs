//! BMP280 register-file model speaking the SPI protocol.

use crate::sensor::registers::{self, READ_PRESSURE, READ_TEMPERATURE};
use crate::sensor::{CalibrationSet, PressureCoefficients, RawSample, TemperatureCoefficients};

const RESET: u8 = 0xE0;
const CTRL_MEAS: u8 = 0xF4;
const CONFIG: u8 = 0xF5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Waiting for a control byte.
    Command,
    Reading(u8),
    Writing(u8),
}

#[derive(Debug, Clone)]
pub struct VirtualBmp280 {
    registers: [u8; 256],
    phase: Phase,
}

impl Default for VirtualBmp280 {
    /// The datasheet's worked example: 25.08 °C, 100.653 kPa.
    fn default() -> Self {
        let calibration = CalibrationSet::new(
            TemperatureCoefficients {
                t1: 27504,
                t2: 26435,
                t3: -1000,
            },
            PressureCoefficients {
                p1: 36477,
                p2: -10685,
                p3: 3024,
                p4: 2855,
                p5: 140,
                p6: -7,
                p7: 15500,
                p8: -14600,
                p9: 6000,
            },
        );
        let mut sensor = Self::new(&calibration);
        sensor.set_raw_temperature(RawSample::new(519_888));
        sensor.set_raw_pressure(RawSample::new(415_148));
        sensor
    }
}

impl VirtualBmp280 {
    pub fn new(calibration: &CalibrationSet) -> Self {
        let mut registers = [0u8; 256];
        registers[registers::READ_CHIP_ID as usize] = registers::CHIP_ID;

        let t = calibration.temperature();
        let p = calibration.pressure();
        let words = [
            t.t1,
            t.t2 as u16,
            t.t3 as u16,
            p.p1,
            p.p2 as u16,
            p.p3 as u16,
            p.p4 as u16,
            p.p5 as u16,
            p.p6 as u16,
            p.p7 as u16,
            p.p8 as u16,
            p.p9 as u16,
        ];
        let start = registers::READ_TEMPERATURE_CALIBRATION as usize;
        for (slot, word) in registers[start..start + 24].chunks_exact_mut(2).zip(words) {
            slot.copy_from_slice(&word.to_le_bytes());
        }

        Self {
            registers,
            phase: Phase::Command,
        }
    }

    pub fn set_raw_temperature(&mut self, raw: RawSample) {
        self.store_sample(READ_TEMPERATURE, raw);
    }

    pub fn set_raw_pressure(&mut self, raw: RawSample) {
        self.store_sample(READ_PRESSURE, raw);
    }

    fn store_sample(&mut self, msb: u8, raw: RawSample) {
        let value = raw.value();
        let at = msb as usize;
        self.registers[at] = (value >> 12) as u8;
        self.registers[at + 1] = (value >> 4) as u8;
        self.registers[at + 2] = ((value & 0x0F) << 4) as u8;
    }

    /// Overwrite any register, including the read-only ones.
    pub fn set_register(&mut self, address: u8, value: u8) {
        self.registers[address as usize] = value;
    }

    /// Last value written to `ctrl_meas`.
    pub fn control(&self) -> u8 {
        self.registers[CTRL_MEAS as usize]
    }

    /// Last value written to `config`.
    pub fn config(&self) -> u8 {
        self.registers[CONFIG as usize]
    }

    pub(crate) fn exchange(&mut self, byte: u8) -> u8 {
        match self.phase {
            Phase::Command => {
                self.phase = if byte & 0x80 != 0 {
                    Phase::Reading(byte)
                } else {
                    Phase::Writing(byte | 0x80)
                };
                0x00
            }
            Phase::Reading(address) => {
                self.phase = Phase::Reading(address.wrapping_add(1));
                self.registers[address as usize]
            }
            Phase::Writing(address) => {
                match address {
                    CTRL_MEAS | CONFIG => self.registers[address as usize] = byte,
                    RESET if byte == registers::RESET_COMMAND => {
                        self.registers[CTRL_MEAS as usize] = 0;
                        self.registers[CONFIG as usize] = 0;
                    }
                    _ => {}
                }
                self.phase = Phase::Command;
                0x00
            }
        }
    }

    pub(crate) fn deselect(&mut self) {
        self.phase = Phase::Command;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transaction(sensor: &mut VirtualBmp280, bytes: &[u8]) -> Vec<u8> {
        let response = bytes.iter().map(|&b| sensor.exchange(b)).collect();
        sensor.deselect();
        response
    }

    #[test]
    fn test_reads_auto_increment() {
        let mut sensor = VirtualBmp280::default();
        let response = transaction(&mut sensor, &[0x88, 0, 0, 0, 0, 0, 0]);
        assert_eq!(response, [0x00, 0x70, 0x6B, 0x43, 0x67, 0x18, 0xFC]);
    }

    #[test]
    fn test_samples_are_stored_msb_first() {
        let mut sensor = VirtualBmp280::default();
        assert_eq!(transaction(&mut sensor, &[0xFA, 0, 0, 0])[1..], [0x7E, 0xED, 0x00]);
        assert_eq!(transaction(&mut sensor, &[0xF7, 0, 0, 0])[1..], [0x65, 0x5A, 0xC0]);
    }

    #[test]
    fn test_writes_only_reach_writable_registers() {
        let mut sensor = VirtualBmp280::default();
        transaction(&mut sensor, &[0x74, 0x4F, 0x50, 0x12]);

        assert_eq!(sensor.control(), 0x4F);
        assert_eq!(transaction(&mut sensor, &[0xD0, 0])[1], 0x58);
    }

    #[test]
    fn test_reset_restores_power_on_state() {
        let mut sensor = VirtualBmp280::default();
        transaction(&mut sensor, &[0x74, 0x4F]);
        transaction(&mut sensor, &[0x75, 0xA0]);
        assert_eq!(sensor.config(), 0xA0);

        transaction(&mut sensor, &[0x60, 0x01]);
        assert_eq!(sensor.control(), 0x4F);

        transaction(&mut sensor, &[0x60, 0xB6]);
        assert_eq!((sensor.control(), sensor.config()), (0, 0));
    }
}
