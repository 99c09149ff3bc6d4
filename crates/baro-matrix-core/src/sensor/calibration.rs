//! Per-unit trimming coefficients burnt into the sensor's NVM.

/// Bytes in the `dig_T1..dig_T3` block.
pub const TEMPERATURE_BLOCK_LEN: usize = 6;
/// Bytes in the `dig_P1..dig_P9` block.
pub const PRESSURE_BLOCK_LEN: usize = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemperatureCoefficients {
    pub t1: u16,
    pub t2: i16,
    pub t3: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressureCoefficients {
    pub p1: u16,
    pub p2: i16,
    pub p3: i16,
    pub p4: i16,
    pub p5: i16,
    pub p6: i16,
    pub p7: i16,
    pub p8: i16,
    pub p9: i16,
}

/// The full coefficient set, read once at startup.
///
/// There are no mutators: a calibrated sensor hands out shared references
/// only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationSet {
    temperature: TemperatureCoefficients,
    pressure: PressureCoefficients,
}

impl CalibrationSet {
    pub const fn new(temperature: TemperatureCoefficients, pressure: PressureCoefficients) -> Self {
        Self {
            temperature,
            pressure,
        }
    }

    /// Decode the two little-endian register blocks.
    pub const fn from_blocks(
        temperature: &[u8; TEMPERATURE_BLOCK_LEN],
        pressure: &[u8; PRESSURE_BLOCK_LEN],
    ) -> Self {
        const fn word(block: &[u8], at: usize) -> u16 {
            u16::from_le_bytes([block[at], block[at + 1]])
        }

        Self {
            temperature: TemperatureCoefficients {
                t1: word(temperature, 0),
                t2: word(temperature, 2) as i16,
                t3: word(temperature, 4) as i16,
            },
            pressure: PressureCoefficients {
                p1: word(pressure, 0),
                p2: word(pressure, 2) as i16,
                p3: word(pressure, 4) as i16,
                p4: word(pressure, 6) as i16,
                p5: word(pressure, 8) as i16,
                p6: word(pressure, 10) as i16,
                p7: word(pressure, 12) as i16,
                p8: word(pressure, 14) as i16,
                p9: word(pressure, 16) as i16,
            },
        }
    }

    pub const fn temperature(&self) -> &TemperatureCoefficients {
        &self.temperature
    }

    pub const fn pressure(&self) -> &PressureCoefficients {
        &self.pressure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_blocks_decodes_little_endian_words() {
        let temperature = [0x70, 0x6B, 0x43, 0x67, 0x18, 0xFC];
        let pressure = [
            0x7D, 0x8E, 0x43, 0xD6, 0xD0, 0x0B, 0x27, 0x0B, 0x8C, 0x00, 0xF9, 0xFF, 0x8C, 0x3C,
            0xF8, 0xC6, 0x70, 0x17,
        ];

        let set = CalibrationSet::from_blocks(&temperature, &pressure);

        assert_eq!(
            *set.temperature(),
            TemperatureCoefficients {
                t1: 27504,
                t2: 26435,
                t3: -1000,
            }
        );
        assert_eq!(
            *set.pressure(),
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
            }
        );
    }

    #[test]
    fn test_unsigned_words_keep_high_bit() {
        let mut pressure = [0u8; PRESSURE_BLOCK_LEN];
        pressure[..2].copy_from_slice(&[0xFE, 0xFF]);

        let set = CalibrationSet::from_blocks(&[0xFF, 0xFF, 0, 0, 0, 0], &pressure);
        assert_eq!(set.temperature().t1, u16::MAX);
        assert_eq!(set.pressure().p1, 0xFFFE);
    }
}
