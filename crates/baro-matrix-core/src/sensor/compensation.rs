//! Fixed-point compensation of raw ADC samples.
//!
//! Integer steps follow the BMP280 reference formulas bit for bit: 32-bit
//! signed arithmetic for temperature, 64-bit for pressure, arithmetic shifts
//! throughout. Overflow wraps the way the reference integer types do instead
//! of panicking. Only the final unit conversions are floating point.

use super::calibration::CalibrationSet;

/// A 20-bit unsigned ADC reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample(u32);

impl RawSample {
    pub const MAX: u32 = 0x000F_FFFF;

    /// Keeps the low 20 bits of `value`.
    pub const fn new(value: u32) -> Self {
        Self(value & Self::MAX)
    }

    /// Assemble `msb`, `lsb` and the top nibble of `xlsb`.
    pub const fn from_bytes(high: u8, middle: u8, low: u8) -> Self {
        Self(((high as u32) << 12) | ((middle as u32) << 4) | ((low as u32) >> 4))
    }

    pub const fn value(self) -> u32 {
        self.0
    }
}

/// `t_fine`: the temperature term pressure compensation depends on.
///
/// Only [`compensate_temperature`] creates one and [`compensate_pressure`]
/// consumes it: there is no pressure without a temperature reading first,
/// and each reading feeds at most one pressure. Nothing ties the value to a
/// cycle, though; a caller holding on to it can still pair it with a later
/// pressure sample.
///
/// ```compile_fail
/// use baro_matrix_core::sensor::FineTemperature;
///
/// let made_up = FineTemperature(128_422);
/// ```
///
/// ```compile_fail
/// use baro_matrix_core::sensor::{CalibrationSet, FineTemperature, RawSample};
/// use baro_matrix_core::sensor::compensate_pressure;
///
/// fn twice(raw: RawSample, calibration: &CalibrationSet, fine: FineTemperature) {
///     compensate_pressure(raw, calibration, fine);
///     compensate_pressure(raw, calibration, fine);
/// }
/// ```
#[derive(Debug, PartialEq, Eq)]
pub struct FineTemperature(i32);

impl FineTemperature {
    pub const fn value(&self) -> i32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperature {
    celsius: f32,
}

impl Temperature {
    pub const fn from_celsius(celsius: f32) -> Self {
        Self { celsius }
    }

    pub const fn celsius(self) -> f32 {
        self.celsius
    }

    pub fn fahrenheit(self) -> f32 {
        self.celsius * 1.8 + 32.0
    }
}

/// Compensated pressure in Pascal, Q24.8 fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pressure {
    q24_8: i64,
}

impl Pressure {
    pub const fn from_q24_8(q24_8: i64) -> Self {
        Self { q24_8 }
    }

    /// Raw fixed-point result (Pa * 256).
    pub const fn q24_8(self) -> i64 {
        self.q24_8
    }

    pub fn pascals(self) -> f32 {
        self.q24_8 as f32 / 256.0
    }

    pub fn kilopascals(self) -> f32 {
        self.q24_8 as f32 / 256.0 / 1000.0
    }
}

pub fn compensate_temperature(
    raw: RawSample,
    calibration: &CalibrationSet,
) -> (Temperature, FineTemperature) {
    let coefficients = calibration.temperature();
    let adc = raw.value() as i32;
    let t1 = coefficients.t1 as i32;
    let t2 = coefficients.t2 as i32;
    let t3 = coefficients.t3 as i32;

    let var1 = ((adc >> 3).wrapping_sub(t1 << 1)).wrapping_mul(t2) >> 11;
    let delta = (adc >> 4).wrapping_sub(t1);
    let var2 = ((delta.wrapping_mul(delta) >> 12).wrapping_mul(t3)) >> 14;
    let fine = var1.wrapping_add(var2);

    (
        Temperature::from_celsius(fine as f32 / 5120.0),
        FineTemperature(fine),
    )
}

/// Returns `None` when the divisor term is zero: the measurement is
/// unavailable, which is distinct from any real pressure.
pub fn compensate_pressure(
    raw: RawSample,
    calibration: &CalibrationSet,
    fine: FineTemperature,
) -> Option<Pressure> {
    let c = calibration.pressure();
    let (p1, p2, p3) = (c.p1 as i64, c.p2 as i64, c.p3 as i64);
    let (p4, p5, p6) = (c.p4 as i64, c.p5 as i64, c.p6 as i64);
    let (p7, p8, p9) = (c.p7 as i64, c.p8 as i64, c.p9 as i64);

    let mut var1 = fine.0 as i64 - 128_000;
    let mut var2 = var1.wrapping_mul(var1).wrapping_mul(p6);
    var2 = var2.wrapping_add(var1.wrapping_mul(p5) << 17);
    var2 = var2.wrapping_add(p4 << 35);
    var1 = (var1.wrapping_mul(var1).wrapping_mul(p3) >> 8)
        .wrapping_add(var1.wrapping_mul(p2) << 12);
    var1 = ((1i64 << 47).wrapping_add(var1)).wrapping_mul(p1) >> 33;

    if var1 == 0 {
        return None;
    }

    let mut p = 1_048_576 - raw.value() as i64;
    p = ((p << 31).wrapping_sub(var2))
        .wrapping_mul(3125)
        .wrapping_div(var1);
    var1 = p9.wrapping_mul(p >> 13).wrapping_mul(p >> 13) >> 25;
    var2 = p8.wrapping_mul(p) >> 19;
    p = (p.wrapping_add(var1).wrapping_add(var2) >> 8).wrapping_add(p7 << 4);

    Some(Pressure::from_q24_8(p))
}
