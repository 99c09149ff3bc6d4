//! Formatting of readings into four display cells.
//!
//! Digits are truncated, not rounded, so a reading never shows a value it
//! has not reached yet.

use super::glyphs::Glyph;
use crate::sensor::{Pressure, Temperature};

/// Cells in one readout: three characters and a unit.
pub const READOUT_WIDTH: usize = 4;

/// What one chip shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub glyph: Glyph,
    /// Part of a decimal mark; see [`MatrixChain::draw`](super::MatrixChain::draw).
    pub dot: bool,
}

impl Cell {
    pub const EMPTY: Self = Self::plain(Glyph::Empty);

    pub const fn plain(glyph: Glyph) -> Self {
        Self { glyph, dot: false }
    }

    pub const fn dotted(glyph: Glyph) -> Self {
        Self { glyph, dot: true }
    }
}

pub type Readout = [Cell; READOUT_WIDTH];

/// `[tens, ones, tenths, unit]` with the decimal mark.
///
/// Negative values put a minus sign in the tens cell; at -10 and below the
/// tenths are dropped to make room: `[-, tens, ones, unit]`.
fn one_decimal(value: f32, unit: Glyph) -> Readout {
    let negative = value < 0.0;
    let magnitude = if negative { -value } else { value };

    if negative && magnitude >= 10.0 {
        let whole = magnitude as u32;
        return [
            Cell::plain(Glyph::Minus),
            Cell::plain(Glyph::digit(whole / 10)),
            Cell::plain(Glyph::digit(whole)),
            Cell::plain(unit),
        ];
    }

    let tenths = (magnitude * 10.0) as u32;
    let lead = if negative {
        Glyph::Minus
    } else {
        Glyph::digit(tenths / 100)
    };
    [
        Cell::dotted(lead),
        Cell::dotted(Glyph::digit(tenths / 10)),
        Cell::dotted(Glyph::digit(tenths)),
        Cell::dotted(unit),
    ]
}

/// `[hundreds, tens, ones, unit]` without decimal mark.
fn whole(value: f32, unit: Glyph) -> Readout {
    let whole = if value > 0.0 { value as u32 } else { 0 };
    [
        Cell::plain(Glyph::digit(whole / 100)),
        Cell::plain(Glyph::digit(whole / 10)),
        Cell::plain(Glyph::digit(whole)),
        Cell::plain(unit),
    ]
}

pub fn celsius(temperature: Temperature) -> Readout {
    one_decimal(temperature.celsius(), Glyph::Celsius)
}

/// Three-digit whole degrees above 99.9 °F, one decimal otherwise.
pub fn fahrenheit(temperature: Temperature) -> Readout {
    let value = temperature.fahrenheit();
    if value > 99.9 {
        whole(value, Glyph::Fahrenheit)
    } else {
        one_decimal(value, Glyph::Fahrenheit)
    }
}

/// Whole kilopascals; an unavailable reading shows dashes.
pub fn pressure(pressure: Option<Pressure>) -> Readout {
    match pressure {
        Some(pressure) => whole(pressure.kilopascals(), Glyph::Kilopascal),
        None => [
            Cell::plain(Glyph::Minus),
            Cell::plain(Glyph::Minus),
            Cell::plain(Glyph::Minus),
            Cell::plain(Glyph::Kilopascal),
        ],
    }
}
