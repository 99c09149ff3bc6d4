//! 8x8 glyphs, one byte per row.
//!
//! The matrices are mounted upside down: row register 0 drives the bottom
//! row and bit 0 the leftmost column.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    /// Decimal digit; values above 9 are taken modulo 10.
    Digit(u8),
    Empty,
    Celsius,
    Fahrenheit,
    Kilopascal,
    Minus,
}

const DIGITS: [[u8; 8]; 10] = [
    [0x18, 0x3C, 0x66, 0x66, 0x66, 0x66, 0x3C, 0x18],
    [0x3C, 0x18, 0x18, 0x18, 0x18, 0x18, 0x1C, 0x18],
    [0x3C, 0x3C, 0x0C, 0x18, 0x30, 0x30, 0x3C, 0x1C],
    [0x3C, 0x3C, 0x30, 0x3C, 0x3C, 0x30, 0x3C, 0x3C],
    [0x30, 0x30, 0x30, 0x7E, 0x7E, 0x36, 0x36, 0x36],
    [0x1C, 0x3C, 0x30, 0x3C, 0x1C, 0x0C, 0x3C, 0x3C],
    [0x3C, 0x66, 0x66, 0x7E, 0x3E, 0x06, 0x0C, 0x38],
    [0x0C, 0x0C, 0x18, 0x30, 0x30, 0x60, 0x7E, 0x3E],
    [0x3C, 0x7E, 0x66, 0x7E, 0x7E, 0x66, 0x7E, 0x3C],
    [0x0C, 0x18, 0x30, 0x7C, 0x66, 0x66, 0x66, 0x3C],
];

const EMPTY: [u8; 8] = [0x00; 8];
const CELSIUS: [u8; 8] = [0x70, 0xD8, 0x18, 0x18, 0x18, 0x1B, 0xDB, 0x70];
const FAHRENHEIT: [u8; 8] = [0x18, 0x18, 0x18, 0x78, 0x78, 0x1B, 0xFB, 0xF8];
const KILOPASCAL: [u8; 8] = [0x00, 0x15, 0x15, 0x15, 0xF3, 0x95, 0xF5, 0x00];
const MINUS: [u8; 8] = [0x00, 0x00, 0x00, 0x7E, 0x7E, 0x00, 0x00, 0x00];

impl Glyph {
    /// Least significant decimal digit of `value`.
    pub const fn digit(value: u32) -> Self {
        Self::Digit((value % 10) as u8)
    }

    pub const fn rows(self) -> &'static [u8; 8] {
        match self {
            Self::Digit(d) => &DIGITS[(d % 10) as usize],
            Self::Empty => &EMPTY,
            Self::Celsius => &CELSIUS,
            Self::Fahrenheit => &FAHRENHEIT,
            Self::Kilopascal => &KILOPASCAL,
            Self::Minus => &MINUS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_wraps() {
        assert_eq!(Glyph::digit(1234), Glyph::Digit(4));
        assert_eq!(Glyph::Digit(12).rows(), Glyph::Digit(2).rows());
    }

    #[test]
    fn test_glyphs_are_distinct() {
        let glyphs = [
            Glyph::Empty,
            Glyph::Celsius,
            Glyph::Fahrenheit,
            Glyph::Kilopascal,
            Glyph::Minus,
        ];
        for d in 0..10 {
            assert_ne!(Glyph::Digit(d).rows(), &EMPTY);
            for other in glyphs.iter().skip(1) {
                assert_ne!(Glyph::Digit(d).rows(), other.rows());
            }
        }
        assert!(Glyph::Empty.rows().iter().all(|&row| row == 0));
    }
}
