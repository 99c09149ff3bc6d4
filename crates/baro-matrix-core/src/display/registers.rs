//! MAX7219 register addresses and the values written at setup.

pub const NO_OP: u8 = 0x00;
/// Row 0; rows 1..=7 follow at consecutive addresses.
pub const ROW_0: u8 = 0x01;
pub const DECODE_MODE: u8 = 0x09;
pub const INTENSITY: u8 = 0x0A;
pub const SCAN_LIMIT: u8 = 0x0B;
pub const SHUTDOWN: u8 = 0x0C;
pub const DISPLAY_TEST: u8 = 0x0F;

pub const ROWS: u8 = 8;

/// `SHUTDOWN` value for normal operation.
pub const NORMAL_OPERATION: u8 = 0x01;
/// `DECODE_MODE` value: raw segment data for every row.
pub const NO_DECODE: u8 = 0x00;
/// `SCAN_LIMIT` value: scan all eight rows.
pub const SCAN_ALL_ROWS: u8 = 0x07;
pub const MAX_INTENSITY: u8 = 0x0F;

/// Address of row `index` (0..8).
pub const fn row(index: u8) -> u8 {
    ROW_0 + index
}
