//! MAX7219 cascade model.
//!
//! Every chip holds a 16-bit shift register. Bytes enter the chip nearest
//! the data input; what falls out of its top is shifted into the next chip.
//! On the latch edge every chip executes the word it holds, and the shift
//! registers keep their contents afterwards.

use alloc::vec;
use alloc::vec::Vec;

use crate::display::registers;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualMax7219 {
    pub rows: [u8; 8],
    pub decode_mode: u8,
    pub intensity: u8,
    pub scan_limit: u8,
    pub shutdown: bool,
    pub display_test: bool,
    shift: u16,
}

impl Default for VirtualMax7219 {
    /// Power-on state: shut down, blank.
    fn default() -> Self {
        Self {
            rows: [0; 8],
            decode_mode: 0,
            intensity: 0,
            scan_limit: 0,
            shutdown: true,
            display_test: false,
            shift: 0,
        }
    }
}

impl VirtualMax7219 {
    /// The word currently sitting in the shift register.
    pub fn pending_word(&self) -> u16 {
        self.shift
    }

    /// Whether the LED driven by `bit` of row register `row` is lit.
    pub fn lit(&self, row: usize, bit: usize) -> bool {
        if self.shutdown || row > self.scan_limit as usize {
            return false;
        }
        if self.display_test {
            return true;
        }
        self.rows
            .get(row)
            .is_some_and(|bits| bits & (1 << bit) != 0)
    }

    fn execute(&mut self) {
        let address = ((self.shift >> 8) & 0x0F) as u8;
        let data = self.shift as u8;
        match address {
            registers::NO_OP => {}
            registers::ROW_0..=0x08 => {
                if let Some(row) = self.rows.get_mut((address - registers::ROW_0) as usize) {
                    *row = data;
                }
            }
            registers::DECODE_MODE => self.decode_mode = data,
            registers::INTENSITY => self.intensity = data & 0x0F,
            registers::SCAN_LIMIT => self.scan_limit = data & 0x07,
            registers::SHUTDOWN => self.shutdown = data & 0x01 == 0,
            registers::DISPLAY_TEST => self.display_test = data & 0x01 != 0,
            _ => {}
        }
    }
}

/// Chips in wiring order: index 0 is fed by the data line.
#[derive(Debug, Clone)]
pub struct VirtualChain {
    chips: Vec<VirtualMax7219>,
}

impl VirtualChain {
    pub fn new(length: usize) -> Self {
        Self {
            chips: vec![VirtualMax7219::default(); length],
        }
    }

    pub fn chips(&self) -> &[VirtualMax7219] {
        &self.chips
    }

    pub(crate) fn shift(&mut self, byte: u8) {
        let mut carry = byte;
        for chip in &mut self.chips {
            let out = (chip.shift >> 8) as u8;
            chip.shift = (chip.shift << 8) | carry as u16;
            carry = out;
        }
    }

    pub(crate) fn latch(&mut self) {
        for chip in &mut self.chips {
            chip.execute();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send(chain: &mut VirtualChain, bytes: &[u8]) {
        for &byte in bytes {
            chain.shift(byte);
        }
        chain.latch();
    }

    #[test]
    fn test_filler_pushes_payload_down_the_chain() {
        let mut chain = VirtualChain::new(4);
        send(&mut chain, &[0x01, 0xAA, 0x00, 0x00, 0x00, 0x00]);

        assert_eq!(chain.chips()[2].rows[0], 0xAA);
        for index in [0, 1, 3] {
            assert_eq!(chain.chips()[index].rows[0], 0x00);
        }
    }

    #[test]
    fn test_short_write_leaves_stale_words_downstream() {
        let mut chain = VirtualChain::new(2);
        send(&mut chain, &[0x01, 0x11]);
        send(&mut chain, &[0x02, 0x22]);

        // The first command was pushed into chip 1 and executed again there.
        assert_eq!(chain.chips()[0].rows[..2], [0x11, 0x22]);
        assert_eq!(chain.chips()[1].rows[0], 0x11);
    }

    #[test]
    fn test_control_registers() {
        let mut chain = VirtualChain::new(1);
        assert!(chain.chips()[0].shutdown);

        send(&mut chain, &[registers::SHUTDOWN, registers::NORMAL_OPERATION]);
        send(&mut chain, &[registers::SCAN_LIMIT, registers::SCAN_ALL_ROWS]);
        send(&mut chain, &[registers::INTENSITY, 0xFF]);
        send(&mut chain, &[registers::row(7), 0b1000_0001]);

        let chip = &chain.chips()[0];
        assert!(!chip.shutdown);
        assert_eq!(chip.scan_limit, 7);
        assert_eq!(chip.intensity, 0x0F);
        assert!(chip.lit(7, 0));
        assert!(chip.lit(7, 7));
        assert!(!chip.lit(7, 1));
    }
}
