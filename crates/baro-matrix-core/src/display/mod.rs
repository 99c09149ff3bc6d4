//! MAX7219 LED-matrix chain
//!
//! Each chip drives one 8x8 matrix and shows one [`Cell`]. All chips sit on
//! the display-chain select line and are addressed with cascaded writes.

pub mod glyphs;
pub mod readout;
pub mod registers;

pub use glyphs::Glyph;
pub use readout::{Cell, READOUT_WIDTH, Readout};

use embedded_hal::digital::OutputPin;
use heapless::Vec;
use log::{debug, info};
use thiserror_no_std::Error;

use crate::bus::{BusError, ByteExchange, ChainOrder, DisplayTarget, MAX_CHAIN_LENGTH, SharedBus};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayError {
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),
    #[error("Place {place} is outside a chain of {chain_length}")]
    PlaceOutOfRange { place: u8, chain_length: u8 },
    #[error("Chain length {0} is not supported")]
    InvalidChainLength(u8),
}

/// Row-0 bit lit for the decimal mark, per place.
///
/// The mark straddles the seam between the second and third chip: the
/// rightmost column of place 1 and the leftmost column of place 2.
const fn decimal_mark(place: u8) -> u8 {
    match place {
        1 => 0x80,
        2 => 0x01,
        _ => 0x00,
    }
}

/// Driver state for N cascaded MAX7219s.
///
/// Keeps the cell each chip was last told to show, so any change can be
/// pushed out as a full redraw.
pub struct MatrixChain {
    chain_length: u8,
    order: ChainOrder,
    intensity: u8,
    frame: Vec<Cell, MAX_CHAIN_LENGTH>,
}

impl MatrixChain {
    pub fn new(chain_length: u8, order: ChainOrder, intensity: u8) -> Result<Self, DisplayError> {
        if chain_length == 0 {
            return Err(DisplayError::InvalidChainLength(chain_length));
        }
        let mut frame = Vec::new();
        frame
            .resize(chain_length as usize, Cell::EMPTY)
            .map_err(|_| DisplayError::InvalidChainLength(chain_length))?;

        Ok(Self {
            chain_length,
            order,
            intensity: intensity.min(registers::MAX_INTENSITY),
            frame,
        })
    }

    pub const fn chain_length(&self) -> u8 {
        self.chain_length
    }

    pub const fn order(&self) -> ChainOrder {
        self.order
    }

    /// Cells as last drawn, place 0 first.
    pub fn frame(&self) -> &[Cell] {
        &self.frame
    }

    /// Wake every chip into raw (no-decode) mode scanning all rows, then
    /// blank the chain.
    pub fn setup<X, S, D>(&mut self, bus: &mut SharedBus<X, S, D>) -> Result<(), DisplayError>
    where
        X: ByteExchange,
        S: OutputPin,
        D: OutputPin,
    {
        let setup = [
            ("shutdown", registers::SHUTDOWN, registers::NORMAL_OPERATION),
            ("decode mode", registers::DECODE_MODE, registers::NO_DECODE),
            ("scan limit", registers::SCAN_LIMIT, registers::SCAN_ALL_ROWS),
            ("intensity", registers::INTENSITY, self.intensity),
        ];

        for target in DisplayTarget::draw_order(self.chain_length, self.order) {
            for (name, register, value) in setup {
                debug!(
                    "chip {} {:<11}({:#04x}) = {:#04x}",
                    target.place(),
                    name,
                    register,
                    value
                );
                bus.write_cascaded_latched(register, value, target)?;
            }
        }

        self.blank(bus)?;
        info!("LED chain of {} ready", self.chain_length);
        Ok(())
    }

    /// Show `cell` at `place` and keep every other place as it was.
    ///
    /// A dotted cell lights the decimal mark in row 0 when it sits at place
    /// 1 or 2; elsewhere the dot has no pixel and is ignored.
    ///
    /// A single cascaded write leaves stale words in the chips past its
    /// target, so the whole frame is redrawn.
    pub fn draw<X, S, D>(
        &mut self,
        bus: &mut SharedBus<X, S, D>,
        place: u8,
        cell: Cell,
    ) -> Result<(), DisplayError>
    where
        X: ByteExchange,
        S: OutputPin,
        D: OutputPin,
    {
        let slot = self
            .frame
            .get_mut(place as usize)
            .ok_or(DisplayError::PlaceOutOfRange {
                place,
                chain_length: self.chain_length,
            })?;
        *slot = cell;
        self.redraw(bus)
    }

    fn draw_target<X, S, D>(
        &self,
        bus: &mut SharedBus<X, S, D>,
        target: DisplayTarget,
        cell: Cell,
    ) -> Result<(), DisplayError>
    where
        X: ByteExchange,
        S: OutputPin,
        D: OutputPin,
    {
        let mark = if cell.dot && cell.glyph != Glyph::Empty {
            decimal_mark(target.place())
        } else {
            0
        };

        for (index, &row) in (0..registers::ROWS).zip(cell.glyph.rows().iter()) {
            let row = if index == 0 { row | mark } else { row };
            bus.write_cascaded_latched(registers::row(index), row, target)?;
        }
        Ok(())
    }

    /// Redraw every chip: `cells[k]` goes to place `k`, missing cells are
    /// blank, extra cells are dropped.
    pub fn show<X, S, D>(
        &mut self,
        bus: &mut SharedBus<X, S, D>,
        cells: &[Cell],
    ) -> Result<(), DisplayError>
    where
        X: ByteExchange,
        S: OutputPin,
        D: OutputPin,
    {
        for (place, slot) in self.frame.iter_mut().enumerate() {
            *slot = cells.get(place).copied().unwrap_or(Cell::EMPTY);
        }
        self.redraw(bus)
    }

    /// Write the stored frame to every chip in [`DisplayTarget::draw_order`].
    fn redraw<X, S, D>(&self, bus: &mut SharedBus<X, S, D>) -> Result<(), DisplayError>
    where
        X: ByteExchange,
        S: OutputPin,
        D: OutputPin,
    {
        for target in DisplayTarget::draw_order(self.chain_length, self.order) {
            let cell = self
                .frame
                .get(target.place() as usize)
                .copied()
                .unwrap_or(Cell::EMPTY);
            self.draw_target(bus, target, cell)?;
        }
        Ok(())
    }

    pub fn blank<X, S, D>(&mut self, bus: &mut SharedBus<X, S, D>) -> Result<(), DisplayError>
    where
        X: ByteExchange,
        S: OutputPin,
        D: OutputPin,
    {
        self.show(bus, &[])
    }
}
