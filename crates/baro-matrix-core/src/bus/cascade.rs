//! Cascaded writes into a daisy-chain of LED drivers.
//!
//! All drivers share one shift-register chain: every 16 bits clocked in
//! push the previous 16 bits one chip further down. When the chain select is
//! released, every chip executes the word it holds. A command for one chip is
//! therefore followed by enough zero (no-op) words to push it to its slot.

use embedded_hal::digital::OutputPin;
use serde::{Deserialize, Serialize};

use super::{BusError, ByteExchange, SharedBus};

/// Longest supported chain.
pub const MAX_CHAIN_LENGTH: usize = 8;

/// How `place` indices map onto the physical chain.
///
/// Which end counts as place 0 depends on the board wiring and has to be
/// checked against the hardware; an off-by-one here draws onto a neighbour.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainOrder {
    /// Place 0 is the chip farthest from the data input.
    /// A write to place `k` is followed by `N - 1 - k` filler pairs.
    #[default]
    FarFirst,
    /// Place 0 is the chip wired to the data input.
    /// A write to place `k` is followed by `k` filler pairs.
    NearFirst,
}

/// One driver in an N-chip cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayTarget {
    place: u8,
    chain_length: u8,
    order: ChainOrder,
}

impl DisplayTarget {
    /// `None` unless `place < chain_length <= MAX_CHAIN_LENGTH`.
    pub const fn new(place: u8, chain_length: u8, order: ChainOrder) -> Option<Self> {
        if chain_length as usize > MAX_CHAIN_LENGTH || place >= chain_length {
            return None;
        }
        Some(Self {
            place,
            chain_length,
            order,
        })
    }

    pub const fn place(&self) -> u8 {
        self.place
    }

    pub const fn chain_length(&self) -> u8 {
        self.chain_length
    }

    pub const fn order(&self) -> ChainOrder {
        self.order
    }

    /// Number of zero `(address, data)` pairs that follow the payload.
    pub const fn filler_pairs(&self) -> u8 {
        match self.order {
            ChainOrder::FarFirst => self.chain_length - 1 - self.place,
            ChainOrder::NearFirst => self.place,
        }
    }

    /// Bytes on the wire for one cascaded write.
    pub const fn transfer_len(&self) -> usize {
        2 + 2 * self.filler_pairs() as usize
    }

    /// Places of a chain sorted by increasing filler count.
    ///
    /// A cascaded write leaves stale words in the chips past its target.
    /// Redrawing every place in this order makes each chip's own writes come
    /// after any stale word it received, and the last write fills the whole
    /// chain.
    pub fn draw_order(chain_length: u8, order: ChainOrder) -> impl Iterator<Item = Self> {
        let length = chain_length.min(MAX_CHAIN_LENGTH as u8);
        (0..length).filter_map(move |step| {
            let place = match order {
                ChainOrder::FarFirst => length - 1 - step,
                ChainOrder::NearFirst => step,
            };
            Self::new(place, length, order)
        })
    }
}

impl<X, S, D> SharedBus<X, S, D>
where
    X: ByteExchange,
    S: OutputPin,
    D: OutputPin,
{
    /// Emit `(address, data)` followed by the target's filler pairs.
    ///
    /// The display chain must already be selected; the write takes effect
    /// when it is released.
    pub fn write_cascaded(
        &mut self,
        address: u8,
        data: u8,
        target: DisplayTarget,
    ) -> Result<(), BusError> {
        self.exchange(address)?;
        self.exchange(data)?;
        for _ in 0..target.filler_pairs() {
            self.exchange(0x00)?;
            self.exchange(0x00)?;
        }
        Ok(())
    }

    /// One cascaded write framed by a select/release (latch) pulse.
    pub fn write_cascaded_latched(
        &mut self,
        address: u8,
        data: u8,
        target: DisplayTarget,
    ) -> Result<(), BusError> {
        self.with_display_chain(|bus| bus.write_cascaded(address, data, target))
    }
}
