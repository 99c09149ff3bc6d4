//! Exchange driven by a hardware shift register with an edge counter.
//!
//! Small MCUs expose a "universal serial interface": software loads a data
//! register and strobes the clock; a 4-bit counter overflows once all eight
//! bits have been shifted (16 clock edges). The transfer is finished when the
//! overflow flag is raised.

use core::num::NonZeroU32;

use super::{BusError, ByteExchange};

/// Clock edges (both directions) in one byte transfer.
pub const EDGES_PER_BYTE: u32 = 16;

/// Register-level view of a counter-driven shift peripheral.
pub trait ShiftRegister {
    /// Load the outgoing byte and clear the edge counter and overflow flag.
    fn load(&mut self, byte: u8);

    /// Toggle the clock line once.
    fn toggle_clock(&mut self);

    /// `true` once the edge counter wrapped.
    fn overflowed(&self) -> bool;

    /// The data register; holds the received byte after overflow.
    fn data(&self) -> u8;
}

/// Spins on the overflow flag, strobing the clock.
///
/// Without a budget the spin is unbounded, like the bare hardware loop. With
/// [`with_edge_budget`](Self::with_edge_budget) a clock that never completes
/// a byte surfaces as [`BusError::ClockStalled`].
pub struct ShiftRegisterExchange<R> {
    register: R,
    edge_budget: Option<NonZeroU32>,
}

impl<R: ShiftRegister> ShiftRegisterExchange<R> {
    pub const fn new(register: R) -> Self {
        Self {
            register,
            edge_budget: None,
        }
    }

    /// Give up after `edges` clock toggles without an overflow.
    ///
    /// A budget of zero is treated as unbounded.
    pub fn with_edge_budget(mut self, edges: u32) -> Self {
        self.edge_budget = NonZeroU32::new(edges);
        self
    }

    pub fn edge_budget(&self) -> Option<u32> {
        self.edge_budget.map(NonZeroU32::get)
    }

    pub fn register(&self) -> &R {
        &self.register
    }

    pub fn release(self) -> R {
        self.register
    }
}

impl<R: ShiftRegister> ByteExchange for ShiftRegisterExchange<R> {
    fn exchange(&mut self, byte: u8) -> Result<u8, BusError> {
        let budget = self.edge_budget;
        let register = &mut self.register;
        critical_section::with(|_| {
            register.load(byte);
            let mut edges = 0u32;
            while !register.overflowed() {
                if let Some(limit) = budget
                    && edges >= limit.get()
                {
                    return Err(BusError::ClockStalled { edges });
                }
                register.toggle_clock();
                edges = edges.saturating_add(1);
            }
            Ok(register.data())
        })
    }
}
