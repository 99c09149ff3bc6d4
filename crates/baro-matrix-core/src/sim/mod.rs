//! Host-side models of the station hardware
//!
//! [`VirtualHardware`] is the wiring harness: a BMP280 and a MAX7219 chain
//! hanging off one link, gated by two active-low select lines. It hands out
//! the pieces a [`SharedBus`] is built from, so the real protocol code runs
//! unchanged against the models.

mod bmp280;
mod max7219;

pub use bmp280::VirtualBmp280;
pub use max7219::{VirtualChain, VirtualMax7219};

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};

use crate::bus::{BusError, ByteExchange, ChainOrder, EDGES_PER_BYTE, ShiftRegister, SharedBus};

/// Level read on data-in while nothing drives it.
const FLOATING: u8 = 0xFF;

struct Wiring {
    sensor: VirtualBmp280,
    chain: VirtualChain,
    sensor_selected: bool,
    chain_selected: bool,
    clock_stuck: bool,
}

impl Wiring {
    fn exchange(&mut self, byte: u8) -> u8 {
        if self.chain_selected {
            self.chain.shift(byte);
        }
        if self.sensor_selected {
            self.sensor.exchange(byte)
        } else {
            FLOATING
        }
    }
}

/// Shared handle to the simulated board.
#[derive(Clone)]
pub struct VirtualHardware(Rc<RefCell<Wiring>>);

pub type VirtualBus = SharedBus<VirtualLink, VirtualSelect, VirtualSelect>;

impl VirtualHardware {
    /// A board with the datasheet's example sensor and `chain_length`
    /// powered-down LED drivers.
    pub fn new(chain_length: usize) -> Self {
        Self::with_sensor(VirtualBmp280::default(), chain_length)
    }

    pub fn with_sensor(sensor: VirtualBmp280, chain_length: usize) -> Self {
        Self(Rc::new(RefCell::new(Wiring {
            sensor,
            chain: VirtualChain::new(chain_length),
            sensor_selected: false,
            chain_selected: false,
            clock_stuck: false,
        })))
    }

    pub fn link(&self) -> VirtualLink {
        VirtualLink(self.clone())
    }

    pub fn shift_register(&self) -> VirtualShiftRegister {
        VirtualShiftRegister {
            hardware: self.clone(),
            data: 0,
            edges: 0,
            overflow: false,
        }
    }

    pub fn sensor_select(&self) -> VirtualSelect {
        VirtualSelect {
            hardware: self.clone(),
            line: Line::Sensor,
        }
    }

    pub fn chain_select(&self) -> VirtualSelect {
        VirtualSelect {
            hardware: self.clone(),
            line: Line::Chain,
        }
    }

    /// A bus over the plain [`VirtualLink`].
    pub fn shared_bus(&self) -> Result<VirtualBus, BusError> {
        SharedBus::new(self.link(), self.sensor_select(), self.chain_select())
    }

    /// Stop the clock of every [`VirtualShiftRegister`]; no byte completes.
    pub fn set_clock_stuck(&self, stuck: bool) {
        self.0.borrow_mut().clock_stuck = stuck;
    }

    /// Snapshot of the chain in wiring order.
    pub fn chips(&self) -> Vec<VirtualMax7219> {
        self.0.borrow().chain.chips().to_vec()
    }

    /// Snapshot of the chip that shows `place` under `order`.
    pub fn chip_at(&self, place: u8, order: ChainOrder) -> VirtualMax7219 {
        let wiring = self.0.borrow();
        let chips = wiring.chain.chips();
        let index = match order {
            ChainOrder::FarFirst => chips.len() - 1 - place as usize,
            ChainOrder::NearFirst => place as usize,
        };
        chips[index].clone()
    }

    /// Row data of every place, place 0 first.
    pub fn frame(&self, order: ChainOrder) -> Vec<[u8; 8]> {
        let length = self.0.borrow().chain.chips().len();
        (0..length as u8)
            .map(|place| self.chip_at(place, order).rows)
            .collect()
    }

    /// Inspect or modify the sensor model.
    pub fn sensor<R>(&self, f: impl FnOnce(&mut VirtualBmp280) -> R) -> R {
        f(&mut self.0.borrow_mut().sensor)
    }
}

/// The clock/data lines as an ideal byte exchange.
pub struct VirtualLink(VirtualHardware);

impl ByteExchange for VirtualLink {
    fn exchange(&mut self, byte: u8) -> Result<u8, BusError> {
        Ok((self.0).0.borrow_mut().exchange(byte))
    }
}

/// A counter-driven shift peripheral wired to the simulated link.
///
/// The byte moves across the wire once the sixteenth clock edge is counted.
pub struct VirtualShiftRegister {
    hardware: VirtualHardware,
    data: u8,
    edges: u32,
    overflow: bool,
}

impl ShiftRegister for VirtualShiftRegister {
    fn load(&mut self, byte: u8) {
        self.data = byte;
        self.edges = 0;
        self.overflow = false;
    }

    fn toggle_clock(&mut self) {
        let mut wiring = self.hardware.0.borrow_mut();
        if wiring.clock_stuck || self.overflow {
            return;
        }
        self.edges += 1;
        if self.edges == EDGES_PER_BYTE {
            self.data = wiring.exchange(self.data);
            self.overflow = true;
        }
    }

    fn overflowed(&self) -> bool {
        self.overflow
    }

    fn data(&self) -> u8 {
        self.data
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line {
    Sensor,
    Chain,
}

/// One active-low select line.
pub struct VirtualSelect {
    hardware: VirtualHardware,
    line: Line,
}

impl ErrorType for VirtualSelect {
    type Error = Infallible;
}

impl OutputPin for VirtualSelect {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let mut wiring = self.hardware.0.borrow_mut();
        match self.line {
            Line::Sensor => wiring.sensor_selected = true,
            Line::Chain => wiring.chain_selected = true,
        }
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut wiring = self.hardware.0.borrow_mut();
        match self.line {
            Line::Sensor => {
                if wiring.sensor_selected {
                    wiring.sensor.deselect();
                }
                wiring.sensor_selected = false;
            }
            Line::Chain => {
                if wiring.chain_selected {
                    wiring.chain.latch();
                }
                wiring.chain_selected = false;
            }
        }
        Ok(())
    }
}
