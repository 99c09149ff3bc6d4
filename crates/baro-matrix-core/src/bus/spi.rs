//! Exchange over a hardware SPI bus.

use embedded_hal::spi::{Error as _, SpiBus};

use super::{BusError, ByteExchange};

/// Adapts an embedded-hal [`SpiBus`] to [`ByteExchange`].
///
/// Select lines stay under [`SharedBus`](super::SharedBus) control, so the
/// bus is used raw rather than through an `SpiDevice`.
pub struct SpiBusExchange<B> {
    bus: B,
}

impl<B: SpiBus<u8>> SpiBusExchange<B> {
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn release(self) -> B {
        self.bus
    }
}

impl<B: SpiBus<u8>> ByteExchange for SpiBusExchange<B> {
    fn exchange(&mut self, byte: u8) -> Result<u8, BusError> {
        let mut word = [byte];
        self.bus
            .transfer_in_place(&mut word)
            .map_err(|e| BusError::Spi(e.kind()))?;
        // The transfer may still be in flight until flushed.
        self.bus.flush().map_err(|e| BusError::Spi(e.kind()))?;
        Ok(word[0])
    }
}
