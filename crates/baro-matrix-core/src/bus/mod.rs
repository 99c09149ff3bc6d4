//! Shared serial bus transport
//!
//! One clock/data-out/data-in triple is shared by the BMP280 sensor and a
//! cascade of MAX7219 LED drivers. Each peripheral class has its own
//! active-low select line; only the selected peripheral reacts to the clock.
//!
//! The byte-level exchange is abstracted behind [`ByteExchange`] so the same
//! protocol code runs over bit-banged GPIO, a counter-driven shift peripheral
//! or a hardware SPI bus.

mod bit_bang;
mod cascade;
mod shift_register;
mod spi;

pub use bit_bang::BitBangExchange;
pub use cascade::{ChainOrder, DisplayTarget, MAX_CHAIN_LENGTH};
pub use shift_register::{EDGES_PER_BYTE, ShiftRegister, ShiftRegisterExchange};
pub use spi::SpiBusExchange;

use embedded_hal::digital::{self, OutputPin};
use log::warn;
use thiserror_no_std::Error;

/// Failures reported by the electrical layer underneath the protocol.
///
/// The protocol itself has no error path: a miswired or silent peripheral
/// produces wrong data, not an error. Only the embedded-hal peripherals and
/// an exhausted clock budget can fail.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    #[error("GPIO error: {0:?}")]
    Pin(digital::ErrorKind),
    #[error("SPI error: {0:?}")]
    Spi(embedded_hal::spi::ErrorKind),
    #[error("Clock stalled: no byte completed after {edges} edges")]
    ClockStalled { edges: u32 },
}

impl BusError {
    pub(crate) fn pin<E: digital::Error>(error: E) -> Self {
        Self::Pin(error.kind())
    }
}

/// Full-duplex single-byte exchange, most significant bit first.
///
/// Clocks `byte` out while clocking a response byte in. Returns only after
/// all eight bit clocks completed. The caller must already have asserted the
/// select line of the intended peripheral; the response is meaningless for
/// write-only peripherals.
pub trait ByteExchange {
    fn exchange(&mut self, byte: u8) -> Result<u8, BusError>;
}

impl<T: ByteExchange + ?Sized> ByteExchange for &mut T {
    #[inline]
    fn exchange(&mut self, byte: u8) -> Result<u8, BusError> {
        T::exchange(self, byte)
    }
}

/// The two peripheral classes sharing the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Peripheral {
    Sensor,
    DisplayChain,
}

/// The shared link plus the two select lines gating it.
///
/// Select lines are active low. Asserting one while the other is still
/// asserted is the caller's mistake; it is logged but not prevented.
pub struct SharedBus<X, S, D> {
    link: X,
    sensor_select: S,
    chain_select: D,
    sensor_active: bool,
    chain_active: bool,
}

impl<X, S, D> SharedBus<X, S, D>
where
    X: ByteExchange,
    S: OutputPin,
    D: OutputPin,
{
    /// Take ownership of the link and select lines, deasserting both lines.
    pub fn new(link: X, sensor_select: S, chain_select: D) -> Result<Self, BusError> {
        let mut bus = Self {
            link,
            sensor_select,
            chain_select,
            sensor_active: true,
            chain_active: true,
        };
        bus.select_sensor(false)?;
        bus.select_display_chain(false)?;
        Ok(bus)
    }

    /// Assert (`true`) or deassert (`false`) the sensor select line.
    pub fn select_sensor(&mut self, active: bool) -> Result<(), BusError> {
        if active && self.chain_active {
            warn!("Sensor selected while the display chain is still selected");
        }
        drive(&mut self.sensor_select, active)?;
        self.sensor_active = active;
        Ok(())
    }

    /// Assert (`true`) or deassert (`false`) the display-chain select line.
    ///
    /// Deasserting is the latch edge: every driver in the chain executes the
    /// word currently held in its shift register.
    pub fn select_display_chain(&mut self, active: bool) -> Result<(), BusError> {
        if active && self.sensor_active {
            warn!("Display chain selected while the sensor is still selected");
        }
        drive(&mut self.chain_select, active)?;
        self.chain_active = active;
        Ok(())
    }

    /// Which peripheral is currently selected, if exactly one is.
    pub fn selected(&self) -> Option<Peripheral> {
        match (self.sensor_active, self.chain_active) {
            (true, false) => Some(Peripheral::Sensor),
            (false, true) => Some(Peripheral::DisplayChain),
            _ => None,
        }
    }

    #[inline]
    pub fn exchange(&mut self, byte: u8) -> Result<u8, BusError> {
        self.link.exchange(byte)
    }

    /// Send every byte of `bytes`, discarding the responses.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), BusError> {
        for &byte in bytes {
            self.link.exchange(byte)?;
        }
        Ok(())
    }

    /// Clock in `buffer.len()` bytes, sending zeros.
    pub fn read(&mut self, buffer: &mut [u8]) -> Result<(), BusError> {
        for slot in buffer.iter_mut() {
            *slot = self.link.exchange(0x00)?;
        }
        Ok(())
    }

    /// Run `f` with the sensor selected. The line is deasserted afterwards
    /// even when `f` fails.
    pub fn with_sensor<R, E>(&mut self, f: impl FnOnce(&mut Self) -> Result<R, E>) -> Result<R, E>
    where
        E: From<BusError>,
    {
        self.select_sensor(true)?;
        let result = f(self);
        let released = self.select_sensor(false);
        let value = result?;
        released?;
        Ok(value)
    }

    /// Run `f` with the display chain selected, latching on release.
    pub fn with_display_chain<R, E>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R, E>,
    ) -> Result<R, E>
    where
        E: From<BusError>,
    {
        self.select_display_chain(true)?;
        let result = f(self);
        let released = self.select_display_chain(false);
        let value = result?;
        released?;
        Ok(value)
    }

    /// Give back the link and the select lines.
    pub fn release(self) -> (X, S, D) {
        (self.link, self.sensor_select, self.chain_select)
    }
}

fn drive<P: OutputPin>(pin: &mut P, active: bool) -> Result<(), BusError> {
    if active {
        pin.set_low().map_err(BusError::pin)
    } else {
        pin.set_high().map_err(BusError::pin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    fn byte(sent: u8, received: u8) -> [SpiTransaction<u8>; 2] {
        [
            SpiTransaction::transfer_in_place(vec![sent], vec![received]),
            SpiTransaction::flush(),
        ]
    }

    #[test]
    fn test_new_deasserts_both_lines() {
        let spi = SpiMock::new(&[]);
        let sensor = PinMock::new(&[PinTransaction::set(PinState::High)]);
        let chain = PinMock::new(&[PinTransaction::set(PinState::High)]);

        let bus = SharedBus::new(SpiBusExchange::new(spi), sensor, chain).unwrap();
        assert_eq!(bus.selected(), None);

        let (link, mut sensor, mut chain) = bus.release();
        link.release().done();
        sensor.done();
        chain.done();
    }

    #[test]
    fn test_with_sensor_gates_the_transaction() {
        let mut expectations = vec![];
        expectations.extend(byte(0xD0, 0x00));
        expectations.extend(byte(0x00, 0x58));
        let spi = SpiMock::new(&expectations);
        let sensor = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);
        let chain = PinMock::new(&[PinTransaction::set(PinState::High)]);

        let mut bus = SharedBus::new(SpiBusExchange::new(spi), sensor, chain).unwrap();
        let id = bus
            .with_sensor(|bus| {
                assert_eq!(bus.selected(), Some(Peripheral::Sensor));
                bus.exchange(0xD0)?;
                bus.exchange(0x00)
            })
            .unwrap();

        assert_eq!(id, 0x58);
        assert_eq!(bus.selected(), None);

        let (link, mut sensor, mut chain) = bus.release();
        link.release().done();
        sensor.done();
        chain.done();
    }

    #[test]
    fn test_with_display_chain_releases_on_error() {
        let spi = SpiMock::new(&[]);
        let sensor = PinMock::new(&[PinTransaction::set(PinState::High)]);
        let chain = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);

        let mut bus = SharedBus::new(SpiBusExchange::new(spi), sensor, chain).unwrap();
        let result: Result<(), BusError> = bus.with_display_chain(|_| {
            Err(BusError::ClockStalled { edges: 3 })
        });

        assert_eq!(result, Err(BusError::ClockStalled { edges: 3 }));
        assert_eq!(bus.selected(), None);

        let (link, mut sensor, mut chain) = bus.release();
        link.release().done();
        sensor.done();
        chain.done();
    }
}
