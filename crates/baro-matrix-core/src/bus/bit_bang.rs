//! Software-clocked exchange over plain GPIO pins.

use embedded_hal::digital::{InputPin, OutputPin, PinState};

use super::{BusError, ByteExchange};

/// Bit-banged SPI mode 0 link: clock idles low, data-out is set up before
/// the rising edge and data-in is sampled on it.
///
/// Each byte runs inside a critical section so an interrupt cannot stretch
/// a clock phase in the middle of a transfer.
pub struct BitBangExchange<CLK, DO, DI> {
    clock: CLK,
    data_out: DO,
    data_in: DI,
}

impl<CLK, DO, DI> BitBangExchange<CLK, DO, DI>
where
    CLK: OutputPin,
    DO: OutputPin,
    DI: InputPin,
{
    /// Wrap the three link pins, parking the clock low.
    pub fn new(mut clock: CLK, data_out: DO, data_in: DI) -> Result<Self, BusError> {
        clock.set_low().map_err(BusError::pin)?;
        Ok(Self {
            clock,
            data_out,
            data_in,
        })
    }

    pub fn release(self) -> (CLK, DO, DI) {
        (self.clock, self.data_out, self.data_in)
    }
}

impl<CLK, DO, DI> ByteExchange for BitBangExchange<CLK, DO, DI>
where
    CLK: OutputPin,
    DO: OutputPin,
    DI: InputPin,
{
    fn exchange(&mut self, byte: u8) -> Result<u8, BusError> {
        critical_section::with(|_| {
            let mut received = 0u8;
            for bit in (0..8).rev() {
                let mask = 1u8 << bit;
                self.data_out
                    .set_state(PinState::from(byte & mask != 0))
                    .map_err(BusError::pin)?;
                self.clock.set_high().map_err(BusError::pin)?;
                if self.data_in.is_high().map_err(BusError::pin)? {
                    received |= mask;
                }
                self.clock.set_low().map_err(BusError::pin)?;
            }
            Ok(received)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;
    use std::rc::Rc;

    /// Data-out wired straight back into data-in.
    #[derive(Clone, Default)]
    struct Wire(Rc<Cell<bool>>);

    impl ErrorType for Wire {
        type Error = Infallible;
    }

    impl OutputPin for Wire {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.0.set(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.0.set(true);
            Ok(())
        }
    }

    impl InputPin for Wire {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.0.get())
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.0.get())
        }
    }

    /// Clock pin counting rising edges.
    #[derive(Clone, Default)]
    struct Clock {
        level: Rc<Cell<bool>>,
        rising_edges: Rc<Cell<u32>>,
    }

    impl ErrorType for Clock {
        type Error = Infallible;
    }

    impl OutputPin for Clock {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.level.set(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            if !self.level.get() {
                self.rising_edges.set(self.rising_edges.get() + 1);
            }
            self.level.set(true);
            Ok(())
        }
    }

    #[test]
    fn test_loopback_returns_sent_byte() {
        let wire = Wire::default();
        let clock = Clock::default();
        let mut link = BitBangExchange::new(clock.clone(), wire.clone(), wire).unwrap();

        for byte in [0x00, 0xFF, 0xA5, 0x5A, 0x80, 0x01, 0x74] {
            assert_eq!(link.exchange(byte).unwrap(), byte);
        }
    }

    #[test]
    fn test_each_byte_takes_eight_clocks() {
        let wire = Wire::default();
        let clock = Clock::default();
        let mut link = BitBangExchange::new(clock.clone(), wire.clone(), wire).unwrap();

        link.exchange(0xF7).unwrap();
        assert_eq!(clock.rising_edges.get(), 8);
        link.exchange(0x00).unwrap();
        assert_eq!(clock.rising_edges.get(), 16);
        assert!(!clock.level.get(), "clock must idle low between bytes");
    }

    #[test]
    fn test_floating_input_reads_ones() {
        let clock = Clock::default();
        let data_in = Wire(Rc::new(Cell::new(true)));
        let mut link = BitBangExchange::new(clock, Wire::default(), data_in).unwrap();

        assert_eq!(link.exchange(0x12).unwrap(), 0xFF);
    }
}
