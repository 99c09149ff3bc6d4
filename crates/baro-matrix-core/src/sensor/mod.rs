//! BMP280 acquisition and compensation pipeline
//!
//! The free functions are single bus transactions against the sensor. The
//! [`Bmp280`] type strings them together as a typestate: only a calibrated
//! sensor can measure, and pressure can only be measured with the
//! [`FineTemperature`] produced by a temperature measurement.

pub mod calibration;
pub mod compensation;
pub mod registers;

pub use calibration::{CalibrationSet, PressureCoefficients, TemperatureCoefficients};
pub use compensation::{
    FineTemperature, Pressure, RawSample, Temperature, compensate_pressure, compensate_temperature,
};
pub use registers::{
    ConfigRegister, ControlMeasurement, IirFilter, Oversampling, PowerMode, StandbyTime,
};

use embedded_hal::digital::OutputPin;
use log::{debug, info};
use thiserror_no_std::Error;

use crate::bus::{BusError, ByteExchange, SharedBus};
use calibration::{PRESSURE_BLOCK_LEN, TEMPERATURE_BLOCK_LEN};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),
    #[error("Unexpected chip id {found:#04x} (expected {expected:#04x})")]
    UnexpectedChipId { found: u8, expected: u8 },
}

/// Read the `id` register.
pub fn read_chip_id<X, S, D>(bus: &mut SharedBus<X, S, D>) -> Result<u8, SensorError>
where
    X: ByteExchange,
    S: OutputPin,
    D: OutputPin,
{
    bus.with_sensor(|bus| {
        bus.exchange(registers::READ_CHIP_ID)?;
        Ok(bus.exchange(0x00)?)
    })
}

/// Fail unless the device answers with the BMP280 chip id.
pub fn verify_chip_id<X, S, D>(bus: &mut SharedBus<X, S, D>) -> Result<(), SensorError>
where
    X: ByteExchange,
    S: OutputPin,
    D: OutputPin,
{
    let found = read_chip_id(bus)?;
    if found != registers::CHIP_ID {
        return Err(SensorError::UnexpectedChipId {
            found,
            expected: registers::CHIP_ID,
        });
    }
    Ok(())
}

/// Read both calibration blocks from the device.
///
/// Safe to repeat; every call re-reads the NVM.
pub fn load_calibration<X, S, D>(
    bus: &mut SharedBus<X, S, D>,
) -> Result<CalibrationSet, SensorError>
where
    X: ByteExchange,
    S: OutputPin,
    D: OutputPin,
{
    let mut temperature = [0u8; TEMPERATURE_BLOCK_LEN];
    bus.with_sensor(|bus| {
        bus.exchange(registers::READ_TEMPERATURE_CALIBRATION)?;
        bus.read(&mut temperature)
    })?;

    let mut pressure = [0u8; PRESSURE_BLOCK_LEN];
    bus.with_sensor(|bus| {
        bus.exchange(registers::READ_PRESSURE_CALIBRATION)?;
        bus.read(&mut pressure)
    })?;

    let calibration = CalibrationSet::from_blocks(&temperature, &pressure);
    debug!("BMP280 calibration: {:?}", calibration);
    Ok(calibration)
}

/// Write `ctrl_meas`, selecting oversampling and power mode.
pub fn configure_sensor<X, S, D>(
    bus: &mut SharedBus<X, S, D>,
    control: ControlMeasurement,
) -> Result<(), SensorError>
where
    X: ByteExchange,
    S: OutputPin,
    D: OutputPin,
{
    debug!("BMP280 ctrl_meas = {:#010b}", control.bits());
    bus.with_sensor(|bus| bus.write(&[registers::WRITE_CTRL_MEAS, control.bits()]))?;
    Ok(())
}

/// Write `config`: standby time and IIR filter.
pub fn write_config<X, S, D>(
    bus: &mut SharedBus<X, S, D>,
    config: ConfigRegister,
) -> Result<(), SensorError>
where
    X: ByteExchange,
    S: OutputPin,
    D: OutputPin,
{
    debug!("BMP280 config = {:#010b}", config.bits());
    bus.with_sensor(|bus| bus.write(&[registers::WRITE_CONFIG, config.bits()]))?;
    Ok(())
}

/// Power-on reset. The device needs about 2 ms before it answers again.
pub fn soft_reset<X, S, D>(bus: &mut SharedBus<X, S, D>) -> Result<(), SensorError>
where
    X: ByteExchange,
    S: OutputPin,
    D: OutputPin,
{
    debug!("BMP280 soft reset");
    bus.with_sensor(|bus| bus.write(&[registers::WRITE_RESET, registers::RESET_COMMAND]))?;
    Ok(())
}

fn read_raw<X, S, D>(bus: &mut SharedBus<X, S, D>, command: u8) -> Result<RawSample, SensorError>
where
    X: ByteExchange,
    S: OutputPin,
    D: OutputPin,
{
    let mut bytes = [0u8; 3];
    bus.with_sensor(|bus| {
        bus.exchange(command)?;
        bus.read(&mut bytes)
    })?;
    let [high, middle, low] = bytes;
    Ok(RawSample::from_bytes(high, middle, low))
}

pub fn read_raw_temperature<X, S, D>(bus: &mut SharedBus<X, S, D>) -> Result<RawSample, SensorError>
where
    X: ByteExchange,
    S: OutputPin,
    D: OutputPin,
{
    read_raw(bus, registers::READ_TEMPERATURE)
}

pub fn read_raw_pressure<X, S, D>(bus: &mut SharedBus<X, S, D>) -> Result<RawSample, SensorError>
where
    X: ByteExchange,
    S: OutputPin,
    D: OutputPin,
{
    read_raw(bus, registers::READ_PRESSURE)
}

/// Typestate: calibration not loaded yet.
pub struct Uncalibrated;

/// Typestate: calibration loaded and sensor configured.
pub struct Calibrated {
    calibration: CalibrationSet,
}

/// The sensor on the shared bus.
///
/// The bus is borrowed per call because the display chain uses it too.
pub struct Bmp280<State> {
    control: ControlMeasurement,
    state: State,
}

impl Bmp280<Uncalibrated> {
    pub const fn new(control: ControlMeasurement) -> Self {
        Self {
            control,
            state: Uncalibrated,
        }
    }

    /// Load the calibration set, then configure the sensor.
    pub fn calibrate<X, S, D>(
        self,
        bus: &mut SharedBus<X, S, D>,
    ) -> Result<Bmp280<Calibrated>, SensorError>
    where
        X: ByteExchange,
        S: OutputPin,
        D: OutputPin,
    {
        let calibration = load_calibration(bus)?;
        configure_sensor(bus, self.control)?;
        info!("BMP280 calibrated and configured");
        Ok(Bmp280 {
            control: self.control,
            state: Calibrated { calibration },
        })
    }
}

impl Bmp280<Calibrated> {
    pub const fn calibration(&self) -> &CalibrationSet {
        &self.state.calibration
    }

    pub const fn control(&self) -> ControlMeasurement {
        self.control
    }

    /// Read and compensate a temperature sample.
    ///
    /// The returned [`FineTemperature`] is needed for the pressure reading of
    /// the same cycle.
    pub fn measure_temperature<X, S, D>(
        &self,
        bus: &mut SharedBus<X, S, D>,
    ) -> Result<(Temperature, FineTemperature), SensorError>
    where
        X: ByteExchange,
        S: OutputPin,
        D: OutputPin,
    {
        let raw = read_raw_temperature(bus)?;
        let (temperature, fine) = compensate_temperature(raw, self.calibration());
        debug!(
            "BMP280 temperature raw={} fine={} -> {} C",
            raw.value(),
            fine.value(),
            temperature.celsius()
        );
        Ok((temperature, fine))
    }

    /// Read and compensate a pressure sample. `Ok(None)` means the
    /// compensation had no valid divisor.
    pub fn measure_pressure<X, S, D>(
        &self,
        bus: &mut SharedBus<X, S, D>,
        fine: FineTemperature,
    ) -> Result<Option<Pressure>, SensorError>
    where
        X: ByteExchange,
        S: OutputPin,
        D: OutputPin,
    {
        let raw = read_raw_pressure(bus)?;
        let pressure = compensate_pressure(raw, self.calibration(), fine);
        debug!("BMP280 pressure raw={} -> {:?}", raw.value(), pressure);
        Ok(pressure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::SpiBusExchange;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    /// One select-gated sensor transaction: `(sent, received)` byte pairs.
    fn transaction(pairs: &[(u8, u8)]) -> Vec<SpiTransaction<u8>> {
        pairs
            .iter()
            .flat_map(|&(sent, received)| {
                [
                    SpiTransaction::transfer_in_place(vec![sent], vec![received]),
                    SpiTransaction::flush(),
                ]
            })
            .collect()
    }

    fn command_then_read(command: u8, response: &[u8]) -> Vec<SpiTransaction<u8>> {
        let mut pairs = vec![(command, 0xFF)];
        pairs.extend(response.iter().map(|&b| (0x00, b)));
        transaction(&pairs)
    }

    fn select_pulses(count: usize) -> Vec<PinTransaction> {
        let mut pin = vec![PinTransaction::set(PinState::High)];
        for _ in 0..count {
            pin.push(PinTransaction::set(PinState::Low));
            pin.push(PinTransaction::set(PinState::High));
        }
        pin
    }

    const TEMPERATURE_BLOCK: [u8; 6] = [0x70, 0x6B, 0x43, 0x67, 0x18, 0xFC];
    const PRESSURE_BLOCK: [u8; 18] = [
        0x7D, 0x8E, 0x43, 0xD6, 0xD0, 0x0B, 0x27, 0x0B, 0x8C, 0x00, 0xF9, 0xFF, 0x8C, 0x3C, 0xF8,
        0xC6, 0x70, 0x17,
    ];

    #[test]
    fn test_full_cycle_against_mocked_bus() {
        let mut spi = vec![];
        spi.extend(command_then_read(0x88, &TEMPERATURE_BLOCK));
        spi.extend(command_then_read(0x8E, &PRESSURE_BLOCK));
        spi.extend(transaction(&[(0x74, 0xFF), (0x4F, 0xFF)]));
        // 519888 and 415148 as msb/lsb/xlsb
        spi.extend(command_then_read(0xFA, &[0x7E, 0xED, 0x00]));
        spi.extend(command_then_read(0xF7, &[0x65, 0x5A, 0xC0]));

        let spi = SpiMock::new(&spi);
        let sensor_select = PinMock::new(&select_pulses(5));
        let chain_select = PinMock::new(&[PinTransaction::set(PinState::High)]);
        let mut bus =
            SharedBus::new(SpiBusExchange::new(spi), sensor_select, chain_select).unwrap();

        let sensor = Bmp280::new(ControlMeasurement::default())
            .calibrate(&mut bus)
            .unwrap();
        assert_eq!(sensor.calibration().temperature().t1, 27504);
        assert_eq!(sensor.calibration().pressure().p9, 6000);

        let (temperature, fine) = sensor.measure_temperature(&mut bus).unwrap();
        assert_eq!(fine.value(), 128422);
        assert!((temperature.celsius() - 25.08).abs() < 0.005);

        let pressure = sensor.measure_pressure(&mut bus, fine).unwrap().unwrap();
        assert_eq!(pressure.q24_8(), 25_767_233);

        let (link, mut sensor_select, mut chain_select) = bus.release();
        link.release().done();
        sensor_select.done();
        chain_select.done();
    }

    #[test]
    fn test_verify_chip_id_rejects_other_devices() {
        let spi = SpiMock::new(&command_then_read(0xD0, &[0x60]));
        let sensor_select = PinMock::new(&select_pulses(1));
        let chain_select = PinMock::new(&[PinTransaction::set(PinState::High)]);
        let mut bus =
            SharedBus::new(SpiBusExchange::new(spi), sensor_select, chain_select).unwrap();

        assert_eq!(
            verify_chip_id(&mut bus),
            Err(SensorError::UnexpectedChipId {
                found: 0x60,
                expected: 0x58
            })
        );

        let (link, mut sensor_select, mut chain_select) = bus.release();
        link.release().done();
        sensor_select.done();
        chain_select.done();
    }
}
