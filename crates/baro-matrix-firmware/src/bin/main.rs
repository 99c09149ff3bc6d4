#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use esp_hal::clock::CpuClock;
use esp_hal::delay::Delay;
use esp_hal::gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull};
use log::{error, info};

use baro_matrix_core::bus::{BitBangExchange, SharedBus};
use baro_matrix_core::config::StationConfig;
use baro_matrix_core::station::Station;

/// Pause after a failed cycle before measuring again.
const RETRY_DELAY_MS: u32 = 1000;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

fn halt(delay: Delay) -> ! {
    error!("Station halted");
    loop {
        delay.delay_millis(RETRY_DELAY_MS);
    }
}

#[esp_hal::main]
fn main() -> ! {
    rtt_target::rtt_init_log!();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);
    let delay = Delay::new();

    // Shared link: clock, data to the peripherals, data back from the sensor.
    // The LED chain never drives data-in; the pull-up keeps it defined.
    let clock = Output::new(peripherals.GPIO12, Level::Low, OutputConfig::default());
    let data_out = Output::new(peripherals.GPIO11, Level::Low, OutputConfig::default());
    let data_in = Input::new(
        peripherals.GPIO13,
        InputConfig::default().with_pull(Pull::Up),
    );

    // Select lines start deasserted (high).
    let sensor_select = Output::new(peripherals.GPIO10, Level::High, OutputConfig::default());
    let chain_select = Output::new(peripherals.GPIO9, Level::High, OutputConfig::default());

    let bus = match BitBangExchange::new(clock, data_out, data_in)
        .and_then(|link| SharedBus::new(link, sensor_select, chain_select))
    {
        Ok(bus) => bus,
        Err(e) => {
            error!("Bus setup failed: {}", e);
            halt(delay);
        }
    };

    let station_config = StationConfig::default();
    let mut station = match Station::start(bus, delay, &station_config) {
        Ok(station) => station,
        Err(e) => {
            error!("Station failed to start: {}", e);
            halt(delay);
        }
    };
    info!("baro-matrix running");

    loop {
        if let Err(e) = station.run_cycle() {
            error!("Cycle {} failed: {}", station.cycles() + 1, e);
            delay.delay_millis(RETRY_DELAY_MS);
        }
    }
}
