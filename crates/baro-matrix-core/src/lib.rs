//! Hardware-independent core library for baro-matrix
//!
//! A BMP280 pressure/temperature sensor and a cascade of MAX7219 LED-matrix
//! drivers share one clocked serial link. This crate contains everything that
//! does not depend on a concrete MCU: the shared-bus transport, the sensor
//! calibration/compensation pipeline, the LED chain driver and glyphs, and the
//! station loop tying them together.
//!
//! It is `#![no_std]` so it compiles on both embedded targets (ESP32-S3) and
//! desktop hosts (for the simulator and tests). The `sim` feature adds
//! host-side models of the peripherals, which pull in `alloc`.

#![cfg_attr(not(test), no_std)]

#[cfg(any(test, feature = "sim"))]
extern crate alloc;

pub mod bus;
pub mod config;
pub mod display;
pub mod sensor;
pub mod station;

#[cfg(any(test, feature = "sim"))]
pub mod sim;
