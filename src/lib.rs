//! This is a platform-agnostic Rust driver for the Sensirion SHT30, SHT31 and SHT35
//! humidity and temperature digital sensors using the [`embedded-hal`] or
//! [`embedded-hal-async`] traits.
//!
//! [`embedded-hal`]: https://github.com/rust-embedded/embedded-hal/tree/master/embedded-hal
//! [`embedded-hal-async`]: https://github.com/rust-embedded/embedded-hal/tree/master/embedded-hal-async
//!
//! This driver allows you to:
//! - Read samples in single-shot, periodic and ART (accelerated response time) mode.
//! - Choose the repeatability and, in periodic mode, the acquisition speed.
//! - Tell "no new sample yet" (periodic mode NACK) apart from bus failures.
//! - Enable/disable the heater.
//! - Trigger a software reset.
//! - Read and clear the device status bits.
//! - Switch between the two device addresses.
//! - Plug in a checksum validator, or use the built-in CRC-8.
//! - blocking API support.
//! - async API support.
//!
//! This driver does not yet support the following device features:
//! - Alert thresholds.
//! - Reading the serial number.
//!
//! ## Features
//!
//! - `async`: Enables async API ([`Sht3xAsync`]).
//! - `blocking`: Enables blocking API ([`Sht3x`]).
//! - `crc`: Provides [`checksum::verify`], the CRC-8 the device appends to every word.
//! - `clock-stretching`: Single-shot reads hold the bus while the device stretches the
//!   clock instead of polling it for up to 20 ms.
//! - `defmt`: Enables logging using the `defmt` framework.
//! - `log`: Enables logging using the `log` framework.
//!
//! ## Supported devices: SHT30, SHT31, SHT35
//!
//! Datasheet:
//!   [SHT3x-DIS](https://sensirion.com/media/documents/213E6A3B/63A5A569/Datasheet_SHT3x_DIS.pdf)
//!
//! ## Blocking Example:
//!
//! ```ignore
//! use sht3x::{checksum, I2cAddr, Repeatability, Sht3x, Speed, Error};
//!
//! // Platform-specific
//! let i2c = /* embedded_hal::i2c::I2c instance */;
//! let delay = /* embedded_hal::delay::DelayNs instance */;
//!
//! let mut sht3x = Sht3x::new(i2c, delay, I2cAddr::A).with_crc_check(checksum::verify);
//! sht3x.init().unwrap();
//!
//! let sample = sht3x.read_sample().unwrap();
//! println!("{:0.1} %RH, {:0.1} °C", sample.humidity_percent, sample.centigrade);
//!
//! sht3x.set_periodic(Speed::Mps1, Repeatability::High).unwrap();
//! loop {
//!     match sht3x.read_sample() {
//!         Ok(sample) => println!("{:0.1} °C", sample.centigrade),
//!         Err(Error::NoData) => {}
//!         Err(e) => panic!("{e:?}"),
//!     }
//!     // Platform-specific: sleep a while
//!     sleep_ms(250);
//! }
//! ```
//!
//! ## Async Example:
//!
//! ```ignore
//! use sht3x::{I2cAddr, Repeatability, Sht3xAsync};
//!
//! let mut sht3x = Sht3xAsync::new(i2c, delay, I2cAddr::B);
//! sht3x.init().await.unwrap();
//! sht3x.set_single_shot(Repeatability::High).await.unwrap();
//! let sample = sht3x.read_sample().await.unwrap();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![cfg_attr(not(test), no_std)]

#[cfg(not(any(feature = "async", feature = "blocking")))]
compile_error!("At least one of \"async\" and \"blocking\" features must be enabled");

#[cfg(all(feature = "defmt", feature = "log"))]
compile_error!("Features \"defmt\" and \"log\" are mutually exclusive and cannot be enabled together");

#[macro_use]
mod fmt;

pub mod checksum;
#[cfg(feature = "blocking")]
mod device_impl;
#[cfg(feature = "async")]
mod device_impl_async;
mod hw_def;
mod protocol;
mod types;

pub use crate::{hw_def::*, types::*};
