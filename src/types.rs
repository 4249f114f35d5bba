use crate::hw_def::*;

use core::fmt;

#[cfg(feature = "defmt")]
use defmt::Format;

cfg_if::cfg_if! {
    if #[cfg(feature = "blocking")] {
        use embedded_hal::i2c::ErrorType;
    } else {
        use embedded_hal_async::i2c::ErrorType;
    }
}

/// Validates a received data word against the checksum byte that follows it.
/// Returns `true` when the word is valid.
pub type CrcCheck = fn(word: u16, crc: u8) -> bool;

/// Platform bus bring-up or teardown, run by `init` and `deinit`
pub type BusHook<I2C> = fn(&mut I2C) -> Result<(), <I2C as ErrorType>::Error>;

/// SHT3x device driver, blocking API
#[cfg(feature = "blocking")]
#[derive(Debug)]
pub struct Sht3x<I2C: ErrorType, Delay> {
    pub(crate) i2c: I2C,
    pub(crate) delay: Delay,
    pub(crate) i2c_addr: I2cAddr,
    pub(crate) mode: Mode,
    pub(crate) crc_check: CrcCheck,
    pub(crate) bus_init: Option<BusHook<I2C>>,
    pub(crate) bus_deinit: Option<BusHook<I2C>>,
}

/// SHT3x device driver, async API
#[cfg(feature = "async")]
#[derive(Debug)]
pub struct Sht3xAsync<I2C: ErrorType, Delay> {
    pub(crate) i2c: I2C,
    pub(crate) delay: Delay,
    pub(crate) i2c_addr: I2cAddr,
    pub(crate) mode: Mode,
    pub(crate) crc_check: CrcCheck,
    pub(crate) bus_init: Option<BusHook<I2C>>,
    pub(crate) bus_deinit: Option<BusHook<I2C>>,
}

/// All possible errors in this crate
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Debug)]
pub enum Error<E> {
    /// I²C communication error
    I2c(E),
    /// Invalid input data provided
    InvalidInputData,
    /// The checksum validation rejected a word received from the device
    CrcMismatch,
    /// Periodic mode has no new sample buffered yet (the device NACKed the read)
    NoData,
    /// A single-shot read completed with both checksum bytes zero
    EmptyResponse,
}
impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::I2c(e) => write!(f, "I2C error: {e:?}"),
            Error::InvalidInputData => write!(f, "invalid input data"),
            Error::CrcMismatch => write!(f, "checksum mismatch"),
            Error::NoData => write!(f, "no data ready"),
            Error::EmptyResponse => write!(f, "empty response"),
        }
    }
}
impl<E: fmt::Debug> core::error::Error for Error<E> {}

/// One temperature and relative humidity measurement
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sample {
    /// unprocessed temperature
    pub temperature_raw: u16,
    /// unprocessed relative humidity
    pub humidity_raw: u16,
    /// degrees centigrade
    pub centigrade: f32,
    /// degrees fahrenheit
    pub fahrenheit: f32,
    /// relative humidity in percent
    pub humidity_percent: f32,
}
impl Sample {
    /// Build a sample from raw counts, deriving the physical values
    pub fn from_raw(temperature_raw: u16, humidity_raw: u16) -> Self {
        let mut sample = Self {
            temperature_raw,
            humidity_raw,
            ..Default::default()
        };
        sample.convert();
        sample
    }

    /// Recompute the physical values from the raw counts
    pub fn convert(&mut self) {
        self.centigrade = raw_temp_to_centigrade(self.temperature_raw);
        self.fahrenheit = raw_temp_to_fahrenheit(self.temperature_raw);
        self.humidity_percent = raw_rel_humid_to_percent(self.humidity_raw);
    }
}

/// Status bits from the device
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StatusBits {
    raw: u16,
    /// at least one alert is pending
    pub alert_pending: bool,
    /// heater is on
    pub heater_on: bool,
    /// relative humidity tracking alert
    pub rh_tracking_alert: bool,
    /// temperature tracking alert
    pub t_tracking_alert: bool,
    /// reset (power-on, soft or brown-out) detected since last clear of status register
    pub system_reset_detected: bool,
    /// last command was not processed (invalid or failed its checksum)
    pub command_failed: bool,
    /// checksum of the last write transfer failed
    pub write_checksum_failed: bool,
}
impl From<u16> for StatusBits {
    fn from(raw: u16) -> Self {
        let bit = |lsbit: u16| (raw >> lsbit) & 1 != 0;
        Self {
            raw,
            alert_pending: bit(STATUS_FIELD_LSBIT_ALERT_PENDING),
            heater_on: bit(STATUS_FIELD_LSBIT_HEATER_ON),
            rh_tracking_alert: bit(STATUS_FIELD_LSBIT_RH_TRACKING_ALERT),
            t_tracking_alert: bit(STATUS_FIELD_LSBIT_T_TRACKING_ALERT),
            system_reset_detected: bit(STATUS_FIELD_LSBIT_SYSTEM_RESET),
            command_failed: bit(STATUS_FIELD_LSBIT_COMMAND_FAILED),
            write_checksum_failed: bit(STATUS_FIELD_LSBIT_WRITE_CHECKSUM_FAILED),
        }
    }
}
impl StatusBits {
    /// Get the raw status bits
    pub fn raw(&self) -> u16 {
        self.raw
    }
}
impl fmt::Display for StatusBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StatusBits {{ 0x{:04x}; ", self.raw)?;
        if self.alert_pending {
            write!(f, "alert_pending ")?;
        }
        if self.heater_on {
            write!(f, "heater_on ")?;
        }
        if self.rh_tracking_alert {
            write!(f, "rh_tracking_alert ")?;
        }
        if self.t_tracking_alert {
            write!(f, "t_tracking_alert ")?;
        }
        if self.system_reset_detected {
            write!(f, "system_reset_detected ")?;
        }
        if self.command_failed {
            write!(f, "command_failed ")?;
        }
        if self.write_checksum_failed {
            write!(f, "write_checksum_failed ")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_from_raw_counts() {
        let sample = Sample::from_raw(0x662E, 0x7D13);
        assert_eq!(sample.temperature_raw, 26158);
        assert_eq!(sample.humidity_raw, 32019);
        assert!((sample.centigrade - 24.85).abs() < 0.01);
        assert!((sample.fahrenheit - 76.73).abs() < 0.01);
        assert!((sample.humidity_percent - 48.86).abs() < 0.01);
    }

    #[test]
    fn status_after_power_on() {
        // datasheet default after reset
        let status = StatusBits::from(0x8010);
        assert!(status.alert_pending);
        assert!(status.system_reset_detected);
        assert!(!status.heater_on);
        assert!(!status.command_failed);
        assert_eq!(status.raw(), 0x8010);
    }

    #[test]
    fn status_all_bits() {
        let status = StatusBits::from(0xFFFF);
        assert!(status.alert_pending);
        assert!(status.heater_on);
        assert!(status.rh_tracking_alert);
        assert!(status.t_tracking_alert);
        assert!(status.system_reset_detected);
        assert!(status.command_failed);
        assert!(status.write_checksum_failed);
    }

    #[test]
    fn status_display_lists_set_bits() {
        let status = StatusBits::from(0x2002);
        assert_eq!(status.to_string(), "StatusBits { 0x2002; heater_on command_failed }");
    }
}
