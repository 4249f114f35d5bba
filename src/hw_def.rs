//! Bus addresses, command words and transfer functions from the SHT3x datasheet.

use crate::types::Error;

#[cfg(feature = "defmt")]
use defmt::Format;

/// Number of receive attempts made while a single-shot conversion is in progress
pub const SINGLE_SHOT_READ_ATTEMPTS: u8 = 20;
/// Delay between single-shot receive attempts, in milliseconds
pub const SINGLE_SHOT_RETRY_DELAY_MS: u32 = 1;
/// Time the sensor needs to come back after a soft reset, in milliseconds
pub const SOFT_RESET_DELAY_MS: u32 = 2;

/// 7-bit I²C address of the device, selected by the level of the ADDR pin
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[repr(u8)]
pub enum I2cAddr {
    /// ADDR pin low
    #[default]
    A = 0x44,
    /// ADDR pin high
    B = 0x45,
}
impl I2cAddr {
    /// The 7-bit address as used on the bus
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
/// Accepts the ADDR pin selector (0 or 1), the 7-bit address, or the address
/// already shifted into the 8-bit bus framing.
impl TryFrom<u8> for I2cAddr {
    type Error = Error<()>;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        const A: u8 = I2cAddr::A as u8;
        const B: u8 = I2cAddr::B as u8;
        const A_SHIFTED: u8 = A << 1;
        const B_SHIFTED: u8 = B << 1;
        match raw {
            0 | A | A_SHIFTED => Ok(I2cAddr::A),
            1 | B | B_SHIFTED => Ok(I2cAddr::B),
            _ => Err(Error::InvalidInputData),
        }
    }
}

/// Trade-off between measurement duration and noise
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum Repeatability {
    /// shortest conversion, most noise
    Low = 0,
    /// medium
    Medium = 1,
    /// longest conversion (up to 15.5 ms), least noise
    High = 2,
}
impl TryFrom<u8> for Repeatability {
    type Error = Error<()>;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Repeatability::Low),
            1 => Ok(Repeatability::Medium),
            2 => Ok(Repeatability::High),
            _ => Err(Error::InvalidInputData),
        }
    }
}

/// Acquisition frequency in periodic mode, in measurements per second
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum Speed {
    /// 0.5 mps
    Mps05 = 0,
    /// 1 mps
    Mps1 = 1,
    /// 2 mps
    Mps2 = 2,
    /// 4 mps
    Mps4 = 3,
    /// 10 mps
    Mps10 = 4,
}
impl TryFrom<u8> for Speed {
    type Error = Error<()>;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Speed::Mps05),
            1 => Ok(Speed::Mps1),
            2 => Ok(Speed::Mps2),
            3 => Ok(Speed::Mps4),
            4 => Ok(Speed::Mps10),
            _ => Err(Error::InvalidInputData),
        }
    }
}

/// Measurement mode last armed on the device
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mode {
    /// one conversion per read
    SingleShot(Repeatability),
    /// self-timed conversions, the latest one is fetched on read
    Periodic(Speed, Repeatability),
    /// accelerated response time, periodic at 4 mps
    Art,
}
impl Default for Mode {
    fn default() -> Self {
        Mode::SingleShot(Repeatability::Low)
    }
}

/// Fixed command words, sent MSB first
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u16)]
pub enum Command {
    /// soft reset
    SoftReset = 0x30A2,
    /// stop periodic (and ART) acquisition
    StopPeriodic = 0x3093,
    /// fetch the latest periodic sample
    FetchData = 0xE000,
    /// enter accelerated response time mode
    Art = 0x2B32,
    /// read the status register
    StatusRead = 0xF32D,
    /// clear the status register
    StatusClear = 0x3041,
    /// enable the heater
    HeaterEnable = 0x306D,
    /// disable the heater
    HeaterDisable = 0x3066,
}
impl Command {
    /// Big-endian wire bytes of this command
    pub fn to_be_bytes(self) -> [u8; 2] {
        (self as u16).to_be_bytes()
    }
}

// [repeatability]
const SINGLE_SHOT_CLOCK_STRETCHING: [u16; 3] = [0x2C10, 0x2C0D, 0x2C06];
const SINGLE_SHOT_NO_CLOCK_STRETCHING: [u16; 3] = [0x2416, 0x240B, 0x2400];

// [speed][repeatability]
const PERIODIC: [[u16; 3]; 5] = [
    [0x202F, 0x2024, 0x2032],
    [0x212D, 0x2126, 0x2130],
    [0x222B, 0x2220, 0x2236],
    [0x2329, 0x2322, 0x2334],
    [0x272A, 0x2721, 0x2737],
];

/// Command word that starts one single-shot conversion
pub fn single_shot_command(repeatability: Repeatability, clock_stretching: bool) -> u16 {
    if clock_stretching {
        SINGLE_SHOT_CLOCK_STRETCHING[repeatability as usize]
    } else {
        SINGLE_SHOT_NO_CLOCK_STRETCHING[repeatability as usize]
    }
}

/// Command word that starts periodic acquisition
pub fn periodic_command(speed: Speed, repeatability: Repeatability) -> u16 {
    PERIODIC[speed as usize][repeatability as usize]
}

/// Convert a raw temperature count to degrees centigrade
pub fn raw_temp_to_centigrade(raw: u16) -> f32 {
    (raw as f32 / 65535.0) * 175.0 - 45.0
}

/// Convert a raw temperature count to degrees fahrenheit
pub fn raw_temp_to_fahrenheit(raw: u16) -> f32 {
    (raw as f32 / 65535.0) * 315.0 - 49.0
}

/// Convert a raw humidity count to relative humidity in percent
pub fn raw_rel_humid_to_percent(raw: u16) -> f32 {
    (raw as f32 / 65535.0) * 100.0
}

pub(crate) const STATUS_FIELD_LSBIT_ALERT_PENDING: u16 = 15;
pub(crate) const STATUS_FIELD_LSBIT_HEATER_ON: u16 = 13;
pub(crate) const STATUS_FIELD_LSBIT_RH_TRACKING_ALERT: u16 = 11;
pub(crate) const STATUS_FIELD_LSBIT_T_TRACKING_ALERT: u16 = 10;
pub(crate) const STATUS_FIELD_LSBIT_SYSTEM_RESET: u16 = 4;
pub(crate) const STATUS_FIELD_LSBIT_COMMAND_FAILED: u16 = 1;
pub(crate) const STATUS_FIELD_LSBIT_WRITE_CHECKSUM_FAILED: u16 = 0;
