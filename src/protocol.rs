//! Bus-independent half of the protocol shared by the blocking and async drivers.

use crate::hw_def::*;
use crate::types::*;

cfg_if::cfg_if! {
    if #[cfg(feature = "blocking")] {
        use embedded_hal::i2c::{Error as I2cError, ErrorKind};
    } else {
        use embedded_hal_async::i2c::{Error as I2cError, ErrorKind};
    }
}

/// `[T_hi, T_lo, T_crc, H_hi, H_lo, H_crc]`
pub(crate) const MEASUREMENT_LEN: usize = 6;
/// `[S_hi, S_lo, S_crc]`
pub(crate) const STATUS_LEN: usize = 3;

pub(crate) const CLOCK_STRETCHING: bool = cfg!(feature = "clock-stretching");

/// Command issued by a read in the given mode
pub(crate) fn read_command(mode: Mode) -> u16 {
    match mode {
        Mode::SingleShot(repeatability) => single_shot_command(repeatability, CLOCK_STRETCHING),
        Mode::Periodic(..) | Mode::Art => Command::FetchData as u16,
    }
}

/// Periodic-mode reads are NACKed by the device until a new sample is ready
pub(crate) fn fetch_error<E: I2cError>(err: E) -> Error<E> {
    match err.kind() {
        ErrorKind::NoAcknowledge(_) => {
            warn!("sht3x: fetch NACKed, no new sample");
            Error::NoData
        }
        _ => Error::I2c(err),
    }
}

/// A receive that reports success but leaves the buffer untouched shows up as
/// zeroed checksum bytes.
pub(crate) fn is_empty_response(buf: &[u8; MEASUREMENT_LEN]) -> bool {
    buf[2] == 0 && buf[5] == 0
}

/// Fill the raw counts, check both words (temperature first), then derive the
/// physical values. The raw counts are written even when a check fails.
pub(crate) fn decode_measurement<E>(
    buf: &[u8; MEASUREMENT_LEN],
    crc_check: CrcCheck,
    sample: &mut Sample,
) -> Result<(), Error<E>> {
    sample.temperature_raw = u16::from_be_bytes([buf[0], buf[1]]);
    sample.humidity_raw = u16::from_be_bytes([buf[3], buf[4]]);
    if !crc_check(sample.temperature_raw, buf[2]) {
        warn!("sht3x: temperature crc mismatch: buf={:?}", buf);
        return Err(Error::CrcMismatch);
    }
    if !crc_check(sample.humidity_raw, buf[5]) {
        warn!("sht3x: humidity crc mismatch: buf={:?}", buf);
        return Err(Error::CrcMismatch);
    }
    sample.convert();
    Ok(())
}

pub(crate) fn decode_status<E>(buf: &[u8; STATUS_LEN], crc_check: CrcCheck) -> Result<StatusBits, Error<E>> {
    let raw = u16::from_be_bytes([buf[0], buf[1]]);
    if !crc_check(raw, buf[2]) {
        warn!("sht3x: status crc mismatch: buf={:?}", buf);
        return Err(Error::CrcMismatch);
    }
    Ok(StatusBits::from(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum;
    use embedded_hal::i2c::NoAcknowledgeSource;

    fn reject(_word: u16, _crc: u8) -> bool {
        false
    }

    #[test]
    fn decode_scenario_buffer() {
        let mut sample = Sample::default();
        decode_measurement::<()>(&[0x66, 0x2E, 0xFF, 0x7D, 0x13, 0xFF], checksum::ignore, &mut sample).unwrap();
        assert_eq!(sample, Sample::from_raw(26158, 32019));
    }

    #[test]
    fn crc_failure_still_fills_raw_counts() {
        let mut sample = Sample::default();
        let result = decode_measurement::<()>(&[0x66, 0x2E, 0xFF, 0x7D, 0x13, 0xFF], reject, &mut sample);
        assert!(matches!(result, Err(Error::CrcMismatch)));
        assert_eq!(sample.temperature_raw, 0x662E);
        assert_eq!(sample.humidity_raw, 0x7D13);
        assert_eq!(sample.centigrade, 0.0);
    }

    #[cfg(feature = "crc")]
    #[test]
    fn humidity_checked_after_temperature() {
        let t_crc = checksum::compute(0x662E);
        let mut sample = Sample::default();
        let result = decode_measurement::<()>(&[0x66, 0x2E, t_crc, 0x7D, 0x13, 0x00], checksum::verify, &mut sample);
        assert!(matches!(result, Err(Error::CrcMismatch)));

        let h_crc = checksum::compute(0x7D13);
        decode_measurement::<()>(&[0x66, 0x2E, t_crc, 0x7D, 0x13, h_crc], checksum::verify, &mut sample).unwrap();
        assert_eq!(sample.humidity_raw, 0x7D13);
    }

    #[test]
    fn status_crc() {
        let status = decode_status::<()>(&[0x80, 0x10, 0x00], checksum::ignore).unwrap();
        assert!(status.alert_pending);
        assert!(matches!(decode_status::<()>(&[0x80, 0x10, 0x00], reject), Err(Error::CrcMismatch)));
    }

    #[test]
    fn empty_response_detection() {
        assert!(is_empty_response(&[0x12, 0x34, 0x00, 0x56, 0x78, 0x00]));
        assert!(!is_empty_response(&[0x00, 0x00, 0x81, 0x00, 0x00, 0x00]));
    }

    #[test]
    fn nack_is_no_data() {
        assert!(matches!(fetch_error(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)), Error::NoData));
        assert!(matches!(fetch_error(ErrorKind::ArbitrationLoss), Error::I2c(ErrorKind::ArbitrationLoss)));
    }

    #[test]
    fn read_command_follows_mode() {
        assert_eq!(read_command(Mode::Periodic(Speed::Mps1, Repeatability::High)), 0xE000);
        assert_eq!(read_command(Mode::Art), 0xE000);
        assert_eq!(
            read_command(Mode::SingleShot(Repeatability::High)),
            single_shot_command(Repeatability::High, CLOCK_STRETCHING)
        );
    }
}
