//! Checksum validators that can be installed with `with_crc_check`.

#[cfg(feature = "crc")]
use crc::{Crc, CRC_8_NRSC_5};

// polynomial 0x31, init 0xFF, no reflection, no final xor
#[cfg(feature = "crc")]
const CRC: Crc<u8> = Crc::<u8>::new(&CRC_8_NRSC_5);

/// Accept every word. This is the default check.
pub fn ignore(_word: u16, _crc: u8) -> bool {
    true
}

/// Checksum the device appends to a data word
#[cfg(feature = "crc")]
pub fn compute(word: u16) -> u8 {
    CRC.checksum(&word.to_be_bytes())
}

/// Validate a word against the CRC-8 the device computed for it
#[cfg(feature = "crc")]
pub fn verify(word: u16, crc: u8) -> bool {
    compute(word) == crc
}

#[cfg(all(test, feature = "crc"))]
mod tests {
    use super::*;

    #[test]
    fn datasheet_example() {
        assert_eq!(compute(0xBEEF), 0x92);
        assert!(verify(0xBEEF, 0x92));
        assert!(!verify(0xBEEF, 0x93));
    }

    #[test]
    fn ignore_accepts_anything() {
        assert!(ignore(0x0000, 0xFF));
        assert!(ignore(0xBEEF, 0x00));
    }
}
