//! CRC-16/XMODEM: polynomial 0x1021, initial value 0, no reflection, no final
//! XOR.

use ::crc::{Crc, CRC_16_XMODEM};

const XMODEM: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// CRC-16 of `data`.
pub fn crc16(data: &[u8]) -> u16 {
    XMODEM.checksum(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_value() {
        assert_eq!(crc16(b"123456789"), 0x31C3);
    }

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(crc16(&[]), 0);
    }

    #[test]
    fn appending_crc_yields_zero_remainder() {
        let data = [0x55, 0xAA, 0x01];
        let crc = crc16(&data);
        let mut framed = data.to_vec();
        framed.extend_from_slice(&crc.to_be_bytes());
        assert_eq!(crc16(&framed), 0);
    }
}
