//! CRC-24 checksum as used by OpenPGP ASCII armor (RFC 4880, section 6.1)

/// Initial register value
const CRC24_INIT: u32 = 0x00B7_04CE;

/// Generator polynomial, including the implicit x^24 term
const CRC24_POLY: u32 = 0x0186_4CFB;

/// Bit that overflows the 24-bit register after a shift
const CRC24_OVERFLOW: u32 = 0x0100_0000;

/// Length of the checksum in bytes
pub const CRC24_LEN: usize = 3;

/// Compute the CRC-24 of `data`, returned big-endian.
pub fn compute(data: &[u8]) -> [u8; CRC24_LEN] {
    let mut crc = CRC24_INIT;
    for &byte in data {
        crc ^= u32::from(byte) << 16;
        for _ in 0..8 {
            crc <<= 1;
            if crc & CRC24_OVERFLOW != 0 {
                crc ^= CRC24_POLY;
            }
        }
    }

    let [_, hi, mid, lo] = crc.to_be_bytes();
    [hi, mid, lo]
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};

    fn decode(s: &str) -> Vec<u8> {
        let joined: String = s.split_whitespace().collect();
        BASE64_STANDARD.decode(joined).unwrap()
    }

    #[test]
    fn test_empty_input_is_initial_register() {
        assert_eq!(compute(b""), [0xB7, 0x04, 0xCE]);
    }

    #[test]
    fn test_check_value() {
        // Standard CRC-24/OpenPGP check value.
        assert_eq!(compute(b"123456789"), [0x21, 0xCF, 0x02]);
    }

    #[test]
    fn test_rfc_sample_message() {
        let data = decode(
            "yDgBO22WxBHv7O8X7O/jygAEzol56iUKiXmV+XmpCtmpqQUKiQrFqclFqUDBovzS
             vBSFjNSiVHsuAA==",
        );
        assert_eq!(compute(&data).to_vec(), decode("njUN"));
    }

    #[test]
    fn test_signed_message() {
        let data = decode(
            "owGbwMvMwCWmemUby0pOLhXG02xJDElh7lM6prMwiHEx2IspsuS6azG8TdPdqnbA
             diNMHSsTSJGiTF5+SVFqYg6QysjMS88sBnEcUisScwtyUvWS83MZuDgFYHokzBkZ
             Xh98v+Db4fCcssPLvl38G2fbfeXfqo8VUlosKQENrxgbnzEy9J3MFnrivtiz3SY/
             qv+Ky9E1ZXLnul5+tpgtHvijqGw/FwA=",
        );
        assert_eq!(compute(&data).to_vec(), decode("noZm"));
    }

    #[test]
    fn test_all_byte_values() {
        let data: Vec<u8> = (0..=255).collect();
        assert_eq!(compute(&data), [0x5b, 0xbd, 0x34]);
    }
}
