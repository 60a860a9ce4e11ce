//! Crockford-alphabet Base32 codec for 128-bit values.
//!
//! A 128-bit value takes 26 digits: the first digit carries the three most significant bits and
//! each of the remaining 25 digits carries five bits, most significant first. Since the alphabet
//! is in ascending ASCII order, string comparison of two encoded values agrees with numeric
//! comparison.

use crate::Error;

/// Digit characters used in the Base32 notation.
pub(crate) const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Number of digits in an encoded 128-bit value.
pub(crate) const ENCODED_LEN: usize = 26;

const NO_VALUE: u8 = 0xff;

/// An O(1) map from ASCII code points to Base32 digit values, accepting lowercase letters.
const DECODE_MAP: [u8; 256] = {
    let mut lut = [NO_VALUE; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        let c = ALPHABET[i];
        lut[c as usize] = i as u8;
        lut[c.to_ascii_lowercase() as usize] = i as u8;
        i += 1;
    }
    lut
};

/// Encodes a 128-bit value into 26 uppercase digits.
pub(crate) const fn encode_u128(int_value: u128) -> [u8; ENCODED_LEN] {
    let mut dst = [0u8; ENCODED_LEN];
    let mut i = 0;
    while i < ENCODED_LEN {
        let shift = 5 * (ENCODED_LEN - 1 - i);
        dst[i] = ALPHABET[((int_value >> shift) & 0x1f) as usize];
        i += 1;
    }
    dst
}

/// Decodes 26 Base32 digits into a 128-bit value.
///
/// Without `strict`, bytes outside the alphabet are not detected and produce an unspecified
/// value, except in the leading position where they are reported as [`Error::Overflow`].
pub(crate) fn decode_u128(src: &str, strict: bool) -> Result<u128, Error> {
    let bytes = src.as_bytes();
    if bytes.len() != ENCODED_LEN {
        return Err(Error::DataSize {
            expected: ENCODED_LEN,
            actual: bytes.len(),
        });
    }

    if strict {
        if let Some(index) = bytes
            .iter()
            .position(|&b| DECODE_MAP[b as usize] == NO_VALUE)
        {
            return Err(Error::InvalidCharacter {
                byte: bytes[index],
                index,
            });
        }
    }

    // only 3 bits are left for the leading digit
    if DECODE_MAP[bytes[0] as usize] > 7 {
        return Err(Error::Overflow);
    }

    Ok(bytes
        .iter()
        .fold(0u128, |acc, &b| (acc << 5) | DECODE_MAP[b as usize] as u128))
}
