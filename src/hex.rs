//! Hexadecimal nibble codec.

/// Digit characters used in the lowercase hexadecimal notation.
const DIGITS: &[u8; 16] = b"0123456789abcdef";

const NO_VALUE: u8 = 0xff;

/// An O(1) map from ASCII code points to hexadecimal digit values.
const DECODE_MAP: [u8; 256] = {
    let mut lut = [NO_VALUE; 256];
    let mut i = 0;
    while i < DIGITS.len() {
        let c = DIGITS[i];
        lut[c as usize] = i as u8;
        lut[c.to_ascii_uppercase() as usize] = i as u8;
        i += 1;
    }
    lut
};

/// Converts a pair of hexadecimal digits into a byte, or returns `None` if either is not a digit.
pub(crate) const fn decode_pair(hi: u8, lo: u8) -> Option<u8> {
    let (hi, lo) = (DECODE_MAP[hi as usize], DECODE_MAP[lo as usize]);
    if hi == NO_VALUE || lo == NO_VALUE {
        None
    } else {
        Some((hi << 4) | lo)
    }
}

/// Writes two lowercase digits per byte of `src` into `dst`.
pub(crate) fn encode_into(src: &[u8], dst: &mut [u8]) {
    debug_assert_eq!(src.len() * 2, dst.len());
    for (e, pair) in src.iter().zip(dst.chunks_exact_mut(2)) {
        pair[0] = DIGITS[(e >> 4) as usize];
        pair[1] = DIGITS[(e & 15) as usize];
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_pair, encode_into};

    /// Decodes every byte value in both cases
    #[test]
    fn decodes_every_byte_value_in_both_cases() {
        for b in 0..=255u8 {
            let text = format!("{:02x}", b);
            let bs = text.as_bytes();
            assert_eq!(decode_pair(bs[0], bs[1]), Some(b));
            let text = text.to_uppercase();
            let bs = text.as_bytes();
            assert_eq!(decode_pair(bs[0], bs[1]), Some(b));
        }
    }

    /// Rejects non-hexadecimal digits
    #[test]
    fn rejects_non_hexadecimal_digits() {
        for c in [b'g', b'G', b'-', b' ', b'x', 0, 0xff] {
            assert_eq!(decode_pair(c, b'0'), None);
            assert_eq!(decode_pair(b'0', c), None);
        }
    }

    /// Encodes lowercase digits
    #[test]
    fn encodes_lowercase_digits() {
        let mut dst = [0u8; 8];
        encode_into(&[0x01, 0xab, 0xcd, 0xef], &mut dst);
        assert_eq!(&dst, b"01abcdef");
    }
}
