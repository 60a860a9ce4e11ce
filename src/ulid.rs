//! ULID: Universally Unique Lexicographically Sortable Identifier.
//!
//! # Field and bit layout
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                      32_bit_uint_time_high                    |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     16_bit_uint_time_low      |       16_bit_uint_random      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                       32_bit_uint_random                      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                       32_bit_uint_random                      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! The 48-bit timestamp holds Unix time in milliseconds and the remaining 80 bits hold entropy,
//! both in network byte order, so the byte order of two ULIDs is the order of their
//! (timestamp, entropy) pairs.

use std::{fmt, str, time};

use fstr::FStr;

use crate::{base32, entropy::Entropy, Error};

/// Represents a ULID.
///
/// # Examples
///
/// ```rust
/// use twinid::Ulid;
///
/// let x = "01AN4Z07BY79KA1307SR9X4MV3".parse::<Ulid>()?;
/// assert_eq!(x.timestamp(), 1_465_824_320_894);
/// assert_eq!(x.to_string(), "01AN4Z07BY79KA1307SR9X4MV3");
/// # Ok::<(), twinid::Error>(())
/// ```
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
#[repr(transparent)]
pub struct Ulid([u8; 16]);

impl Ulid {
    /// Zero-value ULID (00000000000000000000000000)
    pub const NIL: Self = Self([0x00; 16]);

    /// The largest Unix time in milliseconds that a ULID can hold.
    pub const MAX_TIME: u64 = (1 << 48) - 1;

    /// Length of the canonical string representation.
    pub const ENCODED_LEN: usize = base32::ENCODED_LEN;

    /// Creates an object from a 16-byte big-endian byte array.
    pub const fn from_bytes(array_value: [u8; 16]) -> Self {
        Self(array_value)
    }

    /// Returns the big-endian byte array representation.
    pub const fn to_bytes(self) -> [u8; 16] {
        self.0
    }

    /// Returns a reference to the big-endian byte array representation.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Creates an object from a 128-bit unsigned integer.
    pub const fn from_u128(int_value: u128) -> Self {
        Self(int_value.to_be_bytes())
    }

    /// Returns the 128-bit unsigned integer representation.
    pub const fn to_u128(self) -> u128 {
        u128::from_be_bytes(self.0)
    }

    /// Creates an object from a byte slice that must be exactly 16 bytes long.
    pub fn from_slice(src: &[u8]) -> Result<Self, Error> {
        <[u8; 16]>::try_from(src)
            .map(Self)
            .map_err(|_| Error::DataSize {
                expected: 16,
                actual: src.len(),
            })
    }

    /// Returns true if this is the zero-value ULID.
    pub const fn is_zero(&self) -> bool {
        self.to_u128() == 0
    }

    /// Returns the 48-bit Unix time in milliseconds.
    pub const fn timestamp(&self) -> u64 {
        (self.to_u128() >> 80) as u64
    }

    /// Overwrites the timestamp field.
    pub fn set_timestamp(&mut self, unix_ts_ms: u64) -> Result<(), Error> {
        if unix_ts_ms > Self::MAX_TIME {
            return Err(Error::TimeTooLarge(unix_ts_ms));
        }
        self.0[..6].copy_from_slice(&unix_ts_ms.to_be_bytes()[2..]);
        Ok(())
    }

    /// Returns a copy of the 80-bit entropy field.
    pub fn entropy(&self) -> [u8; 10] {
        let mut dst = [0u8; 10];
        dst.copy_from_slice(&self.0[6..]);
        dst
    }

    /// Overwrites the entropy field with a slice that must be exactly 10 bytes long.
    pub fn set_entropy(&mut self, src: &[u8]) -> Result<(), Error> {
        if src.len() != 10 {
            return Err(Error::DataSize {
                expected: 10,
                actual: src.len(),
            });
        }
        self.0[6..].copy_from_slice(src);
        Ok(())
    }

    /// Returns the timestamp field as a [`SystemTime`](time::SystemTime).
    pub fn datetime(&self) -> time::SystemTime {
        time::UNIX_EPOCH + time::Duration::from_millis(self.timestamp())
    }

    /// Creates a ULID from a Unix time in milliseconds and an optional entropy source.
    ///
    /// Without an entropy source, the entropy field is left zero. With a
    /// [`Monotonic`](crate::entropy::Monotonic) source, ULIDs created within the same millisecond
    /// are strictly increasing.
    ///
    /// Whether this is safe for concurrent use depends only on the entropy source; share one
    /// through [`Locked`](crate::entropy::Locked).
    ///
    /// # Errors
    ///
    /// Returns [`Error::TimeTooLarge`] if `unix_ts_ms` exceeds [`Ulid::MAX_TIME`] and passes
    /// through errors from the entropy source.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use twinid::{entropy::Monotonic, Ulid};
    ///
    /// let mut entropy = Monotonic::new(rand::rngs::OsRng, 0);
    /// let x = Ulid::generate(1_469_922_850_259, Some(&mut entropy))?;
    /// let y = Ulid::generate(1_469_922_850_259, Some(&mut entropy))?;
    /// assert!(x < y);
    /// # Ok::<(), twinid::Error>(())
    /// ```
    pub fn generate(unix_ts_ms: u64, entropy: Option<&mut dyn Entropy>) -> Result<Self, Error> {
        let mut id = Self::NIL;
        id.set_timestamp(unix_ts_ms)?;
        if let Some(entropy) = entropy {
            let mut buffer = [0u8; 10];
            entropy.fill_entropy(unix_ts_ms, &mut buffer)?;
            id.0[6..].copy_from_slice(&buffer);
        }
        Ok(id)
    }

    /// Equivalent to [`Ulid::generate`] but panics on failure.
    ///
    /// # Panics
    ///
    /// Panics if `unix_ts_ms` exceeds [`Ulid::MAX_TIME`] or the entropy source fails.
    pub fn must_generate(unix_ts_ms: u64, entropy: Option<&mut dyn Entropy>) -> Self {
        Self::generate(unix_ts_ms, entropy)
            .unwrap_or_else(|err| panic!("could not generate ULID: {}", err))
    }

    /// Creates an object from the 26-digit string representation without validating each digit.
    ///
    /// This is the fast path. Characters outside the Base32 alphabet are not reported (except in
    /// the leading position) and yield an unspecified ULID; use [`Ulid::parse_strict`] for
    /// untrusted input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DataSize`] if the string is not 26 bytes long and [`Error::Overflow`] if
    /// the leading digit is not between `0` and `7`.
    pub fn parse(src: &str) -> Result<Self, Error> {
        base32::decode_u128(src, false).map(Self::from_u128)
    }

    /// Creates an object from the 26-digit string representation, validating every digit.
    ///
    /// # Errors
    ///
    /// In addition to the errors of [`Ulid::parse`], returns [`Error::InvalidCharacter`] at the
    /// first character outside the Base32 alphabet.
    pub fn parse_strict(src: &str) -> Result<Self, Error> {
        base32::decode_u128(src, true).map(Self::from_u128)
    }

    /// Equivalent to [`Ulid::parse`] but panics on failure. Intended for literals.
    ///
    /// # Panics
    ///
    /// Panics if the string cannot be parsed.
    pub fn must_parse(src: &str) -> Self {
        Self::parse(src).unwrap_or_else(|err| panic!("could not parse ULID {:?}: {}", src, err))
    }

    /// Equivalent to [`Ulid::parse_strict`] but panics on failure. Intended for literals.
    ///
    /// # Panics
    ///
    /// Panics if the string cannot be parsed.
    pub fn must_parse_strict(src: &str) -> Self {
        Self::parse_strict(src)
            .unwrap_or_else(|err| panic!("could not parse ULID {:?}: {}", src, err))
    }

    /// Returns the 26-digit canonical string representation stored in a stack-allocated
    /// string-like type that can be handled like [`String`] through common traits.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use twinid::Ulid;
    ///
    /// let x = Ulid::from_u128(u128::MAX);
    /// assert_eq!(x.encode(), "7ZZZZZZZZZZZZZZZZZZZZZZZZZ");
    /// ```
    pub const fn encode(&self) -> FStr<26> {
        // SAFETY: All bytes produced by the Base32 encoder are ASCII digits.
        unsafe { FStr::from_bytes_unchecked(base32::encode_u128(self.to_u128())) }
    }
}

/// Returns the Unix time in milliseconds of a [`SystemTime`](time::SystemTime).
pub fn timestamp_ms(t: time::SystemTime) -> Result<u64, Error> {
    Ok(t.duration_since(time::UNIX_EPOCH)?.as_millis() as u64)
}

/// Returns the current Unix time in milliseconds.
pub fn now_ms() -> Result<u64, Error> {
    timestamp_ms(time::SystemTime::now())
}

impl fmt::Display for Ulid {
    /// Returns the 26-digit canonical string representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.encode().as_str(), f)
    }
}

impl str::FromStr for Ulid {
    type Err = Error;

    /// Creates an object from the 26-digit string representation, validating every digit.
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        Self::parse_strict(src)
    }
}

impl From<[u8; 16]> for Ulid {
    fn from(src: [u8; 16]) -> Self {
        Self::from_bytes(src)
    }
}

impl From<Ulid> for [u8; 16] {
    fn from(src: Ulid) -> Self {
        src.to_bytes()
    }
}

impl From<u128> for Ulid {
    fn from(src: u128) -> Self {
        Self::from_u128(src)
    }
}

impl From<Ulid> for u128 {
    fn from(src: Ulid) -> Self {
        src.to_u128()
    }
}

impl AsRef<[u8]> for Ulid {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<Ulid> for String {
    fn from(src: Ulid) -> Self {
        src.encode().into()
    }
}

impl TryFrom<String> for Ulid {
    type Error = Error;

    fn try_from(src: String) -> Result<Self, Self::Error> {
        Self::parse_strict(&src)
    }
}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
mod serde_support {
    use super::{fmt, Ulid};
    use serde::{de, Deserializer, Serializer};

    impl serde::Serialize for Ulid {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            if serializer.is_human_readable() {
                serializer.serialize_str(&self.encode())
            } else {
                serializer.serialize_bytes(self.as_bytes())
            }
        }
    }

    impl<'de> serde::Deserialize<'de> for Ulid {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            if deserializer.is_human_readable() {
                deserializer.deserialize_str(VisitorImpl)
            } else {
                deserializer.deserialize_bytes(VisitorImpl)
            }
        }
    }

    struct VisitorImpl;

    impl<'de> de::Visitor<'de> for VisitorImpl {
        type Value = Ulid;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "a ULID representation")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Self::Value::parse_strict(value).map_err(de::Error::custom)
        }

        fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<Self::Value, E> {
            Self::Value::from_slice(value).map_err(de::Error::custom)
        }
    }

}

#[cfg(test)]
mod tests {
    use super::Ulid;
    use crate::{entropy::Adapter, Error};

    const MAX_UINT80: u128 = (1 << 80) - 1;

    /// Returns a collection of prepared cases
    fn prepare_cases() -> &'static [((u64, u128), &'static str)] {
        &[
            ((0, 0), "00000000000000000000000000"),
            ((Ulid::MAX_TIME, 0), "7ZZZZZZZZZ0000000000000000"),
            ((0, MAX_UINT80), "0000000000ZZZZZZZZZZZZZZZZ"),
            ((Ulid::MAX_TIME, MAX_UINT80), "7ZZZZZZZZZZZZZZZZZZZZZZZZZ"),
            (
                (1_465_824_320_894, 275_790_392_532_082_281_829_219),
                "01AN4Z07BY79KA1307SR9X4MV3",
            ),
            (
                (1_469_922_850_259, 1_012_768_647_078_601_740_696_923),
                "01ARZ3NDEKTSV4RRFFQ69G5FAV",
            ),
        ]
    }

    fn from_fields(timestamp: u64, entropy: u128) -> Ulid {
        let mut e = Ulid::NIL;
        e.set_timestamp(timestamp).unwrap();
        e.set_entropy(&entropy.to_be_bytes()[6..]).unwrap();
        e
    }

    /// Encodes and decodes prepared cases correctly
    #[test]
    fn encodes_and_decodes_prepared_cases_correctly() {
        for ((timestamp, entropy), text) in prepare_cases() {
            let from_fields = from_fields(*timestamp, *entropy);
            assert_eq!(from_fields.timestamp(), *timestamp);
            assert_eq!(from_fields.to_u128() & MAX_UINT80, *entropy);
            assert_eq!(&from_fields.encode() as &str, *text);
            assert_eq!(&from_fields.to_string(), text);
            assert_eq!(Ulid::parse(text).unwrap(), from_fields);
            assert_eq!(Ulid::parse_strict(text).unwrap(), from_fields);
            assert_eq!(text.to_lowercase().parse::<Ulid>().unwrap(), from_fields);
        }
    }

    /// Has symmetric converters
    #[test]
    fn has_symmetric_converters() {
        for ((timestamp, entropy), _) in prepare_cases() {
            let e = from_fields(*timestamp, *entropy);
            assert_eq!(Ulid::from(<[u8; 16]>::from(e)), e);
            assert_eq!(Ulid::from(u128::from(e)), e);
            assert_eq!(Ulid::from_slice(e.as_bytes()).unwrap(), e);
            assert_eq!(Ulid::try_from(String::from(e)).unwrap(), e);
            assert_eq!(Ulid::parse_strict(&e.encode()).unwrap(), e);
        }
    }

    /// Restores random values from binary and text forms
    #[test]
    fn restores_random_values_from_binary_and_text_forms() {
        use rand::{rngs::StdRng, Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1_000 {
            let e = Ulid::from_u128(rng.gen::<u128>());
            assert_eq!(Ulid::from_slice(&e.to_bytes()).unwrap(), e);
            assert_eq!(Ulid::parse_strict(&e.encode()).unwrap(), e);
            assert_eq!(Ulid::parse_strict(&e.encode().to_lowercase()).unwrap(), e);
            assert_eq!(Ulid::parse(&e.encode()).unwrap(), e);
        }
    }

    /// Orders by timestamp then entropy
    #[test]
    fn orders_by_timestamp_then_entropy() {
        let cases = prepare_cases();
        for (a, ta) in cases {
            for (b, tb) in cases {
                let (x, y) = (from_fields(a.0, a.1), from_fields(b.0, b.1));
                assert_eq!(x.cmp(&y), a.cmp(b));
                assert_eq!(x.cmp(&y), ta.cmp(tb));
            }
        }
    }

    /// Returns errors to invalid inputs
    #[test]
    fn returns_errors_to_invalid_inputs() {
        assert!(matches!(
            Ulid::parse("01AN4Z07BY79KA1307SR9X4MV"),
            Err(Error::DataSize { actual: 25, .. })
        ));
        assert!(matches!(
            Ulid::parse_strict("01AN4Z07BY79KA1307SR9X4MVU"),
            Err(Error::InvalidCharacter {
                byte: b'U',
                index: 25
            })
        ));
        assert!(Ulid::parse("01AN4Z07BY79KA1307SR9X4MVU").is_ok());
        assert!(matches!(
            Ulid::parse_strict("81AN4Z07BY79KA1307SR9X4MV3"),
            Err(Error::Overflow)
        ));
        assert!(matches!(
            Ulid::from_slice(&[0u8; 15]),
            Err(Error::DataSize {
                expected: 16,
                actual: 15
            })
        ));
        let mut e = Ulid::NIL;
        assert!(matches!(
            e.set_entropy(&[0u8; 11]),
            Err(Error::DataSize {
                expected: 10,
                actual: 11
            })
        ));
    }

    /// Rejects timestamps beyond max time
    #[test]
    fn rejects_timestamps_beyond_max_time() {
        assert!(Ulid::generate(Ulid::MAX_TIME, None).is_ok());
        assert!(matches!(
            Ulid::generate(Ulid::MAX_TIME + 1, None),
            Err(Error::TimeTooLarge(ms)) if ms == Ulid::MAX_TIME + 1
        ));
        let mut e = Ulid::NIL;
        assert!(e.set_timestamp(1 << 48).is_err());
        assert!(e.is_zero());
    }

    /// Leaves entropy zero without source
    #[test]
    fn leaves_entropy_zero_without_source() {
        let e = Ulid::generate(1_469_922_850_259, None).unwrap();
        assert_eq!(e.timestamp(), 1_469_922_850_259);
        assert_eq!(e.entropy(), [0u8; 10]);
        assert_eq!(e.encode(), "01ARZ3NDEK0000000000000000");
    }

    /// Fills entropy from plain source
    #[test]
    fn fills_entropy_from_plain_source() {
        let mut source = Adapter(rand::thread_rng());
        let x = Ulid::generate(1_469_922_850_259, Some(&mut source)).unwrap();
        let y = Ulid::generate(1_469_922_850_259, Some(&mut source)).unwrap();
        assert_eq!(x.timestamp(), y.timestamp());
        assert_ne!(x.entropy(), y.entropy());
    }

    /// Reports zero value only for nil
    #[test]
    fn reports_zero_value_only_for_nil() {
        assert_eq!(Ulid::default(), Ulid::NIL);
        assert!(Ulid::NIL.is_zero());
        assert!(!Ulid::from_u128(1).is_zero());
        assert!(!Ulid::from_u128(1 << 127).is_zero());
    }

    /// Converts timestamp to system time
    #[test]
    fn converts_timestamp_to_system_time() {
        let e = Ulid::must_parse("01ARZ3NDEKTSV4RRFFQ69G5FAV");
        assert_eq!(super::timestamp_ms(e.datetime()).unwrap(), 1_469_922_850_259);
        assert!(super::now_ms().unwrap() > 1_469_922_850_259);
    }

    /// Panics on invalid literal
    #[test]
    #[should_panic(expected = "could not parse ULID")]
    fn panics_on_invalid_literal() {
        Ulid::must_parse_strict("not a ulid");
    }

    /// Panics on out-of-range generation
    #[test]
    #[should_panic(expected = "could not generate ULID")]
    fn panics_on_out_of_range_generation() {
        assert_eq!(Ulid::must_generate(0, None), Ulid::NIL);
        Ulid::must_generate(Ulid::MAX_TIME + 1, None);
    }
}
