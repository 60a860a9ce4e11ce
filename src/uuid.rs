use std::{fmt, str};

use digest::Digest;
use fstr::FStr;

use crate::{hex, Error, Variant};

/// Represents a Universally Unique IDentifier.
///
/// # Examples
///
/// ```rust
/// use twinid::{Uuid, Variant};
///
/// let x = "urn:uuid:F47AC10B-58CC-4372-A567-0E02B2C3D479".parse::<Uuid>()?;
/// assert_eq!(x.version(), 4);
/// assert_eq!(x.variant(), Variant::Rfc4122);
/// assert_eq!(x.to_string(), "f47ac10b-58cc-4372-a567-0e02b2c3d479");
/// # Ok::<(), twinid::Error>(())
/// ```
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
#[repr(transparent)]
pub struct Uuid([u8; 16]);

/// Positions of the hexadecimal digit pairs in the 8-4-4-4-12 form.
const HYPHENATED_PAIRS: [usize; 16] = [0, 2, 4, 6, 9, 11, 14, 16, 19, 21, 24, 26, 28, 30, 32, 34];

/// Text shapes left after stripping the URN prefix or braces.
enum Shape<'a> {
    Hyphenated(&'a [u8]),
    Simple(&'a [u8]),
}

impl Uuid {
    /// Nil UUID (00000000-0000-0000-0000-000000000000)
    pub const NIL: Self = Self([0x00; 16]);

    /// Max UUID (ffffffff-ffff-ffff-ffff-ffffffffffff)
    pub const MAX: Self = Self([0xff; 16]);

    /// Name space for fully-qualified domain names.
    pub const NAMESPACE_DNS: Self = Self::from_u128(0x6ba7b810_9dad_11d1_80b4_00c04fd430c8);

    /// Name space for URLs.
    pub const NAMESPACE_URL: Self = Self::from_u128(0x6ba7b811_9dad_11d1_80b4_00c04fd430c8);

    /// Name space for ISO OIDs.
    pub const NAMESPACE_OID: Self = Self::from_u128(0x6ba7b812_9dad_11d1_80b4_00c04fd430c8);

    /// Name space for X.500 DNs.
    pub const NAMESPACE_X500: Self = Self::from_u128(0x6ba7b814_9dad_11d1_80b4_00c04fd430c8);

    /// Creates an object from a 16-byte array in the canonical field order.
    pub const fn from_bytes(array_value: [u8; 16]) -> Self {
        Self(array_value)
    }

    /// Returns a reference to the underlying byte array.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Returns the underlying byte array.
    pub const fn to_bytes(self) -> [u8; 16] {
        self.0
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

    /// Creates a UUID byte array from UUIDv7 field values.
    ///
    /// # Panics
    ///
    /// Panics if any argument is out of the range of its field.
    pub const fn from_fields_v7(unix_ts_ms: u64, rand_a: u16, rand_b: u64) -> Self {
        if unix_ts_ms >= 1 << 48 || rand_a >= 1 << 12 || rand_b >= 1 << 62 {
            panic!("invalid field value");
        }

        Self([
            (unix_ts_ms >> 40) as u8,
            (unix_ts_ms >> 32) as u8,
            (unix_ts_ms >> 24) as u8,
            (unix_ts_ms >> 16) as u8,
            (unix_ts_ms >> 8) as u8,
            unix_ts_ms as u8,
            0x70 | (rand_a >> 8) as u8,
            rand_a as u8,
            0x80 | (rand_b >> 56) as u8,
            (rand_b >> 48) as u8,
            (rand_b >> 40) as u8,
            (rand_b >> 32) as u8,
            (rand_b >> 24) as u8,
            (rand_b >> 16) as u8,
            (rand_b >> 8) as u8,
            rand_b as u8,
        ])
    }

    /// Returns true if this is the Nil UUID.
    pub const fn is_nil(&self) -> bool {
        self.to_u128() == 0
    }

    /// Returns the 4-bit version field.
    pub const fn version(&self) -> u8 {
        self.0[6] >> 4
    }

    /// Overwrites the version field with the low four bits of `version`.
    pub fn set_version(&mut self, version: u8) {
        self.0[6] = (self.0[6] & 0x0f) | ((version & 0x0f) << 4);
    }

    /// Returns the variant field.
    pub const fn variant(&self) -> Variant {
        Variant::from_byte(self.0[8])
    }

    /// Overwrites the variant field, clearing only the bits the variant pattern occupies.
    pub fn set_variant(&mut self, variant: Variant) {
        self.0[8] = variant.apply_to(self.0[8]);
    }

    /// Creates a version 3 UUID from the MD5 hash of a name space UUID and a name.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use twinid::Uuid;
    ///
    /// let x = Uuid::new_v3(&Uuid::NAMESPACE_DNS, b"python.org");
    /// assert_eq!(x.encode(), "6fa459ea-ee8a-3ca4-894e-db77e160355e");
    /// ```
    pub fn new_v3(namespace: &Uuid, name: &[u8]) -> Self {
        Self::new_hash_based::<md5::Md5>(namespace, name, 3)
    }

    /// Creates a version 5 UUID from the SHA-1 hash of a name space UUID and a name.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use twinid::Uuid;
    ///
    /// let x = Uuid::new_v5(&Uuid::NAMESPACE_DNS, b"python.org");
    /// assert_eq!(x.encode(), "886313e1-3b8a-5372-9b90-0c9aee199e5d");
    /// ```
    pub fn new_v5(namespace: &Uuid, name: &[u8]) -> Self {
        Self::new_hash_based::<sha1::Sha1>(namespace, name, 5)
    }

    /// Hashes `namespace || name`, keeps the first 16 bytes, and overlays the version and the
    /// RFC 4122 variant.
    fn new_hash_based<D: Digest>(namespace: &Uuid, name: &[u8], version: u8) -> Self {
        let mut hasher = D::new();
        hasher.update(namespace.as_bytes());
        hasher.update(name);
        let digest = hasher.finalize();

        let mut id = Self::NIL;
        id.0.copy_from_slice(&digest[..16]);
        id.set_version(version);
        id.set_variant(Variant::Rfc4122);
        id
    }

    /// Creates an object from any of the following string representations:
    ///
    /// - `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`
    /// - `urn:uuid:xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` (prefix is case-insensitive)
    /// - `{xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx}`
    /// - `xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx`
    ///
    /// Hexadecimal digits are accepted in either case. The enclosing characters of the 38-char form
    /// are skipped without being examined; use [`Uuid::validate`] to insist on braces.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLength`] for lengths other than 32, 36, 38, and 45,
    /// [`Error::InvalidUrnPrefix`] if a 45-char string lacks the URN prefix, and
    /// [`Error::InvalidFormat`] for misplaced hyphens or non-hexadecimal digits.
    pub fn parse_str(src: &str) -> Result<Self, Error> {
        match Self::strip(src.as_bytes(), false)? {
            Shape::Hyphenated(hyphenated) => Self::decode_hyphenated(hyphenated),
            Shape::Simple(simple) => Self::decode_simple(simple),
        }
    }

    /// Checks if the string is in any of the formats [`Uuid::parse_str`] accepts, requiring
    /// literal braces in the 38-char form.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Uuid::parse_str`], plus [`Error::InvalidBracketedFormat`] if a
    /// 38-char string is not enclosed in braces.
    pub fn validate(src: &str) -> Result<(), Error> {
        match Self::strip(src.as_bytes(), true)? {
            Shape::Hyphenated(hyphenated) => Self::decode_hyphenated(hyphenated).map(|_| ()),
            Shape::Simple(simple) => Self::decode_simple(simple).map(|_| ()),
        }
    }

    /// Equivalent to [`Uuid::parse_str`] but panics on failure. Intended for literals.
    ///
    /// # Panics
    ///
    /// Panics if the string cannot be parsed.
    pub fn must_parse(src: &str) -> Self {
        Self::parse_str(src).unwrap_or_else(|err| panic!("could not parse UUID {:?}: {}", src, err))
    }

    /// Removes the URN prefix or the enclosing characters and classifies what remains.
    fn strip(bytes: &[u8], check_braces: bool) -> Result<Shape<'_>, Error> {
        match bytes.len() {
            36 => Ok(Shape::Hyphenated(bytes)),
            45 => {
                let (prefix, rest) = bytes.split_at(9);
                if prefix.eq_ignore_ascii_case(b"urn:uuid:") {
                    Ok(Shape::Hyphenated(rest))
                } else {
                    Err(Error::InvalidUrnPrefix(
                        String::from_utf8_lossy(prefix).into_owned(),
                    ))
                }
            }
            38 => {
                if check_braces && (bytes[0] != b'{' || bytes[37] != b'}') {
                    return Err(Error::InvalidBracketedFormat);
                }
                Ok(Shape::Hyphenated(&bytes[1..37]))
            }
            32 => Ok(Shape::Simple(bytes)),
            len => Err(Error::InvalidLength(len)),
        }
    }

    /// Decodes the 36-byte 8-4-4-4-12 form.
    fn decode_hyphenated(src: &[u8]) -> Result<Self, Error> {
        debug_assert_eq!(src.len(), 36);
        if [8, 13, 18, 23].iter().any(|&i| src[i] != b'-') {
            return Err(Error::InvalidFormat);
        }

        let mut dst = [0u8; 16];
        for (e, &i) in dst.iter_mut().zip(HYPHENATED_PAIRS.iter()) {
            *e = hex::decode_pair(src[i], src[i + 1]).ok_or(Error::InvalidFormat)?;
        }
        Ok(Self(dst))
    }

    /// Decodes the 32-byte form without hyphens.
    fn decode_simple(src: &[u8]) -> Result<Self, Error> {
        debug_assert_eq!(src.len(), 32);
        let mut dst = [0u8; 16];
        for (e, pair) in dst.iter_mut().zip(src.chunks_exact(2)) {
            *e = hex::decode_pair(pair[0], pair[1]).ok_or(Error::InvalidFormat)?;
        }
        Ok(Self(dst))
    }

    /// Returns the 8-4-4-4-12 hexadecimal string representation stored in a stack-allocated
    /// string-like type that can be handled like [`String`] through common traits.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use twinid::Uuid;
    ///
    /// let x = Uuid::must_parse("{F47AC10B-58CC-4372-A567-0E02B2C3D479}");
    /// let y = x.encode();
    /// assert_eq!(y, "f47ac10b-58cc-4372-a567-0e02b2c3d479");
    /// assert_eq!(format!("{}", y), "f47ac10b-58cc-4372-a567-0e02b2c3d479");
    /// ```
    pub fn encode(&self) -> FStr<36> {
        let mut buffer = [b'-'; 36];
        hex::encode_into(&self.0[..4], &mut buffer[..8]);
        hex::encode_into(&self.0[4..6], &mut buffer[9..13]);
        hex::encode_into(&self.0[6..8], &mut buffer[14..18]);
        hex::encode_into(&self.0[8..10], &mut buffer[19..23]);
        hex::encode_into(&self.0[10..], &mut buffer[24..]);
        debug_assert!(buffer.is_ascii());
        // SAFETY: The buffer consists of hexadecimal digits and hyphens only.
        unsafe { FStr::from_bytes_unchecked(buffer) }
    }

    /// Returns the RFC 2141 URN form, `urn:uuid:xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`.
    pub fn urn(&self) -> String {
        format!("urn:uuid:{}", self.encode())
    }
}

impl fmt::Display for Uuid {
    /// Returns the 8-4-4-4-12 canonical hexadecimal string representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.encode().as_str(), f)
    }
}

impl str::FromStr for Uuid {
    type Err = Error;

    /// Creates an object from any of the string representations [`Uuid::parse_str`] accepts.
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        Self::parse_str(src)
    }
}

impl From<Uuid> for [u8; 16] {
    fn from(src: Uuid) -> Self {
        src.0
    }
}

impl From<[u8; 16]> for Uuid {
    fn from(src: [u8; 16]) -> Self {
        Self(src)
    }
}

impl AsRef<[u8]> for Uuid {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<Uuid> for u128 {
    fn from(src: Uuid) -> Self {
        src.to_u128()
    }
}

impl From<u128> for Uuid {
    fn from(src: u128) -> Self {
        Self::from_u128(src)
    }
}

impl From<Uuid> for String {
    fn from(src: Uuid) -> Self {
        src.encode().into()
    }
}

impl TryFrom<String> for Uuid {
    type Error = Error;

    fn try_from(src: String) -> Result<Self, Self::Error> {
        Self::parse_str(&src)
    }
}

#[cfg(feature = "uuid")]
#[cfg_attr(docsrs, doc(cfg(feature = "uuid")))]
mod uuid_support {
    use super::Uuid;

    impl From<Uuid> for uuid::Uuid {
        fn from(src: Uuid) -> Self {
            uuid::Uuid::from_bytes(src.0)
        }
    }

    impl From<uuid::Uuid> for Uuid {
        fn from(src: uuid::Uuid) -> Self {
            Self(src.into_bytes())
        }
    }
}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
mod serde_support {
    use super::{fmt, Uuid};
    use serde::{de, Deserializer, Serializer};

    impl serde::Serialize for Uuid {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            if serializer.is_human_readable() {
                serializer.serialize_str(&self.encode())
            } else {
                serializer.serialize_bytes(self.as_bytes())
            }
        }
    }

    impl<'de> serde::Deserialize<'de> for Uuid {
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
        type Value = Uuid;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "a UUID representation")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Self::Value::parse_str(value).map_err(de::Error::custom)
        }

        fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<Self::Value, E> {
            Self::Value::from_slice(value).map_err(de::Error::custom)
        }
    }

}
