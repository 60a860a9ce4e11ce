//! Conversions between identifiers and database driver values.
//!
//! [`SqlValue`] models the value kinds a database driver hands over when reading a column.
//! [`Ulid::scan`] and [`Uuid::scan`] accept text and binary columns; `value()` always produces the
//! 16-byte binary form.
//!
//! # Examples
//!
//! ```rust
//! use twinid::{sql::SqlValue, Ulid, Uuid};
//!
//! let mut x = Ulid::NIL;
//! x.scan(SqlValue::Text("01AN4Z07BY79KA1307SR9X4MV3"))?;
//! assert_eq!(x.timestamp(), 1_465_824_320_894);
//! assert_eq!(x.value(), SqlValue::Bytes(x.as_bytes()));
//!
//! let mut y = Uuid::NIL;
//! y.scan(SqlValue::Text("{f47ac10b-58cc-4372-a567-0e02b2c3d479}"))?;
//! assert_eq!(y.version(), 4);
//! # Ok::<(), twinid::Error>(())
//! ```

use std::str;

use crate::{Error, Ulid, Uuid};

/// A value read from or written to a database column.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum SqlValue<'a> {
    /// SQL `NULL`.
    Null,
    /// A character column.
    Text(&'a str),
    /// A binary column.
    Bytes(&'a [u8]),
    /// An integer column.
    Int(i64),
    /// A floating-point column.
    Float(f64),
    /// A boolean column.
    Bool(bool),
}

impl Ulid {
    /// Overwrites `self` with a database value.
    ///
    /// `Null` leaves `self` untouched, `Text` is parsed with [`Ulid::parse`], and `Bytes` must
    /// hold exactly 16 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScanType`] for value kinds other than text and bytes, and the parse or
    /// size error otherwise.
    pub fn scan(&mut self, src: SqlValue<'_>) -> Result<(), Error> {
        *self = match src {
            SqlValue::Null => return Ok(()),
            SqlValue::Text(text) => Self::parse(text)?,
            SqlValue::Bytes(bytes) => Self::from_slice(bytes)?,
            _ => return Err(Error::ScanType),
        };
        Ok(())
    }

    /// Returns the 16-byte binary form as a database value.
    pub fn value(&self) -> SqlValue<'_> {
        SqlValue::Bytes(self.as_bytes())
    }
}

impl Uuid {
    /// Overwrites `self` with a database value.
    ///
    /// `Null`, empty text, and empty bytes leave `self` untouched. Text is parsed with
    /// [`Uuid::parse_str`]; 16 bytes are copied as they are, while byte strings of other lengths
    /// are parsed as text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScanType`] for value kinds other than text and bytes, and the parse error
    /// otherwise.
    pub fn scan(&mut self, src: SqlValue<'_>) -> Result<(), Error> {
        *self = match src {
            SqlValue::Null | SqlValue::Text("") | SqlValue::Bytes([]) => return Ok(()),
            SqlValue::Text(text) => Self::parse_str(text)?,
            SqlValue::Bytes(bytes) => match <[u8; 16]>::try_from(bytes) {
                Ok(array_value) => Self::from_bytes(array_value),
                Err(_) => Self::parse_str(str::from_utf8(bytes).map_err(|_| Error::InvalidFormat)?)?,
            },
            _ => return Err(Error::ScanType),
        };
        Ok(())
    }

    /// Returns the 16-byte binary form as a database value.
    pub fn value(&self) -> SqlValue<'_> {
        SqlValue::Bytes(self.as_bytes())
    }
}
