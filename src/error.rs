use std::{error, fmt, time::SystemTimeError};

/// All errors that encoding, decoding, and generation functions of this crate can produce.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The input has a byte or character length other than the one the target format requires.
    DataSize {
        /// The length required by the format.
        expected: usize,
        /// The length given.
        actual: usize,
    },

    /// Strict Base32 decoding encountered a byte outside the ULID alphabet.
    InvalidCharacter {
        /// The offending byte.
        byte: u8,
        /// The position of the offending byte.
        index: usize,
    },

    /// The leading Base32 digit of a ULID string is larger than `7`, which would require more
    /// than 128 bits to store.
    Overflow,

    /// The timestamp is larger than [`Ulid::MAX_TIME`](crate::Ulid::MAX_TIME).
    TimeTooLarge(u64),

    /// Incrementing the previous entropy within the same millisecond would overflow 80 bits.
    MonotonicOverflow,

    /// The string is not in any of the accepted UUID formats.
    InvalidFormat,

    /// A 38-character UUID string is not enclosed in braces.
    InvalidBracketedFormat,

    /// A 45-character UUID string does not start with `urn:uuid:`.
    InvalidUrnPrefix(String),

    /// The UUID string length is none of 32, 36, 38, and 45.
    InvalidLength(usize),

    /// A database driver value is neither text nor binary.
    ScanType,

    /// The random number generator failed to provide bytes.
    Rand(rand::Error),

    /// The system clock reports a time before the Unix epoch.
    Clock(SystemTimeError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataSize { expected, actual } => {
                write!(f, "bad data size: {} (expected {})", actual, expected)
            }
            Self::InvalidCharacter { byte, index } => write!(
                f,
                "invalid character '{}' at {}",
                char::from(*byte).escape_debug(),
                index
            ),
            Self::Overflow => write!(f, "ULID string overflows 128 bits"),
            Self::TimeTooLarge(ms) => write!(f, "timestamp too large: {}", ms),
            Self::MonotonicOverflow => write!(f, "monotonic entropy overflow"),
            Self::InvalidFormat => write!(f, "invalid UUID format"),
            Self::InvalidBracketedFormat => write!(f, "invalid bracketed UUID format"),
            Self::InvalidUrnPrefix(prefix) => write!(f, "invalid urn prefix: {:?}", prefix),
            Self::InvalidLength(len) => write!(f, "invalid UUID length: {}", len),
            Self::ScanType => write!(f, "source value must be a string or byte slice"),
            Self::Rand(err) => write!(f, "random number generator failed: {}", err),
            Self::Clock(err) => write!(f, "could not read system clock: {}", err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Rand(err) => Some(err),
            Self::Clock(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rand::Error> for Error {
    fn from(err: rand::Error) -> Self {
        Self::Rand(err)
    }
}

impl From<SystemTimeError> for Error {
    fn from(err: SystemTimeError) -> Self {
        Self::Clock(err)
    }
}
