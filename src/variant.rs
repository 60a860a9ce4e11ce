use std::fmt;

/// The layout family encoded in the top bits of byte 8 of a [`Uuid`](crate::Uuid).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Variant {
    /// `0xxxxxxx`: reserved for NCS backward compatibility.
    Reserved,

    /// `10xxxxxx`: the layout of RFC 4122 (and RFC 9562).
    Rfc4122,

    /// `110xxxxx`: reserved for Microsoft backward compatibility.
    Microsoft,

    /// `111xxxxx`: reserved for future definition.
    Future,
}

impl Variant {
    /// Decodes the variant from byte 8 of a UUID.
    pub(crate) const fn from_byte(b: u8) -> Self {
        if b & 0xc0 == 0x80 {
            Self::Rfc4122
        } else if b & 0xe0 == 0xc0 {
            Self::Microsoft
        } else if b & 0xe0 == 0xe0 {
            Self::Future
        } else {
            Self::Reserved
        }
    }

    /// Overwrites the bits that this variant occupies in `b`, keeping the rest.
    pub(crate) const fn apply_to(self, b: u8) -> u8 {
        match self {
            Self::Reserved => b & 0x7f,
            Self::Rfc4122 => (b & 0x3f) | 0x80,
            Self::Microsoft => (b & 0x1f) | 0xc0,
            Self::Future => (b & 0x1f) | 0xe0,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Reserved => "Reserved",
            Self::Rfc4122 => "RFC4122",
            Self::Microsoft => "Microsoft",
            Self::Future => "Future",
        })
    }
}

/// The DCE Security domain embedded in a version 2 UUID.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(u8)]
pub enum Domain {
    /// POSIX UID domain.
    Person = 0,

    /// POSIX GID domain.
    Group = 1,

    /// Organization domain.
    Org = 2,
}

impl From<Domain> for u8 {
    fn from(src: Domain) -> Self {
        src as u8
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Person => "Person",
            Self::Group => "Group",
            Self::Org => "Org",
        })
    }
}
