//! Lexicographically sortable ULIDs and RFC 4122 / RFC 9562 UUIDs
//!
//! ```rust
//! # #[cfg(feature = "global_gen")]
//! # {
//! let ulid = twinid::ulid();
//! println!("{}", ulid); // e.g. "01ARZ3NDEKTSV4RRFFQ69G5FAV"
//!
//! let uuid = twinid::uuid4();
//! println!("{}", uuid); // e.g. "2ca4b2ce-6c13-40d4-bccf-37d222820f6f"
//! # }
//! ```
//!
//! # ULID
//!
//! A [`Ulid`] is a 128-bit identifier made of a 48-bit Unix timestamp in milliseconds and 80 bits
//! of entropy. Its 26-character Crockford Base32 form sorts in the same order as its bytes, so
//! ULIDs sort by creation time both as text and in binary.
//!
//! [`Ulid::generate`] takes the timestamp and an [`entropy::Entropy`] source explicitly. The
//! [`entropy::Monotonic`] source guarantees strictly increasing ULIDs within the same millisecond
//! by adding a random increment to the previous entropy, and [`ulid()`] uses one process-wide
//! instance of it:
//!
//! ```rust
//! use twinid::{entropy::Monotonic, Ulid};
//!
//! let mut entropy = Monotonic::new(rand::thread_rng(), 0);
//! let x = Ulid::generate(1_469_922_850_259, Some(&mut entropy))?;
//! let y = Ulid::generate(1_469_922_850_259, Some(&mut entropy))?;
//! assert!(x < y);
//! assert_eq!(x.to_string()[..10], *"01ARZ3NDEK");
//! # Ok::<(), twinid::Error>(())
//! ```
//!
//! # UUID
//!
//! A [`Uuid`] is parsed from the hyphenated, URN, braced, and plain hexadecimal forms, and is
//! generated in versions 1 through 7 by a [`generator::Generator`] or the global functions
//! [`uuid1()`] to [`uuid7()`]:
//!
//! ```rust
//! use twinid::{Uuid, Variant};
//!
//! let x: Uuid = "{f47ac10b-58cc-4372-a567-0e02b2c3d479}".parse()?;
//! assert_eq!(x.version(), 4);
//! assert_eq!(x.variant(), Variant::Rfc4122);
//! assert_eq!(x.urn(), "urn:uuid:f47ac10b-58cc-4372-a567-0e02b2c3d479");
//!
//! let y = Uuid::new_v5(&Uuid::NAMESPACE_DNS, b"python.org");
//! assert_eq!(y.to_string(), "886313e1-3b8a-5372-9b90-0c9aee199e5d");
//! # Ok::<(), twinid::Error>(())
//! ```
//!
//! # Crate features
//!
//! Default features:
//!
//! - `global_gen`: enables the process-wide generators behind [`ulid()`], [`uuid1()`] to
//!   [`uuid7()`], and their `try_` counterparts.
//! - `mac_address`: derives the node id of version 1, 2, and 6 UUIDs from the host hardware
//!   address, falling back to random bits where none is found.
//!
//! Optional features:
//!
//! - `serde`: enables serialization and deserialization of [`Ulid`] and [`Uuid`].
//! - `uuid`: enables conversion between [`Uuid`] and [`uuid::Uuid`](https://docs.rs/uuid).

#![cfg_attr(docsrs, feature(doc_cfg))]

mod base32;
mod hex;

mod error;
pub use error::Error;

pub mod ulid;
pub use ulid::Ulid;

pub mod entropy;

mod uuid;
pub use uuid::Uuid;

mod variant;
pub use variant::{Domain, Variant};

pub mod generator;

pub mod sql;

mod global_gen;
#[cfg(feature = "global_gen")]
pub use global_gen::{
    default_entropy, disable_rand_pool, enable_rand_pool, set_rand, try_ulid, try_uuid1,
    try_uuid2, try_uuid3, try_uuid4, try_uuid5, try_uuid6, try_uuid7, ulid, uuid1, uuid2, uuid3,
    uuid4, uuid5, uuid6, uuid7, DefaultRng,
};
