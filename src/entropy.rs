//! Entropy sources for ULID generation.
//!
//! [`Ulid::generate`](crate::Ulid::generate) accepts any [`Entropy`] implementation:
//!
//! - [`Adapter`] fills the entropy field with fresh random bytes each time;
//! - [`Monotonic`] keeps ULIDs created within the same millisecond strictly increasing;
//! - [`Locked`] serializes access to either of them so that one instance can be shared across
//!   threads.

use std::sync::{Mutex, PoisonError};

use rand::RngCore;

use crate::Error;

/// The largest value of the 80-bit entropy field.
const MAX_ENTROPY: u128 = (1 << 80) - 1;

/// The increment bound that [`Monotonic::new`] selects when given zero.
pub const DEFAULT_MAX_INCREMENT: u64 = 1 << 32;

/// A trait for the sources that fill the 80-bit entropy field of a ULID.
pub trait Entropy {
    /// Fills `dest` with the entropy for a ULID with the timestamp `unix_ts_ms`.
    fn fill_entropy(&mut self, unix_ts_ms: u64, dest: &mut [u8; 10]) -> Result<(), Error>;
}

/// An adapter that implements [`Entropy`] for [`RngCore`] types by copying random bytes as they
/// are, regardless of the timestamp.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Adapter<T>(/** The wrapped [`RngCore`] type. */ pub T);

impl<T: RngCore> Entropy for Adapter<T> {
    fn fill_entropy(&mut self, _: u64, dest: &mut [u8; 10]) -> Result<(), Error> {
        Ok(self.0.try_fill_bytes(dest)?)
    }
}

/// An entropy source that yields strictly increasing entropy within the same millisecond.
///
/// The first read for a timestamp takes fresh random bytes. Every subsequent read with the same
/// timestamp adds a random increment between one and the configured bound (inclusive) to the
/// previous entropy, so the resulting ULIDs sort in the order they were created while remaining
/// hard to guess. Smaller bounds allow more ULIDs per millisecond at the cost of
/// predictability.
///
/// This type is not safe for concurrent use; wrap it in [`Locked`] to share it.
///
/// # Examples
///
/// ```rust
/// use twinid::{entropy::Monotonic, Ulid};
///
/// let mut entropy = Monotonic::new(rand::thread_rng(), 0);
/// let mut prev = Ulid::generate(1_469_922_850_259, Some(&mut entropy))?;
/// for _ in 0..1_000 {
///     let curr = Ulid::generate(1_469_922_850_259, Some(&mut entropy))?;
///     assert!(prev < curr);
///     prev = curr;
/// }
/// # Ok::<(), twinid::Error>(())
/// ```
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Monotonic<R> {
    /// The timestamp and entropy of the preceding read.
    last: Option<(u64, u128)>,
    max_inc: u64,

    /// The random number generator used by the source.
    rng: R,
}

impl<R: Default> Default for Monotonic<R> {
    fn default() -> Self {
        Self::new(R::default(), 0)
    }
}

impl<R> Monotonic<R> {
    /// Creates an entropy source that increments entropy by at most `max_inc` within the same
    /// millisecond.
    ///
    /// Passing zero selects [`DEFAULT_MAX_INCREMENT`].
    pub const fn new(rng: R, max_inc: u64) -> Self {
        Self {
            last: None,
            max_inc: if max_inc == 0 {
                DEFAULT_MAX_INCREMENT
            } else {
                max_inc
            },
            rng,
        }
    }

    /// Returns the upper bound of the increment applied within the same millisecond.
    pub const fn max_increment(&self) -> u64 {
        self.max_inc
    }
}

impl<R: RngCore> Monotonic<R> {
    /// Writes monotonically increasing entropy into `dest` for all calls with the same
    /// `unix_ts_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MonotonicOverflow`] if the increment would exceed the 80-bit field, in
    /// which case the source state and `dest` are left untouched, and [`Error::Rand`] if the
    /// random number generator fails.
    pub fn monotonic_read(&mut self, unix_ts_ms: u64, dest: &mut [u8; 10]) -> Result<(), Error> {
        let entropy = match self.last {
            Some((timestamp, entropy)) if timestamp == unix_ts_ms => {
                let next = entropy + self.random_increment()? as u128;
                if next > MAX_ENTROPY {
                    return Err(Error::MonotonicOverflow);
                }
                next
            }
            _ => {
                let mut buffer = [0u8; 16];
                self.rng.try_fill_bytes(&mut buffer[6..])?;
                u128::from_be_bytes(buffer)
            }
        };

        self.last = Some((unix_ts_ms, entropy));
        dest.copy_from_slice(&entropy.to_be_bytes()[6..]);
        Ok(())
    }

    /// Returns a uniform random value between one and `max_inc`, inclusive.
    fn random_increment(&mut self) -> Result<u64, Error> {
        if self.max_inc <= 1 {
            return Ok(1);
        }

        // draw from [0, max_inc) using as few bytes as possible
        let n_bits = u64::BITS - (self.max_inc - 1).leading_zeros();
        let n_bytes = ((n_bits + 7) / 8) as usize;
        let top_mask = 0xffu8 >> ((8 - n_bits % 8) % 8);

        let mut buffer = [0u8; 8];
        loop {
            let bytes = &mut buffer[8 - n_bytes..];
            self.rng.try_fill_bytes(bytes)?;
            // masking keeps the acceptance rate above one half
            bytes[0] &= top_mask;
            let draw = u64::from_be_bytes(buffer);
            if draw < self.max_inc {
                return Ok(1 + draw);
            }
        }
    }
}

impl<R: RngCore> Entropy for Monotonic<R> {
    fn fill_entropy(&mut self, unix_ts_ms: u64, dest: &mut [u8; 10]) -> Result<(), Error> {
        self.monotonic_read(unix_ts_ms, dest)
    }
}

/// A decorator that guards an [`Entropy`] source with a mutex.
///
/// `&Locked<E>` implements [`Entropy`], so one instance can be handed to any number of threads.
///
/// # Examples
///
/// ```rust
/// use std::thread;
/// use twinid::{entropy::{Locked, Monotonic}, Ulid};
///
/// let entropy = Locked::new(Monotonic::new(rand::rngs::OsRng, 0));
/// thread::scope(|s| {
///     for _ in 0..4 {
///         s.spawn(|| {
///             let mut handle = &entropy;
///             Ulid::generate(1_469_922_850_259, Some(&mut handle))
///         });
///     }
/// });
/// ```
#[derive(Debug, Default)]
pub struct Locked<E>(Mutex<E>);

impl<E> Locked<E> {
    /// Wraps an entropy source.
    pub const fn new(inner: E) -> Self {
        Self(Mutex::new(inner))
    }

    /// Returns the wrapped entropy source.
    pub fn into_inner(self) -> E {
        self.0.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: Entropy> Entropy for &Locked<E> {
    fn fill_entropy(&mut self, unix_ts_ms: u64, dest: &mut [u8; 10]) -> Result<(), Error> {
        // sources only commit state after a successful read
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fill_entropy(unix_ts_ms, dest)
    }
}

impl<E: Entropy> Entropy for Locked<E> {
    fn fill_entropy(&mut self, unix_ts_ms: u64, dest: &mut [u8; 10]) -> Result<(), Error> {
        self.0
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .fill_entropy(unix_ts_ms, dest)
    }
}
