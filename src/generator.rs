//! UUID generator and related types.

use std::time;

use rand::{rngs::OsRng, RngCore};

use crate::{Domain, Error, Uuid, Variant};

mod node;
use node::{NodeIdentity, GREGORIAN_OFFSET};

mod pool;
use pool::RandPool;

/// The amount of clock rollback, in milliseconds, that UUIDv7 generation tolerates by reusing the
/// previous timestamp.
const V7_ROLLBACK_ALLOWANCE: u64 = 10_000;

/// A trait that defines the clock interface for [`Generator`].
pub trait TimeSource {
    /// Returns the current time as the duration since the Unix epoch.
    fn now(&mut self) -> Result<time::Duration, Error>;
}

/// The default [`TimeSource`] that reads [`SystemTime::now`](time::SystemTime::now).
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct StdSystemTime;

impl TimeSource for StdSystemTime {
    fn now(&mut self) -> Result<time::Duration, Error> {
        Ok(time::SystemTime::now().duration_since(time::UNIX_EPOCH)?)
    }
}

/// Represents a UUID generator that owns its random number generator, clock, node identity, and
/// counters.
///
/// A generator is not shared implicitly: every method takes `&mut self`, so a generator used from
/// several threads must be wrapped in a [`Mutex`](std::sync::Mutex) or similar. The global
/// functions such as [`uuid4`](crate::uuid4) use one such process-wide instance.
///
/// # Examples
///
/// ```rust
/// use twinid::{generator::Generator, Domain, Variant};
///
/// let mut g = Generator::with_rng(rand::thread_rng());
/// let v1 = g.v1()?;
/// assert_eq!(v1.version(), 1);
/// assert_eq!(v1.variant(), Variant::Rfc4122);
///
/// let v2 = g.v2(Domain::Person, 501)?;
/// assert_eq!(v2.as_bytes()[..4], 501u32.to_be_bytes());
///
/// g.enable_rand_pool();
/// assert_eq!(g.v4()?.version(), 4);
/// # Ok::<(), twinid::Error>(())
/// ```
///
/// # Generator functions
///
/// | Method  | Version | Contents                                              |
/// | ------- | ------- | ----------------------------------------------------- |
/// | [`v1`]  | 1       | Gregorian time, clock sequence, node id               |
/// | [`v2`]  | 2       | Version 1 with local domain and id                    |
/// | [`v3`]  | 3       | MD5 of a fresh version 1 UUID and a name              |
/// | [`v4`]  | 4       | Random bits, optionally served from a pool            |
/// | [`v5`]  | 5       | SHA-1 of a fresh version 1 UUID and a name            |
/// | [`v6`]  | 6       | Version 1 fields reordered most significant first     |
/// | [`v7`]  | 7       | Unix time in milliseconds, counter, random bits       |
///
/// Version 7 UUIDs from one generator are monotonically increasing: the previous timestamp is
/// reused if the clock goes backwards by up to ten seconds, and the generator resets, breaking
/// the increasing order, only when the clock rollback is larger than that.
///
/// [`v1`]: Generator::v1
/// [`v2`]: Generator::v2
/// [`v3`]: Generator::v3
/// [`v4`]: Generator::v4
/// [`v5`]: Generator::v5
/// [`v6`]: Generator::v6
/// [`v7`]: Generator::v7
#[derive(Clone, Debug)]
pub struct Generator<R, T = StdSystemTime> {
    /// The random number generator used by the generator.
    rng: R,

    /// The clock used by the generator.
    time_source: T,

    node: NodeIdentity,
    pool: Option<RandPool>,

    v7_timestamp: u64,
    v7_counter: u64,
}

impl Generator<OsRng> {
    /// Creates a generator that draws random bits from the operating system.
    pub const fn new() -> Self {
        Self::with_rng(OsRng)
    }
}

impl<R: Default, T: Default> Default for Generator<R, T> {
    fn default() -> Self {
        Self::with_rng_and_time_source(R::default(), T::default())
    }
}

impl<R> Generator<R> {
    /// Creates a generator with a random number generator and the system clock.
    pub const fn with_rng(rng: R) -> Self {
        Self::with_rng_and_time_source(rng, StdSystemTime)
    }
}

impl<R, T> Generator<R, T> {
    /// Creates a generator with a random number generator and a clock.
    pub const fn with_rng_and_time_source(rng: R, time_source: T) -> Self {
        Self {
            rng,
            time_source,
            node: NodeIdentity::new(),
            pool: None,
            v7_timestamp: 0,
            v7_counter: 0,
        }
    }

    /// Replaces the random number generator, discarding any pooled bytes drawn from the previous
    /// one.
    pub fn set_rng(&mut self, rng: R) {
        self.rng = rng;
        if self.pool.is_some() {
            self.pool = Some(RandPool::new());
        }
    }

    /// Makes [`Generator::v4`] serve random bits from a 256-byte pool refilled in batches.
    ///
    /// The pool may improve throughput significantly, but it keeps unused random bytes in memory,
    /// which may be a bad fit for security-sensitive applications.
    pub fn enable_rand_pool(&mut self) {
        if self.pool.is_none() {
            self.pool = Some(RandPool::new());
        }
    }

    /// Discards the random pool, if any, so that [`Generator::v4`] reads the random number
    /// generator directly again.
    pub fn disable_rand_pool(&mut self) {
        self.pool = None;
    }

    /// Returns true if [`Generator::v4`] serves random bits from the pool.
    pub const fn is_rand_pool_enabled(&self) -> bool {
        self.pool.is_some()
    }

    /// Sets the node id embedded in version 1, 2, and 6 UUIDs.
    pub fn set_node_id(&mut self, node_id: [u8; 6]) {
        self.node.set_node_id(node_id);
    }

    /// Sets the clock sequence embedded in version 1, 2, and 6 UUIDs to the low 14 bits of `seq`.
    pub fn set_clock_sequence(&mut self, seq: u16) {
        self.node.set_clock_sequence(seq);
    }
}

impl<R: RngCore, T: TimeSource> Generator<R, T> {
    /// Returns the node id, deriving one from the host hardware address (with the `mac_address`
    /// feature) or at random if none has been set.
    pub fn node_id(&mut self) -> Result<[u8; 6], Error> {
        self.node.node_id(&mut self.rng)
    }

    /// Returns the 14-bit clock sequence, drawing a random one if none has been set.
    pub fn clock_sequence(&mut self) -> Result<u16, Error> {
        self.node.clock_sequence(&mut self.rng)
    }

    /// Returns the 60-bit Gregorian timestamp, the clock sequence, and the node id for a
    /// time-based UUID.
    fn gregorian_fields(&mut self) -> Result<(u64, u16, [u8; 6]), Error> {
        let since_unix = self.time_source.now()?;
        let now = since_unix.as_secs() * 10_000_000
            + u64::from(since_unix.subsec_nanos() / 100)
            + GREGORIAN_OFFSET;
        let seq = self.node.tick(now, &mut self.rng)?;
        let node_id = self.node.node_id(&mut self.rng)?;
        Ok((now, seq, node_id))
    }

    /// Generates a version 1 UUID from the Gregorian time, the clock sequence, and the node id.
    pub fn v1(&mut self) -> Result<Uuid, Error> {
        let (now, seq, node_id) = self.gregorian_fields()?;
        let mut bytes = [0u8; 16];
        bytes[..4].copy_from_slice(&(now as u32).to_be_bytes());
        bytes[4..6].copy_from_slice(&((now >> 32) as u16).to_be_bytes());
        bytes[6..8].copy_from_slice(&(((now >> 48) as u16 & 0x0fff) | 0x1000).to_be_bytes());
        bytes[8..10].copy_from_slice(&seq.to_be_bytes());
        bytes[10..].copy_from_slice(&node_id);
        Ok(Uuid::from_bytes(bytes))
    }

    /// Generates a DCE Security (version 2) UUID that carries `domain` and a local `id`, such as a
    /// POSIX UID or GID, in place of the low time and clock sequence bits of version 1.
    pub fn v2(&mut self, domain: Domain, id: u32) -> Result<Uuid, Error> {
        let mut bytes = self.v1()?.to_bytes();
        bytes[..4].copy_from_slice(&id.to_be_bytes());
        bytes[9] = domain.into();
        let mut uuid = Uuid::from_bytes(bytes);
        uuid.set_version(2);
        uuid.set_variant(Variant::Rfc4122);
        Ok(uuid)
    }

    /// Generates a version 3 UUID from the MD5 hash of a freshly generated version 1 UUID and
    /// `name`.
    ///
    /// Use [`Uuid::new_v3`] to hash under a fixed name space instead.
    pub fn v3(&mut self, name: &[u8]) -> Result<Uuid, Error> {
        Ok(Uuid::new_v3(&self.v1()?, name))
    }

    /// Generates a random (version 4) UUID.
    pub fn v4(&mut self) -> Result<Uuid, Error> {
        let bytes = match &mut self.pool {
            Some(pool) => pool.take(&mut self.rng)?,
            None => {
                let mut bytes = [0u8; 16];
                self.rng.try_fill_bytes(&mut bytes)?;
                bytes
            }
        };
        let mut uuid = Uuid::from_bytes(bytes);
        uuid.set_version(4);
        uuid.set_variant(Variant::Rfc4122);
        Ok(uuid)
    }

    /// Generates a version 5 UUID from the SHA-1 hash of a freshly generated version 1 UUID and
    /// `name`.
    ///
    /// Use [`Uuid::new_v5`] to hash under a fixed name space instead.
    pub fn v5(&mut self, name: &[u8]) -> Result<Uuid, Error> {
        Ok(Uuid::new_v5(&self.v1()?, name))
    }

    /// Generates a version 6 UUID, which holds the version 1 timestamp most significant bits first
    /// so that byte order follows creation time.
    pub fn v6(&mut self) -> Result<Uuid, Error> {
        let (now, seq, node_id) = self.gregorian_fields()?;
        let mut bytes = [0u8; 16];
        bytes[..4].copy_from_slice(&((now >> 28) as u32).to_be_bytes());
        bytes[4..6].copy_from_slice(&((now >> 12) as u16).to_be_bytes());
        bytes[6..8].copy_from_slice(&((now as u16 & 0x0fff) | 0x6000).to_be_bytes());
        bytes[8..10].copy_from_slice(&seq.to_be_bytes());
        bytes[10..].copy_from_slice(&node_id);
        Ok(Uuid::from_bytes(bytes))
    }

    /// Generates a version 7 UUID from the current Unix time in milliseconds, a 42-bit counter,
    /// and 32 random bits.
    ///
    /// The counter is randomly initialized whenever the timestamp changes and incremented for
    /// each UUID within the same timestamp. In the very rare case where the counter overflows,
    /// the timestamp is incremented instead.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TimeTooLarge`] if the timestamp no longer fits in 48 bits, in addition to
    /// clock and random number generator failures.
    pub fn v7(&mut self) -> Result<Uuid, Error> {
        let unix_ts_ms = self.time_source.now()?.as_millis() as u64;
        self.v7_core(unix_ts_ms, V7_ROLLBACK_ALLOWANCE)
    }

    fn v7_core(&mut self, unix_ts_ms: u64, rollback_allowance: u64) -> Result<Uuid, Error> {
        const MAX_COUNTER: u64 = (1 << 42) - 1;

        if unix_ts_ms >= 1 << 48 {
            return Err(Error::TimeTooLarge(unix_ts_ms));
        }

        let (timestamp, counter) = if unix_ts_ms > self.v7_timestamp {
            (unix_ts_ms, self.random_u64()? & MAX_COUNTER)
        } else if unix_ts_ms + rollback_allowance >= self.v7_timestamp {
            // go on with previous timestamp if new one is not much smaller
            if self.v7_counter < MAX_COUNTER {
                (self.v7_timestamp, self.v7_counter + 1)
            } else {
                // increment timestamp at counter overflow
                let timestamp = self.v7_timestamp + 1;
                if timestamp >= 1 << 48 {
                    return Err(Error::TimeTooLarge(timestamp));
                }
                (timestamp, self.random_u64()? & MAX_COUNTER)
            }
        } else {
            log::warn!(
                "clock went backwards from {} to {}; resetting UUIDv7 state",
                self.v7_timestamp,
                unix_ts_ms
            );
            (unix_ts_ms, self.random_u64()? & MAX_COUNTER)
        };

        let tail = self.random_u64()? >> 32;
        self.v7_timestamp = timestamp;
        self.v7_counter = counter;

        let rand_b = ((counter & 0x3fff_ffff) << 32) | tail;
        Ok(Uuid::from_fields_v7(timestamp, (counter >> 30) as u16, rand_b))
    }

    fn random_u64(&mut self) -> Result<u64, Error> {
        let mut buffer = [0u8; 8];
        self.rng.try_fill_bytes(&mut buffer)?;
        Ok(u64::from_le_bytes(buffer))
    }
}
