use std::fmt;

use rand::RngCore;

use crate::Error;

/// Number of bytes fetched from the random number generator at once.
pub(crate) const POOL_SIZE: usize = 16 * 16;

/// A buffer of random bytes that serves version 4 UUIDs in 16-byte chunks.
#[derive(Clone)]
pub(crate) struct RandPool {
    buffer: [u8; POOL_SIZE],
    pos: usize,
}

impl RandPool {
    /// Creates an empty pool that fills itself on the first take.
    pub(crate) const fn new() -> Self {
        Self {
            buffer: [0; POOL_SIZE],
            pos: POOL_SIZE,
        }
    }

    /// Returns the next 16 bytes, refilling the whole pool from `rng` when exhausted.
    pub(crate) fn take(&mut self, rng: &mut impl RngCore) -> Result<[u8; 16], Error> {
        if self.pos == POOL_SIZE {
            rng.try_fill_bytes(&mut self.buffer)?;
            self.pos = 0;
        }

        let mut dst = [0u8; 16];
        dst.copy_from_slice(&self.buffer[self.pos..self.pos + 16]);
        self.pos += 16;
        Ok(dst)
    }
}

impl fmt::Debug for RandPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandPool")
            .field("pos", &self.pos)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{RandPool, POOL_SIZE};
    use rand::RngCore;

    /// Counts bytes requested and returns a running sequence.
    #[derive(Default)]
    struct CountingRng {
        calls: usize,
        next: u8,
    }

    impl RngCore for CountingRng {
        fn next_u32(&mut self) -> u32 {
            unreachable!()
        }

        fn next_u64(&mut self) -> u64 {
            unreachable!()
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            self.calls += 1;
            for e in dest {
                *e = self.next;
                self.next = self.next.wrapping_add(1);
            }
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    /// Refills once every sixteen takes
    #[test]
    fn refills_once_every_sixteen_takes() {
        let mut rng = CountingRng::default();
        let mut pool = RandPool::new();
        for i in 0..(POOL_SIZE / 16) * 3 {
            let chunk = pool.take(&mut rng).unwrap();
            assert_eq!(chunk[0], ((i * 16) % 256) as u8);
            assert_eq!(rng.calls, i / 16 + 1);
        }
    }

    /// Hides buffer contents from debug output
    #[test]
    fn hides_buffer_contents_from_debug_output() {
        let mut pool = RandPool::new();
        pool.take(&mut CountingRng::default()).unwrap();
        assert_eq!(format!("{:?}", pool), "RandPool { pos: 16, .. }");
    }
}
