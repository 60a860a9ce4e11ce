//! Node id and clock sequence of time-based UUIDs.

use rand::RngCore;

use crate::Error;

/// Offset between 1582-10-15 and 1970-01-01 in 100-nanosecond intervals.
pub(crate) const GREGORIAN_OFFSET: u64 = 122_192_928_000_000_000;

/// The node id, the clock sequence, and the last timestamp of version 1, 2, and 6 UUIDs.
///
/// Each part is derived on first use.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub(crate) struct NodeIdentity {
    node_id: Option<[u8; 6]>,

    /// 14-bit clock sequence with the RFC 4122 variant bits on top.
    clock_seq: Option<u16>,

    /// 60-bit count of 100-nanosecond intervals since the Gregorian epoch.
    last_time: u64,
}

impl NodeIdentity {
    pub(crate) const fn new() -> Self {
        Self {
            node_id: None,
            clock_seq: None,
            last_time: 0,
        }
    }

    /// Returns the node id, deriving one if none has been set.
    pub(crate) fn node_id(&mut self, rng: &mut impl RngCore) -> Result<[u8; 6], Error> {
        match self.node_id {
            Some(node_id) => Ok(node_id),
            None => {
                let node_id = detect_node_id(rng)?;
                self.node_id = Some(node_id);
                Ok(node_id)
            }
        }
    }

    pub(crate) fn set_node_id(&mut self, node_id: [u8; 6]) {
        self.node_id = Some(node_id);
    }

    /// Returns the 14-bit clock sequence, drawing a random one if none has been set.
    pub(crate) fn clock_sequence(&mut self, rng: &mut impl RngCore) -> Result<u16, Error> {
        Ok(self.stamped_clock_seq(rng)? & 0x3fff)
    }

    /// Overwrites the clock sequence with the low 14 bits of `seq`.
    ///
    /// Changing the value forgets the last timestamp so that the next call to
    /// [`NodeIdentity::tick`] does not bump it again.
    pub(crate) fn set_clock_sequence(&mut self, seq: u16) {
        let seq = (seq & 0x3fff) | 0x8000;
        if self.clock_seq != Some(seq) {
            self.last_time = 0;
        }
        self.clock_seq = Some(seq);
    }

    /// Records `now` and returns the clock sequence to stamp it with, bumping the sequence if the
    /// clock has not advanced since the preceding call.
    pub(crate) fn tick(&mut self, now: u64, rng: &mut impl RngCore) -> Result<u16, Error> {
        let mut seq = self.stamped_clock_seq(rng)?;
        if now <= self.last_time {
            seq = ((seq + 1) & 0x3fff) | 0x8000;
            log::trace!(
                "clock did not advance past {}; clock sequence bumped to {}",
                self.last_time,
                seq & 0x3fff
            );
            self.clock_seq = Some(seq);
        }
        self.last_time = now;
        Ok(seq)
    }

    fn stamped_clock_seq(&mut self, rng: &mut impl RngCore) -> Result<u16, Error> {
        match self.clock_seq {
            Some(seq) => Ok(seq),
            None => {
                let mut buffer = [0u8; 2];
                rng.try_fill_bytes(&mut buffer)?;
                let seq = (u16::from_be_bytes(buffer) & 0x3fff) | 0x8000;
                self.clock_seq = Some(seq);
                Ok(seq)
            }
        }
    }
}

/// Reads the hardware address of the host, falling back to a random node id.
fn detect_node_id(rng: &mut impl RngCore) -> Result<[u8; 6], Error> {
    #[cfg(feature = "mac_address")]
    match mac_address::get_mac_address() {
        Ok(Some(addr)) => {
            log::debug!("using hardware address {} as node id", addr);
            return Ok(addr.bytes());
        }
        Ok(None) => log::warn!("no hardware address found; using random node id"),
        Err(err) => log::warn!("could not read hardware address ({}); using random node id", err),
    }

    let mut node_id = [0u8; 6];
    rng.try_fill_bytes(&mut node_id)?;
    // multicast bit marks an id that is not a hardware address
    node_id[0] |= 0x01;
    log::debug!("generated random node id");
    Ok(node_id)
}
