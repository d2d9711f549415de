//! Purpose: Derive independent, reproducible random streams from one run seed.
//! Exports: `StreamKind`, `stream_rng`, `RecordStreams`, `os_seed`.
//! Role: Makes generation output a function of (seed, stream kind, record index) only.
//! Invariants: Distinct (seed, kind) pairs key distinct ChaCha instances.
//! Invariants: A record's stream does not depend on which worker produced it.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StreamKind {
    ValidRecords,
    InvalidRecords,
    Shuffle,
    Serialize,
}

impl StreamKind {
    fn tag(self) -> u64 {
        match self {
            StreamKind::ValidRecords => 1,
            StreamKind::InvalidRecords => 2,
            StreamKind::Shuffle => 3,
            StreamKind::Serialize => 4,
        }
    }
}

pub fn stream_rng(seed: u64, kind: StreamKind) -> ChaCha8Rng {
    let mut key = [0u8; 32];
    key[0..8].copy_from_slice(&seed.to_le_bytes());
    key[8..16].copy_from_slice(&kind.tag().to_le_bytes());
    ChaCha8Rng::from_seed(key)
}

/// Per-record streams: record `i` reads ChaCha stream `i` under the kind's key.
#[derive(Clone, Debug)]
pub struct RecordStreams {
    base: ChaCha8Rng,
}

impl RecordStreams {
    pub fn new(seed: u64, kind: StreamKind) -> Self {
        Self {
            base: stream_rng(seed, kind),
        }
    }

    pub fn record(&self, index: u64) -> ChaCha8Rng {
        let mut rng = self.base.clone();
        rng.set_stream(index);
        rng
    }
}

pub fn os_seed() -> Result<u64, Error> {
    let mut bytes = [0u8; 8];
    getrandom::fill(&mut bytes).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message(format!("failed to draw a seed from the OS: {err}"))
    })?;
    Ok(u64::from_le_bytes(bytes))
}
