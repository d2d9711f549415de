//! Purpose: Generate valid and invalid key/value records and collect them into dictionaries.
//! Exports: `Dictionary`, `EntryKind`, `RecordGenerator`.
//! Role: Sequential builder run by each worker over its slice of record indices.
//! Invariants: Valid keys are one letter plus 1..=64 alphanumerics by default; values one letter plus 0..=64.
//! Invariants: Invalid keys are punctuation only (no reserved syntax characters); values alphanumeric.
//! Invariants: Record `i` is a pure function of (seed, kind, i).

use std::fmt;
use std::ops::Range;

use indexmap::IndexMap;
use rand::Rng;

use crate::core::charset::{CharClass, push_random};
use crate::core::config::{GeneratorConfig, LengthRange};
use crate::core::error::Error;
use crate::core::rng::{RecordStreams, StreamKind};

/// Insertion-ordered key/value mapping; re-inserting a key replaces its value.
pub type Dictionary = IndexMap<String, String>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntryKind {
    Valid,
    Invalid,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Valid => f.write_str("valid"),
            EntryKind::Invalid => f.write_str("invalid"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RecordGenerator {
    kind: EntryKind,
    key_len: LengthRange,
    value_len: LengthRange,
    alpha: CharClass,
    alnum: CharClass,
    punct: CharClass,
    streams: RecordStreams,
    progress_interval: u64,
}

impl RecordGenerator {
    pub fn new(config: &GeneratorConfig, kind: EntryKind, seed: u64) -> Result<Self, Error> {
        let (key_len, value_len, stream) = match kind {
            EntryKind::Valid => (
                config.valid_key_len,
                config.valid_value_len,
                StreamKind::ValidRecords,
            ),
            EntryKind::Invalid => (
                config.invalid_key_len,
                config.invalid_value_len,
                StreamKind::InvalidRecords,
            ),
        };
        Ok(Self {
            kind,
            key_len,
            value_len,
            alpha: CharClass::alphabetic(),
            alnum: CharClass::alphanumeric(),
            punct: config.syntax.punctuation_class()?,
            streams: RecordStreams::new(seed, stream),
            progress_interval: config.progress_interval,
        })
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn record(&self, index: u64) -> (String, String) {
        let mut rng = self.streams.record(index);
        match self.kind {
            EntryKind::Valid => {
                let key = self.lettered(&mut rng, self.key_len);
                let value = self.lettered(&mut rng, self.value_len);
                (key, value)
            }
            EntryKind::Invalid => {
                let mut key = String::new();
                let key_len = rng.random_range(self.key_len.min..=self.key_len.max);
                push_random(&mut rng, key_len, &self.punct, &mut key);
                let mut value = String::new();
                let value_len = rng.random_range(self.value_len.min..=self.value_len.max);
                push_random(&mut rng, value_len, &self.alnum, &mut value);
                (key, value)
            }
        }
    }

    fn lettered<R: Rng + ?Sized>(&self, rng: &mut R, tail: LengthRange) -> String {
        let tail_len = rng.random_range(tail.min..=tail.max);
        let mut out = String::with_capacity(tail_len + 1);
        push_random(rng, 1, &self.alpha, &mut out);
        push_random(rng, tail_len, &self.alnum, &mut out);
        out
    }

    /// Generates records `indices` into `dict`, emitting a progress event
    /// every `progress_interval` records.
    pub fn fill(&self, indices: Range<u64>, worker: usize, dict: &mut Dictionary) {
        let chunk_len = indices.end.saturating_sub(indices.start);
        for (done, index) in indices.enumerate() {
            let (key, value) = self.record(index);
            dict.insert(key, value);
            let done = done as u64 + 1;
            if self.progress_interval != 0 && done % self.progress_interval == 0 {
                tracing::debug!(
                    kind = %self.kind,
                    worker,
                    generated = done,
                    chunk = chunk_len,
                    "generation progress"
                );
            }
        }
    }

    pub fn build(&self, count: u64) -> Dictionary {
        let mut dict = Dictionary::with_capacity(count as usize);
        self.fill(0..count, 0, &mut dict);
        dict
    }
}
