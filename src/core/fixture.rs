//! Purpose: Run the whole fixture pipeline: dictionaries, merge, shuffle, both serializations.
//! Exports: `Dictionaries`, `Fixture`, `RunSummary`, `build_dictionaries`, `merge_and_shuffle`,
//!          `generate`, `generate_to_files`, `resolve_seed`.
//! Role: Entry point used by the CLI and tests; owns no global state.
//! Invariants: The expected output is derived from the valid dictionary only.
//! Invariants: Each merged entry is tagged valid or invalid; invalid wins on a shared key.
//! Invariants: Output for a fixed seed and config is byte-identical across runs and worker counts
//!             (given `RemainderPolicy::Distribute`).
//! Invariants: File outputs are staged beside their targets and only renamed into place once
//!             both are fully written; a failed run leaves existing targets untouched.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use serde::Serialize;

use crate::core::canonical::{to_canonical_string, write_canonical};
use crate::core::config::GeneratorConfig;
use crate::core::dictionary::{Dictionary, EntryKind, RecordGenerator};
use crate::core::error::{Error, ErrorKind};
use crate::core::noisy::{Entry, NoisySerializer, NoisyStats};
use crate::core::parallel::{ChunkPlan, generate_parallel};
use crate::core::rng::{StreamKind, os_seed, stream_rng};

#[derive(Clone, Debug, Default)]
pub struct Dictionaries {
    pub valid: Dictionary,
    pub invalid: Dictionary,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct RunSummary {
    pub seed: u64,
    /// Worker threads actually used per dictionary, after clamping to the count.
    pub valid_workers: usize,
    pub invalid_workers: usize,
    pub valid_requested: u64,
    pub invalid_requested: u64,
    pub valid_entries: u64,
    pub invalid_entries: u64,
    pub input: NoisyStats,
    pub expected_bytes: u64,
}

#[derive(Clone, Debug)]
pub struct Fixture {
    pub input: String,
    pub expected: String,
    pub summary: RunSummary,
}

pub fn resolve_seed(config: &GeneratorConfig) -> Result<u64, Error> {
    match config.seed {
        Some(seed) => Ok(seed),
        None => {
            let seed = os_seed()?;
            tracing::info!(seed, "no seed configured; drew one from the OS");
            Ok(seed)
        }
    }
}

fn chunk_plan(config: &GeneratorConfig, kind: EntryKind) -> ChunkPlan {
    let total = match kind {
        EntryKind::Valid => config.valid_count,
        EntryKind::Invalid => config.invalid_count,
    };
    ChunkPlan::new(total, config.workers, config.remainder)
}

pub fn build_dictionaries(config: &GeneratorConfig, seed: u64) -> Result<Dictionaries, Error> {
    let valid = RecordGenerator::new(config, EntryKind::Valid, seed)?;
    let valid = generate_parallel(&valid, &chunk_plan(config, EntryKind::Valid))?;

    let invalid = RecordGenerator::new(config, EntryKind::Invalid, seed)?;
    let invalid = generate_parallel(&invalid, &chunk_plan(config, EntryKind::Invalid))?;

    Ok(Dictionaries { valid, invalid })
}

/// Union of both dictionaries in a seeded random order. Consumes the
/// invalid dictionary; the valid one is only read.
pub fn merge_and_shuffle(valid: &Dictionary, invalid: Dictionary, seed: u64) -> Vec<Entry> {
    let mut entries: Vec<Entry> = Vec::with_capacity(valid.len() + invalid.len());
    entries.extend(
        valid
            .iter()
            .filter(|(key, _)| !invalid.contains_key(key.as_str()))
            .map(|(key, value)| Entry::new(key.clone(), value.clone(), EntryKind::Valid)),
    );
    entries.extend(
        invalid
            .into_iter()
            .map(|(key, value)| Entry::new(key, value, EntryKind::Invalid)),
    );
    entries.shuffle(&mut stream_rng(seed, StreamKind::Shuffle));
    entries
}

fn summary_for(config: &GeneratorConfig, seed: u64, dicts: &Dictionaries) -> RunSummary {
    RunSummary {
        seed,
        valid_workers: chunk_plan(config, EntryKind::Valid).workers(),
        invalid_workers: chunk_plan(config, EntryKind::Invalid).workers(),
        valid_requested: config.valid_count,
        invalid_requested: config.invalid_count,
        valid_entries: dicts.valid.len() as u64,
        invalid_entries: dicts.invalid.len() as u64,
        ..RunSummary::default()
    }
}

/// Generates both fixtures in memory.
pub fn generate(config: &GeneratorConfig) -> Result<Fixture, Error> {
    config.validate()?;
    let seed = resolve_seed(config)?;
    let dicts = build_dictionaries(config, seed)?;
    let mut summary = summary_for(config, seed, &dicts);

    let expected = to_canonical_string(&dicts.valid, config.pretty_expected)?;
    summary.expected_bytes = expected.len() as u64;

    let entries = merge_and_shuffle(&dicts.valid, dicts.invalid, seed);
    let serializer = NoisySerializer::new(config)?;
    let mut input = Vec::new();
    summary.input = serializer
        .write(&mut input, &entries, &mut stream_rng(seed, StreamKind::Serialize))
        .map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to render noisy input")
                .with_source(err)
        })?;
    let input = String::from_utf8(input).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("noisy input is not utf-8")
            .with_source(err)
    })?;

    log_summary(&summary);
    Ok(Fixture {
        input,
        expected,
        summary,
    })
}

/// Generates both fixtures straight into files, replacing them. The
/// expected output is written first so the valid dictionary can be released
/// before the merged entries are built.
pub fn generate_to_files(
    config: &GeneratorConfig,
    input_path: &Path,
    expected_path: &Path,
) -> Result<RunSummary, Error> {
    config.validate()?;
    let expected_stage = StagedFile::new(expected_path)?;
    let input_stage = StagedFile::new(input_path)?;
    let mut expected = CountingWriter::new(expected_stage.create()?);
    let mut input = input_stage.create()?;

    let seed = resolve_seed(config)?;
    let dicts = build_dictionaries(config, seed)?;
    let mut summary = summary_for(config, seed, &dicts);

    write_canonical(&mut expected, &dicts.valid, config.pretty_expected)
        .map_err(|err| err.with_path(expected_path))?;
    expected.flush().map_err(|err| write_error(expected_path, err))?;
    summary.expected_bytes = expected.count;
    drop(expected);

    let entries = merge_and_shuffle(&dicts.valid, dicts.invalid, seed);
    drop(dicts.valid);

    let serializer = NoisySerializer::new(config)?;
    summary.input = serializer
        .write(&mut input, &entries, &mut stream_rng(seed, StreamKind::Serialize))
        .map_err(|err| write_error(input_path, err))?;
    input.flush().map_err(|err| write_error(input_path, err))?;
    drop(input);

    input_stage.commit()?;
    expected_stage.commit()?;

    log_summary(&summary);
    Ok(summary)
}

fn log_summary(summary: &RunSummary) {
    tracing::info!(
        seed = summary.seed,
        valid = summary.valid_entries,
        invalid = summary.invalid_entries,
        records = summary.input.records,
        noise_runs = summary.input.noise_runs,
        "fixture generated"
    );
}

/// Output written to `<name>.partial` beside its target until `commit`.
/// Dropping an uncommitted stage removes the partial file.
struct StagedFile {
    target: PathBuf,
    staging: PathBuf,
}

impl StagedFile {
    fn new(target: &Path) -> Result<Self, Error> {
        let mut name = target
            .file_name()
            .ok_or_else(|| {
                Error::new(ErrorKind::Usage)
                    .with_message("output path has no file name")
                    .with_path(target)
            })?
            .to_os_string();
        name.push(".partial");
        Ok(Self {
            target: target.to_path_buf(),
            staging: target.with_file_name(name),
        })
    }

    fn create(&self) -> Result<BufWriter<File>, Error> {
        let file = File::create(&self.staging).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to create output file")
                .with_path(&self.target)
                .with_source(err)
        })?;
        Ok(BufWriter::new(file))
    }

    fn commit(&self) -> Result<(), Error> {
        fs::rename(&self.staging, &self.target).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to move output file into place")
                .with_path(&self.target)
                .with_source(err)
        })
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        // Already gone after a successful commit.
        let _ = fs::remove_file(&self.staging);
    }
}

fn write_error(path: &Path, err: std::io::Error) -> Error {
    Error::new(ErrorKind::Io)
        .with_message("failed to write output file")
        .with_path(path)
        .with_source(err)
}

struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.count += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
