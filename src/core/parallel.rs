//! Purpose: Fan record generation out across worker threads and merge the results.
//! Exports: `ChunkPlan`, `generate_parallel`.
//! Role: Thread-per-chunk builder; each worker owns a private dictionary until the join barrier.
//! Invariants: Workers are clamped to the total; no worker ever receives an empty chunk.
//! Invariants: Merge runs on the calling thread in worker order with last-write-wins.
//! Invariants: A worker panic or spawn failure fails the whole call; nothing partial is returned.

use std::ops::Range;
use std::thread;

use crate::core::config::RemainderPolicy;
use crate::core::dictionary::{Dictionary, RecordGenerator};
use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChunkPlan {
    chunks: Vec<Range<u64>>,
}

impl ChunkPlan {
    pub fn new(total: u64, workers: usize, policy: RemainderPolicy) -> Self {
        let workers = (workers as u64).min(total);
        if workers == 0 {
            return Self { chunks: Vec::new() };
        }
        let base = total / workers;
        let remainder = match policy {
            RemainderPolicy::Truncate => 0,
            RemainderPolicy::Distribute => total % workers,
        };

        let mut chunks = Vec::with_capacity(workers as usize);
        let mut start = 0;
        for worker in 0..workers {
            let len = base + u64::from(worker < remainder);
            chunks.push(start..start + len);
            start += len;
        }
        Self { chunks }
    }

    pub fn chunks(&self) -> &[Range<u64>] {
        &self.chunks
    }

    pub fn workers(&self) -> usize {
        self.chunks.len()
    }

    pub fn planned_total(&self) -> u64 {
        self.chunks.last().map(|chunk| chunk.end).unwrap_or(0)
    }
}

pub fn generate_parallel(generator: &RecordGenerator, plan: &ChunkPlan) -> Result<Dictionary, Error> {
    let kind = generator.kind();
    tracing::debug!(
        %kind,
        workers = plan.workers(),
        records = plan.planned_total(),
        "starting parallel generation"
    );

    run_chunks(plan, &kind.to_string(), |range, worker| {
        let mut dict = Dictionary::with_capacity((range.end - range.start) as usize);
        generator.fill(range, worker, &mut dict);
        tracing::debug!(%kind, worker, entries = dict.len(), "worker finished");
        dict
    })
}

/// Runs `work` once per chunk on its own scoped thread, joins every worker,
/// then merges the results in worker order.
fn run_chunks<F>(plan: &ChunkPlan, label: &str, work: F) -> Result<Dictionary, Error>
where
    F: Fn(Range<u64>, usize) -> Dictionary + Sync,
{
    let work = &work;
    let joined: Vec<Result<Dictionary, Error>> = thread::scope(|scope| {
        let spawned: Vec<_> = plan
            .chunks()
            .iter()
            .cloned()
            .enumerate()
            .map(|(worker, range)| {
                thread::Builder::new()
                    .name(format!("kvpgen-{label}-{worker}"))
                    .spawn_scoped(scope, move || work(range, worker))
            })
            .collect();

        spawned
            .into_iter()
            .enumerate()
            .map(|(worker, handle)| {
                let handle = handle.map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message(format!("failed to spawn {label} worker {worker}"))
                        .with_source(err)
                })?;
                handle.join().map_err(|_| {
                    Error::new(ErrorKind::Internal)
                        .with_message(format!("{label} worker {worker} panicked"))
                })
            })
            .collect()
    });

    let mut merged = Dictionary::with_capacity(plan.planned_total() as usize);
    for part in joined {
        merged.extend(part?);
    }
    Ok(merged)
}
