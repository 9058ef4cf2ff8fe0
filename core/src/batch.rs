//! # Wave Scheduler
//!
//! Probes are driven in waves: the candidate list is cut into contiguous,
//! order-preserving batches of at most `concurrency_limit`, every probe of a batch
//! runs concurrently, and the next batch only starts once the whole batch settled.
//! Unbounded concurrency exhausts connection pools and makes queued probes look
//! slow, which reads as "not resolved".

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use lanprobe_common::{candidate::Candidate, config::StrategyConfig};
use tracing::debug;

/// An ordered slice of the candidate list, owned by the scheduler for one wave.
#[derive(Debug, Clone, Copy)]
pub struct ProbeBatch<'a> {
    /// Position of the first candidate of this batch in the full list.
    pub offset: usize,
    pub candidates: &'a [Candidate],
}

impl<'a> ProbeBatch<'a> {
    /// Pairs each candidate with its position in the full list.
    pub fn indexed(&self) -> impl Iterator<Item = (usize, &'a Candidate)> + 'a {
        let offset = self.offset;
        self.candidates
            .iter()
            .enumerate()
            .map(move |(i, c)| (offset + i, c))
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Splits `candidates` into `ceil(n / size)` disjoint batches.
pub fn partition(candidates: &[Candidate], size: usize) -> impl Iterator<Item = ProbeBatch<'_>> {
    let size = size.max(1);
    candidates
        .chunks(size)
        .enumerate()
        .map(move |(i, chunk)| ProbeBatch {
            offset: i * size,
            candidates: chunk,
        })
}

/// Runs `probe` over every candidate, one wave at a time.
///
/// `probe` receives the candidate's position in the full list. Results come back in
/// input order; `None` entries are dropped.
pub async fn run_waves<'a, T, F, Fut>(
    candidates: &'a [Candidate],
    cfg: &StrategyConfig,
    mut probe: F,
) -> Vec<T>
where
    F: FnMut(usize, &'a Candidate) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let total = candidates.len().div_ceil(cfg.concurrency_limit.max(1));
    let mut found = Vec::new();

    for (wave, batch) in partition(candidates, cfg.concurrency_limit).enumerate() {
        pause_between(wave, cfg.inter_batch_delay).await;
        debug!(wave = wave + 1, of = total, size = batch.len(), "starting probe wave");
        let settled = join_all(batch.indexed().map(|(index, c)| probe(index, c))).await;
        found.extend(settled.into_iter().flatten());
    }

    found
}

/// Sleeps between waves, skipping the pause before the first one.
pub(crate) async fn pause_between(wave: usize, delay: Duration) {
    if wave > 0 && !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
