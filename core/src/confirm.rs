//! # Double-Probe Confirmation
//!
//! A single timing sample is too noisy to call a name local: WAN lookups can land
//! inside the window, and jitter can push a real local name past it. A candidate is
//! therefore sampled twice and only confirmed when the second sample is both faster
//! than the first and under an absolute threshold.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// One timing measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    /// Settled on its own after this long.
    Settled(Duration),
    /// Did not settle within its bound.
    TimedOut,
    /// Failed for a reason that says nothing about resolution.
    Failed,
}

/// Why a candidate was not confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    FirstTimedOut,
    SecondTooSlow { first: Duration },
    ProbeFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoubleProbe {
    AwaitingFirst,
    AwaitingSecond { first: Duration },
    Confirmed { ping: Duration },
    Rejected(Rejection),
}

impl DoubleProbe {
    pub fn new() -> Self {
        Self::AwaitingFirst
    }

    /// The bound the next sample should be taken with, or `None` once decided.
    ///
    /// The second sample cannot be accepted at or above `min(first, threshold)`, so
    /// there is no point waiting any longer for it.
    pub fn next_bound(&self, probe_timeout: Duration, threshold: Duration) -> Option<Duration> {
        match self {
            Self::AwaitingFirst => Some(probe_timeout),
            Self::AwaitingSecond { first } => Some((*first).min(threshold)),
            Self::Confirmed { .. } | Self::Rejected(_) => None,
        }
    }

    pub fn record(&mut self, sample: Sample, threshold: Duration) {
        *self = match (*self, sample) {
            (decided @ (Self::Confirmed { .. } | Self::Rejected(_)), _) => decided,
            (Self::AwaitingFirst, Sample::Settled(first)) => Self::AwaitingSecond { first },
            (Self::AwaitingFirst, Sample::TimedOut) => Self::Rejected(Rejection::FirstTimedOut),
            (Self::AwaitingSecond { first }, Sample::Settled(second))
                if second < first && second < threshold =>
            {
                Self::Confirmed { ping: second }
            }
            (Self::AwaitingSecond { first }, Sample::Settled(_) | Sample::TimedOut) => {
                Self::Rejected(Rejection::SecondTooSlow { first })
            }
            (_, Sample::Failed) => Self::Rejected(Rejection::ProbeFailed),
        };
    }

    pub fn ping(&self) -> Option<Duration> {
        match self {
            Self::Confirmed { ping } => Some(*ping),
            _ => None,
        }
    }
}

impl Default for DoubleProbe {
    fn default() -> Self {
        Self::new()
    }
}

/// Times `probe` against `bound`.
///
/// `probe` yields `true` when it settled and `false` when it failed. It is dropped,
/// and with it the underlying operation, as soon as the bound elapses. A sample that
/// lands exactly on the bound counts as timed out.
pub async fn timed<F>(bound: Duration, probe: F) -> Sample
where
    F: Future<Output = bool>,
{
    let start = Instant::now();
    match tokio::time::timeout(bound, probe).await {
        Ok(true) => {
            let elapsed = start.elapsed();
            if elapsed >= bound {
                Sample::TimedOut
            } else {
                Sample::Settled(elapsed)
            }
        }
        Ok(false) => Sample::Failed,
        Err(_elapsed) => Sample::TimedOut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(1_000);
    const THRESHOLD: Duration = Duration::from_millis(100);

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn run(samples: &[Sample]) -> DoubleProbe {
        let mut probe = DoubleProbe::new();
        for sample in samples {
            if probe.next_bound(TIMEOUT, THRESHOLD).is_none() {
                break;
            }
            probe.record(*sample, THRESHOLD);
        }
        probe
    }

    #[test]
    fn faster_second_sample_under_threshold_confirms() {
        let probe = run(&[Sample::Settled(ms(300)), Sample::Settled(ms(40))]);
        assert_eq!(probe.ping(), Some(ms(40)));
    }

    #[test]
    fn slower_second_sample_rejects() {
        let probe = run(&[Sample::Settled(ms(50)), Sample::Settled(ms(80))]);
        assert_eq!(probe, DoubleProbe::Rejected(Rejection::SecondTooSlow { first: ms(50) }));
    }

    #[test]
    fn first_timeout_never_takes_a_second_sample() {
        let probe = run(&[Sample::TimedOut, Sample::Settled(ms(10))]);
        assert_eq!(probe, DoubleProbe::Rejected(Rejection::FirstTimedOut));
        assert_eq!(probe.next_bound(TIMEOUT, THRESHOLD), None);
    }

    #[test]
    fn second_sample_bound_is_the_tighter_limit() {
        let probe = run(&[Sample::Settled(ms(60))]);
        assert_eq!(probe.next_bound(TIMEOUT, THRESHOLD), Some(ms(60)));

        let probe = run(&[Sample::Settled(ms(600))]);
        assert_eq!(probe.next_bound(TIMEOUT, THRESHOLD), Some(THRESHOLD));
    }

    #[test]
    fn failure_rejects_at_any_stage() {
        assert_eq!(run(&[Sample::Failed]), DoubleProbe::Rejected(Rejection::ProbeFailed));
        assert_eq!(
            run(&[Sample::Settled(ms(300)), Sample::Failed]),
            DoubleProbe::Rejected(Rejection::ProbeFailed)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn sample_on_the_bound_times_out() {
        let sample = timed(ms(100), async {
            tokio::time::sleep(ms(100)).await;
            true
        })
        .await;
        assert_eq!(sample, Sample::TimedOut);

        let sample = timed(ms(100), async {
            tokio::time::sleep(ms(30)).await;
            true
        })
        .await;
        assert_eq!(sample, Sample::Settled(ms(30)));
    }
}
