use crate::probe::{score, Prober};
use crate::types::{MirrorCandidate, ProbeOutcome, ScoredCandidate};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

/// Outcome of one benchmarking run. An empty `ranked` list is valid;
/// it means no probe succeeded before the deadline.
#[derive(Debug)]
pub struct RankReport {
    pub ranked: Vec<ScoredCandidate>,
    pub failed: usize,
    /// Probes that had not reported when the deadline fired.
    pub abandoned: usize,
}

/// Benchmark all candidates concurrently and rank the survivors.
///
/// Fan-out: one task per candidate, no concurrency cap. Fan-in: each
/// task posts its outcome over a channel; the receive loop ends when
/// every candidate has reported or the deadline elapses, whichever is
/// first. Results arriving after that single cutoff event are
/// discarded, and their tasks aborted.
pub async fn rank(
    prober: Arc<dyn Prober>,
    candidates: Vec<MirrorCandidate>,
    deadline: Duration,
) -> RankReport {
    let total = candidates.len();
    let cutoff = Instant::now() + deadline;
    let (tx, mut rx) = mpsc::channel::<(usize, ProbeOutcome)>(total.max(1));

    let handles: Vec<_> = candidates
        .into_iter()
        .enumerate()
        .map(|(idx, candidate)| {
            let prober = Arc::clone(&prober);
            let tx = tx.clone();
            tokio::spawn(async move {
                let outcome = prober.probe(candidate).await;
                // Send fails only once the aggregator has finalized;
                // a late result is discarded, not an error.
                let _ = tx.send((idx, outcome)).await;
            })
        })
        .collect();
    drop(tx);

    let mut successes: Vec<(usize, MirrorCandidate, Duration)> = Vec::new();
    let mut failed = 0usize;
    let mut reported = 0usize;

    while reported < total {
        match time::timeout_at(cutoff, rx.recv()).await {
            Ok(Some((idx, outcome))) => {
                reported += 1;
                match outcome {
                    ProbeOutcome::Completed(s) => {
                        tracing::debug!(
                            mirror = %s.candidate.name,
                            elapsed_ms = s.elapsed.as_millis() as u64,
                            "probe completed"
                        );
                        successes.push((idx, s.candidate, s.elapsed));
                    }
                    ProbeOutcome::Failed(f) => {
                        failed += 1;
                        tracing::warn!(
                            mirror = %f.candidate.name,
                            cause = %f.cause,
                            "probe failed, excluding mirror"
                        );
                    }
                }
            }
            Ok(None) => break,
            Err(_) => {
                tracing::info!(
                    outstanding = total - reported,
                    "deadline elapsed, abandoning outstanding probes"
                );
                break;
            }
        }
    }

    let abandoned = total - reported;
    drop(rx);
    for handle in &handles {
        handle.abort();
    }
    // Reap the tasks so no probe outlives the run.
    let _ = futures::future::join_all(handles).await;

    let mut scored: Vec<(usize, ScoredCandidate)> = successes
        .into_iter()
        .map(|(idx, candidate, elapsed)| {
            let s = score(candidate.lag, elapsed);
            (
                idx,
                ScoredCandidate {
                    name: candidate.name,
                    url: candidate.url,
                    score: s,
                    elapsed,
                },
            )
        })
        .collect();

    // Ascending by score; equal scores fall back to directory order so
    // the output is deterministic regardless of arrival order.
    scored.sort_by(|a, b| a.1.score.total_cmp(&b.1.score).then(a.0.cmp(&b.0)));

    RankReport {
        ranked: scored.into_iter().map(|(_, c)| c).collect(),
        failed,
        abandoned,
    }
}
