use crate::types::{MirrorCandidate, ProbeError, ProbeFailure, ProbeOutcome, ProbeSuccess};
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};

/// Reference object fetched from every mirror. Any static object works
/// as long as every mirror carries the same bytes, otherwise the
/// latency numbers are not comparable.
pub const REFERENCE_PATH: &str = "misc/u-boot-sunxi-with-spl.bin";

// Weights calibrated against lag in hours and elapsed time in raw
// milliseconds. Do not rescale the units without re-deriving these.
const WEIGHT_STALENESS: f64 = 0.39;
const WEIGHT_LATENCY: f64 = 0.61;

/// Composite freshness/latency score. Pure; lower is better.
pub fn score(lag: Duration, elapsed: Duration) -> f64 {
    (lag.as_secs_f64() / 3600.0) * WEIGHT_STALENESS + elapsed.as_millis() as f64 * WEIGHT_LATENCY
}

/// Prober: one timed fetch against one candidate. Trait so the
/// aggregator can be exercised without touching the network.
#[async_trait]
pub trait Prober: Sync + Send {
    async fn probe(&self, candidate: MirrorCandidate) -> ProbeOutcome;
}

pub struct HttpProber {
    client: Client,
    reference_path: String,
}

impl HttpProber {
    pub fn new(timeout: Duration, reference_path: &str) -> Self {
        // Client-level timeout keeps one dead mirror from holding its
        // probe task open past the aggregation deadline anyway.
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            reference_path: reference_path.to_string(),
        }
    }

    fn reference_url(&self, base: &str) -> String {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            self.reference_path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, candidate: MirrorCandidate) -> ProbeOutcome {
        let url = self.reference_url(&candidate.url);
        let start = Instant::now();

        // Full GET, not HEAD: elapsed covers fetch initiation through
        // the last body byte, which is what the score weights expect.
        let resp = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                return ProbeOutcome::Failed(ProbeFailure {
                    candidate,
                    cause: ProbeError::Transport(e),
                })
            }
        };

        let status = resp.status();
        if !status.is_success() {
            return ProbeOutcome::Failed(ProbeFailure {
                candidate,
                cause: ProbeError::BadStatus(status),
            });
        }

        match resp.bytes().await {
            Ok(_) => {
                let elapsed = start.elapsed();
                ProbeOutcome::Completed(ProbeSuccess { candidate, elapsed })
            }
            Err(e) => ProbeOutcome::Failed(ProbeFailure {
                candidate,
                cause: ProbeError::Transport(e),
            }),
        }
    }
}
