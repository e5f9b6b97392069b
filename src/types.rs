use std::time::Duration;

use thiserror::Error;

/// One entry from the mirror directory.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorCandidate {
    pub name: String,
    pub url: String,
    /// Staleness of this mirror relative to the authoritative repository
    /// (repo last update minus mirror last update).
    pub lag: Duration,
}

impl MirrorCandidate {
    pub fn new(name: &str, url: &str, lag: Duration) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            lag,
        }
    }
}

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    BadStatus(reqwest::StatusCode),
}

#[derive(Debug)]
pub struct ProbeSuccess {
    pub candidate: MirrorCandidate,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub struct ProbeFailure {
    pub candidate: MirrorCandidate,
    pub cause: ProbeError,
}

/// Result of one timed fetch. Failure is an explicit variant so the
/// aggregator can count and log it instead of dropping it on the floor.
#[derive(Debug)]
pub enum ProbeOutcome {
    Completed(ProbeSuccess),
    Failed(ProbeFailure),
}

/// A candidate that survived benchmarking, with its composite score.
/// Lower is better.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub name: String,
    pub url: String,
    pub score: f64,
    /// Measured fetch time behind the latency term of the score.
    pub elapsed: Duration,
}
