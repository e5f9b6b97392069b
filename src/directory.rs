use crate::error::{RankError, Result};
use crate::types::MirrorCandidate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct StatusPayload {
    mirrors: Vec<WireMirror>,
    repo_info: RepoInfo,
}

#[derive(Debug, Deserialize)]
struct WireMirror {
    name: String,
    url: String,
    /// Unix timestamp of the mirror's last successful sync.
    lupd: u64,
}

#[derive(Debug, Deserialize)]
struct RepoInfo {
    /// Unix timestamp of the authoritative repository's last update.
    lupd: u64,
}

/// Decode the `/api/mirror-status` payload into candidates. Lag is the
/// repository's last update minus the mirror's, saturating at zero so
/// clock skew never rewards a "mirror from the future".
fn candidates_from_json(body: &str) -> serde_json::Result<Vec<MirrorCandidate>> {
    let payload: StatusPayload = serde_json::from_str(body)?;
    let repo_lupd = payload.repo_info.lupd;

    Ok(payload
        .mirrors
        .into_iter()
        .map(|m| {
            let lag = Duration::from_secs(repo_lupd.saturating_sub(m.lupd));
            MirrorCandidate::new(&m.name, &m.url, lag)
        })
        .collect())
}

/// Client for the mirror directory service.
pub struct DirectoryClient {
    client: Client,
    api_base: String,
}

impl DirectoryClient {
    pub fn new(api_base: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the candidate list. Every failure mode here (transport,
    /// bad status, undecodable body) is `DirectoryUnreachable`: without
    /// a directory there is nothing to benchmark.
    pub async fn fetch_candidates(&self) -> Result<Vec<MirrorCandidate>> {
        let url = format!("{}/api/mirror-status", self.api_base);

        let unreachable = |reason: String| RankError::DirectoryUnreachable {
            url: url.clone(),
            reason,
        };

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| unreachable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(unreachable(format!("HTTP status {}", status)));
        }

        let body = resp.text().await.map_err(|e| unreachable(e.to_string()))?;
        candidates_from_json(&body).map_err(|e| unreachable(format!("bad payload: {}", e)))
    }
}
