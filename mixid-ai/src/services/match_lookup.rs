//! Match Lookup
//!
//! Searches a peer-to-peer file-sharing index (slskd's JSON-RPC endpoint) for
//! files matching an extracted track name.
//!
//! Transport and response errors are not raised. The adapter returns a
//! single synthetic candidate whose owner is
//! [`MatchCandidate::ERROR_OWNER`] and whose path carries the message, so the
//! caller can print it in place of results.

use crate::error::{Error, Result};
use crate::models::{ExtractedTrack, MatchCandidate};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// File-search backend
#[async_trait]
pub trait MatchLookup: Send + Sync {
    /// Search for `query`; an empty list means "no results"
    async fn search(&self, query: &str) -> Vec<MatchCandidate>;
}

#[derive(Debug, thiserror::Error)]
enum LookupError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Search service returned {0}")]
    Status(reqwest::StatusCode),

    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: SearchParams<'a>,
    id: u64,
}

#[derive(Debug, Serialize)]
struct SearchParams<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// slskd JSON-RPC search client
pub struct SlskdClient {
    http_client: Client,
    endpoint: String,
}

impl SlskdClient {
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> std::result::Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn try_search(
        &self,
        query: &str,
    ) -> std::result::Result<Vec<MatchCandidate>, LookupError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method: "search",
            params: SearchParams { query },
            id: 1,
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status));
        }

        let body: RpcResponse = response.json().await?;
        if let Some(error) = body.error {
            return Err(LookupError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        Ok(parse_candidates(body.result))
    }
}

#[async_trait]
impl MatchLookup for SlskdClient {
    async fn search(&self, query: &str) -> Vec<MatchCandidate> {
        debug!(query, endpoint = %self.endpoint, "Searching for files");

        match self.try_search(query).await {
            Ok(candidates) => {
                debug!(query, results = candidates.len(), "Search complete");
                candidates
            }
            Err(e) => {
                warn!(query, error = %e, "Search failed");
                vec![MatchCandidate::transport_error(e.to_string())]
            }
        }
    }
}

/// Search for every track's display name, in tracklist order
///
/// Searches run one at a time. Cancelling abandons the in-flight search and
/// returns `Error::Cancelled`.
pub async fn search_tracks(
    lookup: &dyn MatchLookup,
    tracks: &[ExtractedTrack],
    cancel: &CancellationToken,
) -> Result<Vec<(String, Vec<MatchCandidate>)>> {
    let mut results = Vec::with_capacity(tracks.len());

    for track in tracks {
        let query = track.display_name();
        info!(query, "Searching for files");

        let candidates = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(completed = results.len(), "Search cancelled");
                return Err(Error::Cancelled);
            }
            candidates = lookup.search(query) => candidates,
        };

        results.push((query.to_string(), candidates));
    }

    Ok(results)
}

/// Candidates from a `result` array; malformed entries are skipped
fn parse_candidates(result: Option<Value>) -> Vec<MatchCandidate> {
    match result {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method: "search",
            params: SearchParams { query: "Windowlicker" },
            id: 1,
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"jsonrpc": "2.0", "method": "search", "params": {"query": "Windowlicker"}, "id": 1})
        );
    }

    #[test]
    fn test_parse_candidates_skips_malformed() {
        let candidates = parse_candidates(Some(json!([
            {"username": "a", "path": "x.mp3", "filesize": 10},
            {"nope": true},
            {"username": "b", "path": "y.flac"}
        ])));

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].file_size_bytes, None);
    }

    struct Recorded;

    #[async_trait]
    impl MatchLookup for Recorded {
        async fn search(&self, query: &str) -> Vec<MatchCandidate> {
            vec![MatchCandidate {
                owner_handle: "peer".to_string(),
                file_path: format!("{}.flac", query),
                file_size_bytes: Some(1),
            }]
        }
    }

    struct Stalled;

    #[async_trait]
    impl MatchLookup for Stalled {
        async fn search(&self, _query: &str) -> Vec<MatchCandidate> {
            std::future::pending().await
        }
    }

    fn track(name: &str) -> ExtractedTrack {
        ExtractedTrack {
            track_name: name.to_string(),
            artist: "A".to_string(),
            album: "B".to_string(),
            genre: "C".to_string(),
            release_year: "D".to_string(),
            timestamp: "0:00".to_string(),
        }
    }

    #[tokio::test]
    async fn test_search_tracks_in_order() {
        let results = search_tracks(
            &Recorded,
            &[track("One"), track("Two")],
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "One");
        assert_eq!(results[1].1[0].file_path, "Two.flac");
    }

    #[tokio::test]
    async fn test_search_tracks_cancelled_mid_search() {
        let cancel = CancellationToken::new();
        tokio::spawn({
            let cancel = cancel.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                cancel.cancel();
            }
        });

        let result = tokio::time::timeout(
            Duration::from_secs(2),
            search_tracks(&Stalled, &[track("One"), track("Two")], &cancel),
        )
        .await
        .expect("search ignored cancellation");

        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_missing_result_is_empty() {
        assert!(parse_candidates(None).is_empty());
        assert!(parse_candidates(Some(json!({"files": []}))).is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_service_yields_error_candidate() {
        let client = SlskdClient::new("http://127.0.0.1:1/jsonrpc", Duration::from_secs(2)).unwrap();
        let results = client.search("anything").await;

        assert_eq!(results.len(), 1);
        assert!(results[0].is_error());
        assert!(!results[0].file_path.is_empty());
    }
}
