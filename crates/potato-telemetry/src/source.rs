// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Snapshot sources: the seam between the poller and the transport.

use crate::error::{FetchError, PollError};
use crate::snapshot::Snapshot;
use std::future::Future;
use std::time::Duration;

/// Default telemetry server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8050";
/// Path of the snapshot endpoint, relative to the base URL.
pub const SNAPSHOT_PATH: &str = "/get-data";

/// Something that can produce one snapshot per call.
///
/// Calls must be idempotent reads: the poller may issue a new call while a
/// previous one is still pending.
pub trait SnapshotSource: Send + Sync + 'static {
    /// Fetch and decode one snapshot.
    fn fetch(&self) -> impl Future<Output = Result<Snapshot, PollError>> + Send;

    /// Human-readable target for logs.
    fn describe(&self) -> String;
}

/// `GET {base}/get-data` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSource {
    /// Per-request timeout used by [`HttpSource::new`].
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Build a source for `base_url` with the default request timeout.
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        Self::with_timeout(base_url, Self::DEFAULT_TIMEOUT)
    }

    /// Build a source for `base_url` whose requests give up after `timeout`.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let url = format!("{}{SNAPSHOT_PATH}", base_url.trim_end_matches('/'));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;
        Ok(Self { client, url })
    }

    /// Full endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn transport(&self, err: &reqwest::Error) -> FetchError {
        FetchError::Transport {
            url: self.url.clone(),
            message: err.to_string(),
        }
    }
}

impl SnapshotSource for HttpSource {
    async fn fetch(&self) -> Result<Snapshot, PollError> {
        let resp = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.transport(&e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            }
            .into());
        }
        let body = resp.bytes().await.map_err(|e| self.transport(&e))?;
        Ok(Snapshot::from_json_slice(&body)?)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
