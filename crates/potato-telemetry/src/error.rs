// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Poll error taxonomy. All of these are recovered inside the poller.

use thiserror::Error;

/// Transport-level failure: the request never produced a usable 2xx body.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection refused, DNS failure, timeout, body read error...
    #[error("request to {url} failed: {message}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Underlying client error.
        message: String,
    },
    /// Server answered with a non-2xx status.
    #[error("{url} answered HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },
}

/// The body arrived but is not a valid snapshot.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Malformed JSON or a required field is missing.
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
    /// Parsed, but structurally inconsistent (e.g. ragged scalar field).
    #[error("snapshot shape mismatch: {0}")]
    Shape(String),
}

/// Any failure of a single poll.
#[derive(Debug, Error)]
pub enum PollError {
    /// See [`FetchError`].
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// See [`DecodeError`].
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl PollError {
    /// Short label for logs and toasts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch failed",
            Self::Decode(_) => "decode failed",
        }
    }
}
