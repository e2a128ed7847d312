// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Telemetry intake for the potato monitor.
//!
//! - [`Snapshot`]: one complete `/get-data` payload, immutable once received.
//! - [`SnapshotSource`]: async fetch seam; [`HttpSource`] is the reqwest-backed impl.
//! - [`DataPoller`]: fixed-interval poll loop publishing the latest good snapshot
//!   through a [`PollerHandle`]. Failures are logged, counted and queued for the
//!   UI; they never stop the loop or clobber the last good snapshot.

mod error;
mod poller;
mod snapshot;
mod source;

pub use error::{DecodeError, FetchError, PollError};
pub use poller::{
    DataPoller, OverlapPolicy, PollFailure, PollStats, PollerConfig, PollerHandle,
    DEFAULT_POLL_INTERVAL,
};
pub use snapshot::{GameTheory, GpuStats, Snapshot};
pub use source::{HttpSource, SnapshotSource, DEFAULT_BASE_URL, SNAPSHOT_PATH};
