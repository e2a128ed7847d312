// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Snapshot intake port.

use potato_telemetry::{PollFailure, PollerHandle, Snapshot};
use std::sync::Arc;

/// Where the dashboard pulls snapshots from, once per frame.
pub trait SnapshotFeed {
    /// The newest snapshot not yet taken, if any.
    fn take_update(&mut self) -> Option<Arc<Snapshot>>;
    /// Failures queued since the last call (at most `max`).
    fn drain_failures(&mut self, max: usize) -> Vec<PollFailure>;
    /// Stop intake. Idempotent; nothing is delivered afterwards.
    fn stop(&mut self);
}

impl SnapshotFeed for PollerHandle {
    fn take_update(&mut self) -> Option<Arc<Snapshot>> {
        Self::take_update(self)
    }

    fn drain_failures(&mut self, max: usize) -> Vec<PollFailure> {
        Self::drain_failures(self, max)
    }

    fn stop(&mut self) {
        Self::stop(self);
    }
}
