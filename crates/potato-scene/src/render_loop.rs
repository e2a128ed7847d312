// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-frame render tick with explicit cancellation.

use crate::backend::RenderBackend;
use crate::error::SceneError;
use crate::scene::SceneManager;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag. Cancelling is idempotent and irreversible.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel; every clone observes it.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// True once any clone has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Result of one [`RenderLoop::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Controls advanced and one frame was drawn.
    Rendered,
    /// The loop is cancelled; nothing ran. Stop scheduling ticks.
    Cancelled,
}

/// Render loop bound to one mount of a [`SceneManager`].
///
/// The driver (window event loop or headless timer) calls [`RenderLoop::tick`]
/// once per display frame. Disposing the scene cancels the loop.
#[derive(Debug)]
pub struct RenderLoop {
    token: CancelToken,
    ticks: u64,
}

impl RenderLoop {
    pub(crate) fn new(token: CancelToken) -> Self {
        Self { token, ticks: 0 }
    }

    /// Run one frame: check cancellation, advance controls, draw.
    pub fn tick<B: RenderBackend>(
        &mut self,
        scene: &mut SceneManager<B>,
    ) -> Result<TickOutcome, SceneError> {
        if self.token.is_cancelled() {
            return Ok(TickOutcome::Cancelled);
        }
        scene.render_frame(&self.token)?;
        self.ticks += 1;
        Ok(TickOutcome::Rendered)
    }

    /// Frames rendered by this loop.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Cancel the loop without disposing the scene.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// True once cancelled (explicitly or by dispose).
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A clone of the loop's token, e.g. for a signal handler.
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_shared_and_idempotent() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        token.cancel();
        assert!(clone.is_cancelled());
        assert!(token.same_as(&clone));
        assert!(!token.same_as(&CancelToken::new()));
    }
}
