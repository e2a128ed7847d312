// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene lifecycle errors.

use thiserror::Error;

/// Misuse of the scene lifecycle, or a backend failure.
///
/// Lifecycle variants indicate an orchestration bug and are surfaced to the
/// caller rather than swallowed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    /// `mount` called while already mounted.
    #[error("scene is already mounted")]
    AlreadyMounted,
    /// Operation requires a mounted scene.
    #[error("scene is not mounted")]
    NotMounted,
    /// Operation attempted after `dispose`.
    #[error("scene has been disposed")]
    Disposed,
    /// Position/colour buffers do not describe the same number of points.
    #[error("invalid geometry: {positions} position floats vs {colors} color floats")]
    InvalidGeometry {
        /// Length of the position buffer.
        positions: usize,
        /// Length of the colour buffer.
        colors: usize,
    },
    /// The render backend reported a failure.
    #[error("render backend error: {0}")]
    Backend(String),
}
