// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Typed shape of one `/get-data` payload.

use crate::error::DecodeError;
use serde::{Deserialize, Serialize};

/// Hardware sensor series, one sample per backend report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpuStats {
    /// Temperature samples (°C).
    pub temperature: Vec<f64>,
    /// Utilization samples (%).
    pub utilization: Vec<f64>,
}

/// Replicator-dynamics population history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameTheory {
    /// Round numbers.
    pub rounds: Vec<i64>,
    /// Share of the "cooperate" strategy per round.
    pub cooperate: Vec<f64>,
    /// Share of the "defect" strategy per round.
    pub defect: Vec<f64>,
    /// Share of the "tit for tat" strategy per round.
    pub tit_for_tat: Vec<f64>,
}

/// One complete telemetry snapshot.
///
/// Replaced wholesale by the next successful poll, never merged. Consumers
/// receive it behind an `Arc` and must treat it as read-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireSnapshot")]
pub struct Snapshot {
    /// Sensor series.
    #[serde(rename = "gpu_stats")]
    pub gpu: GpuStats,
    /// Optional 2-D scalar field (Mandelbrot iteration counts), row-major.
    #[serde(rename = "mandelbrot", skip_serializing_if = "Option::is_none")]
    pub scalar_field: Option<Vec<Vec<f64>>>,
    /// Population simulation history.
    #[serde(rename = "game_theory")]
    pub population: GameTheory,
}

/// Payload as sent. The scalar field may arrive under either key, or both.
#[derive(Deserialize)]
struct WireSnapshot {
    gpu_stats: GpuStats,
    #[serde(default)]
    mandelbrot: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    mandelbrot_data: Option<Vec<Vec<f64>>>,
    game_theory: GameTheory,
}

impl From<WireSnapshot> for Snapshot {
    fn from(wire: WireSnapshot) -> Self {
        Self {
            gpu: wire.gpu_stats,
            scalar_field: wire.mandelbrot.or(wire.mandelbrot_data),
            population: wire.game_theory,
        }
    }
}

impl Snapshot {
    /// Decode and validate a JSON body.
    ///
    /// Missing required series are a [`DecodeError::Json`]; a ragged scalar
    /// field is a [`DecodeError::Shape`]. An empty matrix is normalised to
    /// "absent".
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut snapshot: Self = serde_json::from_slice(bytes)?;
        if snapshot
            .scalar_field
            .as_ref()
            .is_some_and(|rows| rows.is_empty() || rows.iter().all(Vec::is_empty))
        {
            snapshot.scalar_field = None;
        }
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check structural consistency of the optional scalar field.
    pub fn validate(&self) -> Result<(), DecodeError> {
        if let Some(rows) = &self.scalar_field {
            let width = rows.first().map_or(0, Vec::len);
            if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
                return Err(DecodeError::Shape(format!(
                    "scalar field row {idx} has {} columns, expected {width}",
                    row.len()
                )));
            }
        }
        Ok(())
    }

    /// `(rows, cols)` of the scalar field, when present.
    pub fn scalar_field_dims(&self) -> Option<(usize, usize)> {
        self.scalar_field
            .as_ref()
            .map(|rows| (rows.len(), rows.first().map_or(0, Vec::len)))
    }

    /// Row-major flattened scalar field as `f32`, or empty when absent.
    pub fn scalar_field_values(&self) -> Vec<f32> {
        self.scalar_field
            .as_ref()
            .map(|rows| rows.iter().flatten().map(|&v| v as f32).collect())
            .unwrap_or_default()
    }

    /// Most recent temperature sample.
    pub fn latest_temperature(&self) -> Option<f64> {
        self.gpu.temperature.last().copied()
    }

    /// Most recent utilization sample.
    pub fn latest_utilization(&self) -> Option<f64> {
        self.gpu.utilization.last().copied()
    }

    /// Most recent simulated round.
    pub fn latest_round(&self) -> Option<i64> {
        self.population.rounds.last().copied()
    }
}
