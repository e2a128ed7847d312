// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Chart panel view models derived from one snapshot.

use crate::colormap::viridis;
use potato_telemetry::Snapshot;

/// A named line series of `[x, y]` points.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Legend label.
    pub name: &'static str,
    /// Plot points.
    pub points: Vec<[f64; 2]>,
}

impl Series {
    fn indexed(name: &'static str, values: &[f64]) -> Self {
        Self {
            name,
            points: values
                .iter()
                .enumerate()
                .map(|(i, &v)| [i as f64, v])
                .collect(),
        }
    }

    fn against(name: &'static str, xs: &[i64], ys: &[f64]) -> Self {
        Self {
            name,
            points: xs.iter().zip(ys).map(|(&x, &y)| [x as f64, y]).collect(),
        }
    }

    /// Last y value.
    pub fn latest(&self) -> Option<f64> {
        self.points.last().map(|p| p[1])
    }
}

/// GPU temperature + utilization against sample index.
#[derive(Debug, Clone, PartialEq)]
pub struct GpuPanel {
    /// Temperature (°C).
    pub temperature: Series,
    /// Utilization (%).
    pub utilization: Series,
}

/// Strategy shares against round number.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationPanel {
    /// "cooperate" share.
    pub cooperate: Series,
    /// "defect" share.
    pub defect: Series,
    /// "tit for tat" share.
    pub tit_for_tat: Series,
    /// Most recent round.
    pub latest_round: Option<i64>,
}

impl PopulationPanel {
    /// The three series in legend order.
    pub fn series(&self) -> [&Series; 3] {
        [&self.cooperate, &self.defect, &self.tit_for_tat]
    }
}

/// Scalar field rendered through [`viridis`], normalised to its own range.
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    /// Rows (image height).
    pub rows: usize,
    /// Columns (image width).
    pub cols: usize,
    /// Smallest value in the field.
    pub min: f64,
    /// Largest value in the field.
    pub max: f64,
    /// Row-major RGBA pixels, `rows * cols` entries.
    pub pixels: Vec<[u8; 4]>,
}

impl Heatmap {
    /// Build from a snapshot; `None` when the scalar field is absent.
    pub fn from_snapshot(snapshot: &Snapshot) -> Option<Self> {
        let (rows, cols) = snapshot.scalar_field_dims()?;
        let field = snapshot.scalar_field.as_ref()?;
        let (min, max) = field
            .iter()
            .flatten()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let span = max - min;
        let pixels = field
            .iter()
            .flatten()
            .map(|&v| {
                let t = if span > 0.0 { (v - min) / span } else { 0.0 };
                let [r, g, b] = viridis(t as f32);
                [r, g, b, 255]
            })
            .collect();
        Some(Self {
            rows,
            cols,
            min,
            max,
            pixels,
        })
    }
}

/// Every chart panel for one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Panels {
    /// GPU stats chart.
    pub gpu: GpuPanel,
    /// Game theory chart.
    pub population: PopulationPanel,
    /// Scalar field heatmap, omitted when the snapshot has none.
    pub heatmap: Option<Heatmap>,
}

impl Panels {
    /// Derive every panel from `snapshot`.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let pop = &snapshot.population;
        Self {
            gpu: GpuPanel {
                temperature: Series::indexed("Temperature", &snapshot.gpu.temperature),
                utilization: Series::indexed("Utilization", &snapshot.gpu.utilization),
            },
            population: PopulationPanel {
                cooperate: Series::against("Cooperate", &pop.rounds, &pop.cooperate),
                defect: Series::against("Defect", &pop.rounds, &pop.defect),
                tit_for_tat: Series::against("Tit for tat", &pop.rounds, &pop.tit_for_tat),
                latest_round: snapshot.latest_round(),
            },
            heatmap: Heatmap::from_snapshot(snapshot),
        }
    }
}
