// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Which snapshot array becomes the point cloud.

use potato_app_core::prefs::CloudSourcePref;
use potato_telemetry::Snapshot;

/// Point-cloud input selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CloudSource {
    /// Row-major flattened scalar field.
    #[default]
    ScalarField,
    /// GPU utilization series.
    Utilization,
    /// GPU temperature series.
    Temperature,
}

impl CloudSource {
    /// Every selector, in menu order.
    pub const ALL: [Self; 3] = [Self::ScalarField, Self::Utilization, Self::Temperature];

    /// The selected array as `f32`; empty when absent.
    pub fn extract(self, snapshot: &Snapshot) -> Vec<f32> {
        match self {
            Self::ScalarField => snapshot.scalar_field_values(),
            Self::Utilization => to_f32(&snapshot.gpu.utilization),
            Self::Temperature => to_f32(&snapshot.gpu.temperature),
        }
    }

    /// UI label.
    pub fn label(self) -> &'static str {
        match self {
            Self::ScalarField => "Scalar field",
            Self::Utilization => "GPU utilization",
            Self::Temperature => "GPU temperature",
        }
    }
}

fn to_f32(series: &[f64]) -> Vec<f32> {
    series.iter().map(|&v| v as f32).collect()
}

impl From<CloudSourcePref> for CloudSource {
    fn from(pref: CloudSourcePref) -> Self {
        match pref {
            CloudSourcePref::ScalarField => Self::ScalarField,
            CloudSourcePref::Utilization => Self::Utilization,
            CloudSourcePref::Temperature => Self::Temperature,
        }
    }
}

impl From<CloudSource> for CloudSourcePref {
    fn from(source: CloudSource) -> Self {
        match source {
            CloudSource::ScalarField => Self::ScalarField,
            CloudSource::Utilization => Self::Utilization,
            CloudSource::Temperature => Self::Temperature,
        }
    }
}
