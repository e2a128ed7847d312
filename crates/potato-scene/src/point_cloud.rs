// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Numeric array → point-cloud buffers.

/// Points per grid row.
pub const GRID_WIDTH: usize = 100;
/// Input values are expected in `[0, VALUE_MAX]`.
pub const VALUE_MAX: f32 = 255.0;

const CELL: f32 = 50.0;

/// Interleaved-xyz positions and rgb colours, three floats per point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    /// `x, y, z` per point.
    pub positions: Vec<f32>,
    /// `r, g, b` per point.
    pub colors: Vec<f32>,
}

impl PointCloud {
    /// Number of points.
    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    /// True when there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Lay `data` out on a [`GRID_WIDTH`]-wide grid in the `[-1, 1)` square.
///
/// Point `i` sits at `((i % 100) / 50 - 1, (i / 100) / 50 - 1, v / 255)` and is
/// coloured `(v / 255, 0.5, 1 - v / 255)`. Pure and deterministic; the input is
/// never modified. An empty slice yields an empty cloud.
pub fn build_point_cloud(data: &[f32]) -> PointCloud {
    let mut positions = Vec::with_capacity(data.len() * 3);
    let mut colors = Vec::with_capacity(data.len() * 3);

    for (i, &v) in data.iter().enumerate() {
        let t = v / VALUE_MAX;
        let col = (i % GRID_WIDTH) as f32;
        let row = (i / GRID_WIDTH) as f32;
        positions.extend_from_slice(&[col / CELL - 1.0, row / CELL - 1.0, t]);
        colors.extend_from_slice(&[t, 0.5, 1.0 - t]);
    }

    PointCloud { positions, colors }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_input_builds_empty_cloud() {
        let cloud = build_point_cloud(&[]);
        assert!(cloud.is_empty());
        assert!(cloud.colors.is_empty());
        assert_eq!(cloud.len(), 0);
    }

    #[test]
    fn buffers_are_three_floats_per_point() {
        for n in [1_usize, 99, 100, 101, 1234] {
            let data: Vec<f32> = (0..n).map(|i| (i % 256) as f32).collect();
            let cloud = build_point_cloud(&data);
            assert_eq!(cloud.positions.len(), 3 * n);
            assert_eq!(cloud.colors.len(), 3 * n);
            assert_eq!(cloud.len(), n);
        }
    }

    #[test]
    fn same_input_is_bit_identical() {
        let data: Vec<f32> = (0..2500).map(|i| ((i * 37) % 256) as f32).collect();
        let a = build_point_cloud(&data);
        let b = build_point_cloud(&data);
        let bits = |v: &[f32]| v.iter().map(|f| f.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a.positions), bits(&b.positions));
        assert_eq!(bits(&a.colors), bits(&b.colors));
    }

    #[test]
    fn height_and_colour_track_value_exactly() {
        let data: Vec<f32> = (0..=255).map(|v| v as f32).collect();
        let cloud = build_point_cloud(&data);
        for (i, &v) in data.iter().enumerate() {
            let z = cloud.positions[3 * i + 2];
            let (r, g, b) = (cloud.colors[3 * i], cloud.colors[3 * i + 1], cloud.colors[3 * i + 2]);
            assert_eq!(z, v / 255.0);
            assert_eq!(r, z);
            assert_eq!(g, 0.5);
            assert_eq!(r + b, 1.0, "r + b drifted for v = {v}");
        }
    }

    #[test]
    fn grid_wraps_every_hundred_points() {
        let cloud = build_point_cloud(&[0.0; 201]);
        let xy = |i: usize| (cloud.positions[3 * i], cloud.positions[3 * i + 1]);
        assert_eq!(xy(0), (-1.0, -1.0));
        assert_relative_eq!(xy(99).0, 0.98, epsilon = 1e-6);
        assert_eq!(xy(100), (-1.0, 1.0 / 50.0 - 1.0));
        assert_eq!(xy(200), (-1.0, 2.0 / 50.0 - 1.0));
    }

    #[test]
    fn uniform_midscale_input() {
        let cloud = build_point_cloud(&vec![128.0; 10_000]);
        assert_eq!(cloud.positions.len(), 30_000);
        for i in 0..10_000 {
            assert_relative_eq!(cloud.positions[3 * i + 2], 0.502, epsilon = 1e-3);
            assert_relative_eq!(cloud.colors[3 * i], 0.502, epsilon = 1e-3);
            assert_eq!(cloud.colors[3 * i + 1], 0.5);
            assert_relative_eq!(cloud.colors[3 * i + 2], 0.498, epsilon = 1e-3);
        }
        assert_relative_eq!(cloud.positions[3], -0.98, epsilon = 1e-6);
        assert_relative_eq!(cloud.positions[3 * 9_999 + 1], 0.98, epsilon = 1e-6);
    }
}
