// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Viridis colormap, piecewise-linear over nine stops.

const STOPS: [[f32; 3]; 9] = [
    [68.0, 1.0, 84.0],
    [71.0, 44.0, 122.0],
    [59.0, 81.0, 139.0],
    [44.0, 113.0, 142.0],
    [33.0, 144.0, 141.0],
    [39.0, 173.0, 129.0],
    [92.0, 200.0, 99.0],
    [170.0, 220.0, 50.0],
    [253.0, 231.0, 37.0],
];

/// Map `t` in `[0, 1]` to an sRGB colour. Out-of-range and NaN inputs clamp.
pub fn viridis(t: f32) -> [u8; 3] {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (STOPS.len() - 1) as f32;
    let lo = (scaled.floor() as usize).min(STOPS.len() - 2);
    let frac = scaled - lo as f32;
    let (a, b) = (STOPS[lo], STOPS[lo + 1]);
    let mix = |i: usize| (a[i] + (b[i] - a[i]) * frac).round() as u8;
    [mix(0), mix(1), mix(2)]
}
