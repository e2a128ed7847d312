// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]
//! Mount/update/dispose pairing and render-loop cancellation on the headless backend.

use potato_scene::{
    build_point_cloud, HeadlessBackend, HeadlessTarget, SceneError, SceneManager, SceneState,
    TickOutcome,
};

fn scene() -> SceneManager<HeadlessBackend> {
    SceneManager::new()
}

#[test]
fn double_mount_is_refused() {
    let mut target = HeadlessTarget::new(640, 480);
    let mut s = scene();
    let _loop = s.mount(&mut target).unwrap();
    assert_eq!(s.mount(&mut target).unwrap_err(), SceneError::AlreadyMounted);
    assert_eq!(s.state(), SceneState::Mounted);
}

#[test]
fn operations_before_mount_fail() {
    let mut s = scene();
    assert_eq!(
        s.update_geometry(&[0.0; 3], &[0.0; 3]).unwrap_err(),
        SceneError::NotMounted
    );
    assert_eq!(s.resize(10, 10).unwrap_err(), SceneError::NotMounted);
    assert_eq!(s.state(), SceneState::Unmounted);
}

#[test]
fn lifecycle_errors_take_precedence_over_bad_buffers() {
    let mut s = scene();
    assert_eq!(
        s.update_geometry(&[0.0; 6], &[0.0; 2]).unwrap_err(),
        SceneError::NotMounted
    );

    let mut target = HeadlessTarget::new(64, 64);
    let _loop = s.mount(&mut target).unwrap();
    assert_eq!(
        s.update_geometry(&[0.0; 6], &[0.0; 2]).unwrap_err(),
        SceneError::InvalidGeometry {
            positions: 6,
            colors: 2
        }
    );

    s.dispose();
    assert_eq!(
        s.update_geometry(&[0.0; 6], &[0.0; 2]).unwrap_err(),
        SceneError::Disposed
    );
    assert_eq!(s.generation(), 0);
}

#[test]
fn double_dispose_is_a_noop() {
    let mut target = HeadlessTarget::new(640, 480);
    let counters = target.counters();
    let mut s = scene();
    let _loop = s.mount(&mut target).unwrap();
    s.dispose();
    s.dispose();
    assert_eq!(s.state(), SceneState::Disposed);
    assert!(counters.released());
    assert_eq!(
        s.update_geometry(&[0.0; 3], &[0.0; 3]).unwrap_err(),
        SceneError::Disposed
    );
    assert_eq!(s.mount(&mut target).unwrap_err(), SceneError::Disposed);
}

#[test]
fn repeated_updates_keep_one_live_geometry() {
    let mut target = HeadlessTarget::new(640, 480);
    let counters = target.counters();
    let mut s = scene();
    let _loop = s.mount(&mut target).unwrap();

    for k in 0..50_u16 {
        let data: Vec<f32> = (0..(100 + usize::from(k))).map(|i| (i % 256) as f32).collect();
        s.set_point_cloud(&build_point_cloud(&data)).unwrap();
        assert_eq!(counters.live_points(), 1);
        assert_eq!(s.point_count(), data.len());
    }
    assert_eq!(counters.uploads(), 50);
    assert_eq!(counters.releases(), 49);

    s.dispose();
    assert_eq!(counters.live_points(), 0);
    assert_eq!(counters.releases(), 50);
}

#[test]
fn empty_cloud_detaches_without_error() {
    let mut target = HeadlessTarget::new(640, 480);
    let counters = target.counters();
    let mut s = scene();
    let mut render_loop = s.mount(&mut target).unwrap();

    s.set_point_cloud(&build_point_cloud(&[10.0, 20.0])).unwrap();
    s.set_point_cloud(&build_point_cloud(&[])).unwrap();
    assert_eq!(s.point_count(), 0);
    assert_eq!(counters.live_points(), 0);
    assert!(s.root().unwrap().points().is_none());

    assert_eq!(render_loop.tick(&mut s).unwrap(), TickOutcome::Rendered);
    assert_eq!(counters.drawn_points(), 0);
}

#[test]
fn ticks_stop_after_dispose() {
    let mut target = HeadlessTarget::new(640, 480);
    let counters = target.counters();
    let mut s = scene();
    let mut render_loop = s.mount(&mut target).unwrap();
    s.set_point_cloud(&build_point_cloud(&[128.0; 300])).unwrap();

    for _ in 0..10 {
        assert_eq!(render_loop.tick(&mut s).unwrap(), TickOutcome::Rendered);
    }
    assert_eq!(render_loop.ticks(), 10);
    assert_eq!(counters.drawn_points(), 300);

    s.dispose();
    assert!(render_loop.is_cancelled());
    for _ in 0..10 {
        assert_eq!(render_loop.tick(&mut s).unwrap(), TickOutcome::Cancelled);
    }
    assert_eq!(render_loop.ticks(), 10);
    assert_eq!(counters.draws(), 10);
}

#[test]
fn explicit_cancel_stops_ticks_but_keeps_scene() {
    let mut target = HeadlessTarget::new(640, 480);
    let mut s = scene();
    let mut render_loop = s.mount(&mut target).unwrap();
    render_loop.tick(&mut s).unwrap();
    render_loop.cancel();
    assert_eq!(render_loop.tick(&mut s).unwrap(), TickOutcome::Cancelled);
    assert_eq!(render_loop.ticks(), 1);
    assert_eq!(s.state(), SceneState::Mounted);
}

#[test]
fn drop_releases_everything() {
    let mut target = HeadlessTarget::new(640, 480);
    let counters = target.counters();
    let render_loop = {
        let mut s = scene();
        let render_loop = s.mount(&mut target).unwrap();
        s.set_point_cloud(&build_point_cloud(&[1.0, 2.0, 3.0])).unwrap();
        render_loop
    };
    assert!(render_loop.is_cancelled());
    assert!(counters.released());
    assert_eq!(counters.live_points(), 0);
}

#[test]
fn resize_propagates_to_surface() {
    let mut target = HeadlessTarget::new(640, 480);
    let counters = target.counters();
    let mut s = scene();
    let _loop = s.mount(&mut target).unwrap();
    s.resize(1280, 720).unwrap();
    assert_eq!(counters.surface().width, 1280);
    assert_eq!(counters.surface().height, 720);
}
