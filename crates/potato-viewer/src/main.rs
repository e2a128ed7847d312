// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! potato-viewer: polls a telemetry server and renders GPU stats, strategy
//! shares and the scalar field as charts plus a 3-D point cloud.
//!
//! `--headless` drives the same dashboard against a counting backend without
//! opening a window.

mod app;
mod cli;
mod gpu;
mod headless;
mod input;
mod settings;
mod ui;

use anyhow::Result;
use clap::Parser;
use egui_winit::winit::event_loop::EventLoop;
use potato_telemetry::HttpSource;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = cli::Args::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let (settings, store_notice) = settings::Settings::open(!args.no_save_prefs);
    let (stored, load_notice) = settings.load();
    let prefs = args.apply(stored);
    let source = HttpSource::new(&prefs.poll.base_url)?;
    info!(
        url = source.url(),
        interval_ms = prefs.poll.interval_ms,
        cloud_source = ?prefs.cloud_source,
        headless = args.headless,
        "starting"
    );

    if args.headless {
        let summary = headless::run(source, &prefs, args.frames)?;
        info!(
            frames = summary.frames,
            snapshots = summary.snapshots,
            failures = summary.failures,
            points = summary.points,
            uploads = summary.uploads,
            releases = summary.releases,
            "headless summary"
        );
        settings.save(&prefs);
        return Ok(());
    }

    let notices = store_notice.into_iter().chain(load_notice).collect();
    let event_loop = EventLoop::new()?;
    let mut app = app::App::new(settings, prefs, source, notices)?;
    event_loop.run_app(&mut app)?;
    Ok(())
}
