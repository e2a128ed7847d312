// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Command line, and how it overrides stored prefs.

use clap::{Parser, ValueEnum};
use potato_app_core::prefs::{CloudSourcePref, DashboardPrefs, PollPrefs};
use potato_telemetry::{OverlapPolicy, PollerConfig};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Live telemetry dashboard for the potato monitor")]
pub struct Args {
    /// Telemetry server base URL; `/get-data` is appended.
    #[arg(long)]
    pub base_url: Option<String>,
    /// Poll interval in milliseconds.
    #[arg(long)]
    pub interval_ms: Option<u64>,
    /// Which snapshot array feeds the point cloud.
    #[arg(long, value_enum)]
    pub cloud_source: Option<CloudSourceArg>,
    /// Skip a poll tick while the previous request is still outstanding.
    #[arg(long)]
    pub skip_while_in_flight: bool,
    /// Run without a window against a counting backend.
    #[arg(long)]
    pub headless: bool,
    /// Headless only: stop after this many frames (default: until Ctrl-C).
    #[arg(long, requires = "headless")]
    pub frames: Option<u64>,
    /// Don't write prefs back on exit.
    #[arg(long)]
    pub no_save_prefs: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CloudSourceArg {
    ScalarField,
    Utilization,
    Temperature,
}

impl From<CloudSourceArg> for CloudSourcePref {
    fn from(arg: CloudSourceArg) -> Self {
        match arg {
            CloudSourceArg::ScalarField => Self::ScalarField,
            CloudSourceArg::Utilization => Self::Utilization,
            CloudSourceArg::Temperature => Self::Temperature,
        }
    }
}

impl Args {
    /// Stored prefs with every flag that was given applied on top.
    pub fn apply(&self, mut prefs: DashboardPrefs) -> DashboardPrefs {
        if let Some(url) = &self.base_url {
            prefs.poll.base_url.clone_from(url);
        }
        if let Some(ms) = self.interval_ms {
            prefs.poll.interval_ms = ms;
        }
        if self.skip_while_in_flight {
            prefs.poll.skip_while_in_flight = true;
        }
        if let Some(source) = self.cloud_source {
            prefs.cloud_source = source.into();
        }
        prefs
    }
}

pub fn poller_config(poll: &PollPrefs) -> PollerConfig {
    PollerConfig {
        interval: Duration::from_millis(poll.interval_ms.max(1)),
        overlap: if poll.skip_while_in_flight {
            OverlapPolicy::SkipWhileInFlight
        } else {
            OverlapPolicy::Allow
        },
        ..PollerConfig::default()
    }
}
