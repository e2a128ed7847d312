// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Config port used by the viewer to load/save dashboard prefs.

use crate::config::{ConfigService, ConfigStore, PREFS_KEY};
use crate::prefs::DashboardPrefs;

/// Config-facing port for loading/saving dashboard preferences.
pub trait ConfigPort {
    /// Load dashboard preferences (returns None if missing or unreadable).
    fn load_prefs(&self) -> Option<DashboardPrefs>;
    /// Persist dashboard preferences (best-effort; returns a message on failure).
    fn save_prefs(&self, prefs: &DashboardPrefs) -> Result<(), String>;
}

impl<S> ConfigPort for ConfigService<S>
where
    S: ConfigStore,
{
    fn load_prefs(&self) -> Option<DashboardPrefs> {
        self.load(PREFS_KEY).ok().flatten()
    }

    fn save_prefs(&self, prefs: &DashboardPrefs) -> Result<(), String> {
        self.save(PREFS_KEY, prefs).map_err(|e| e.to_string())
    }
}
