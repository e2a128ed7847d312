// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Prefs persistence for the viewer. Never fatal: a missing store or a
//! corrupt file falls back to defaults and yields a notice for the UI.

use potato_app_core::config::{ConfigService, ConfigStore, PREFS_KEY};
use potato_app_core::config_port::ConfigPort;
use potato_app_core::prefs::DashboardPrefs;
use potato_config_fs::FsConfigStore;
use tracing::{debug, info, warn};

pub struct Settings<S> {
    service: Option<ConfigService<S>>,
    persist: bool,
}

impl Settings<FsConfigStore> {
    /// Open the platform config store. The notice is set when it is unavailable.
    pub fn open(persist: bool) -> (Self, Option<String>) {
        match FsConfigStore::new() {
            Ok(store) => {
                debug!(dir = %store.base().display(), "config store opened");
                (Self::with_store(store, persist), None)
            }
            Err(err) => {
                warn!(error = %err, "config store unavailable");
                let settings = Self {
                    service: None,
                    persist,
                };
                (settings, Some(format!("prefs won't persist this session: {err}")))
            }
        }
    }
}

impl<S: ConfigStore> Settings<S> {
    pub fn with_store(store: S, persist: bool) -> Self {
        Self {
            service: Some(ConfigService::new(store)),
            persist,
        }
    }

    /// Stored prefs, or defaults plus a notice when they can't be read.
    pub fn load(&self) -> (DashboardPrefs, Option<String>) {
        let Some(service) = &self.service else {
            return (DashboardPrefs::default(), None);
        };
        match service.load::<DashboardPrefs>(PREFS_KEY) {
            Ok(Some(prefs)) => (prefs, None),
            Ok(None) => (DashboardPrefs::default(), None),
            Err(err) => {
                warn!(error = %err, "stored prefs unreadable; using defaults");
                (
                    DashboardPrefs::default(),
                    Some(format!("stored prefs unreadable ({err}); using defaults")),
                )
            }
        }
    }

    /// Best-effort write; skipped under `--no-save-prefs`.
    pub fn save(&self, prefs: &DashboardPrefs) {
        if !self.persist {
            debug!("prefs not saved (--no-save-prefs)");
            return;
        }
        let Some(service) = &self.service else {
            return;
        };
        match service.save_prefs(prefs) {
            Ok(()) => info!("prefs saved"),
            Err(err) => warn!(error = %err, "failed to save prefs"),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use potato_app_core::prefs::CloudSourcePref;

    #[test]
    fn missing_prefs_load_as_defaults_silently() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::with_store(FsConfigStore::at(dir.path()).unwrap(), true);
        let (prefs, notice) = settings.load();
        assert_eq!(prefs, DashboardPrefs::default());
        assert!(notice.is_none());
    }

    #[test]
    fn corrupt_prefs_fall_back_with_notice() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dashboard.json"), b"{ not json").unwrap();
        let settings = Settings::with_store(FsConfigStore::at(dir.path()).unwrap(), true);
        let (prefs, notice) = settings.load();
        assert_eq!(prefs, DashboardPrefs::default());
        assert!(notice.unwrap().contains("unreadable"));
    }

    #[test]
    fn saved_prefs_are_loaded_back() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::with_store(FsConfigStore::at(dir.path()).unwrap(), true);
        let mut prefs = DashboardPrefs::default();
        prefs.cloud_source = CloudSourcePref::Temperature;
        prefs.camera.distance = 12.0;
        settings.save(&prefs);
        assert_eq!(settings.load().0, prefs);
    }

    #[test]
    fn no_save_leaves_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::with_store(FsConfigStore::at(dir.path()).unwrap(), false);
        let mut prefs = DashboardPrefs::default();
        prefs.poll.interval_ms = 42;
        settings.save(&prefs);
        assert!(!dir.path().join("dashboard.json").exists());
        assert_eq!(settings.load().0, DashboardPrefs::default());
    }
}
