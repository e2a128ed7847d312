// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for the potato monitor (config, prefs, toasts).
//! Keeps the viewer's adapters thin and framework-agnostic.

pub mod config;
pub mod config_port;
pub mod prefs;
pub mod toast;
