//! Requesting and announcing profile reloads.
//!
//! Triggering a [`ReloadRequestEvent`] queues a background load with the
//! current [`EffectsConfig`]. When the new snapshot has been published a
//! [`ProfilesReloaded`] message is written.

use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::{error, info};

use crate::resources::effectsconfig::EffectsConfig;
use crate::resources::profiles::ProfileSources;
use crate::resources::reload::ReloadBridge;

#[derive(Event, Debug, Clone, Copy)]
pub struct ReloadRequestEvent {}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfilesReloaded {
    pub generation: u64,
}

/// Queue a load on the reload thread.
pub fn observe_reload_request(
    _trigger: On<ReloadRequestEvent>,
    bridge: Option<Res<ReloadBridge>>,
    sources: Res<ProfileSources>,
    settings: Res<EffectsConfig>,
) {
    let Some(bridge) = bridge else {
        error!("Reload requested but the reload thread is not running");
        return;
    };
    info!("Reloading effect profiles from {}", settings.rules_dir.display());
    if let Err(e) = bridge.request(sources.clone(), settings.clone()) {
        error!("Reload request failed: {}", e);
    }
}
