//! Settings change detection.
//!
//! Monitors [`EffectsConfig`] and queues a profile reload when values that
//! feed the load (rule directory, chances, blocked sounds, disabled effects)
//! change at runtime. Scanner settings are read every tick and need nothing.

use bevy_ecs::prelude::*;
use log::debug;

use crate::events::reload::ReloadRequestEvent;
use crate::resources::effectsconfig::EffectsConfig;

/// Load-relevant part of the settings, as of the last reload.
#[derive(Default, PartialEq)]
pub struct LoadedSettings(Option<EffectsConfig>);

fn load_inputs(config: &EffectsConfig) -> EffectsConfig {
    EffectsConfig {
        near_range: 0,
        far_range: 0,
        iterations: 0,
        scan_interval: 0,
        config_path: Default::default(),
        ..config.clone()
    }
}

/// System that triggers a reload when load-relevant settings changed.
///
/// The first run only records the current values; the initial snapshot is
/// loaded by the host at startup.
pub fn apply_effects_config_changes(
    config: Res<EffectsConfig>,
    mut loaded: Local<LoadedSettings>,
    mut commands: Commands,
) {
    if !config.is_changed() {
        return;
    }
    let inputs = load_inputs(&config);
    match &loaded.0 {
        None => loaded.0 = Some(inputs),
        Some(previous) if *previous == inputs => {
            debug!("EffectsConfig changed, scanner settings only");
        }
        Some(_) => {
            loaded.0 = Some(inputs);
            commands.trigger(ReloadRequestEvent {});
        }
    }
}
