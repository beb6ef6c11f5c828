//! Wiring the effect engine into an ECS world.
//!
//! [`install`] inserts every resource and observer the systems need;
//! [`tick_schedule`] builds the per-tick schedule. The host adds an
//! [`EffectScanner`](crate::components::scanner::EffectScanner) and an
//! [`AmbientListener`](crate::components::ambientlistener::AmbientListener)
//! to its player entity, together with a
//! [`CellPos`](crate::components::cellposition::CellPos) it keeps current.
//!
//! Audio and reload threads are optional: [`crate::resources::audio::setup_audio`]
//! and [`crate::resources::reload::setup_reload`] start them, and the
//! matching systems only run while their bridge resource exists.

use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;

use crate::events::audio::{AudioCmd, AudioMessage};
use crate::events::blockbroken::block_broken_observer;
use crate::events::particle::ParticleCmd;
use crate::events::reload::{ProfilesReloaded, observe_reload_request};
use crate::resources::audio::{AudioBridge, SoundHandles};
use crate::resources::effectsconfig::EffectsConfig;
use crate::resources::profiles::{ActiveProfiles, EffectProfiles, ProfileSources};
use crate::resources::reload::ReloadBridge;
use crate::resources::world::WorldHandle;
use crate::resources::worldtime::WorldTime;
use crate::systems::audio::{
    forward_audio_cmds, poll_audio_messages, track_playing_sounds, update_bevy_audio_cmds,
    update_bevy_audio_messages,
};
use crate::systems::dispatch::update_particle_messages;
use crate::systems::effectsconfig::apply_effects_config_changes;
use crate::systems::regionsound::update_region_sounds;
use crate::systems::reload::{apply_reloaded_profiles, update_reload_messages};
use crate::systems::scanner::scan_effects;
use crate::systems::time::{advance_world_time, world_is_running};

/// Insert resources and observers. `profiles` becomes the active snapshot.
pub fn install(
    world: &mut World,
    settings: EffectsConfig,
    sources: ProfileSources,
    access: WorldHandle,
    profiles: EffectProfiles,
) {
    world.insert_resource(settings);
    world.insert_resource(sources);
    world.insert_resource(access);
    world.insert_resource(ActiveProfiles::new(profiles));
    world.insert_resource(WorldTime::default());
    world.init_resource::<SoundHandles>();
    world.init_resource::<Messages<ParticleCmd>>();
    world.init_resource::<Messages<AudioCmd>>();
    world.init_resource::<Messages<AudioMessage>>();
    world.init_resource::<Messages<ProfilesReloaded>>();

    world.spawn(Observer::new(block_broken_observer));
    world.spawn(Observer::new(observe_reload_request));
    world.flush();
}

/// The per-tick schedule.
pub fn tick_schedule() -> Schedule {
    let mut update = Schedule::default();
    update.add_systems(
        (
            advance_world_time,
            apply_effects_config_changes,
            apply_reloaded_profiles.run_if(resource_exists::<ReloadBridge>),
            (scan_effects, update_region_sounds).run_if(world_is_running),
        )
            .chain(),
    );
    update.add_systems(
        // audio systems must be together
        (
            update_bevy_audio_cmds,
            forward_audio_cmds.run_if(resource_exists::<AudioBridge>),
            poll_audio_messages.run_if(resource_exists::<AudioBridge>),
            update_bevy_audio_messages,
            track_playing_sounds,
        )
            .chain()
            .after(update_region_sounds)
            .after(scan_effects),
    );
    update.add_systems((update_particle_messages, update_reload_messages).after(update_region_sounds));
    update
}
