//! Region ambience around each [`AmbientListener`].
//!
//! On the region cadence the listener's region is resolved and its ambient
//! sounds are reconciled with what is playing: sounds whose condition no
//! longer holds (or that belong to an older snapshot) are stopped, matching
//! sounds that are not audible are started, tracking the listener. Then the
//! region's spot sound is rolled and played somewhere near the listener.

use bevy_ecs::prelude::*;
use fastrand::Rng;
use log::debug;
use rustc_hash::FxHashSet;

use crate::components::ambientlistener::AmbientListener;
use crate::components::cellposition::CellPos;
use crate::events::audio::AudioCmd;
use crate::events::particle::ParticleCmd;
use crate::resources::audio::SoundHandles;
use crate::resources::effectsconfig::EffectsConfig;
use crate::resources::profiles::{ActiveProfiles, EffectProfiles};
use crate::resources::resourcekey::ResourceKey;
use crate::resources::world::{WorldAccess, WorldHandle};
use crate::systems::dispatch::{BufferedSink, EffectSink};

/// What one listener update changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AmbienceChange {
    pub started: u32,
    pub stopped: u32,
    pub spot: bool,
}

/// Reconcile one listener with the region at `pos`.
pub fn refresh_listener(
    entity: Entity,
    pos: CellPos,
    listener: &mut AmbientListener,
    world: &dyn WorldAccess,
    profiles: &EffectProfiles,
    rng: &mut Rng,
    sink: &mut dyn EffectSink,
) -> AmbienceChange {
    let mut change = AmbienceChange::default();
    let region_id = world.region_at(pos);
    let region = profiles.region(region_id);

    if listener.generation != profiles.generation {
        for handle in listener.retain(|_, _| false) {
            sink.stop_sound(handle);
            change.stopped += 1;
        }
        listener.generation = profiles.generation;
    }
    if listener.region != Some(region_id) {
        debug!("Listener {:?} entered {}", entity, region.name);
        listener.region = Some(region_id);
    }

    let wanted = region.find_ambient_sounds();
    let wanted_keys: FxHashSet<&ResourceKey> = wanted.iter().map(|s| &s.key).collect();

    for handle in listener.retain(|key, handle| wanted_keys.contains(key) && sink.is_playing(handle)) {
        if sink.is_playing(handle) {
            sink.stop_sound(handle);
            change.stopped += 1;
        }
    }

    for sound in wanted {
        if listener.handle(&sound.key).is_none() {
            let handle = sink.play_sound(sound.request_tracking(entity, rng));
            listener.insert(sound.key.clone(), handle);
            change.started += 1;
        }
    }

    if let Some(spot) = region.get_spot_sound(rng) {
        sink.play_sound(spot.request_near(pos.center(), rng));
        change.spot = true;
    }
    change
}

/// Run [`refresh_listener`] for every due listener.
pub fn update_region_sounds(
    mut listeners: Query<(Entity, &CellPos, &mut AmbientListener)>,
    world: Res<WorldHandle>,
    profiles: Res<ActiveProfiles>,
    settings: Res<EffectsConfig>,
    mut handles: ResMut<SoundHandles>,
    mut particles: MessageWriter<ParticleCmd>,
    mut audio: MessageWriter<AudioCmd>,
    mut rng: Local<Rng>,
) {
    let snapshot = profiles.snapshot();
    let mut sink = BufferedSink::new(&mut handles);
    for (entity, pos, mut listener) in listeners.iter_mut() {
        if !listener.tick(settings.region_interval) {
            continue;
        }
        refresh_listener(
            entity,
            *pos,
            &mut listener,
            world.0.as_ref(),
            &snapshot,
            &mut rng,
            &mut sink,
        );
    }
    sink.flush(&mut particles, &mut audio);
}
