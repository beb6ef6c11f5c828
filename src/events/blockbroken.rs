//! Effects for a cell the player just broke.
//!
//! The host triggers a [`BlockBrokenEvent`] with the state the cell held
//! before it was broken; the observer runs the regular dispatch for it once.

use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use fastrand::Rng;

use crate::components::cellposition::CellPos;
use crate::events::audio::AudioCmd;
use crate::events::particle::ParticleCmd;
use crate::resources::audio::SoundHandles;
use crate::resources::palette::CellState;
use crate::resources::profiles::ActiveProfiles;
use crate::resources::world::WorldHandle;
use crate::systems::dispatch::{BufferedSink, dispatch_cell_effects};

#[derive(Event, Debug, Clone, Copy)]
pub struct BlockBrokenEvent {
    pub pos: CellPos,
    /// State before breaking.
    pub state: CellState,
}

pub fn block_broken_observer(
    trigger: On<BlockBrokenEvent>,
    world: Res<WorldHandle>,
    profiles: Res<ActiveProfiles>,
    mut handles: ResMut<SoundHandles>,
    mut particles: MessageWriter<ParticleCmd>,
    mut audio: MessageWriter<AudioCmd>,
    mut rng: Local<Rng>,
) {
    let pos = trigger.event().pos;
    let state = trigger.event().state;
    let snapshot = profiles.snapshot();
    let profile = snapshot.states.lookup(state);
    if !profile.has_sounds_or_effects() {
        return;
    }
    let region = snapshot.region(world.0.region_at(pos));
    let mut sink = BufferedSink::new(&mut handles);
    dispatch_cell_effects(world.0.as_ref(), pos, profile, region, &mut rng, &mut sink);
    sink.flush(&mut particles, &mut audio);
}
