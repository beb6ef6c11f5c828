//! Turning a resolved cell into effects.
//!
//! [`dispatch_cell_effects`] rolls every block effect of a profile and its
//! sound, and hands whatever fires to an [`EffectSink`]. The scanner, the
//! block-broken observer and the region sound system all go through a sink,
//! so the same logic can be driven from tests without a world.

use bevy_ecs::prelude::*;
use fastrand::Rng;

use crate::components::cellposition::CellPos;
use crate::events::audio::{AudioCmd, SoundHandle, SoundRequest};
use crate::events::particle::ParticleCmd;
use crate::resources::audio::SoundHandles;
use crate::resources::effectprofile::EffectProfile;
use crate::resources::region::RegionProfile;
use crate::resources::world::WorldAccess;

/// Where fired effects go.
pub trait EffectSink {
    fn spawn_particle(&mut self, cmd: ParticleCmd);
    fn play_sound(&mut self, request: SoundRequest) -> SoundHandle;
    fn stop_sound(&mut self, handle: SoundHandle);
    fn is_playing(&self, handle: SoundHandle) -> bool;
}

/// Collects commands during a system run; [`BufferedSink::flush`] writes
/// them out as messages.
pub struct BufferedSink<'a> {
    handles: &'a mut SoundHandles,
    pub particles: Vec<ParticleCmd>,
    pub audio: Vec<AudioCmd>,
}

impl<'a> BufferedSink<'a> {
    pub fn new(handles: &'a mut SoundHandles) -> Self {
        Self {
            handles,
            particles: Vec::new(),
            audio: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty() && self.audio.is_empty()
    }

    pub fn flush(self, particles: &mut MessageWriter<ParticleCmd>, audio: &mut MessageWriter<AudioCmd>) {
        particles.write_batch(self.particles);
        audio.write_batch(self.audio);
    }
}

impl EffectSink for BufferedSink<'_> {
    fn spawn_particle(&mut self, cmd: ParticleCmd) {
        self.particles.push(cmd);
    }

    fn play_sound(&mut self, request: SoundRequest) -> SoundHandle {
        let handle = self.handles.allocate();
        self.audio.push(AudioCmd::Play { handle, request });
        handle
    }

    fn stop_sound(&mut self, handle: SoundHandle) {
        self.handles.release(handle);
        self.audio.push(AudioCmd::Stop { handle });
    }

    fn is_playing(&self, handle: SoundHandle) -> bool {
        self.handles.is_playing(handle)
    }
}

/// What one dispatch fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fired {
    pub particles: u32,
    pub sounds: u32,
}

/// Roll the effects and the sound of `profile` for the cell at `pos`.
///
/// Conditions are evaluated against `region`, the region containing `pos`.
/// The sound is a one-shot at the cell center.
pub fn dispatch_cell_effects(
    world: &dyn WorldAccess,
    pos: CellPos,
    profile: &EffectProfile,
    region: &RegionProfile,
    rng: &mut Rng,
    sink: &mut dyn EffectSink,
) -> Fired {
    let mut fired = Fired::default();
    for effect in profile.effects() {
        if effect.can_trigger(world, pos, region, rng) {
            sink.spawn_particle(effect.do_effect(world, pos, region, rng));
            fired.particles += 1;
        }
    }
    if let Some(sound) = profile.sound_to_play(rng, region) {
        sink.play_sound(sound.request_at(pos, rng));
        fired.sounds += 1;
    }
    fired
}

/// Advance the ECS message queue for [`ParticleCmd`].
pub fn update_particle_messages(mut msgs: ResMut<Messages<ParticleCmd>>) {
    msgs.update();
}
