//! Particle spawn commands.
//!
//! The engine does not render anything. Block effects write
//! [`ParticleCmd`] messages and the host's particle backend reads them.

use arrayvec::ArrayVec;
use bevy_ecs::message::Message;

use crate::resources::blockeffect::BlockEffectKind;

/// Kind-specific parameters (strength, height, color...).
pub type ParticleParams = ArrayVec<f32, 4>;

#[derive(Message, Debug, Clone, PartialEq)]
pub struct ParticleCmd {
    pub kind: BlockEffectKind,
    /// World position the effect originates from.
    pub origin: [f32; 3],
    pub params: ParticleParams,
}
