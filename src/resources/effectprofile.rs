//! What a cell state can do: sounds it may play and effects it may show.

use std::fmt;
use std::sync::{Arc, LazyLock};

use fastrand::Rng;

use crate::expression::{ConditionSubject, Conditional};
use crate::resources::blockeffect::BlockEffect;
use crate::resources::soundeffect::SoundEffect;
use crate::weighttable::WeightTable;

static EMPTY: LazyLock<Arc<EffectProfile>> = LazyLock::new(|| {
    Arc::new(EffectProfile {
        sounds: Vec::new(),
        effects: Vec::new(),
        chance: 0,
    })
});

/// Immutable profile shared by every state it was resolved for.
#[derive(Debug)]
pub struct EffectProfile {
    sounds: Vec<Arc<SoundEffect>>,
    effects: Vec<BlockEffect>,
    /// 1-in-`chance` odds that a scanned cell plays a sound.
    chance: u32,
}

impl EffectProfile {
    /// The shared "no effects" profile.
    pub fn empty() -> &'static Arc<EffectProfile> {
        &EMPTY
    }

    pub fn is_empty_profile(profile: &Arc<EffectProfile>) -> bool {
        Arc::ptr_eq(profile, &EMPTY)
    }

    pub fn has_sounds_or_effects(&self) -> bool {
        !self.sounds.is_empty() || !self.effects.is_empty()
    }

    pub fn sounds(&self) -> &[Arc<SoundEffect>] {
        &self.sounds
    }

    pub fn effects(&self) -> &[BlockEffect] {
        &self.effects
    }

    pub fn chance(&self) -> u32 {
        self.chance
    }

    /// Roll the profile chance and pick one sound whose condition holds for
    /// `subject`, by weight.
    pub fn sound_to_play(&self, rng: &mut Rng, subject: &dyn ConditionSubject) -> Option<&Arc<SoundEffect>> {
        if self.sounds.is_empty() || self.chance == 0 || rng.u32(..self.chance) != 0 {
            return None;
        }
        self.sounds
            .iter()
            .filter(|s| s.is_active(subject))
            .collect::<WeightTable<'_, Arc<SoundEffect>>>()
            .pick(rng)
    }
}

impl fmt::Display for EffectProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chance 1/{}", self.chance)?;
        for sound in &self.sounds {
            write!(f, "\n  sound {}", sound)?;
        }
        for effect in &self.effects {
            write!(f, "\n  effect {}", effect)?;
        }
        Ok(())
    }
}

/// Mutable profile used while rules are registered.
#[derive(Debug, Default, Clone)]
pub struct EffectProfileBuilder {
    sounds: Vec<Arc<SoundEffect>>,
    effects: Vec<BlockEffect>,
    chance: Option<u32>,
}

impl EffectProfileBuilder {
    pub fn clear_sounds(&mut self) {
        self.sounds.clear();
    }

    pub fn clear_effects(&mut self) {
        self.effects.clear();
    }

    pub fn set_chance(&mut self, chance: u32) {
        self.chance = Some(chance);
    }

    pub fn add_sound(&mut self, sound: SoundEffect) {
        self.sounds.push(Arc::new(sound));
    }

    pub fn add_effect(&mut self, effect: BlockEffect) {
        self.effects.push(effect);
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty() && self.effects.is_empty()
    }

    pub fn build(self, default_chance: u32) -> EffectProfile {
        EffectProfile {
            sounds: self.sounds,
            effects: self.effects,
            chance: self.chance.unwrap_or(default_chance),
        }
    }
}
