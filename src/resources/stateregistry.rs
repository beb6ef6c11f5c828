//! Cell state to effect profile registry.
//!
//! Rules are registered against cell patterns: `ns:name` matches every
//! variant of a material, `ns:name[N]` only variant `N`. Once registration is
//! done the builder is turned into a [`StateProfileRegistry`], which resolves
//! each state at most once (exact match, then generic match, then the empty
//! profile) and caches the answer in a write-once slot indexed by the state's
//! palette ordinal.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

use log::{info, warn};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::resources::blockeffect::BlockEffect;
use crate::resources::config::BlockConfig;
use crate::resources::effectprofile::{EffectProfile, EffectProfileBuilder};
use crate::resources::loadcontext::LoadContext;
use crate::resources::palette::{CellState, MaterialId, MaterialPalette, SharedPalette};
use crate::resources::resourcekey::ResourceKey;
use crate::resources::soundeffect::{SoundCategory, SoundEffect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateMatcher {
    /// One specific state.
    Exact(CellState),
    /// Every variant of a material.
    Generic(MaterialId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("malformed cell pattern '{0}'")]
    Malformed(String),
    #[error("unknown material in '{0}'")]
    UnknownMaterial(String),
    #[error("variant out of range in '{0}'")]
    UnknownVariant(String),
    #[error("the void cell cannot carry effects")]
    Void,
}

impl StateMatcher {
    pub fn parse(palette: &MaterialPalette, pattern: &str) -> Result<Self, PatternError> {
        let pattern = pattern.trim();
        let malformed = || PatternError::Malformed(pattern.to_string());

        let (name, variant) = match pattern.strip_suffix(']') {
            Some(head) => {
                let (name, variant) = head.split_once('[').ok_or_else(malformed)?;
                let variant: u16 = variant.trim().parse().map_err(|_| malformed())?;
                (name, Some(variant))
            }
            None => (pattern, None),
        };

        let key = ResourceKey::parse(name).map_err(|_| malformed())?;
        let material = palette
            .get(&key)
            .ok_or_else(|| PatternError::UnknownMaterial(pattern.to_string()))?;
        if material == CellState::VOID.material {
            return Err(PatternError::Void);
        }

        match variant {
            None => Ok(StateMatcher::Generic(material)),
            Some(v) => {
                let state = CellState::new(material, v);
                palette
                    .index_of(state)
                    .map(|_| StateMatcher::Exact(state))
                    .ok_or_else(|| PatternError::UnknownVariant(pattern.to_string()))
            }
        }
    }
}

/// Collects rules before the registry is frozen.
pub struct StateRegistryBuilder {
    palette: SharedPalette,
    profiles: FxHashMap<StateMatcher, EffectProfileBuilder>,
}

impl StateRegistryBuilder {
    pub fn new(palette: SharedPalette) -> Self {
        Self {
            palette,
            profiles: FxHashMap::default(),
        }
    }

    /// Merge one block rule into the profiles of its patterns.
    ///
    /// Resets clear the existing list before the entry's own items are
    /// appended. Bad patterns and items are logged and skipped.
    pub fn register(&mut self, entry: &BlockConfig, ctx: &mut LoadContext) {
        if entry.blocks.is_empty() {
            return;
        }

        let sounds: Vec<SoundEffect> = entry
            .sounds
            .iter()
            .filter_map(|cfg| SoundEffect::from_config(cfg, Some(SoundCategory::Blocks), ctx))
            .collect();
        let effects: Vec<BlockEffect> = entry
            .effects
            .iter()
            .filter_map(|cfg| BlockEffect::from_config(cfg, ctx))
            .collect();

        for pattern in &entry.blocks {
            let matcher = match StateMatcher::parse(&self.palette, pattern) {
                Ok(m) => m,
                Err(e) => {
                    warn!("Unknown block [{}] in block config file: {}", pattern, e);
                    ctx.skip();
                    continue;
                }
            };

            let profile = self.profiles.entry(matcher).or_default();
            if entry.sound_reset.unwrap_or(false) {
                profile.clear_sounds();
            }
            if entry.effect_reset.unwrap_or(false) {
                profile.clear_effects();
            }
            if let Some(chance) = entry.chance {
                profile.set_chance(chance);
            }
            for sound in &sounds {
                profile.add_sound(sound.clone());
            }
            for effect in &effects {
                profile.add_effect(effect.clone());
            }
        }
    }

    pub fn entries(&self) -> usize {
        self.profiles.len()
    }

    pub fn build(self, default_chance: u32, warn_limit: u32) -> StateProfileRegistry {
        let matchers: FxHashMap<StateMatcher, Arc<EffectProfile>> = self
            .profiles
            .into_iter()
            .map(|(m, b)| (m, Arc::new(b.build(default_chance))))
            .collect();
        let table: Box<[OnceLock<Arc<EffectProfile>>]> =
            (0..self.palette.state_count()).map(|_| OnceLock::new()).collect();
        if let Some(void) = self.palette.index_of(CellState::VOID) {
            let _ = table[void].set(EffectProfile::empty().clone());
        }
        StateProfileRegistry {
            palette: self.palette,
            entries: matchers.len(),
            matchers: Some(matchers),
            table,
            unknown_warnings: AtomicU32::new(0),
            warn_limit,
        }
    }
}

/// Counts reported by [`StateProfileRegistry::prime`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrimeStats {
    pub states: usize,
    pub with_effects: usize,
}

pub struct StateProfileRegistry {
    palette: SharedPalette,
    matchers: Option<FxHashMap<StateMatcher, Arc<EffectProfile>>>,
    table: Box<[OnceLock<Arc<EffectProfile>>]>,
    unknown_warnings: AtomicU32,
    warn_limit: u32,
    entries: usize,
}

impl StateProfileRegistry {
    /// Registry with no rules: every state maps to the empty profile.
    pub fn empty(palette: SharedPalette) -> Self {
        StateRegistryBuilder::new(palette).build(0, 0)
    }

    pub fn palette(&self) -> &SharedPalette {
        &self.palette
    }

    /// Number of distinct patterns that were registered.
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Profile of `state`. Always returns the same `Arc` for the same state.
    pub fn lookup(&self, state: CellState) -> &Arc<EffectProfile> {
        match self.palette.index_of(state) {
            Some(idx) => self.table[idx].get_or_init(|| self.resolve(state)),
            None => {
                self.warn_unknown(state);
                EffectProfile::empty()
            }
        }
    }

    fn resolve(&self, state: CellState) -> Arc<EffectProfile> {
        let Some(matchers) = &self.matchers else {
            self.warn_unknown(state);
            return EffectProfile::empty().clone();
        };
        matchers
            .get(&StateMatcher::Exact(state))
            .or_else(|| matchers.get(&StateMatcher::Generic(state.material)))
            .cloned()
            .unwrap_or_else(|| EffectProfile::empty().clone())
    }

    fn warn_unknown(&self, state: CellState) {
        let seen = self.unknown_warnings.fetch_add(1, Ordering::Relaxed);
        if seen < self.warn_limit {
            warn!(
                "Unknown cell state encountered '{}'",
                self.palette.describe(state)
            );
        } else if seen == self.warn_limit && self.warn_limit > 0 {
            warn!("Further unknown cell state warnings suppressed");
        }
    }

    /// Resolve every palette state now.
    pub fn prime(&self) -> PrimeStats {
        let mut stats = PrimeStats::default();
        for state in self.palette.states() {
            stats.states += 1;
            if self.lookup(state).has_sounds_or_effects() {
                stats.with_effects += 1;
            }
        }
        stats
    }

    /// Drop the registration map. Unresolved states resolve to the empty
    /// profile from now on.
    pub fn complete(&mut self) {
        if let Some(matchers) = self.matchers.take() {
            info!(
                "[State Registry] {} cell states, {} registry entries",
                self.palette.state_count(),
                matchers.len()
            );
        }
    }

    pub fn is_complete(&self) -> bool {
        self.matchers.is_none()
    }

    /// States that carry effects, with their profiles, in palette order.
    pub fn interesting_states(&self) -> impl Iterator<Item = (CellState, &Arc<EffectProfile>)> + '_ {
        self.palette
            .states()
            .map(|s| (s, self.lookup(s)))
            .filter(|(_, p)| p.has_sounds_or_effects())
    }
}
