//! The entity that hears region sounds.
//!
//! Holds the ambient sounds currently playing for it, keyed by sound id, so
//! the region sound system can stop the ones whose condition no longer holds
//! and restart the ones that ended.

use bevy_ecs::prelude::Component;
use rustc_hash::FxHashMap;

use crate::events::audio::SoundHandle;
use crate::resources::resourcekey::ResourceKey;
use crate::resources::world::RegionId;

#[derive(Component, Debug, Clone, Default)]
pub struct AmbientListener {
    countdown: u32,
    /// Region of the last update.
    pub region: Option<RegionId>,
    /// Snapshot generation the playing sounds were chosen from.
    pub generation: u64,
    playing: FxHashMap<ResourceKey, SoundHandle>,
}

impl AmbientListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one tick. `true` when an update is due.
    pub fn tick(&mut self, interval: u32) -> bool {
        if self.countdown > 0 {
            self.countdown -= 1;
            return false;
        }
        self.countdown = interval.max(1) - 1;
        true
    }

    pub fn handle(&self, key: &ResourceKey) -> Option<SoundHandle> {
        self.playing.get(key).copied()
    }

    pub fn insert(&mut self, key: ResourceKey, handle: SoundHandle) {
        self.playing.insert(key, handle);
    }

    /// Keep only the entries for which `keep` returns `true`; the removed
    /// handles are returned.
    pub fn retain(&mut self, mut keep: impl FnMut(&ResourceKey, SoundHandle) -> bool) -> Vec<SoundHandle> {
        let mut dropped = Vec::new();
        self.playing.retain(|k, h| {
            let kept = keep(k, *h);
            if !kept {
                dropped.push(*h);
            }
            kept
        });
        dropped
    }

    pub fn playing_count(&self) -> usize {
        self.playing.len()
    }

    pub fn playing_keys(&self) -> impl Iterator<Item = &ResourceKey> {
        self.playing.keys()
    }
}
