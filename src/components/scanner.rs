//! Marks the entity whose surroundings are scanned for block effects.
//!
//! The entity also needs a [`CellPos`](crate::components::cellposition::CellPos),
//! which is the locus of every pass. Scan settings come from the
//! [`EffectsConfig`](crate::resources::effectsconfig::EffectsConfig) resource.

use bevy_ecs::prelude::Component;

/// Counters of one scan pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Offsets drawn.
    pub samples: u32,
    /// Samples that hit a position that is not resident.
    pub unloaded: u32,
    /// Samples whose state has sounds or effects.
    pub interesting: u32,
}

#[derive(Component, Debug, Clone, Default)]
pub struct EffectScanner {
    countdown: u32,
    pub passes: u64,
    pub last: ScanStats,
}

impl EffectScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one tick. `true` when a pass is due.
    pub fn tick(&mut self, interval: u32) -> bool {
        if self.countdown > 0 {
            self.countdown -= 1;
            return false;
        }
        self.countdown = interval.max(1) - 1;
        true
    }

    pub fn record(&mut self, stats: ScanStats) {
        self.passes += 1;
        self.last = stats;
    }
}
