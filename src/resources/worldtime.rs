//! Tick clock shared by the effect systems.

use bevy_ecs::prelude::Resource;

#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorldTime {
    /// Ticks run since startup.
    pub tick: u64,
    /// While set, no effects are scanned or played.
    pub paused: bool,
}

impl WorldTime {
    pub fn is_running(&self) -> bool {
        !self.paused
    }
}
