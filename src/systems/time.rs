//! Tick update system and run condition.
//!
//! [`advance_world_time`] runs first in the tick schedule; the effect systems
//! are gated on [`world_is_running`].
use bevy_ecs::prelude::*;

use crate::resources::worldtime::WorldTime;

/// Count one tick unless paused.
pub fn advance_world_time(mut time: ResMut<WorldTime>) {
    if time.is_running() {
        time.tick += 1;
    }
}

/// Run condition: `true` while the clock is not paused.
pub fn world_is_running(time: Res<WorldTime>) -> bool {
    time.is_running()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paused_clock_does_not_advance() {
        let mut world = World::new();
        world.insert_resource(WorldTime::default());
        let mut schedule = Schedule::default();
        schedule.add_systems(advance_world_time);
        schedule.run(&mut world);
        schedule.run(&mut world);
        assert_eq!(world.resource::<WorldTime>().tick, 2);
        world.resource_mut::<WorldTime>().paused = true;
        schedule.run(&mut world);
        assert_eq!(world.resource::<WorldTime>().tick, 2);
    }
}
