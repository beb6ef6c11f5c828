//! Headless demo host.
//!
//! Builds a small world out of 16³ chunks: a stone floor with a lake, a lava
//! pool, a forest patch and a cave ceiling, split into four regions. The
//! effects that fire are only logged.

use std::sync::Arc;

use bevy_ecs::prelude::*;
use log::info;

use crate::components::ambientlistener::AmbientListener;
use crate::components::cellposition::CellPos;
use crate::events::particle::ParticleCmd;
use crate::resources::palette::{MaterialClass, MaterialPalette, SharedPalette};
use crate::resources::region::{FogSpec, RegionParams};
use crate::resources::resourcekey::ResourceKey;
use crate::resources::world::{GridWorld, RegionId};
use crate::resources::worldtime::WorldTime;

pub const SPAWN: CellPos = CellPos::new(0, 65, 0);
const FLOOR: i32 = 64;

pub fn demo_palette() -> SharedPalette {
    let mut palette = MaterialPalette::new();
    for (key, class, variants) in [
        ("stone", MaterialClass::Solid, 1),
        ("gravel", MaterialClass::Solid, 1),
        ("sand", MaterialClass::Solid, 1),
        ("dirt", MaterialClass::Solid, 1),
        ("water", MaterialClass::Water, 16),
        ("lava", MaterialClass::Lava, 16),
        ("leaves", MaterialClass::Foliage, 4),
        ("tall_grass", MaterialClass::Foliage, 1),
    ] {
        palette.register(ResourceKey::from_parts("core", key), class, variants);
    }
    Arc::new(palette)
}

fn region(id: u16, path: &str, name: &str) -> RegionParams {
    RegionParams::new(RegionId(id), ResourceKey::from_parts("core", path), name)
}

pub fn demo_regions() -> Vec<RegionParams> {
    vec![
        region(0, "plains", "Plains").with_climate(0.8, 0.4).with_tags(&["plains"]),
        region(1, "forest", "Forest")
            .with_climate(0.7, 0.8)
            .with_tags(&["forest", "dense"]),
        region(2, "desert", "Desert")
            .with_climate(2.0, 0.0)
            .with_tags(&["hot", "dry", "sandy"]),
        RegionParams {
            fog: Some(FogSpec {
                color: [72, 88, 64],
                density: 0.7,
            }),
            ..region(3, "swamp", "Swamp")
                .with_climate(0.8, 0.9)
                .with_tags(&["swamp", "wet"])
        },
    ]
}

fn state(palette: &MaterialPalette, path: &str, variant: u16) -> crate::resources::palette::CellState {
    palette
        .get(&ResourceKey::from_parts("core", path))
        .map(|m| crate::resources::palette::CellState::new(m, variant))
        .unwrap_or(crate::resources::palette::CellState::VOID)
}

/// A world around [`SPAWN`] spanning four chunks in every horizontal
/// direction.
pub fn demo_world(palette: &SharedPalette) -> GridWorld {
    let mut world = GridWorld::new(palette.clone(), RegionId(0));
    let stone = state(palette, "stone", 0);
    let sand = state(palette, "sand", 0);
    let gravel = state(palette, "gravel", 0);
    let water = state(palette, "water", 0);
    let lava = state(palette, "lava", 0);
    let leaves = state(palette, "leaves", 0);
    let old_leaves = state(palette, "leaves", 3);
    let grass = state(palette, "tall_grass", 0);

    world.load_area(CellPos::new(-64, 48, -64), CellPos::new(63, 95, 63));
    world.fill(CellPos::new(-64, 48, -64), CellPos::new(63, FLOOR - 1, 63), stone);

    // lake with a lava vent on its bed
    world.fill(CellPos::new(-20, FLOOR - 4, -20), CellPos::new(-5, FLOOR - 1, -5), water);
    world.set(CellPos::new(-12, FLOOR - 5, -12), lava);
    world.set(CellPos::new(-13, FLOOR - 4, -12), lava);

    // lava pool
    world.fill(CellPos::new(8, FLOOR - 2, -6), CellPos::new(12, FLOOR - 1, -2), lava);

    // forest
    for x in (-40..-24).step_by(4) {
        for z in (10..40).step_by(5) {
            let top = if (x + z) % 3 == 0 { old_leaves } else { leaves };
            world.fill(CellPos::new(x, FLOOR + 3, z), CellPos::new(x + 2, FLOOR + 4, z + 2), top);
            world.set(CellPos::new(x + 3, FLOOR, z), grass);
        }
    }

    // desert floor and a cave ceiling over it
    world.fill(CellPos::new(20, FLOOR - 1, 20), CellPos::new(50, FLOOR - 1, 50), sand);
    world.fill(CellPos::new(24, FLOOR + 8, 24), CellPos::new(44, FLOOR + 9, 44), gravel);

    world.paint_region(-64, 0, -1, 63, RegionId(1));
    world.paint_region(0, 0, 63, 63, RegionId(2));
    world.paint_region(-64, -64, -1, -1, RegionId(3));
    world
}

/// Walk listeners in a circle around the spawn point, crossing every region.
pub fn walk_listeners(mut listeners: Query<&mut CellPos, With<AmbientListener>>, time: Res<WorldTime>) {
    let angle = time.tick as f32 * 0.02;
    let pos = SPAWN.offset(
        (angle.cos() * 40.0).round() as i32,
        0,
        (angle.sin() * 40.0).round() as i32,
    );
    for mut p in listeners.iter_mut() {
        if *p != pos {
            *p = pos;
        }
    }
}

/// Log the particle commands written this tick.
pub fn log_particles(mut reader: MessageReader<ParticleCmd>) {
    for cmd in reader.read() {
        let [x, y, z] = cmd.origin;
        info!(
            "[particle] {} at ({:.1}, {:.1}, {:.1}) {:?}",
            cmd.kind,
            x,
            y,
            z,
            cmd.params.as_slice()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::world::WorldAccess;

    #[test]
    fn test_demo_world_layout() {
        let palette = demo_palette();
        let world = demo_world(&palette);
        assert!(world.is_loaded(SPAWN));
        assert_eq!(world.class_at(CellPos::new(0, FLOOR - 1, 0)), MaterialClass::Solid);
        assert_eq!(world.class_at(CellPos::new(-10, FLOOR - 1, -10)), MaterialClass::Water);
        assert_eq!(world.class_at(CellPos::new(-12, FLOOR - 5, -12)), MaterialClass::Lava);
        assert_eq!(world.region_at(CellPos::new(-30, FLOOR, 20)), RegionId(1));
        assert_eq!(world.region_at(CellPos::new(30, FLOOR, 30)), RegionId(2));
        assert_eq!(world.region_at(CellPos::new(30, FLOOR, -30)), RegionId(0));
        assert_eq!(demo_regions().len(), 4);
    }
}
