//! Sampling the neighborhood of a scanner for block effects.
//!
//! Every due pass draws `iterations` pairs of offsets around the scanner's
//! position: one within the near range and one within the far range. Each
//! axis of an offset is `rand(range) - rand(range)`, so samples cluster near
//! the locus and thin out toward the edge of the range.
//!
//! Positions that are not resident are skipped. Resolved states go through
//! the state registry; only states whose profile has sounds or effects reach
//! the callback.

use std::sync::Arc;

use bevy_ecs::prelude::*;
use fastrand::Rng;

use crate::components::cellposition::CellPos;
use crate::components::scanner::{EffectScanner, ScanStats};
use crate::events::audio::AudioCmd;
use crate::events::particle::ParticleCmd;
use crate::resources::audio::SoundHandles;
use crate::resources::effectprofile::EffectProfile;
use crate::resources::effectsconfig::EffectsConfig;
use crate::resources::palette::CellState;
use crate::resources::profiles::ActiveProfiles;
use crate::resources::stateregistry::StateProfileRegistry;
use crate::resources::world::{WorldAccess, WorldHandle};
use crate::systems::dispatch::{BufferedSink, dispatch_cell_effects};

/// One axis of a center-biased offset in `(-range, range)`.
#[inline]
pub fn sample_axis(rng: &mut Rng, range: i32) -> i32 {
    let range = range.max(1);
    rng.i32(0..range) - rng.i32(0..range)
}

fn sample_offset(rng: &mut Rng, locus: CellPos, range: i32) -> CellPos {
    let dx = sample_axis(rng, range);
    let dy = sample_axis(rng, range);
    let dz = sample_axis(rng, range);
    locus.offset(dx, dy, dz)
}

/// Run one pass around `locus`.
pub fn run_scan_pass<F>(
    world: &dyn WorldAccess,
    states: &StateProfileRegistry,
    locus: CellPos,
    settings: &EffectsConfig,
    rng: &mut Rng,
    mut callback: F,
) -> ScanStats
where
    F: FnMut(CellState, CellPos, &Arc<EffectProfile>, &mut Rng),
{
    let mut stats = ScanStats::default();
    for _ in 0..settings.iterations {
        for range in [settings.near_range, settings.far_range] {
            let pos = sample_offset(rng, locus, range);
            stats.samples += 1;
            if !world.is_loaded(pos) {
                stats.unloaded += 1;
                continue;
            }
            let state = world.cell_state(pos);
            let profile = states.lookup(state);
            if profile.has_sounds_or_effects() {
                stats.interesting += 1;
                callback(state, pos, profile, rng);
            }
        }
    }
    stats
}

/// Scan around every due [`EffectScanner`] and dispatch what fires.
pub fn scan_effects(
    mut scanners: Query<(&CellPos, &mut EffectScanner)>,
    world: Res<WorldHandle>,
    profiles: Res<ActiveProfiles>,
    settings: Res<EffectsConfig>,
    mut handles: ResMut<SoundHandles>,
    mut particles: MessageWriter<ParticleCmd>,
    mut audio: MessageWriter<AudioCmd>,
    mut rng: Local<Rng>,
) {
    let snapshot = profiles.snapshot();
    let world = world.0.clone();
    let mut sink = BufferedSink::new(&mut handles);

    for (locus, mut scanner) in scanners.iter_mut() {
        if !scanner.tick(settings.scan_interval) {
            continue;
        }
        let stats = run_scan_pass(
            world.as_ref(),
            &snapshot.states,
            *locus,
            &settings,
            &mut rng,
            |_, pos, profile, rng| {
                let region = snapshot.region(world.region_at(pos));
                dispatch_cell_effects(world.as_ref(), pos, profile, region, rng, &mut sink);
            },
        );
        scanner.record(stats);
    }

    sink.flush(&mut particles, &mut audio);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::palette::{MaterialClass, MaterialPalette};
    use crate::resources::world::{GridWorld, RegionId};

    #[test]
    fn test_axis_is_center_biased() {
        let mut rng = Rng::with_seed(17);
        let n = 100_000;
        let samples: Vec<i32> = (0..n).map(|_| sample_axis(&mut rng, 16)).collect();
        assert!(samples.iter().all(|v| (-15..=15).contains(v)));
        let near = samples.iter().filter(|v| v.abs() <= 4).count();
        let far = samples.iter().filter(|v| v.abs() >= 11).count();
        assert!(near > 3 * far);
        let mean = samples.iter().map(|v| *v as f64).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.1);
    }

    #[test]
    fn test_unloaded_world_never_calls_back() {
        let palette = Arc::new(MaterialPalette::new());
        let world = GridWorld::new(palette.clone(), RegionId(0));
        let states = StateProfileRegistry::empty(palette);
        let settings = EffectsConfig::new();
        let mut rng = Rng::with_seed(3);
        let mut calls = 0;
        let stats = run_scan_pass(
            &world,
            &states,
            CellPos::new(0, 64, 0),
            &settings,
            &mut rng,
            |_, _, _, _| calls += 1,
        );
        assert_eq!(calls, 0);
        assert_eq!(stats.samples, 2 * 667);
        assert_eq!(stats.unloaded, stats.samples);
    }

    #[test]
    fn test_zero_iterations_is_a_no_op() {
        let mut palette = MaterialPalette::new();
        palette.register_named("core:stone", MaterialClass::Solid, 1).unwrap();
        let palette = Arc::new(palette);
        let world = GridWorld::new(palette.clone(), RegionId(0));
        let states = StateProfileRegistry::empty(palette);
        let mut settings = EffectsConfig::new();
        settings.iterations = 0;
        let mut rng = Rng::with_seed(3);
        let stats = run_scan_pass(&world, &states, CellPos::default(), &settings, &mut rng, |_, _, _, _| {
            unreachable!()
        });
        assert_eq!(stats, ScanStats::default());
    }
}
