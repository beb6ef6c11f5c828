//! Engine integration tests: scanning, dispatch, block breaking and reloads
//! driven through bevy_ecs schedules.

use std::sync::Arc;
use std::time::Duration;

use bevy_ecs::prelude::*;
use bevy_ecs::system::SystemState;
use crossbeam_channel::unbounded;

use ambientfx::components::ambientlistener::AmbientListener;
use ambientfx::components::cellposition::CellPos;
use ambientfx::components::scanner::EffectScanner;
use ambientfx::engine;
use ambientfx::events::audio::{AudioCmd, RepeatPolicy, SoundAnchor};
use ambientfx::events::blockbroken::BlockBrokenEvent;
use ambientfx::events::particle::ParticleCmd;
use ambientfx::events::reload::{ProfilesReloaded, ReloadRequestEvent};
use ambientfx::resources::blockeffect::BlockEffectKind;
use ambientfx::resources::config::{LoadError, RuleDocument};
use ambientfx::resources::effectprofile::EffectProfile;
use ambientfx::resources::effectsconfig::EffectsConfig;
use ambientfx::resources::palette::{CellState, MaterialClass, MaterialPalette};
use ambientfx::resources::profiles::{ActiveProfiles, ProfileSources, load_profiles};
use ambientfx::resources::region::RegionParams;
use ambientfx::resources::reload::{ReloadBridge, ReloadResult, setup_reload, shutdown_reload};
use ambientfx::resources::resourcekey::ResourceKey;
use ambientfx::resources::soundeffect::SoundCatalog;
use ambientfx::resources::world::{GridWorld, RegionId, WorldHandle};
use ambientfx::systems::regionsound::update_region_sounds;
use ambientfx::systems::reload::apply_reloaded_profiles;
use ambientfx::systems::scanner::scan_effects;

const LAVA_RULES: &str = r#"{
    "blocks":[{"blocks":["core:lava"],"chance":1,
               "sounds":[{"sound":"core:lava_pop"}],
               "effects":[{"effect":"fire","chance":1}]}],
    "biomes":[{"conditions":"biome.isWet","sounds":[{"sound":"core:frogs","soundType":"background"}]}]
}"#;

fn sources() -> ProfileSources {
    let mut palette = MaterialPalette::new();
    palette.register_named("core:stone", MaterialClass::Solid, 1).unwrap();
    palette.register_named("core:lava", MaterialClass::Lava, 1).unwrap();
    let regions = vec![
        RegionParams::new(RegionId(0), ResourceKey::parse("core:marsh").unwrap(), "Marsh")
            .with_tags(&["swamp", "wet"]),
    ];
    ProfileSources::new(Arc::new(palette), regions)
}

fn lava(sources: &ProfileSources) -> CellState {
    sources.palette.state("core:lava", 0).unwrap()
}

/// A lava sheet at y = 0 with air above, loaded well past the far range.
fn lava_world(sources: &ProfileSources) -> GridWorld {
    let mut world = GridWorld::new(sources.palette.clone(), RegionId(0));
    world.load_area(CellPos::new(-48, -48, -48), CellPos::new(47, 47, 47));
    world.fill(CellPos::new(-48, 0, -48), CellPos::new(47, 0, 47), lava(sources));
    world
}

fn make_world(rules: &str, settings: EffectsConfig) -> World {
    let sources = sources();
    let docs = [RuleDocument::parse("test", rules).unwrap()];
    let profiles = load_profiles(&sources, &settings, &SoundCatalog::default(), &docs);
    let access = WorldHandle::new(lava_world(&sources));
    let mut world = World::new();
    engine::install(&mut world, settings, sources, access, profiles);
    world
}

fn settings(iterations: u32) -> EffectsConfig {
    let mut settings = EffectsConfig::new();
    settings.iterations = iterations;
    settings
}

fn tick_scanner(world: &mut World) {
    let mut schedule = Schedule::default();
    schedule.add_systems(scan_effects);
    schedule.run(world);
}

fn particles(world: &mut World) -> Vec<ParticleCmd> {
    let mut state = SystemState::<MessageReader<ParticleCmd>>::new(world);
    let mut reader = state.get_mut(world);
    reader.read().cloned().collect()
}

fn audio(world: &mut World) -> Vec<AudioCmd> {
    let mut state = SystemState::<MessageReader<AudioCmd>>::new(world);
    let mut reader = state.get_mut(world);
    reader.read().cloned().collect()
}

#[test]
fn scanner_fires_every_interesting_sample() {
    let mut world = make_world(LAVA_RULES, settings(50));
    let scanner = world.spawn((CellPos::new(0, 0, 0), EffectScanner::new())).id();

    tick_scanner(&mut world);

    let stats = world.get::<EffectScanner>(scanner).unwrap().last;
    assert_eq!(world.get::<EffectScanner>(scanner).unwrap().passes, 1);
    assert_eq!(stats.samples, 100);
    assert_eq!(stats.unloaded, 0);
    assert!(stats.interesting > 0);

    let fired = particles(&mut world);
    assert_eq!(fired.len(), stats.interesting as usize);
    assert!(fired.iter().all(|p| p.kind == BlockEffectKind::Fire));
    assert!(fired.iter().all(|p| p.origin[1] == 1.0));

    let sounds = audio(&mut world);
    assert_eq!(sounds.len(), stats.interesting as usize);
    for cmd in &sounds {
        match cmd {
            AudioCmd::Play { request, .. } => {
                assert_eq!(request.sound.path(), "lava_pop");
                assert_eq!(request.repeat, RepeatPolicy::Once);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

#[test]
fn default_scanner_settings_find_the_lava() {
    let mut world = make_world(LAVA_RULES, EffectsConfig::new());
    let scanner = world.spawn((CellPos::new(0, 0, 0), EffectScanner::new())).id();

    tick_scanner(&mut world);

    let scanned = world.get::<EffectScanner>(scanner).unwrap();
    assert_eq!(scanned.passes, 1);
    let stats = scanned.last;
    assert_eq!(stats.samples, 2 * 667);
    assert_eq!(stats.unloaded, 0);
    assert!(stats.interesting > 0);
    assert_eq!(particles(&mut world).len(), stats.interesting as usize);
}

#[test]
fn scanner_skips_unloaded_locus() {
    let mut world = make_world(LAVA_RULES, settings(40));
    let scanner = world.spawn((CellPos::new(5000, 0, 5000), EffectScanner::new())).id();

    tick_scanner(&mut world);

    let stats = world.get::<EffectScanner>(scanner).unwrap().last;
    assert_eq!(stats.samples, 80);
    assert_eq!(stats.unloaded, 80);
    assert!(particles(&mut world).is_empty());
    assert!(audio(&mut world).is_empty());
}

#[test]
fn scanner_honors_scan_interval() {
    let mut config = settings(5);
    config.scan_interval = 3;
    let mut world = make_world(LAVA_RULES, config);
    let scanner = world.spawn((CellPos::new(0, 0, 0), EffectScanner::new())).id();

    for _ in 0..4 {
        tick_scanner(&mut world);
    }
    assert_eq!(world.get::<EffectScanner>(scanner).unwrap().passes, 2);
}

#[test]
fn empty_rules_fire_nothing() {
    let mut world = make_world("{}", settings(200));
    let scanner = world.spawn((CellPos::new(0, 0, 0), EffectScanner::new())).id();

    tick_scanner(&mut world);

    assert_eq!(world.get::<EffectScanner>(scanner).unwrap().last.interesting, 0);
    assert!(particles(&mut world).is_empty());
    assert!(audio(&mut world).is_empty());

    let snapshot = world.resource::<ActiveProfiles>().snapshot();
    let src = world.resource::<ProfileSources>().clone();
    for state in src.palette.states() {
        assert!(EffectProfile::is_empty_profile(snapshot.states.lookup(state)));
    }
}

#[test]
fn disabled_effect_kind_is_never_spawned() {
    let mut config = settings(50);
    config.disabled_effects.insert(BlockEffectKind::Fire);
    let mut world = make_world(LAVA_RULES, config);
    world.spawn((CellPos::new(0, 0, 0), EffectScanner::new()));

    tick_scanner(&mut world);

    assert!(particles(&mut world).is_empty());
    assert!(!audio(&mut world).is_empty());
}

#[test]
fn lookup_returns_the_same_profile() {
    let world = make_world(LAVA_RULES, settings(1));
    let snapshot = world.resource::<ActiveProfiles>().snapshot();
    let state = lava(world.resource::<ProfileSources>());
    let a = snapshot.states.lookup(state);
    let b = snapshot.states.lookup(state);
    assert!(Arc::ptr_eq(a, b));
    assert!(a.has_sounds_or_effects());
}

#[test]
fn block_broken_observer_dispatches_once() {
    let mut world = make_world(LAVA_RULES, settings(1));
    let state = lava(world.resource::<ProfileSources>());

    world.trigger(BlockBrokenEvent {
        pos: CellPos::new(3, 0, 3),
        state,
    });

    let fired = particles(&mut world);
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].origin, [3.5, 1.0, 3.5]);
    assert_eq!(audio(&mut world).len(), 1);
}

#[test]
fn block_broken_with_uninteresting_state_is_silent() {
    let mut world = make_world(LAVA_RULES, settings(1));
    let stone = world
        .resource::<ProfileSources>()
        .palette
        .state("core:stone", 0)
        .unwrap();

    world.trigger(BlockBrokenEvent {
        pos: CellPos::new(0, 0, 0),
        state: stone,
    });

    assert!(particles(&mut world).is_empty());
    assert!(audio(&mut world).is_empty());
}

#[test]
fn listener_starts_region_background_sound() {
    let mut world = make_world(LAVA_RULES, settings(1));
    let listener = world
        .spawn((CellPos::new(0, 1, 0), AmbientListener::new()))
        .id();

    let mut schedule = Schedule::default();
    schedule.add_systems(update_region_sounds);
    schedule.run(&mut world);

    let cmds = audio(&mut world);
    let tracking: Vec<_> = cmds
        .iter()
        .filter_map(|c| match c {
            AudioCmd::Play { request, .. } if request.anchor == SoundAnchor::Tracking(listener) => {
                Some(request)
            }
            _ => None,
        })
        .collect();
    assert_eq!(tracking.len(), 1);
    assert_eq!(tracking[0].sound.path(), "frogs");
    assert_eq!(world.get::<AmbientListener>(listener).unwrap().playing_count(), 1);
}

fn manual_bridge(world: &mut World) -> crossbeam_channel::Sender<ReloadResult> {
    let (tx_job, _rx_job) = unbounded();
    let (tx_done, rx_done) = unbounded();
    world.insert_resource(ReloadBridge {
        tx_job,
        rx_done,
        handle: std::thread::spawn(|| {}),
    });
    tx_done
}

#[test]
fn failed_reload_keeps_current_snapshot() {
    let mut world = make_world(LAVA_RULES, settings(1));
    let tx_done = manual_bridge(&mut world);
    let before = world.resource::<ActiveProfiles>().generation();

    let mut schedule = Schedule::default();
    schedule.add_systems(apply_reloaded_profiles);

    tx_done.send(Err(LoadError::WorkerGone)).unwrap();
    schedule.run(&mut world);
    assert_eq!(world.resource::<ActiveProfiles>().generation(), before);

    let src = world.resource::<ProfileSources>().clone();
    let docs = [RuleDocument::parse("empty", "{}").unwrap()];
    let fresh = load_profiles(&src, &EffectsConfig::new(), &SoundCatalog::default(), &docs);
    let generation = fresh.generation;
    tx_done.send(Ok(fresh)).unwrap();
    schedule.run(&mut world);
    assert_eq!(world.resource::<ActiveProfiles>().generation(), generation);

    // the lava rules are gone after the swap
    let snapshot = world.resource::<ActiveProfiles>().snapshot();
    assert!(EffectProfile::is_empty_profile(snapshot.states.lookup(lava(&src))));
    let scanner = world.spawn((CellPos::new(0, 0, 0), EffectScanner::new())).id();
    tick_scanner(&mut world);
    assert_eq!(world.get::<EffectScanner>(scanner).unwrap().passes, 1);
    assert_eq!(world.get::<EffectScanner>(scanner).unwrap().last.interesting, 0);
    assert!(particles(&mut world).is_empty());
    assert!(audio(&mut world).is_empty());

    let mut state = SystemState::<MessageReader<ProfilesReloaded>>::new(&mut world);
    let mut reader = state.get_mut(&mut world);
    let reloaded: Vec<ProfilesReloaded> = reader.read().copied().collect();
    assert_eq!(reloaded, vec![ProfilesReloaded { generation }]);
}

#[test]
fn reload_thread_applies_overlay_with_sound_reset() {
    let dir = std::env::temp_dir().join(format!("ambientfx_reload_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("50-lava.json"),
        r#"{"blocks":[{"blocks":["core:lava"],"soundReset":true,"sounds":[{"sound":"core:hiss"}]}]}"#,
    )
    .unwrap();

    let mut config = settings(1);
    config.rules_dir = dir.clone();
    config.use_defaults = true;
    let mut world = make_world(LAVA_RULES, config);
    setup_reload(&mut world);
    let before = world.resource::<ActiveProfiles>().generation();

    let mut schedule = Schedule::default();
    schedule.add_systems(apply_reloaded_profiles);

    world.trigger(ReloadRequestEvent {});
    for _ in 0..400 {
        schedule.run(&mut world);
        if world.resource::<ActiveProfiles>().generation() != before {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    shutdown_reload(&mut world);
    std::fs::remove_dir_all(&dir).ok();

    assert_ne!(world.resource::<ActiveProfiles>().generation(), before);
    let snapshot = world.resource::<ActiveProfiles>().snapshot();
    let profile = snapshot.states.lookup(lava(world.resource::<ProfileSources>()));
    assert_eq!(profile.sounds().len(), 1);
    assert_eq!(profile.sounds()[0].key.path(), "hiss");
}
