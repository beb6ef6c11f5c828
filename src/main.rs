//! ambientfx demo host.
//!
//! Runs the effect engine headless against a small generated world:
//! - **bevy_ecs** schedules the scanner, region sounds and reloads
//! - a logging audio backend stands in for a real mixer
//! - particle commands are written to the log
//!
//! # Main Loop
//!
//! 1. Load `effects.ini` (missing file means defaults) and the rule documents
//! 2. Build the demo world, install resources and observers
//! 3. Spawn a listener that walks a circle through every region
//! 4. Run the tick schedule; break a block and reload the rules on request
//! 5. Join the audio and reload threads on exit
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --ticks 400 --reload-at 200
//! ```

use std::path::PathBuf;
use std::time::Duration;

use bevy_ecs::prelude::*;
use clap::Parser;

use ambientfx::components::ambientlistener::AmbientListener;
use ambientfx::components::cellposition::CellPos;
use ambientfx::components::scanner::EffectScanner;
use ambientfx::demo::{SPAWN, demo_palette, demo_regions, demo_world, log_particles, walk_listeners};
use ambientfx::engine;
use ambientfx::events::blockbroken::BlockBrokenEvent;
use ambientfx::events::reload::ReloadRequestEvent;
use ambientfx::resources::audio::{LogAudioBackend, setup_audio, shutdown_audio};
use ambientfx::resources::effectsconfig::EffectsConfig;
use ambientfx::resources::profiles::{EffectProfiles, ProfileSources, load_from_disk};
use ambientfx::resources::reload::{setup_reload, shutdown_reload};
use ambientfx::resources::world::{WorldAccess, WorldHandle};
use ambientfx::systems::dispatch::update_particle_messages;
use ambientfx::systems::scanner::scan_effects;
use ambientfx::systems::time::advance_world_time;

/// Ambient block and region effects, headless.
#[derive(Parser)]
#[command(version, about = "Runs the ambient effect engine against a generated world.")]
struct Cli {
    /// Settings file.
    #[arg(long, value_name = "PATH", default_value = "./effects.ini")]
    config: PathBuf,

    /// Rule directory, overrides the one in the settings file.
    #[arg(long, value_name = "DIR")]
    rules: Option<PathBuf>,

    /// Number of ticks to run.
    #[arg(long, default_value_t = 200)]
    ticks: u64,

    /// Milliseconds between ticks.
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,

    /// Trigger a rule reload at this tick.
    #[arg(long, value_name = "TICK")]
    reload_at: Option<u64>,

    /// Break the lava cell next to the spawn at this tick.
    #[arg(long, value_name = "TICK")]
    break_at: Option<u64>,

    /// Write the effective settings to the config path and exit.
    #[arg(long)]
    dump_config: bool,

    /// Print the loaded region and state profiles and exit.
    #[arg(long)]
    report: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut settings = EffectsConfig::with_path(&cli.config);
    if let Err(e) = settings.load_from_file() {
        log::info!("{}; using default settings", e);
    }
    if let Some(dir) = cli.rules {
        settings.rules_dir = dir;
    }

    // Early-exit: write settings and quit
    if cli.dump_config {
        if let Err(e) = settings.save_to_file() {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
        println!("Settings written to {}", settings.config_path.display());
        return;
    }

    let palette = demo_palette();
    let sources = ProfileSources::new(palette.clone(), demo_regions());
    let profiles = match load_from_disk(&sources, &settings) {
        Ok(p) => p,
        Err(e) => {
            log::error!("Failed to load effect rules: {}", e);
            EffectProfiles::empty(&sources, &settings)
        }
    };

    // Early-exit: print what was loaded
    if cli.report {
        for region in profiles.regions.iter() {
            println!("{region}\n");
        }
        for (state, profile) in profiles.states.interesting_states() {
            println!("{} {}", palette.describe(state), profile);
        }
        return;
    }

    let grid = demo_world(&palette);
    let access = WorldHandle::new(grid);
    let lava_cell = CellPos::new(8, 62, -6);
    let lava_state = access.0.cell_state(lava_cell);

    let mut world = World::new();
    engine::install(&mut world, settings, sources, access, profiles);
    setup_audio(&mut world, LogAudioBackend::default());
    setup_reload(&mut world);

    world.spawn((SPAWN, EffectScanner::new(), AmbientListener::new()));
    world.flush();

    let mut update = engine::tick_schedule();
    update.add_systems(walk_listeners.after(advance_world_time).before(scan_effects));
    update.add_systems(log_particles.after(scan_effects).before(update_particle_messages));
    if let Err(e) = update.initialize(&mut world) {
        log::error!("Failed to build the tick schedule: {}", e);
        std::process::exit(1);
    }

    log::info!("Running {} ticks", cli.ticks);
    for tick in 0..cli.ticks {
        if cli.break_at == Some(tick) {
            world.trigger(BlockBrokenEvent {
                pos: lava_cell,
                state: lava_state,
            });
        }
        if cli.reload_at == Some(tick) {
            world.trigger(ReloadRequestEvent {});
        }
        update.run(&mut world);
        world.clear_trackers();
        std::thread::sleep(Duration::from_millis(cli.tick_ms));
    }

    shutdown_reload(&mut world);
    shutdown_audio(&mut world);
    log::info!("Done");
}
