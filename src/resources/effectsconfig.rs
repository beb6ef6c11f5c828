//! Engine settings resource.
//!
//! Loaded from an INI file. Every value has a default, so a missing file or a
//! missing key is never an error.
//!
//! # Configuration File Format
//!
//! ```ini
//! [scanner]
//! near_range = 16
//! far_range = 32
//! iterations = 667
//! interval = 1
//!
//! [regions]
//! scan_interval = 4
//! ; spot_chance = 250
//!
//! [blocks]
//! default_chance = 1000
//!
//! [effects]
//! disabled = fountain, splash
//!
//! [sounds]
//! blocked = core:cave_groan
//!
//! [rules]
//! directory = ./effects
//! defaults = true
//!
//! [logging]
//! unknown_state_warnings = 10
//! ```

use std::path::PathBuf;

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{info, warn};
use rustc_hash::FxHashSet;

use crate::resources::blockeffect::BlockEffectKind;
use crate::resources::resourcekey::ResourceKey;

const DEFAULT_NEAR_RANGE: i32 = 16;
const DEFAULT_FAR_RANGE: i32 = 32;
const DEFAULT_ITERATIONS: u32 = 667;
const DEFAULT_SCAN_INTERVAL: u32 = 1;
const DEFAULT_REGION_INTERVAL: u32 = 4;
const DEFAULT_BLOCK_CHANCE: u32 = 1000;
const DEFAULT_UNKNOWN_STATE_WARNINGS: u32 = 10;
const DEFAULT_CONFIG_PATH: &str = "./effects.ini";
const DEFAULT_RULES_DIR: &str = "./effects";

/// Base of the region spot chance; divided by the region scan interval.
pub const SPOT_CHANCE_BASE: u32 = 1000;

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct EffectsConfig {
    pub near_range: i32,
    pub far_range: i32,
    pub iterations: u32,
    /// Ticks between two scan passes.
    pub scan_interval: u32,
    /// Ticks between two region sound updates.
    pub region_interval: u32,
    /// Explicit spot chance; `None` derives it from `region_interval`.
    pub spot_chance: Option<u32>,
    pub default_block_chance: u32,
    pub disabled_effects: FxHashSet<BlockEffectKind>,
    pub blocked_sounds: FxHashSet<ResourceKey>,
    pub rules_dir: PathBuf,
    pub use_defaults: bool,
    pub unknown_state_warnings: u32,
    pub config_path: PathBuf,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Unsigned value that fits in a `u32`. Out of range values are reported
/// and ignored.
fn read_u32(config: &Ini, section: &str, key: &str) -> Option<u32> {
    let v = config.getuint(section, key).ok().flatten()?;
    match u32::try_from(v) {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("[{}] {} = {} is out of range, keeping the current value", section, key, v);
            None
        }
    }
}

/// Scanner radius, at least 1.
fn read_range(config: &Ini, key: &str) -> Option<i32> {
    let v = config.getint("scanner", key).ok().flatten()?;
    match i32::try_from(v.max(1)) {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("[scanner] {} = {} is out of range, keeping the current value", key, v);
            None
        }
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value
        .split([',', ' ', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

impl EffectsConfig {
    pub fn new() -> Self {
        Self {
            near_range: DEFAULT_NEAR_RANGE,
            far_range: DEFAULT_FAR_RANGE,
            iterations: DEFAULT_ITERATIONS,
            scan_interval: DEFAULT_SCAN_INTERVAL,
            region_interval: DEFAULT_REGION_INTERVAL,
            spot_chance: None,
            default_block_chance: DEFAULT_BLOCK_CHANCE,
            disabled_effects: FxHashSet::default(),
            blocked_sounds: FxHashSet::default(),
            rules_dir: PathBuf::from(DEFAULT_RULES_DIR),
            use_defaults: true,
            unknown_state_warnings: DEFAULT_UNKNOWN_STATE_WARNINGS,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Spot chance used for regions that do not override it.
    pub fn spot_chance(&self) -> u32 {
        self.spot_chance
            .unwrap_or(SPOT_CHANCE_BASE / self.region_interval.max(1))
            .max(1)
    }

    pub fn is_sound_blocked(&self, key: &ResourceKey) -> bool {
        self.blocked_sounds.contains(key)
    }

    pub fn is_effect_enabled(&self, kind: BlockEffectKind) -> bool {
        !self.disabled_effects.contains(&kind)
    }

    /// Load values from the INI file at `config_path`.
    ///
    /// Missing values keep their current value. Unknown effect names and
    /// malformed sound ids in the lists are ignored.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        // [scanner]
        if let Some(v) = read_range(&config, "near_range") {
            self.near_range = v;
        }
        if let Some(v) = read_range(&config, "far_range") {
            self.far_range = v;
        }
        if let Some(v) = read_u32(&config, "scanner", "iterations") {
            self.iterations = v;
        }
        if let Some(v) = read_u32(&config, "scanner", "interval") {
            self.scan_interval = v.max(1);
        }

        // [regions]
        if let Some(v) = read_u32(&config, "regions", "scan_interval") {
            self.region_interval = v.max(1);
        }
        if let Some(v) = read_u32(&config, "regions", "spot_chance") {
            self.spot_chance = Some(v);
        }

        // [blocks]
        if let Some(v) = read_u32(&config, "blocks", "default_chance") {
            self.default_block_chance = v;
        }

        // [effects]
        if let Some(list) = config.get("effects", "disabled") {
            self.disabled_effects = split_list(&list)
                .filter_map(BlockEffectKind::from_name)
                .collect();
        }

        // [sounds]
        if let Some(list) = config.get("sounds", "blocked") {
            self.blocked_sounds = split_list(&list)
                .filter_map(|s| ResourceKey::parse(s).ok())
                .collect();
        }

        // [rules]
        if let Some(dir) = config.get("rules", "directory") {
            self.rules_dir = PathBuf::from(dir);
        }
        if let Some(v) = config.getbool("rules", "defaults").ok().flatten() {
            self.use_defaults = v;
        }

        // [logging]
        if let Some(v) = read_u32(&config, "logging", "unknown_state_warnings") {
            self.unknown_state_warnings = v;
        }

        info!(
            "Loaded config: scan {}/{} x{} every {} tick(s), regions every {} tick(s), spot 1/{}, block 1/{}",
            self.near_range,
            self.far_range,
            self.iterations,
            self.scan_interval,
            self.region_interval,
            self.spot_chance(),
            self.default_block_chance
        );

        Ok(())
    }

    /// Save configuration to the INI file at `config_path`.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set("scanner", "near_range", Some(self.near_range.to_string()));
        config.set("scanner", "far_range", Some(self.far_range.to_string()));
        config.set("scanner", "iterations", Some(self.iterations.to_string()));
        config.set("scanner", "interval", Some(self.scan_interval.to_string()));

        config.set(
            "regions",
            "scan_interval",
            Some(self.region_interval.to_string()),
        );
        if let Some(chance) = self.spot_chance {
            config.set("regions", "spot_chance", Some(chance.to_string()));
        }

        config.set(
            "blocks",
            "default_chance",
            Some(self.default_block_chance.to_string()),
        );

        let mut disabled: Vec<&str> = self.disabled_effects.iter().map(|k| k.name()).collect();
        disabled.sort_unstable();
        config.set("effects", "disabled", Some(disabled.join(", ")));

        let mut blocked: Vec<String> = self.blocked_sounds.iter().map(|k| k.to_string()).collect();
        blocked.sort_unstable();
        config.set("sounds", "blocked", Some(blocked.join(", ")));

        config.set(
            "rules",
            "directory",
            Some(self.rules_dir.display().to_string()),
        );
        config.set("rules", "defaults", Some(self.use_defaults.to_string()));
        config.set(
            "logging",
            "unknown_state_warnings",
            Some(self.unknown_state_warnings.to_string()),
        );

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }
}
