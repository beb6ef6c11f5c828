//! Rule documents.
//!
//! Rules are JSON documents with two top level lists, `blocks` and `biomes`.
//! The embedded defaults are always applied first, then every `*.json` file
//! of the overlay directory in file-name order. A file named `sounds.json` in
//! that directory is sound metadata (see
//! [`SoundCatalog`](crate::resources::soundeffect::SoundCatalog)), not a rule
//! document.
//!
//! ```json
//! {
//!   "blocks": [
//!     { "blocks": ["core:water"], "chance": 800,
//!       "sounds": [{ "sound": "core:water_drip", "conditions": "biome.isJungle" }],
//!       "effects": [{ "effect": "bubble", "chance": 50 }] }
//!   ],
//!   "biomes": [
//!     { "conditions": "biome.isForest", "spotSoundChance": 400,
//!       "sounds": [{ "sound": "forest:crow", "spotSound": true, "weight": 5 }] }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Built-in rules compiled into the binary.
pub const DEFAULT_RULES: &str = include_str!("../../assets/effects/defaults.json");
pub const DEFAULT_RULES_NAME: &str = "<defaults>";
pub const SOUND_METADATA_FILE: &str = "sounds.json";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid rule document {name}: {source}")]
    Json {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("reload worker is not running")]
    WorkerGone,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModConfiguration {
    pub blocks: Vec<BlockConfig>,
    pub biomes: Vec<BiomeConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockConfig {
    /// Cell patterns: `ns:name` or `ns:name[variant]`.
    pub blocks: Vec<String>,
    pub sound_reset: Option<bool>,
    pub effect_reset: Option<bool>,
    pub chance: Option<u32>,
    pub sounds: Vec<SoundConfig>,
    pub effects: Vec<EffectConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SoundConfig {
    pub sound: Option<String>,
    pub conditions: Option<String>,
    pub sound_category: Option<String>,
    pub volume: Option<f32>,
    pub pitch: Option<f32>,
    pub weight: Option<u32>,
    pub variable: Option<bool>,
    pub repeat_delay: Option<u32>,
    pub repeat_delay_random: Option<u32>,
    pub sound_type: Option<String>,
    pub spot_sound: Option<bool>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EffectConfig {
    pub effect: Option<String>,
    pub chance: Option<u32>,
    pub conditions: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BiomeConfig {
    /// Which regions the overlay applies to. Empty matches every region.
    pub conditions: Option<String>,
    pub comment: Option<String>,
    pub has_precipitation: Option<bool>,
    pub has_dust: Option<bool>,
    pub has_aurora: Option<bool>,
    pub has_fog: Option<bool>,
    pub fog_density: Option<f32>,
    pub fog_color: Option<String>,
    pub dust_color: Option<String>,
    pub sound_reset: Option<bool>,
    pub spot_sound_chance: Option<u32>,
    pub sounds: Vec<SoundConfig>,
}

/// One parsed rule document and where it came from.
#[derive(Debug, Clone)]
pub struct RuleDocument {
    pub name: String,
    pub config: ModConfiguration,
}

impl RuleDocument {
    pub fn parse(name: impl Into<String>, text: &str) -> Result<Self, LoadError> {
        let name = name.into();
        let config = serde_json::from_str(text).map_err(|source| LoadError::Json {
            name: name.clone(),
            source,
        })?;
        Ok(Self { name, config })
    }

    pub fn defaults() -> Result<Self, LoadError> {
        Self::parse(DEFAULT_RULES_NAME, DEFAULT_RULES)
    }

    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let text = read(path)?;
        Self::parse(path.display().to_string(), &text)
    }
}

pub(crate) fn read(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Overlay rule files of `dir`, sorted by file name.
pub fn overlay_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let entries = std::fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")))
        .filter(|p| p.file_name().is_some_and(|n| n != SOUND_METADATA_FILE))
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Defaults (when `with_defaults`) followed by the overlays found in `dir`.
pub fn load_documents(dir: Option<&Path>, with_defaults: bool) -> Result<Vec<RuleDocument>, LoadError> {
    let mut docs = Vec::new();
    if with_defaults {
        docs.push(RuleDocument::defaults()?);
    }
    if let Some(dir) = dir {
        if dir.is_dir() {
            for path in overlay_files(dir)? {
                debug!("Reading rule overlay {}", path.display());
                docs.push(RuleDocument::from_file(&path)?);
            }
        } else {
            info!("Rule directory {} not found, using built-in rules only", dir.display());
        }
    }
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse() {
        let doc = RuleDocument::defaults().unwrap();
        assert!(!doc.config.blocks.is_empty());
        assert!(!doc.config.biomes.is_empty());
    }

    #[test]
    fn test_camel_case_fields_and_missing_lists() {
        let doc = RuleDocument::parse(
            "t",
            r#"{"blocks":[{"blocks":["core:lava"],"soundReset":true,"chance":5,
                "sounds":[{"sound":"core:bubble","repeatDelayRandom":3,"spotSound":true}]}]}"#,
        )
        .unwrap();
        let block = &doc.config.blocks[0];
        assert_eq!(block.sound_reset, Some(true));
        assert_eq!(block.effect_reset, None);
        assert_eq!(block.chance, Some(5));
        assert_eq!(block.sounds[0].repeat_delay_random, Some(3));
        assert_eq!(block.sounds[0].spot_sound, Some(true));
        assert!(block.effects.is_empty());
        assert!(doc.config.biomes.is_empty());
    }

    #[test]
    fn test_invalid_json_names_document() {
        let err = RuleDocument::parse("broken.json", "{ blocks: ").unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_overlays_sorted_and_metadata_skipped() {
        let dir = std::env::temp_dir().join(format!("ambientfx_overlays_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("b.json"), "{}").unwrap();
        std::fs::write(dir.join("a.json"), "{}").unwrap();
        std::fs::write(dir.join("sounds.json"), "{}").unwrap();
        std::fs::write(dir.join("notes.txt"), "").unwrap();

        let docs = load_documents(Some(&dir), true).unwrap();
        let names: Vec<String> = docs
            .iter()
            .map(|d| {
                Path::new(&d.name)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| d.name.clone())
            })
            .collect();
        assert_eq!(names, vec![DEFAULT_RULES_NAME, "a.json", "b.json"]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_directory_is_not_an_error() {
        let dir = std::env::temp_dir().join("ambientfx_does_not_exist_dir");
        let docs = load_documents(Some(&dir), false).unwrap();
        assert!(docs.is_empty());
    }
}
