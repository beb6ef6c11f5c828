//! Sound descriptors attached to cell profiles and regions.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use bevy_ecs::prelude::Entity;
use fastrand::Rng;
use log::warn;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::components::cellposition::CellPos;
use crate::events::audio::{RepeatPolicy, SoundAnchor, SoundRequest};
use crate::expression::{Conditional, Expression};
use crate::resources::config::{LoadError, SoundConfig, read};
use crate::resources::loadcontext::LoadContext;
use crate::resources::resourcekey::ResourceKey;
use crate::weighttable::Weighted;

/// Pitch offsets for variable-pitch sounds, picked uniformly.
const PITCH_DELTA: [f32; 6] = [-0.2, 0.0, 0.0, 0.2, 0.2, 0.2];
const DEFAULT_WEIGHT: u32 = 10;
/// Half-size of the box around the listener where spot sounds are placed.
pub const SPOT_SOUND_RANGE: i32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCategory {
    Master,
    Music,
    Records,
    Weather,
    Blocks,
    Hostile,
    Neutral,
    Players,
    Ambient,
    Voice,
}

impl SoundCategory {
    pub fn from_name(name: &str) -> Option<Self> {
        let category = match name.trim().to_ascii_lowercase().as_str() {
            "master" => SoundCategory::Master,
            "music" => SoundCategory::Music,
            "record" | "records" => SoundCategory::Records,
            "weather" => SoundCategory::Weather,
            "block" | "blocks" => SoundCategory::Blocks,
            "hostile" => SoundCategory::Hostile,
            "neutral" => SoundCategory::Neutral,
            "player" | "players" => SoundCategory::Players,
            "ambient" => SoundCategory::Ambient,
            "voice" => SoundCategory::Voice,
            _ => return None,
        };
        Some(category)
    }

    pub fn name(self) -> &'static str {
        match self {
            SoundCategory::Master => "master",
            SoundCategory::Music => "music",
            SoundCategory::Records => "record",
            SoundCategory::Weather => "weather",
            SoundCategory::Blocks => "block",
            SoundCategory::Hostile => "hostile",
            SoundCategory::Neutral => "neutral",
            SoundCategory::Players => "player",
            SoundCategory::Ambient => "ambient",
            SoundCategory::Voice => "voice",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundType {
    /// One-shot, picked by weight.
    Spot,
    /// Repeats with a delay while its condition holds.
    Periodic,
    /// Loops while its condition holds.
    Background,
}

impl SoundType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "spot" => Some(SoundType::Spot),
            "periodic" => Some(SoundType::Periodic),
            "background" => Some(SoundType::Background),
            _ => None,
        }
    }
}

impl fmt::Display for SoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SoundType::Spot => "SPOT",
            SoundType::Periodic => "PERIODIC",
            SoundType::Background => "BACKGROUND",
        })
    }
}

#[derive(Debug, Deserialize)]
struct SoundMetadata {
    #[serde(default)]
    category: Option<String>,
}

/// Category metadata from a `sounds.json` file. Used when a sound entry
/// does not name its category.
#[derive(Debug, Clone, Default)]
pub struct SoundCatalog {
    categories: FxHashMap<ResourceKey, SoundCategory>,
}

impl SoundCatalog {
    /// Parse `{ "ns:path": { "category": "ambient" }, ... }`. Entries with a
    /// bad id or unknown category are ignored.
    pub fn parse(text: &str) -> Result<Self, LoadError> {
        let raw: FxHashMap<String, SoundMetadata> =
            serde_json::from_str(text).map_err(|source| LoadError::Json {
                name: "sound metadata".to_string(),
                source,
            })?;
        let mut categories = FxHashMap::default();
        for (id, meta) in raw {
            let Ok(key) = ResourceKey::parse(&id) else {
                warn!("Ignoring sound metadata for invalid id '{}'", id);
                continue;
            };
            if let Some(category) = meta.category.as_deref().and_then(SoundCategory::from_name) {
                categories.insert(key, category);
            }
        }
        Ok(Self { categories })
    }

    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        Self::parse(&read(path)?)
    }

    pub fn category(&self, key: &ResourceKey) -> Option<SoundCategory> {
        self.categories.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Immutable sound descriptor.
#[derive(Debug, Clone)]
pub struct SoundEffect {
    pub key: ResourceKey,
    pub category: SoundCategory,
    pub volume: f32,
    pub pitch: f32,
    pub weight: u32,
    pub variable: bool,
    pub repeat_delay: u32,
    pub repeat_delay_random: u32,
    pub sound_type: SoundType,
    pub condition: Arc<Expression>,
    pub title: String,
}

impl SoundEffect {
    /// Plain spot sound with default parameters and no condition.
    pub fn new(key: ResourceKey, category: SoundCategory) -> Self {
        Self {
            key,
            category,
            volume: 1.0,
            pitch: 1.0,
            weight: DEFAULT_WEIGHT,
            variable: false,
            repeat_delay: 0,
            repeat_delay_random: 0,
            sound_type: SoundType::Spot,
            condition: Arc::new(Expression::always()),
            title: String::new(),
        }
    }

    /// Build from a rule entry.
    ///
    /// The type is the explicit `soundType`, else PERIODIC when a repeat delay
    /// is set, else SPOT when `spotSound` is set, else BACKGROUND. The
    /// category is the explicit one, else `default_category`, else the sound
    /// metadata, else ambient. Returns `None` (after logging) for a missing,
    /// blocked or malformed id, or a condition that does not compile.
    pub fn from_config(
        cfg: &SoundConfig,
        default_category: Option<SoundCategory>,
        ctx: &mut LoadContext,
    ) -> Option<Self> {
        let key = ctx.sound_key(cfg.sound.as_deref())?;
        let Some(condition) = ctx.condition(cfg.conditions.as_deref()) else {
            ctx.skip();
            return None;
        };

        let repeat_delay = cfg.repeat_delay.unwrap_or(0);
        let sound_type = cfg
            .sound_type
            .as_deref()
            .and_then(SoundType::from_name)
            .unwrap_or(if repeat_delay > 0 {
                SoundType::Periodic
            } else if cfg.spot_sound.unwrap_or(false) {
                SoundType::Spot
            } else {
                SoundType::Background
            });

        let category = cfg
            .sound_category
            .as_deref()
            .and_then(SoundCategory::from_name)
            .or(default_category)
            .or_else(|| ctx.catalog.category(&key))
            .unwrap_or(SoundCategory::Ambient);

        Some(Self {
            key,
            category,
            volume: cfg.volume.unwrap_or(1.0),
            pitch: cfg.pitch.unwrap_or(1.0),
            weight: cfg.weight.unwrap_or(DEFAULT_WEIGHT),
            variable: cfg.variable.unwrap_or(false),
            repeat_delay,
            repeat_delay_random: cfg.repeat_delay_random.unwrap_or(0),
            sound_type,
            condition,
            title: cfg.title.clone().unwrap_or_default(),
        })
    }

    pub fn pitch(&self, rng: &mut Rng) -> f32 {
        if self.variable {
            self.pitch + PITCH_DELTA[rng.usize(..PITCH_DELTA.len())]
        } else {
            self.pitch
        }
    }

    /// Ticks to wait before the next repetition.
    pub fn repeat(&self, rng: &mut Rng) -> u32 {
        if self.repeat_delay_random == 0 {
            self.repeat_delay
        } else {
            self.repeat_delay + rng.u32(..self.repeat_delay_random)
        }
    }

    fn request(&self, anchor: SoundAnchor, repeat: RepeatPolicy, rng: &mut Rng) -> SoundRequest {
        SoundRequest {
            sound: self.key.clone(),
            category: self.category,
            volume: self.volume,
            pitch: self.pitch(rng),
            anchor,
            repeat,
        }
    }

    /// One-shot at the center of a cell.
    pub fn request_at(&self, pos: CellPos, rng: &mut Rng) -> SoundRequest {
        self.request(SoundAnchor::At(pos.center()), RepeatPolicy::Once, rng)
    }

    /// One-shot at a random point around `center`, biased toward it.
    pub fn request_near(&self, center: [f32; 3], rng: &mut Rng) -> SoundRequest {
        let mut offset = || (rng.i32(0..SPOT_SOUND_RANGE) - rng.i32(0..SPOT_SOUND_RANGE)) as f32;
        let pos = [
            center[0] + offset(),
            center[1] + offset(),
            center[2] + offset(),
        ];
        self.request(SoundAnchor::At(pos), RepeatPolicy::Once, rng)
    }

    /// Sound that follows `entity`, repeating according to its type.
    pub fn request_tracking(&self, entity: Entity, rng: &mut Rng) -> SoundRequest {
        let repeat = match self.sound_type {
            SoundType::Background => RepeatPolicy::Loop,
            SoundType::Periodic => RepeatPolicy::Repeat {
                delay: self.repeat(rng),
            },
            SoundType::Spot => RepeatPolicy::Once,
        };
        self.request(SoundAnchor::Tracking(entity), repeat, rng)
    }
}

impl Weighted for SoundEffect {
    fn weight(&self) -> u32 {
        self.weight
    }
}

impl Conditional for SoundEffect {
    fn condition(&self) -> &Expression {
        &self.condition
    }
}

impl PartialEq for SoundEffect {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl fmt::Display for SoundEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}), v:{:?}, p:{:?}, t:{}",
            self.key, self.condition, self.volume, self.pitch, self.sound_type
        )?;
        if self.sound_type == SoundType::Spot {
            write!(f, ", w:{}", self.weight)?;
        }
        if self.repeat_delay != 0 || self.repeat_delay_random != 0 {
            write!(f, ", d:{}+{}", self.repeat_delay, self.repeat_delay_random)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::ExpressionScope;
    use crate::resources::effectsconfig::EffectsConfig;
    use crate::resources::tags::TagVocabulary;

    fn build(cfg: SoundConfig, default_category: Option<SoundCategory>) -> Option<SoundEffect> {
        let settings = EffectsConfig::new();
        let catalog = SoundCatalog::parse(r#"{"core:wind": {"category": "weather"}}"#).unwrap();
        let scope = ExpressionScope::standard(&TagVocabulary::with_defaults(), []);
        let mut ctx = LoadContext::new(&settings, &catalog, scope);
        SoundEffect::from_config(&cfg, default_category, &mut ctx)
    }

    fn sound(id: &str) -> SoundConfig {
        SoundConfig {
            sound: Some(id.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_type_resolution() {
        let s = build(sound("core:a"), None).unwrap();
        assert_eq!(s.sound_type, SoundType::Background);

        let s = build(SoundConfig { repeat_delay: Some(20), spot_sound: Some(true), ..sound("core:a") }, None).unwrap();
        assert_eq!(s.sound_type, SoundType::Periodic);

        let s = build(SoundConfig { spot_sound: Some(true), ..sound("core:a") }, None).unwrap();
        assert_eq!(s.sound_type, SoundType::Spot);

        let s = build(SoundConfig { sound_type: Some("spot".into()), repeat_delay: Some(5), ..sound("core:a") }, None).unwrap();
        assert_eq!(s.sound_type, SoundType::Spot);
    }

    #[test]
    fn test_category_resolution() {
        assert_eq!(build(sound("core:a"), None).unwrap().category, SoundCategory::Ambient);
        assert_eq!(build(sound("core:wind"), None).unwrap().category, SoundCategory::Weather);
        assert_eq!(
            build(sound("core:wind"), Some(SoundCategory::Blocks)).unwrap().category,
            SoundCategory::Blocks
        );
        let explicit = SoundConfig {
            sound_category: Some("HOSTILE".into()),
            ..sound("core:wind")
        };
        assert_eq!(
            build(explicit, Some(SoundCategory::Blocks)).unwrap().category,
            SoundCategory::Hostile
        );
    }

    #[test]
    fn test_defaults_and_rejections() {
        let s = build(sound("core:a"), None).unwrap();
        assert_eq!((s.volume, s.pitch, s.weight), (1.0, 1.0, 10));
        assert!(s.condition.is_always());

        assert!(build(SoundConfig::default(), None).is_none());
        assert!(build(sound("Not:Valid"), None).is_none());
        let broken = SoundConfig {
            conditions: Some("biome.isGlacier".into()),
            ..sound("core:a")
        };
        assert!(build(broken, None).is_none());
    }

    #[test]
    fn test_variable_pitch_uses_delta_table() {
        let mut s = SoundEffect::new(ResourceKey::parse("core:a").unwrap(), SoundCategory::Ambient);
        let mut rng = Rng::with_seed(3);
        assert_eq!(s.pitch(&mut rng), 1.0);
        s.variable = true;
        for _ in 0..100 {
            let p = s.pitch(&mut rng);
            assert!(PITCH_DELTA.iter().any(|d| (1.0 + d - p).abs() < 1e-6));
        }
    }

    #[test]
    fn test_repeat_delay() {
        let mut s = SoundEffect::new(ResourceKey::parse("core:a").unwrap(), SoundCategory::Ambient);
        let mut rng = Rng::with_seed(9);
        s.repeat_delay = 40;
        assert_eq!(s.repeat(&mut rng), 40);
        s.repeat_delay_random = 10;
        for _ in 0..100 {
            let r = s.repeat(&mut rng);
            assert!((40..50).contains(&r));
        }
    }

    #[test]
    fn test_requests() {
        let s = SoundEffect::new(ResourceKey::parse("core:a").unwrap(), SoundCategory::Blocks);
        let mut rng = Rng::with_seed(1);
        let r = s.request_at(CellPos::new(1, 2, 3), &mut rng);
        assert_eq!(r.anchor, SoundAnchor::At([1.5, 2.5, 3.5]));
        assert_eq!(r.repeat, RepeatPolicy::Once);

        for _ in 0..50 {
            let SoundAnchor::At(p) = s.request_near([0.0, 64.0, 0.0], &mut rng).anchor else {
                panic!("spot sounds are positional");
            };
            assert!(p[0].abs() < SPOT_SOUND_RANGE as f32);
            assert!((p[1] - 64.0).abs() < SPOT_SOUND_RANGE as f32);
        }
    }

    #[test]
    fn test_display() {
        let mut s = SoundEffect::new(ResourceKey::parse("core:a").unwrap(), SoundCategory::Blocks);
        assert_eq!(s.to_string(), "core:a(), v:1.0, p:1.0, t:SPOT, w:10");
        s.sound_type = SoundType::Periodic;
        s.repeat_delay = 5;
        assert_eq!(s.to_string(), "core:a(), v:1.0, p:1.0, t:PERIODIC, d:5+0");
    }
}
