//! Per-region ambient profile.
//!
//! A [`RegionProfile`] starts from the intrinsic parameters the host reports
//! for a region, is mutated by every matching overlay (in document order)
//! while the profiles are loading, and is read-only afterwards.

use std::fmt;
use std::sync::Arc;

use fastrand::Rng;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::expression::{ConditionSubject, Conditional};
use crate::resources::config::BiomeConfig;
use crate::resources::effectsconfig::EffectsConfig;
use crate::resources::loadcontext::LoadContext;
use crate::resources::resourcekey::ResourceKey;
use crate::resources::soundeffect::{SoundEffect, SoundType};
use crate::resources::tags::{TagId, TagSet, TagVocabulary};
use crate::resources::world::RegionId;
use crate::weighttable::WeightTable;

const DEFAULT_FOG_COLOR: [u8; 3] = [64, 96, 64];
const DEFAULT_FOG_DENSITY: f32 = 0.4;
const DEFAULT_DUST_COLOR: [u8; 3] = [255, 234, 151];
const SOUND_RESET_COMMENT: &str = "> Sound Reset";

/// Host-supplied fog for a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogSpec {
    pub color: [u8; 3],
    pub density: f32,
}

/// What the host knows about a region before any rules are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionParams {
    pub id: RegionId,
    pub key: ResourceKey,
    pub name: String,
    pub temperature: f32,
    pub rainfall: f32,
    pub humidity: f32,
    pub tags: Vec<String>,
    pub can_rain: bool,
    pub snows: bool,
    pub fake: bool,
    /// Similarity class used by `isLike`. Defaults to the tag string.
    pub similarity: Option<String>,
    pub fog: Option<FogSpec>,
}

impl RegionParams {
    pub fn new(id: RegionId, key: ResourceKey, name: impl Into<String>) -> Self {
        Self {
            id,
            key,
            name: name.into(),
            temperature: 0.5,
            rainfall: 0.5,
            humidity: 0.5,
            tags: Vec::new(),
            can_rain: true,
            snows: false,
            fake: false,
            similarity: None,
            fog: None,
        }
    }

    pub fn with_climate(mut self, temperature: f32, rainfall: f32) -> Self {
        self.temperature = temperature;
        self.rainfall = rainfall;
        self.humidity = rainfall;
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }
}

/// Maps region keys to their similarity class.
#[derive(Debug, Clone, Default)]
pub struct SimilarityIndex {
    classes: FxHashMap<ResourceKey, Arc<str>>,
}

impl SimilarityIndex {
    pub fn insert(&mut self, key: ResourceKey, class: Arc<str>) {
        self.classes.insert(key, class);
    }

    pub fn class_of(&self, key: &ResourceKey) -> Option<&Arc<str>> {
        self.classes.get(key)
    }
}

/// Parse `"r,g,b"`. Anything other than three integers in `0..=255` is
/// rejected.
pub fn parse_color(text: &str) -> Option<[u8; 3]> {
    let parts: SmallVec<[u8; 3]> = text
        .split(',')
        .map(|p| p.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [r, g, b] => Some([*r, *g, *b]),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct RegionProfile {
    pub id: RegionId,
    pub key: ResourceKey,
    pub name: String,
    pub temperature: f32,
    pub rainfall: f32,
    pub humidity: f32,
    pub fake: bool,
    tags: TagSet,
    traits: String,
    similarity_class: Arc<str>,
    similar: Arc<SimilarityIndex>,

    pub has_precipitation: bool,
    pub has_dust: bool,
    pub has_aurora: bool,
    pub has_fog: bool,
    pub fog_color: [u8; 3],
    pub fog_density: f32,
    pub dust_color: [u8; 3],
    pub is_river: bool,
    pub is_ocean: bool,
    pub is_deep_ocean: bool,

    ambient: Vec<Arc<SoundEffect>>,
    spot: Vec<Arc<SoundEffect>>,
    spot_chance: u32,
    default_spot_chance: u32,
    comments: Vec<String>,
}

impl RegionProfile {
    /// Build a profile from host parameters. `tags` must come from the same
    /// vocabulary the conditions are compiled with.
    pub fn new(
        params: &RegionParams,
        vocabulary: &mut TagVocabulary,
        similar: Arc<SimilarityIndex>,
        default_spot_chance: u32,
    ) -> Self {
        let tags = vocabulary.intern_all(params.tags.iter().map(String::as_str));
        let traits = vocabulary.describe(&tags);
        let has = |name: &str| vocabulary.get(name).is_some_and(|t| tags.contains(&t));
        let path = params.key.path();
        let is_deep_ocean = path.contains("deep_ocean");
        let is_ocean = is_deep_ocean || has("OCEAN") || path.contains("ocean");
        let is_river = has("RIVER") || path.contains("river");

        let similarity_class: Arc<str> = similar
            .class_of(&params.key)
            .cloned()
            .unwrap_or_else(|| params.similarity.clone().unwrap_or_else(|| traits.clone()).into());

        let (has_fog, fog_color, fog_density) = match params.fog {
            Some(fog) => (true, fog.color, fog.density),
            None => (false, DEFAULT_FOG_COLOR, DEFAULT_FOG_DENSITY),
        };

        Self {
            id: params.id,
            key: params.key.clone(),
            name: params.name.clone(),
            temperature: params.temperature,
            rainfall: params.rainfall,
            humidity: params.humidity,
            fake: params.fake,
            tags,
            traits,
            similarity_class,
            similar,
            has_precipitation: !params.fake && (params.can_rain || params.snows),
            has_dust: false,
            has_aurora: false,
            has_fog,
            fog_color,
            fog_density,
            dust_color: DEFAULT_DUST_COLOR,
            is_river,
            is_ocean,
            is_deep_ocean,
            ambient: Vec::new(),
            spot: Vec::new(),
            spot_chance: default_spot_chance,
            default_spot_chance,
            comments: Vec::new(),
        }
    }

    /// Profile outside any registry, with the default vocabulary and spot
    /// chance. `isLike` only matches regions of the same key.
    pub fn detached(params: RegionParams) -> Self {
        let mut vocabulary = TagVocabulary::with_defaults();
        let spot = EffectsConfig::new().spot_chance();
        Self::new(&params, &mut vocabulary, Arc::default(), spot)
    }

    /// Apply one overlay.
    pub fn update(&mut self, cfg: &BiomeConfig, ctx: &mut LoadContext) {
        if let Some(comment) = cfg.comment.as_deref().filter(|c| !c.trim().is_empty()) {
            self.comments.push(comment.to_string());
        }
        if let Some(v) = cfg.has_precipitation {
            self.has_precipitation = v;
        }
        if let Some(v) = cfg.has_dust {
            self.has_dust = v;
        }
        if let Some(v) = cfg.has_aurora {
            self.has_aurora = v;
        }
        if let Some(v) = cfg.has_fog {
            self.has_fog = v;
        }
        if let Some(v) = cfg.fog_density {
            self.fog_density = v;
        }
        if let Some(color) = cfg.fog_color.as_deref().and_then(parse_color) {
            self.fog_color = color;
        }
        if let Some(color) = cfg.dust_color.as_deref().and_then(parse_color) {
            self.dust_color = color;
        }
        if cfg.sound_reset.unwrap_or(false) {
            self.comments.push(SOUND_RESET_COMMENT.to_string());
            self.reset_sounds();
        }
        if let Some(chance) = cfg.spot_sound_chance {
            self.spot_chance = chance;
        }
        for sound in &cfg.sounds {
            if let Some(effect) = SoundEffect::from_config(sound, None, ctx) {
                if effect.sound_type == SoundType::Spot {
                    self.spot.push(Arc::new(effect));
                } else {
                    self.ambient.push(Arc::new(effect));
                }
            }
        }
    }

    fn reset_sounds(&mut self) {
        self.ambient.clear();
        self.spot.clear();
        self.spot_chance = self.default_spot_chance;
    }

    /// Every ambient sound whose condition holds for this region.
    pub fn find_ambient_sounds(&self) -> SmallVec<[&Arc<SoundEffect>; 8]> {
        self.ambient.iter().filter(|s| s.is_active(self)).collect()
    }

    /// Roll the 1-in-`spot_chance` odds and, on success, pick one spot sound
    /// by weight. Spot conditions are not consulted.
    pub fn get_spot_sound(&self, rng: &mut Rng) -> Option<&Arc<SoundEffect>> {
        if self.spot.is_empty() || self.spot_chance == 0 {
            return None;
        }
        if rng.u32(..self.spot_chance) != 0 {
            return None;
        }
        self.spot
            .iter()
            .collect::<WeightTable<'_, Arc<SoundEffect>>>()
            .pick(rng)
    }

    pub fn ambient_sounds(&self) -> &[Arc<SoundEffect>] {
        &self.ambient
    }

    pub fn spot_sounds(&self) -> &[Arc<SoundEffect>] {
        &self.spot
    }

    pub fn spot_chance(&self) -> u32 {
        self.spot_chance
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn tags(&self) -> &[TagId] {
        &self.tags
    }

    /// Space separated classification tags.
    pub fn traits(&self) -> &str {
        &self.traits
    }

    pub fn similarity_class(&self) -> &str {
        &self.similarity_class
    }

    pub fn has_sounds(&self) -> bool {
        !self.ambient.is_empty() || !self.spot.is_empty()
    }
}

impl ConditionSubject for RegionProfile {
    fn name(&self) -> &str {
        &self.name
    }

    fn key(&self) -> &ResourceKey {
        &self.key
    }

    fn rainfall(&self) -> f32 {
        self.rainfall
    }

    fn temperature(&self) -> f32 {
        self.temperature
    }

    fn humidity(&self) -> f32 {
        self.humidity
    }

    fn is_fake(&self) -> bool {
        self.fake
    }

    fn has_tag(&self, tag: TagId) -> bool {
        self.tags.contains(&tag)
    }

    fn is_like(&self, other: &str) -> bool {
        let Ok(key) = ResourceKey::parse(other) else {
            return false;
        };
        if key == self.key {
            return true;
        }
        self.similar
            .class_of(&key)
            .is_some_and(|class| **class == *self.similarity_class)
    }
}

fn write_color(f: &mut fmt::Formatter<'_>, label: &str, [r, g, b]: [u8; 3]) -> fmt::Result {
    write!(f, " {}:{},{},{}", label, r, g, b)
}

impl fmt::Display for RegionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry_name = if self.fake {
            "FAKE".to_string()
        } else {
            self.key.to_string()
        };
        write!(f, "Region [{}/{}] ({}):", self.name, registry_name, self.id.0)?;
        if !self.fake {
            write!(f, "\n+ <{}>\n", self.traits)?;
            write!(f, "+ temp: {:?} rain: {:?}", self.temperature, self.rainfall)?;
        }
        if self.has_precipitation {
            f.write_str(" PRECIPITATION")?;
        }
        if self.has_dust {
            f.write_str(" DUST")?;
        }
        if self.has_aurora {
            f.write_str(" AURORA")?;
        }
        if self.has_fog {
            f.write_str(" FOG")?;
        }
        if self.has_dust {
            write_color(f, "dustColor", self.dust_color)?;
        }
        if self.has_fog {
            write_color(f, "fogColor", self.fog_color)?;
            write!(f, " fogDensity:{:?}", self.fog_density)?;
        }
        if !self.ambient.is_empty() {
            f.write_str("\n+ sounds [")?;
            for sound in &self.ambient {
                write!(f, "\n+   {}", sound)?;
            }
            f.write_str("\n+ ]")?;
        }
        if !self.spot.is_empty() {
            write!(f, "\n+ spot sound chance:{}", self.spot_chance)?;
            f.write_str("\n+ spot sounds [")?;
            for sound in &self.spot {
                write!(f, "\n+   {}", sound)?;
            }
            f.write_str("\n+ ]")?;
        }
        if !self.comments.is_empty() {
            f.write_str("\n+ comments:")?;
            for comment in &self.comments {
                write!(f, "\n+   {}", comment)?;
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::ExpressionScope;
    use crate::resources::config::SoundConfig;
    use crate::resources::soundeffect::SoundCatalog;

    fn params() -> RegionParams {
        RegionParams::new(
            RegionId(4),
            ResourceKey::parse("core:birch_forest").unwrap(),
            "Birch Forest",
        )
        .with_climate(0.6, 0.8)
        .with_tags(&["forest", "dense"])
    }

    fn sound(id: &str, spot: bool) -> SoundConfig {
        SoundConfig {
            sound: Some(id.to_string()),
            spot_sound: Some(spot),
            ..Default::default()
        }
    }

    fn apply(region: &mut RegionProfile, cfg: &BiomeConfig) {
        let settings = EffectsConfig::new();
        let catalog = SoundCatalog::default();
        let scope = ExpressionScope::standard(&TagVocabulary::with_defaults(), []);
        let mut ctx = LoadContext::new(&settings, &catalog, scope);
        region.update(cfg, &mut ctx);
    }

    #[test]
    fn test_construction_defaults() {
        let r = RegionProfile::detached(params());
        assert!(r.has_precipitation);
        assert!(!r.has_fog && !r.has_dust && !r.has_aurora);
        assert_eq!(r.fog_color, [64, 96, 64]);
        assert_eq!(r.fog_density, 0.4);
        assert_eq!(r.dust_color, [255, 234, 151]);
        assert_eq!(r.spot_chance(), 250);
        assert_eq!(r.traits(), "DENSE FOREST");
        assert_eq!(r.similarity_class(), "DENSE FOREST");
        assert!(!r.is_ocean && !r.is_river);
    }

    #[test]
    fn test_fake_region_has_no_precipitation() {
        let mut p = params();
        p.fake = true;
        p.fog = Some(FogSpec {
            color: [1, 2, 3],
            density: 0.9,
        });
        let r = RegionProfile::detached(p);
        assert!(!r.has_precipitation);
        assert!(r.has_fog);
        assert_eq!(r.fog_color, [1, 2, 3]);
    }

    #[test]
    fn test_update_flags_and_colors() {
        let mut r = RegionProfile::detached(params());
        apply(
            &mut r,
            &BiomeConfig {
                comment: Some("misty".into()),
                has_fog: Some(true),
                has_precipitation: Some(false),
                fog_color: Some("10, 20, 30".into()),
                dust_color: Some("1,2".into()),
                fog_density: Some(0.1),
                ..Default::default()
            },
        );
        assert!(r.has_fog);
        assert!(!r.has_precipitation);
        assert_eq!(r.fog_color, [10, 20, 30]);
        assert_eq!(r.dust_color, [255, 234, 151]);
        assert_eq!(r.fog_density, 0.1);
        assert_eq!(r.comments(), &["misty".to_string()]);
    }

    #[test]
    fn test_sounds_split_by_type() {
        let mut r = RegionProfile::detached(params());
        apply(
            &mut r,
            &BiomeConfig {
                sounds: vec![sound("core:wind", false), sound("core:crow", true)],
                ..Default::default()
            },
        );
        assert_eq!(r.ambient_sounds().len(), 1);
        assert_eq!(r.spot_sounds().len(), 1);
        assert_eq!(r.spot_sounds()[0].key.path(), "crow");
    }

    #[test]
    fn test_sound_reset_keeps_only_new_sound() {
        let mut r = RegionProfile::detached(params());
        apply(
            &mut r,
            &BiomeConfig {
                spot_sound_chance: Some(5),
                sounds: vec![sound("core:a", true), sound("core:b", true), sound("core:c", false)],
                ..Default::default()
            },
        );
        apply(
            &mut r,
            &BiomeConfig {
                sound_reset: Some(true),
                sounds: vec![sound("core:d", true)],
                ..Default::default()
            },
        );
        assert_eq!(r.spot_sounds().len(), 1);
        assert_eq!(r.spot_sounds()[0].key.path(), "d");
        assert!(r.ambient_sounds().is_empty());
        assert_eq!(r.spot_chance(), 250);
        assert_eq!(r.comments(), &["> Sound Reset".to_string()]);
    }

    #[test]
    fn test_find_ambient_sounds_filters_by_condition() {
        let mut r = RegionProfile::detached(params());
        apply(
            &mut r,
            &BiomeConfig {
                sounds: vec![
                    SoundConfig {
                        conditions: Some("biome.isForest".into()),
                        ..sound("core:leaves", false)
                    },
                    SoundConfig {
                        conditions: Some("biome.isOcean".into()),
                        ..sound("core:waves", false)
                    },
                ],
                ..Default::default()
            },
        );
        let found = r.find_ambient_sounds();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key.path(), "leaves");
    }

    #[test]
    fn test_spot_sound_frequency() {
        let mut r = RegionProfile::detached(params());
        apply(
            &mut r,
            &BiomeConfig {
                spot_sound_chance: Some(20),
                sounds: vec![sound("core:crow", true)],
                ..Default::default()
            },
        );
        let mut rng = Rng::with_seed(42);
        let n = 200_000;
        let hits = (0..n).filter(|_| r.get_spot_sound(&mut rng).is_some()).count();
        let freq = hits as f64 / n as f64;
        assert!((freq - 0.05).abs() < 0.005, "frequency {freq}");
    }

    #[test]
    fn test_spot_sound_ignores_its_condition() {
        let mut r = RegionProfile::detached(params());
        apply(
            &mut r,
            &BiomeConfig {
                spot_sound_chance: Some(1),
                sounds: vec![SoundConfig {
                    conditions: Some("biome.isOcean".into()),
                    ..sound("core:gull", true)
                }],
                ..Default::default()
            },
        );
        assert_eq!(r.spot_sounds().len(), 1);
        let mut rng = Rng::with_seed(8);
        for _ in 0..1000 {
            let picked = r.get_spot_sound(&mut rng).map(|s| s.key.path().to_string());
            assert_eq!(picked.as_deref(), Some("gull"));
        }
    }

    #[test]
    fn test_spot_sound_disabled_cases() {
        let mut r = RegionProfile::detached(params());
        let mut rng = Rng::with_seed(1);
        assert!((0..1000).all(|_| r.get_spot_sound(&mut rng).is_none()));
        apply(
            &mut r,
            &BiomeConfig {
                spot_sound_chance: Some(0),
                sounds: vec![sound("core:crow", true)],
                ..Default::default()
            },
        );
        assert!((0..1000).all(|_| r.get_spot_sound(&mut rng).is_none()));
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("255,0,7"), Some([255, 0, 7]));
        assert_eq!(parse_color("1,2,3,4"), None);
        assert_eq!(parse_color("1,x,3"), None);
        assert_eq!(parse_color("256,0,0"), None);
    }

    #[test]
    fn test_display_lists_sounds_and_comments() {
        let mut r = RegionProfile::detached(params());
        apply(
            &mut r,
            &BiomeConfig {
                comment: Some("birds".into()),
                sounds: vec![sound("core:crow", true)],
                ..Default::default()
            },
        );
        let text = r.to_string();
        assert!(text.starts_with("Region [Birch Forest/core:birch_forest] (4):"));
        assert!(text.contains("<DENSE FOREST>"));
        assert!(text.contains("spot sound chance:250"));
        assert!(text.contains("+   core:crow"));
        assert!(text.contains("+   birds"));
    }
}
