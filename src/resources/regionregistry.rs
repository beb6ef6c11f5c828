//! Region profiles by id.
//!
//! Built once per load from the host's region parameters. Overlays select the
//! regions they apply to with a `conditions` rule; an overlay without one
//! applies to every region, the fallback included.

use std::sync::Arc;

use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::resources::config::BiomeConfig;
use crate::resources::loadcontext::LoadContext;
use crate::resources::region::{RegionParams, RegionProfile, SimilarityIndex};
use crate::resources::resourcekey::ResourceKey;
use crate::resources::tags::TagVocabulary;
use crate::resources::world::RegionId;

/// Id reported for the fallback region.
pub const FAKE_REGION_ID: RegionId = RegionId(u16::MAX);

pub struct RegionRegistry {
    regions: FxHashMap<RegionId, RegionProfile>,
    fallback: RegionProfile,
    vocabulary: TagVocabulary,
}

impl RegionRegistry {
    /// Intern every region's tags, build the similarity index, then the
    /// profiles. Later duplicates of an id replace earlier ones.
    pub fn new(params: &[RegionParams], vocabulary: TagVocabulary, default_spot_chance: u32) -> Self {
        let mut vocabulary = vocabulary;
        let mut index = SimilarityIndex::default();
        for p in params {
            let tags = vocabulary.intern_all(p.tags.iter().map(String::as_str));
            let class = p
                .similarity
                .clone()
                .unwrap_or_else(|| vocabulary.describe(&tags));
            index.insert(p.key.clone(), class.into());
        }
        let similar = Arc::new(index);

        let mut regions = FxHashMap::default();
        for p in params {
            let profile = RegionProfile::new(p, &mut vocabulary, similar.clone(), default_spot_chance);
            if regions.insert(p.id, profile).is_some() {
                warn!("Region id {} registered twice, keeping {}", p.id.0, p.key);
            }
        }

        let mut fake = RegionParams::new(FAKE_REGION_ID, fake_key(), "Fake Region");
        fake.fake = true;
        fake.can_rain = false;
        let fallback = RegionProfile::new(&fake, &mut vocabulary, similar, default_spot_chance);

        Self {
            regions,
            fallback,
            vocabulary,
        }
    }

    /// Apply one overlay to every region its condition selects.
    pub fn apply(&mut self, overlay: &BiomeConfig, ctx: &mut LoadContext) {
        let Some(selector) = ctx.condition(overlay.conditions.as_deref()) else {
            ctx.skip();
            return;
        };
        let mut applied = 0usize;
        for region in self.regions.values_mut().chain(std::iter::once(&mut self.fallback)) {
            if selector.matches(&*region) {
                region.update(overlay, ctx);
                applied += 1;
            }
        }
        debug!(
            "Overlay '{}' applied to {} region(s)",
            selector.source(),
            applied
        );
    }

    /// Profile for `id`; unknown ids get the fallback region.
    pub fn get(&self, id: RegionId) -> &RegionProfile {
        self.regions.get(&id).unwrap_or(&self.fallback)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn vocabulary(&self) -> &TagVocabulary {
        &self.vocabulary
    }

    pub fn keys(&self) -> impl Iterator<Item = &ResourceKey> {
        self.regions.values().map(|r| &r.key)
    }

    /// Regions sorted by id, fallback last.
    pub fn iter(&self) -> impl Iterator<Item = &RegionProfile> {
        let mut ids: Vec<&RegionId> = self.regions.keys().collect();
        ids.sort();
        ids.into_iter()
            .filter_map(|id| self.regions.get(id))
            .chain(std::iter::once(&self.fallback))
    }
}

fn fake_key() -> ResourceKey {
    ResourceKey::from_parts("core", "fake")
}
