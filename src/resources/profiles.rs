//! The published profile snapshot.
//!
//! [`load_profiles`] turns a list of rule documents into an immutable
//! [`EffectProfiles`]: a state registry and a region registry built in one
//! pass. The ECS world holds the current snapshot in [`ActiveProfiles`];
//! systems clone the inner `Arc` at the start of a pass, so replacing it
//! never disturbs a pass that is already running.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bevy_ecs::prelude::*;
use log::info;

use crate::expression::ExpressionScope;
use crate::resources::config::{LoadError, RuleDocument, SOUND_METADATA_FILE, load_documents};
use crate::resources::effectsconfig::EffectsConfig;
use crate::resources::loadcontext::{LoadContext, LoadReport};
use crate::resources::palette::SharedPalette;
use crate::resources::region::{RegionParams, RegionProfile};
use crate::resources::regionregistry::RegionRegistry;
use crate::resources::soundeffect::SoundCatalog;
use crate::resources::stateregistry::{StateProfileRegistry, StateRegistryBuilder};
use crate::resources::tags::TagVocabulary;
use crate::resources::world::RegionId;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

pub struct EffectProfiles {
    pub states: StateProfileRegistry,
    pub regions: RegionRegistry,
    /// Increases with every load. Zero is the empty snapshot.
    pub generation: u64,
    pub report: LoadReport,
}

impl EffectProfiles {
    /// Snapshot with no rules at all.
    pub fn empty(sources: &ProfileSources, settings: &EffectsConfig) -> Self {
        Self {
            states: StateProfileRegistry::empty(sources.palette.clone()),
            regions: RegionRegistry::new(&sources.regions, TagVocabulary::with_defaults(), settings.spot_chance()),
            generation: 0,
            report: LoadReport::default(),
        }
    }

    pub fn region(&self, id: RegionId) -> &RegionProfile {
        self.regions.get(id)
    }
}

/// What the host knows about its world: the palette and its regions.
#[derive(Resource, Clone)]
pub struct ProfileSources {
    pub palette: SharedPalette,
    pub regions: Arc<[RegionParams]>,
}

impl ProfileSources {
    pub fn new(palette: SharedPalette, regions: Vec<RegionParams>) -> Self {
        Self {
            palette,
            regions: regions.into(),
        }
    }
}

/// The snapshot systems read from.
#[derive(Resource, Clone)]
pub struct ActiveProfiles(pub Arc<EffectProfiles>);

impl ActiveProfiles {
    pub fn new(profiles: EffectProfiles) -> Self {
        Self(Arc::new(profiles))
    }

    pub fn snapshot(&self) -> Arc<EffectProfiles> {
        self.0.clone()
    }

    pub fn generation(&self) -> u64 {
        self.0.generation
    }
}

/// Build a snapshot from already parsed documents, applied in order.
pub fn load_profiles(
    sources: &ProfileSources,
    settings: &EffectsConfig,
    catalog: &SoundCatalog,
    documents: &[RuleDocument],
) -> EffectProfiles {
    let mut regions = RegionRegistry::new(
        &sources.regions,
        TagVocabulary::with_defaults(),
        settings.spot_chance(),
    );
    let scope = ExpressionScope::standard(regions.vocabulary(), regions.keys());
    let mut ctx = LoadContext::new(settings, catalog, scope);
    let mut states = StateRegistryBuilder::new(sources.palette.clone());

    for doc in documents {
        for entry in &doc.config.blocks {
            states.register(entry, &mut ctx);
        }
        for overlay in &doc.config.biomes {
            regions.apply(overlay, &mut ctx);
        }
        ctx.document_done();
    }

    let report = ctx.report();
    let mut states = states.build(settings.default_block_chance, settings.unknown_state_warnings);
    let primed = states.prime();
    states.complete();

    let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);
    info!(
        "Profiles #{}: {} document(s), {} rule(s) compiled, {} failed, {} entries skipped; {}/{} states with effects, {} regions",
        generation,
        report.documents,
        report.rules_compiled,
        report.rule_failures,
        report.skipped_entries,
        primed.with_effects,
        primed.states,
        regions.len()
    );

    EffectProfiles {
        states,
        regions,
        generation,
        report,
    }
}

/// Sound metadata next to the rule files, if any.
pub fn load_catalog(dir: &Path) -> Result<SoundCatalog, LoadError> {
    let path = dir.join(SOUND_METADATA_FILE);
    if path.is_file() {
        SoundCatalog::from_file(&path)
    } else {
        Ok(SoundCatalog::default())
    }
}

/// Read the documents named by `settings` and build a snapshot.
pub fn load_from_disk(sources: &ProfileSources, settings: &EffectsConfig) -> Result<EffectProfiles, LoadError> {
    let dir = settings.rules_dir.as_path();
    let documents = load_documents(Some(dir), settings.use_defaults)?;
    let catalog = load_catalog(dir)?;
    Ok(load_profiles(sources, settings, &catalog, &documents))
}
