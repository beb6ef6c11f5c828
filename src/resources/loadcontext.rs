//! Shared state of one load pass.
//!
//! Every rule string is compiled at most once per load. Failures are cached
//! too, so a broken rule used by many entries is reported a single time and
//! each owning entry is dropped.

use std::sync::Arc;

use log::warn;
use rustc_hash::FxHashMap;

use crate::expression::{Expression, ExpressionScope};
use crate::resources::effectsconfig::EffectsConfig;
use crate::resources::resourcekey::ResourceKey;
use crate::resources::soundeffect::SoundCatalog;

/// Counters reported at the end of a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub documents: usize,
    pub rules_compiled: usize,
    pub rule_failures: usize,
    pub skipped_entries: usize,
}

pub struct LoadContext<'a> {
    pub settings: &'a EffectsConfig,
    pub catalog: &'a SoundCatalog,
    scope: ExpressionScope,
    always: Arc<Expression>,
    compiled: FxHashMap<String, Option<Arc<Expression>>>,
    report: LoadReport,
}

impl<'a> LoadContext<'a> {
    pub fn new(settings: &'a EffectsConfig, catalog: &'a SoundCatalog, scope: ExpressionScope) -> Self {
        Self {
            settings,
            catalog,
            scope,
            always: Arc::new(Expression::always()),
            compiled: FxHashMap::default(),
            report: LoadReport::default(),
        }
    }

    /// Compiled form of `source`. An absent or blank rule is the shared
    /// always-true rule; `None` means the rule does not compile.
    pub fn condition(&mut self, source: Option<&str>) -> Option<Arc<Expression>> {
        let source = source.map(str::trim).unwrap_or_default();
        if source.is_empty() {
            return Some(self.always.clone());
        }
        if let Some(cached) = self.compiled.get(source) {
            return cached.clone();
        }
        let compiled = match Expression::compile(source, &self.scope) {
            Ok(expr) => {
                self.report.rules_compiled += 1;
                Some(Arc::new(expr))
            }
            Err(e) => {
                warn!("Condition '{}' does not compile: {}", source, e);
                self.report.rule_failures += 1;
                None
            }
        };
        self.compiled.insert(source.to_string(), compiled.clone());
        compiled
    }

    /// Parse a sound id and check it against the blocked list.
    pub fn sound_key(&mut self, raw: Option<&str>) -> Option<ResourceKey> {
        let raw = raw?;
        match ResourceKey::parse(raw) {
            Ok(key) if self.settings.is_sound_blocked(&key) => {
                self.skip();
                None
            }
            Ok(key) => Some(key),
            Err(e) => {
                warn!("Invalid sound id '{}': {}", raw, e);
                self.skip();
                None
            }
        }
    }

    pub fn skip(&mut self) {
        self.report.skipped_entries += 1;
    }

    pub fn document_done(&mut self) {
        self.report.documents += 1;
    }

    pub fn report(&self) -> LoadReport {
        self.report
    }
}
