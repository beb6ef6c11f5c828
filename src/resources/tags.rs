//! Classification-tag vocabulary shared by every region.
//!
//! Tags are stored upper-case. Each tag in the vocabulary gets a
//! `biome.is<Tag>` variable in the condition language.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Built-in vocabulary, available even when no region declares the tag.
pub const DEFAULT_TAGS: &[&str] = &[
    "HOT", "COLD", "SPARSE", "DENSE", "WET", "DRY", "SAVANNA", "CONIFEROUS", "JUNGLE", "SPOOKY",
    "DEAD", "LUSH", "NETHER", "END", "MUSHROOM", "MAGICAL", "RARE", "OCEAN", "RIVER", "WATER",
    "MESA", "FOREST", "PLAINS", "MOUNTAIN", "HILLS", "SWAMP", "SANDY", "SNOWY", "WASTELAND",
    "BEACH", "VOID",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagId(pub u16);

/// Small inline set of tags carried by a region.
pub type TagSet = SmallVec<[TagId; 8]>;

#[derive(Debug, Clone, Default)]
pub struct TagVocabulary {
    names: Vec<Arc<str>>,
    by_name: FxHashMap<Arc<str>, TagId>,
}

impl TagVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vocabulary pre-populated with [`DEFAULT_TAGS`].
    pub fn with_defaults() -> Self {
        let mut vocabulary = Self::new();
        for tag in DEFAULT_TAGS {
            vocabulary.intern(tag);
        }
        vocabulary
    }

    /// Return the id of `name`, adding it if unknown.
    pub fn intern(&mut self, name: &str) -> TagId {
        let upper = name.trim().to_ascii_uppercase();
        if let Some(id) = self.by_name.get(upper.as_str()) {
            return *id;
        }
        let id = TagId(self.names.len() as u16);
        let name: Arc<str> = upper.into();
        self.names.push(name.clone());
        self.by_name.insert(name, id);
        id
    }

    pub fn get(&self, name: &str) -> Option<TagId> {
        self.by_name
            .get(name.trim().to_ascii_uppercase().as_str())
            .copied()
    }

    pub fn name(&self, id: TagId) -> Option<&str> {
        self.names.get(id.0 as usize).map(|n| n.as_ref())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TagId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, n)| (TagId(i as u16), n.as_ref()))
    }

    /// Intern a list of names into a sorted, deduplicated [`TagSet`].
    pub fn intern_all<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) -> TagSet {
        let mut set: TagSet = names.into_iter().map(|n| self.intern(n)).collect();
        set.sort_unstable();
        set.dedup();
        set
    }

    /// Space separated tag names, in set order.
    pub fn describe(&self, tags: &[TagId]) -> String {
        tags.iter()
            .filter_map(|t| self.name(*t))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
