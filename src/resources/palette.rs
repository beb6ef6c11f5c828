//! Material palette and cell states.
//!
//! The palette is owned by the host world. It interns every material the world
//! can contain and gives every `(material, variant)` pair a dense ordinal, which
//! is what the state registry uses as the key of its side table. A
//! [`CellState`] is a small `Copy` value: every position holding the same
//! configuration shares the same identity.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::resources::resourcekey::{DEFAULT_NAMESPACE, ResourceKey, ResourceKeyError};

/// Name of the world's "nothing" cell. Always material 0.
pub const VOID_MATERIAL: &str = "core:air";
const VOID_PATH: &str = "air";

/// Index of a material in its [`MaterialPalette`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u16);

/// Coarse physical class of a material. Block effects use it to check the
/// neighborhood of a cell (is there air above, water below, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialClass {
    Void,
    Solid,
    Water,
    Lava,
    Foliage,
}

/// Immutable identity of one cell configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellState {
    pub material: MaterialId,
    pub variant: u16,
}

impl CellState {
    pub const VOID: CellState = CellState {
        material: MaterialId(0),
        variant: 0,
    };

    pub fn new(material: MaterialId, variant: u16) -> Self {
        Self { material, variant }
    }

    pub fn is_void(&self) -> bool {
        self.material == MaterialId(0)
    }
}

/// Palette entry.
#[derive(Debug, Clone)]
pub struct MaterialDef {
    pub key: ResourceKey,
    pub class: MaterialClass,
    pub variants: u16,
    first_ordinal: u32,
}

/// Registry of all materials known to the world.
#[derive(Debug, Clone)]
pub struct MaterialPalette {
    materials: Vec<MaterialDef>,
    by_key: FxHashMap<ResourceKey, MaterialId>,
    state_count: u32,
}

impl Default for MaterialPalette {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialPalette {
    /// Create a palette holding only the void material.
    pub fn new() -> Self {
        let mut palette = Self {
            materials: Vec::new(),
            by_key: FxHashMap::default(),
            state_count: 0,
        };
        let void = ResourceKey::from_parts(DEFAULT_NAMESPACE, VOID_PATH);
        palette.push(void, MaterialClass::Void, 1);
        palette
    }

    fn push(&mut self, key: ResourceKey, class: MaterialClass, variants: u16) -> MaterialId {
        let id = MaterialId(self.materials.len() as u16);
        let variants = variants.max(1);
        self.materials.push(MaterialDef {
            key: key.clone(),
            class,
            variants,
            first_ordinal: self.state_count,
        });
        self.by_key.insert(key, id);
        self.state_count += u32::from(variants);
        id
    }

    /// Register a material. Registering an existing key returns its id
    /// unchanged.
    pub fn register(&mut self, key: ResourceKey, class: MaterialClass, variants: u16) -> MaterialId {
        if let Some(id) = self.by_key.get(&key) {
            return *id;
        }
        self.push(key, class, variants)
    }

    /// Convenience wrapper for hosts that declare materials as strings.
    pub fn register_named(
        &mut self,
        key: &str,
        class: MaterialClass,
        variants: u16,
    ) -> Result<MaterialId, ResourceKeyError> {
        Ok(self.register(ResourceKey::parse(key)?, class, variants))
    }

    pub fn get(&self, key: &ResourceKey) -> Option<MaterialId> {
        self.by_key.get(key).copied()
    }

    pub fn def(&self, id: MaterialId) -> Option<&MaterialDef> {
        self.materials.get(id.0 as usize)
    }

    /// State for `key` and `variant`, if both exist.
    pub fn state(&self, key: &str, variant: u16) -> Option<CellState> {
        let key = ResourceKey::parse(key).ok()?;
        let id = self.get(&key)?;
        let def = self.def(id)?;
        (variant < def.variants).then_some(CellState::new(id, variant))
    }

    /// Dense ordinal of a state, or `None` if the state is not part of the
    /// palette.
    pub fn index_of(&self, state: CellState) -> Option<usize> {
        let def = self.def(state.material)?;
        if state.variant >= def.variants {
            return None;
        }
        Some((def.first_ordinal + u32::from(state.variant)) as usize)
    }

    pub fn class_of(&self, state: CellState) -> MaterialClass {
        self.def(state.material)
            .map(|d| d.class)
            .unwrap_or(MaterialClass::Solid)
    }

    /// Number of distinct states across all materials.
    pub fn state_count(&self) -> usize {
        self.state_count as usize
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    /// Every state in ordinal order.
    pub fn states(&self) -> impl Iterator<Item = CellState> + '_ {
        self.materials.iter().enumerate().flat_map(|(i, def)| {
            (0..def.variants).map(move |v| CellState::new(MaterialId(i as u16), v))
        })
    }

    /// Human-readable form of a state, `ns:path[variant]`.
    pub fn describe(&self, state: CellState) -> String {
        match self.def(state.material) {
            Some(def) => format!("{}[{}]", def.key, state.variant),
            None => format!("<unknown material {}>[{}]", state.material.0, state.variant),
        }
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared handle used by hosts and snapshots.
pub type SharedPalette = Arc<MaterialPalette>;

#[cfg(test)]
mod tests {
    use super::*;

    fn palette() -> MaterialPalette {
        let mut p = MaterialPalette::new();
        p.register_named("core:stone", MaterialClass::Solid, 3).unwrap();
        p.register_named("core:water", MaterialClass::Water, 1).unwrap();
        p
    }

    #[test]
    fn test_void_is_material_zero() {
        let p = MaterialPalette::new();
        assert_eq!(p.state(VOID_MATERIAL, 0), Some(CellState::VOID));
        assert!(CellState::VOID.is_void());
        assert_eq!(p.class_of(CellState::VOID), MaterialClass::Void);
    }

    #[test]
    fn test_ordinals_are_dense() {
        let p = palette();
        assert_eq!(p.state_count(), 5);
        let ordinals: Vec<usize> = p.states().filter_map(|s| p.index_of(s)).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_out_of_range_variant_has_no_index() {
        let p = palette();
        let stone = p.get(&ResourceKey::parse("core:stone").unwrap()).unwrap();
        assert_eq!(p.index_of(CellState::new(stone, 3)), None);
        assert_eq!(p.state("core:stone", 3), None);
        assert_eq!(p.index_of(CellState::new(MaterialId(40), 0)), None);
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut p = palette();
        let again = p.register_named("core:water", MaterialClass::Solid, 9).unwrap();
        assert_eq!(p.def(again).unwrap().class, MaterialClass::Water);
        assert_eq!(p.material_count(), 3);
    }

    #[test]
    fn test_describe() {
        let p = palette();
        let s = p.state("core:stone", 2).unwrap();
        assert_eq!(p.describe(s), "core:stone[2]");
    }
}
