//! Read access to the host world.
//!
//! The engine never owns world data. Everything it needs goes through the
//! [`WorldAccess`] trait: whether a position is resident, which [`CellState`]
//! it holds, and which region contains it. [`GridWorld`] is a small in-memory
//! implementation made of 16x16x16 chunks, used by the demo host and tests.

use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use rustc_hash::FxHashMap;

use crate::components::cellposition::CellPos;
use crate::resources::palette::{CellState, MaterialClass, MaterialPalette, SharedPalette};

/// Host-assigned identity of a region (biome).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RegionId(pub u16);

pub trait WorldAccess: Send + Sync {
    /// `false` for positions whose chunk is not resident.
    fn is_loaded(&self, pos: CellPos) -> bool;
    /// State at `pos`. Unloaded positions read as void.
    fn cell_state(&self, pos: CellPos) -> CellState;
    fn region_at(&self, pos: CellPos) -> RegionId;
    fn palette(&self) -> &MaterialPalette;

    fn class_at(&self, pos: CellPos) -> MaterialClass {
        self.palette().class_of(self.cell_state(pos))
    }
}

/// The world the engine samples, shared with the host.
#[derive(Resource, Clone)]
pub struct WorldHandle(pub Arc<dyn WorldAccess>);

impl WorldHandle {
    pub fn new(world: impl WorldAccess + 'static) -> Self {
        Self(Arc::new(world))
    }
}

pub const CHUNK_SIZE: i32 = 16;
const CHUNK_VOLUME: usize = (CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE) as usize;

type ChunkKey = (i32, i32, i32);

fn chunk_key(pos: CellPos) -> ChunkKey {
    (
        pos.x.div_euclid(CHUNK_SIZE),
        pos.y.div_euclid(CHUNK_SIZE),
        pos.z.div_euclid(CHUNK_SIZE),
    )
}

fn local_index(pos: CellPos) -> usize {
    let lx = pos.x.rem_euclid(CHUNK_SIZE) as usize;
    let ly = pos.y.rem_euclid(CHUNK_SIZE) as usize;
    let lz = pos.z.rem_euclid(CHUNK_SIZE) as usize;
    let size = CHUNK_SIZE as usize;
    (ly * size + lz) * size + lx
}

/// In-memory chunked world.
pub struct GridWorld {
    palette: SharedPalette,
    chunks: FxHashMap<ChunkKey, Box<[CellState]>>,
    regions: FxHashMap<(i32, i32), RegionId>,
    default_region: RegionId,
}

impl GridWorld {
    pub fn new(palette: SharedPalette, default_region: RegionId) -> Self {
        Self {
            palette,
            chunks: FxHashMap::default(),
            regions: FxHashMap::default(),
            default_region,
        }
    }

    pub fn shared_palette(&self) -> &SharedPalette {
        &self.palette
    }

    /// Make the chunk containing `pos` resident (filled with void).
    pub fn load_chunk_at(&mut self, pos: CellPos) {
        self.chunks
            .entry(chunk_key(pos))
            .or_insert_with(|| vec![CellState::VOID; CHUNK_VOLUME].into_boxed_slice());
    }

    /// Load every chunk overlapping the box `[min, max]`.
    pub fn load_area(&mut self, min: CellPos, max: CellPos) {
        let (x0, y0, z0) = chunk_key(min);
        let (x1, y1, z1) = chunk_key(max);
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                for cz in z0..=z1 {
                    self.load_chunk_at(CellPos::new(
                        cx * CHUNK_SIZE,
                        cy * CHUNK_SIZE,
                        cz * CHUNK_SIZE,
                    ));
                }
            }
        }
    }

    pub fn unload_chunk_at(&mut self, pos: CellPos) -> bool {
        self.chunks.remove(&chunk_key(pos)).is_some()
    }

    pub fn loaded_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Set a single cell. Returns `false` if its chunk is not loaded.
    pub fn set(&mut self, pos: CellPos, state: CellState) -> bool {
        match self.chunks.get_mut(&chunk_key(pos)) {
            Some(chunk) => {
                chunk[local_index(pos)] = state;
                true
            }
            None => false,
        }
    }

    /// Fill the box `[min, max]`, loading chunks as needed.
    pub fn fill(&mut self, min: CellPos, max: CellPos, state: CellState) {
        self.load_area(min, max);
        for y in min.y..=max.y {
            for z in min.z..=max.z {
                for x in min.x..=max.x {
                    self.set(CellPos::new(x, y, z), state);
                }
            }
        }
    }

    /// Assign `region` to every column in `[min_x, max_x] x [min_z, max_z]`.
    pub fn paint_region(&mut self, min_x: i32, min_z: i32, max_x: i32, max_z: i32, region: RegionId) {
        for x in min_x..=max_x {
            for z in min_z..=max_z {
                self.regions.insert((x, z), region);
            }
        }
    }
}

impl WorldAccess for GridWorld {
    fn is_loaded(&self, pos: CellPos) -> bool {
        self.chunks.contains_key(&chunk_key(pos))
    }

    fn cell_state(&self, pos: CellPos) -> CellState {
        self.chunks
            .get(&chunk_key(pos))
            .map(|chunk| chunk[local_index(pos)])
            .unwrap_or(CellState::VOID)
    }

    fn region_at(&self, pos: CellPos) -> RegionId {
        self.regions
            .get(&(pos.x, pos.z))
            .copied()
            .unwrap_or(self.default_region)
    }

    fn palette(&self) -> &MaterialPalette {
        &self.palette
    }
}
