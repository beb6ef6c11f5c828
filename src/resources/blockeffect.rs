//! Visual effects attached to cell profiles.
//!
//! Each effect has a 1-in-`chance` roll, an optional condition evaluated
//! against the region of the cell, and a kind-specific check of the cell's
//! neighborhood. Effects that pass produce a [`ParticleCmd`].

use std::fmt;
use std::sync::Arc;

use fastrand::Rng;
use log::warn;

use crate::components::cellposition::CellPos;
use crate::events::particle::{ParticleCmd, ParticleParams};
use crate::expression::Expression;
use crate::resources::config::EffectConfig;
use crate::resources::loadcontext::LoadContext;
use crate::resources::palette::MaterialClass;
use crate::resources::region::RegionProfile;
use crate::resources::world::WorldAccess;

/// Used when an effect entry gives no chance.
pub const DEFAULT_EFFECT_CHANCE: u32 = 100;
const MAX_JET_STRENGTH: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockEffectKind {
    /// Steam rising from water touching lava.
    Steam,
    /// Flames licking up from lava or fire.
    Fire,
    /// Bubbles rising through water.
    Bubble,
    /// Dust falling from a ceiling.
    Dust,
    /// Jet shooting upward from a liquid surface.
    Fountain,
    /// Glowing motes drifting over foliage.
    Firefly,
    /// Spray where falling water hits something.
    Splash,
}

impl BlockEffectKind {
    pub const ALL: [BlockEffectKind; 7] = [
        BlockEffectKind::Steam,
        BlockEffectKind::Fire,
        BlockEffectKind::Bubble,
        BlockEffectKind::Dust,
        BlockEffectKind::Fountain,
        BlockEffectKind::Firefly,
        BlockEffectKind::Splash,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(name))
    }

    pub fn name(self) -> &'static str {
        match self {
            BlockEffectKind::Steam => "steam",
            BlockEffectKind::Fire => "fire",
            BlockEffectKind::Bubble => "bubble",
            BlockEffectKind::Dust => "dust",
            BlockEffectKind::Fountain => "fountain",
            BlockEffectKind::Firefly => "firefly",
            BlockEffectKind::Splash => "splash",
        }
    }

    /// Whether the neighborhood of `pos` lets this effect show.
    pub fn neighborhood_allows(self, world: &dyn WorldAccess, pos: CellPos) -> bool {
        let above = world.class_at(pos.up());
        let below = world.class_at(pos.down());
        match self {
            BlockEffectKind::Steam => {
                above == MaterialClass::Void && lava_contacts(world, pos) > 0
            }
            BlockEffectKind::Fire | BlockEffectKind::Fountain | BlockEffectKind::Firefly => {
                above == MaterialClass::Void
            }
            BlockEffectKind::Bubble => above == MaterialClass::Water,
            BlockEffectKind::Dust => below == MaterialClass::Void,
            BlockEffectKind::Splash => {
                above == MaterialClass::Water && !matches!(below, MaterialClass::Void | MaterialClass::Water)
            }
        }
    }
}

impl fmt::Display for BlockEffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn lava_contacts(world: &dyn WorldAccess, pos: CellPos) -> usize {
    pos.horizontal()
        .into_iter()
        .chain([pos.down()])
        .filter(|p| world.class_at(*p) == MaterialClass::Lava)
        .count()
}

fn water_column(world: &dyn WorldAccess, pos: CellPos) -> usize {
    let mut count = 0;
    let mut cursor = pos.up();
    while count < MAX_JET_STRENGTH as usize && world.class_at(cursor) == MaterialClass::Water {
        count += 1;
        cursor = cursor.up();
    }
    count
}

#[derive(Debug, Clone)]
pub struct BlockEffect {
    pub kind: BlockEffectKind,
    pub chance: u32,
    pub condition: Arc<Expression>,
}

impl BlockEffect {
    pub fn new(kind: BlockEffectKind, chance: u32) -> Self {
        Self {
            kind,
            chance,
            condition: Arc::new(Expression::always()),
        }
    }

    /// Build from a rule entry. Unknown and disabled kinds, and conditions
    /// that do not compile, yield `None`.
    pub fn from_config(cfg: &EffectConfig, ctx: &mut LoadContext) -> Option<Self> {
        let name = cfg.effect.as_deref().map(str::trim).filter(|n| !n.is_empty())?;
        let Some(kind) = BlockEffectKind::from_name(name) else {
            warn!("Unknown block effect type in configuration: [{}]", name);
            ctx.skip();
            return None;
        };
        if !ctx.settings.is_effect_enabled(kind) {
            ctx.skip();
            return None;
        }
        let Some(condition) = ctx.condition(cfg.conditions.as_deref()) else {
            ctx.skip();
            return None;
        };
        Some(Self {
            kind,
            chance: cfg.chance.unwrap_or(DEFAULT_EFFECT_CHANCE),
            condition,
        })
    }

    pub fn can_trigger(
        &self,
        world: &dyn WorldAccess,
        pos: CellPos,
        region: &RegionProfile,
        rng: &mut Rng,
    ) -> bool {
        self.chance > 0
            && rng.u32(..self.chance) == 0
            && self.condition.matches(region)
            && self.kind.neighborhood_allows(world, pos)
    }

    pub fn do_effect(
        &self,
        world: &dyn WorldAccess,
        pos: CellPos,
        region: &RegionProfile,
        rng: &mut Rng,
    ) -> ParticleCmd {
        let mut params = ParticleParams::new();
        let [x, y, z] = pos.center();
        let origin = match self.kind {
            BlockEffectKind::Steam => {
                params.push(lava_contacts(world, pos) as f32);
                [x, y + 0.5, z]
            }
            BlockEffectKind::Fire => {
                params.push(rng.u32(1..=3) as f32);
                [x, y + 0.5, z]
            }
            BlockEffectKind::Bubble => [x + rng.f32() - 0.5, y, z + rng.f32() - 0.5],
            BlockEffectKind::Dust => {
                let [r, g, b] = region.dust_color;
                params.push(f32::from(r) / 255.0);
                params.push(f32::from(g) / 255.0);
                params.push(f32::from(b) / 255.0);
                [x + rng.f32() - 0.5, y - 0.5, z + rng.f32() - 0.5]
            }
            BlockEffectKind::Fountain => {
                params.push(rng.u32(1..=MAX_JET_STRENGTH as u32) as f32);
                [x, y + 0.5, z]
            }
            BlockEffectKind::Firefly => [x, y + 0.5 + rng.f32(), z],
            BlockEffectKind::Splash => {
                params.push(water_column(world, pos) as f32);
                [x, y + 0.5, z]
            }
        };
        ParticleCmd {
            kind: self.kind,
            origin,
            params,
        }
    }
}

impl fmt::Display for BlockEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} 1/{}", self.kind, self.chance)?;
        if !self.condition.is_always() {
            write!(f, " ({})", self.condition)?;
        }
        Ok(())
    }
}
