//! Weighted random selection.
//!
//! A [`WeightTable`] is built on the spot from whatever candidates are live at
//! selection time (for example the spot sounds of a region whose conditions
//! currently hold) and thrown away after [`WeightTable::pick`]. It only
//! borrows its items.
//!
//! # Semantics
//!
//! - The draw is a uniform integer in `[0, total)`.
//! - The list is walked accumulating weights; the first item whose running
//!   sum exceeds the draw wins.
//! - An empty table, or one where every weight is zero, yields `None` and never
//!   draws from the RNG.

use std::sync::Arc;

use fastrand::Rng;
use smallvec::SmallVec;

/// Something that can take part in a weighted pick.
pub trait Weighted {
    /// Relative weight. Zero means "never picked".
    fn weight(&self) -> u32;
}

impl<T: Weighted + ?Sized> Weighted for Arc<T> {
    fn weight(&self) -> u32 {
        (**self).weight()
    }
}

impl<T: Weighted + ?Sized> Weighted for &T {
    fn weight(&self) -> u32 {
        (**self).weight()
    }
}

/// Ephemeral weighted selection table over borrowed items.
#[derive(Debug)]
pub struct WeightTable<'a, T> {
    items: SmallVec<[&'a T; 8]>,
    total: u64,
}

impl<T> Default for WeightTable<'_, T> {
    fn default() -> Self {
        Self {
            items: SmallVec::new(),
            total: 0,
        }
    }
}

impl<'a, T: Weighted> WeightTable<'a, T> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a candidate.
    pub fn push(&mut self, item: &'a T) {
        self.total += u64::from(item.weight());
        self.items.push(item);
    }

    /// Sum of all candidate weights.
    pub fn total_weight(&self) -> u64 {
        self.total
    }

    /// Number of candidates, including zero-weight ones.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Pick one candidate proportionally to its weight.
    ///
    /// Returns `None` when there is nothing with a positive weight.
    pub fn pick(&self, rng: &mut Rng) -> Option<&'a T> {
        if self.total == 0 {
            return None;
        }
        let draw = rng.u64(0..self.total);
        let mut running = 0u64;
        for item in &self.items {
            running += u64::from(item.weight());
            if running > draw {
                return Some(*item);
            }
        }
        None
    }
}

impl<'a, T: Weighted> FromIterator<&'a T> for WeightTable<'a, T> {
    fn from_iter<I: IntoIterator<Item = &'a T>>(iter: I) -> Self {
        let mut table = WeightTable::new();
        for item in iter {
            table.push(item);
        }
        table
    }
}
