//! ECS components for entities.
//!
//! Submodules overview:
//! - [`ambientlistener`] – looping region sounds currently owned by a listener
//! - [`cellposition`] – integer cell coordinates of an entity
//! - [`scanner`] – countdown and statistics of the cell scanner

pub mod ambientlistener;
pub mod cellposition;
pub mod scanner;
