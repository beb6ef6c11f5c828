//! Event and message types, and the observers that react to them.
//!
//! Submodules:
//! - [`audio`] – commands and messages for the background audio thread
//! - [`blockbroken`] – effects for a cell the player just broke
//! - [`particle`] – particle spawn commands for the host renderer
//! - [`reload`] – rule reload requests and completion notices
//!
//! See each submodule for concrete event data and semantics.
pub mod audio;
pub mod blockbroken;
pub mod particle;
pub mod reload;
