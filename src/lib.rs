//! ambientfx library.
//!
//! Ambient block and region effects for a voxel client, built on bevy_ecs.
//!
//! # Project Structure
//!
//! - [`components`] – per-entity scanner and listener state, cell positions
//! - [`events`] – audio and particle commands, block-broken and reload events
//! - [`expression`] – the condition language used by every rule
//! - [`resources`] – rule loading, profile registries, settings, bridges
//! - [`systems`] – scanning, dispatch, region sounds, audio and reload plumbing
//! - [`engine`] – wiring everything into a world and a tick schedule
//! - [`demo`] – a generated world for the headless binary and tests

pub mod components;
pub mod demo;
pub mod engine;
pub mod events;
pub mod expression;
pub mod resources;
pub mod systems;
pub mod weighttable;
