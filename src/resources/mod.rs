//! ECS resources and the data they are built from.
//!
//! This module groups the long-lived data injected into the ECS world: the
//! effect rules, the registries compiled from them, the host world view and
//! the channels to background threads.
//!
//! Overview
//! - `audio` – bridge and channels for the background audio thread
//! - `blockeffect` – particle effects a cell can emit
//! - `config` – rule document format and loading
//! - `effectprofile` – sounds and effects attached to one cell state
//! - `effectsconfig` – engine settings loaded from an INI file
//! - `loadcontext` – shared state while compiling rule documents
//! - `palette` – materials and cell states known to the host
//! - `profiles` – the published snapshot of both registries
//! - `region` – ambient configuration of one region
//! - `regionregistry` – every region profile plus the fallback
//! - `reload` – background thread that rebuilds snapshots
//! - `resourcekey` – `namespace:path` identifiers
//! - `soundeffect` – sound definitions and the sound catalog
//! - `stateregistry` – cell state to effect profile lookup
//! - `tags` – region tag vocabulary
//! - `world` – read access to host cells and regions
//! - `worldtime` – tick counter and pause flag
pub mod audio;
pub mod blockeffect;
pub mod config;
pub mod effectprofile;
pub mod effectsconfig;
pub mod loadcontext;
pub mod palette;
pub mod profiles;
pub mod region;
pub mod regionregistry;
pub mod reload;
pub mod resourcekey;
pub mod soundeffect;
pub mod stateregistry;
pub mod tags;
pub mod world;
pub mod worldtime;
