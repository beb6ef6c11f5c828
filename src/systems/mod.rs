//! Engine systems.
//!
//! Submodules overview
//! - [`audio`] – bridge with the audio thread (poll/update message queues)
//! - [`dispatch`] – roll a cell's effects and hand them to a sink
//! - [`effectsconfig`] – reload rules when load-relevant settings change
//! - [`regionsound`] – keep a listener's looping region sounds in sync
//! - [`reload`] – publish snapshots built by the reload thread
//! - [`scanner`] – sample cells around scanner entities
//! - [`time`] – advance the tick counter

pub mod audio;
pub mod dispatch;
pub mod effectsconfig;
pub mod regionsound;
pub mod reload;
pub mod scanner;
pub mod time;
