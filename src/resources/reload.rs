//! Background profile loading.
//!
//! Loading reads files and compiles every rule, so it runs on its own thread.
//! [`setup_reload`] spawns the worker and inserts the [`ReloadBridge`];
//! finished snapshots come back over a channel and are published by
//! [`crate::systems::reload::apply_reloaded_profiles`].

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::debug;

use crate::resources::config::LoadError;
use crate::resources::effectsconfig::EffectsConfig;
use crate::resources::profiles::{EffectProfiles, ProfileSources, load_from_disk};

pub enum ReloadJob {
    Load {
        sources: ProfileSources,
        settings: EffectsConfig,
    },
    Shutdown,
}

pub type ReloadResult = Result<EffectProfiles, LoadError>;

#[derive(Resource)]
pub struct ReloadBridge {
    pub tx_job: Sender<ReloadJob>,
    pub rx_done: Receiver<ReloadResult>,
    pub handle: std::thread::JoinHandle<()>,
}

impl ReloadBridge {
    /// Queue a load. Fails only if the worker has exited.
    pub fn request(&self, sources: ProfileSources, settings: EffectsConfig) -> Result<(), LoadError> {
        self.tx_job
            .send(ReloadJob::Load { sources, settings })
            .map_err(|_| LoadError::WorkerGone)
    }
}

/// Worker loop: load every queued job until shutdown.
pub fn reload_thread(rx_job: Receiver<ReloadJob>, tx_done: Sender<ReloadResult>) {
    debug!("[reload] thread starting (id={:?})", std::thread::current().id());
    for job in rx_job.iter() {
        match job {
            ReloadJob::Load { sources, settings } => {
                if tx_done.send(load_from_disk(&sources, &settings)).is_err() {
                    break;
                }
            }
            ReloadJob::Shutdown => break,
        }
    }
    debug!("[reload] thread exiting");
}

pub fn setup_reload(world: &mut World) {
    let (tx_job, rx_job) = unbounded::<ReloadJob>();
    let (tx_done, rx_done) = unbounded::<ReloadResult>();
    let handle = std::thread::spawn(move || reload_thread(rx_job, tx_done));
    world.insert_resource(ReloadBridge {
        tx_job,
        rx_done,
        handle,
    });
}

pub fn shutdown_reload(world: &mut World) {
    if let Some(bridge) = world.remove_resource::<ReloadBridge>() {
        let _ = bridge.tx_job.send(ReloadJob::Shutdown);
        let _ = bridge.handle.join();
    }
}
