//! ECS resources that bridge the main thread with the background audio thread.
//!
//! Use [`setup_audio`] once during initialization to spawn the audio thread
//! and insert the [`AudioBridge`], [`SoundHandles`] and message resources.
//! Call [`shutdown_audio`] during teardown to stop the thread.
//!
//! The engine never touches an audio device itself. The host supplies an
//! [`AudioBackend`] which the audio thread owns and drives.

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::info;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::events::audio::{AudioCmd, AudioMessage, RepeatPolicy, SoundAnchor, SoundHandle, SoundRequest};
use crate::systems::audio::audio_thread;

/// Device side of audio playback. Lives on the audio thread.
pub trait AudioBackend: Send {
    fn play(&mut self, handle: SoundHandle, request: &SoundRequest) -> Result<(), String>;
    fn stop(&mut self, handle: SoundHandle);
    /// Handles whose playback ended on its own since the last call.
    fn finished(&mut self) -> Vec<SoundHandle>;
}

/// Backend that only logs. One-shot sounds finish on the next poll; looping
/// and repeating sounds play until stopped.
#[derive(Debug, Default)]
pub struct LogAudioBackend {
    active: FxHashMap<SoundHandle, RepeatPolicy>,
}

impl AudioBackend for LogAudioBackend {
    fn play(&mut self, handle: SoundHandle, request: &SoundRequest) -> Result<(), String> {
        let at = match request.anchor {
            SoundAnchor::At([x, y, z]) => format!("({x:.1}, {y:.1}, {z:.1})"),
            SoundAnchor::Tracking(entity) => format!("{entity:?}"),
        };
        info!(
            "[audio] play #{} {} [{}] v:{:.2} p:{:.2} at {} {:?}",
            handle.0,
            request.sound,
            request.category.name(),
            request.volume,
            request.pitch,
            at,
            request.repeat
        );
        self.active.insert(handle, request.repeat);
        Ok(())
    }

    fn stop(&mut self, handle: SoundHandle) {
        if self.active.remove(&handle).is_some() {
            info!("[audio] stop #{}", handle.0);
        }
    }

    fn finished(&mut self) -> Vec<SoundHandle> {
        let done: Vec<SoundHandle> = self
            .active
            .iter()
            .filter(|(_, repeat)| **repeat == RepeatPolicy::Once)
            .map(|(h, _)| *h)
            .collect();
        for h in &done {
            self.active.remove(h);
        }
        done
    }
}

/// Shared bridge between the ECS world and the audio thread.
#[derive(Resource)]
pub struct AudioBridge {
    /// Sender for [`AudioCmd`] messages (ECS -> audio thread).
    pub tx_cmd: Sender<AudioCmd>,
    /// Receiver for [`AudioMessage`] messages (audio thread -> ECS).
    pub rx_msg: Receiver<AudioMessage>,
    /// Join handle for the background audio thread.
    pub handle: std::thread::JoinHandle<()>,
}

/// Allocates sound handles and tracks which ones are audible.
#[derive(Resource, Debug, Default)]
pub struct SoundHandles {
    next: u64,
    playing: FxHashSet<SoundHandle>,
}

impl SoundHandles {
    /// New handle, counted as playing until a terminal message arrives.
    pub fn allocate(&mut self) -> SoundHandle {
        self.next += 1;
        let handle = SoundHandle(self.next);
        self.playing.insert(handle);
        handle
    }

    pub fn release(&mut self, handle: SoundHandle) {
        self.playing.remove(&handle);
    }

    pub fn is_playing(&self, handle: SoundHandle) -> bool {
        self.playing.contains(&handle)
    }

    pub fn playing_count(&self) -> usize {
        self.playing.len()
    }
}

/// Spawn the audio thread around `backend` and register bridge resources.
pub fn setup_audio(world: &mut World, backend: impl AudioBackend + 'static) {
    let (tx_cmd, rx_cmd) = unbounded::<AudioCmd>();
    let (tx_msg, rx_msg) = unbounded::<AudioMessage>();

    let handle = std::thread::spawn(move || audio_thread(rx_cmd, tx_msg, backend));

    world.insert_resource(AudioBridge {
        tx_cmd,
        rx_msg,
        handle,
    });
    world.init_resource::<SoundHandles>();
    world.init_resource::<Messages<AudioMessage>>();
    world.init_resource::<Messages<AudioCmd>>();
}

/// Request shutdown of the audio thread and join it.
pub fn shutdown_audio(world: &mut World) {
    if let Some(bridge) = world.remove_resource::<AudioBridge>() {
        let _ = bridge.tx_cmd.send(AudioCmd::Shutdown);
        let _ = bridge.handle.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::resourcekey::ResourceKey;
    use crate::resources::soundeffect::SoundCategory;

    fn request(repeat: RepeatPolicy) -> SoundRequest {
        SoundRequest {
            sound: ResourceKey::parse("core:drip").unwrap(),
            category: SoundCategory::Blocks,
            volume: 1.0,
            pitch: 1.0,
            anchor: SoundAnchor::At([0.5, 0.5, 0.5]),
            repeat,
        }
    }

    #[test]
    fn test_handles_are_unique() {
        let mut handles = SoundHandles::default();
        let a = handles.allocate();
        let b = handles.allocate();
        assert_ne!(a, b);
        assert_eq!(handles.playing_count(), 2);
        handles.release(a);
        assert!(!handles.is_playing(a));
        assert!(handles.is_playing(b));
    }

    #[test]
    fn test_log_backend_finishes_one_shots_only() {
        let mut backend = LogAudioBackend::default();
        backend.play(SoundHandle(1), &request(RepeatPolicy::Once)).unwrap();
        backend.play(SoundHandle(2), &request(RepeatPolicy::Loop)).unwrap();
        assert_eq!(backend.finished(), vec![SoundHandle(1)]);
        assert!(backend.finished().is_empty());
        backend.stop(SoundHandle(2));
        assert!(backend.active.is_empty());
    }
}
