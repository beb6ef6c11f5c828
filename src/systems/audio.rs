//! Audio systems backed by a dedicated thread.
//!
//! - [`audio_thread`] runs on its own OS thread, owns the
//!   [`AudioBackend`](crate::resources::audio::AudioBackend) and processes
//!   [`AudioCmd`] messages, emitting [`AudioMessage`] responses.
//! - [`poll_audio_messages`] drains the thread's replies into the ECS queue.
//! - [`track_playing_sounds`] releases handles that stopped being audible.
//! - [`forward_audio_cmds`] sends the commands systems wrote this tick.
//!
//! The thread must be created via [`crate::resources::audio::setup_audio`]
//! and joined via [`crate::resources::audio::shutdown_audio`].

use std::time::Duration;

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{debug, warn};
use rustc_hash::FxHashSet;

use crate::events::audio::{AudioCmd, AudioMessage, SoundHandle};
use crate::resources::audio::{AudioBackend, AudioBridge, SoundHandles};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Drain pending replies from the audio thread into `Messages<AudioMessage>`.
pub fn poll_audio_messages(bridge: Res<AudioBridge>, mut writer: MessageWriter<AudioMessage>) {
    writer.write_batch(bridge.rx_msg.try_iter());
}

/// Advance the ECS message queue for [`AudioMessage`].
///
/// Run after [`poll_audio_messages`] so readers see this tick's replies.
pub fn update_bevy_audio_messages(mut msgs: ResMut<Messages<AudioMessage>>) {
    msgs.update();
}

/// Release handles of sounds that finished, stopped or failed.
pub fn track_playing_sounds(mut reader: MessageReader<AudioMessage>, mut handles: ResMut<SoundHandles>) {
    for msg in reader.read() {
        if let AudioMessage::Failed { handle, error } = msg {
            warn!("Sound #{} failed: {}", handle.0, error);
        }
        if msg.is_terminal() {
            handles.release(msg.handle());
        }
    }
}

/// Forward ECS [`AudioCmd`] messages to the audio thread.
pub fn forward_audio_cmds(bridge: Res<AudioBridge>, mut reader: MessageReader<AudioCmd>) {
    for cmd in reader.read() {
        // ignore send errors during shutdown
        let _ = bridge.tx_cmd.send(cmd.clone());
    }
}

/// Advance the ECS message queue for [`AudioCmd`].
pub fn update_bevy_audio_cmds(mut msgs: ResMut<Messages<AudioCmd>>) {
    msgs.update();
}

/// Entry point of the audio thread.
///
/// Blocks until [`AudioCmd::Shutdown`] arrives or every sender is gone.
/// Between commands the backend is polled for sounds that ended.
pub fn audio_thread(rx_cmd: Receiver<AudioCmd>, tx_msg: Sender<AudioMessage>, mut backend: impl AudioBackend) {
    debug!("[audio] thread starting (id={:?})", std::thread::current().id());
    let mut playing: FxHashSet<SoundHandle> = FxHashSet::default();

    'run: loop {
        match rx_cmd.recv_timeout(POLL_INTERVAL) {
            Ok(cmd) => {
                if !handle_cmd(cmd, &mut backend, &mut playing, &tx_msg) {
                    break 'run;
                }
                for cmd in rx_cmd.try_iter() {
                    if !handle_cmd(cmd, &mut backend, &mut playing, &tx_msg) {
                        break 'run;
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break 'run,
        }

        for handle in backend.finished() {
            if playing.remove(&handle) {
                let _ = tx_msg.send(AudioMessage::Finished { handle });
            }
        }
    }

    stop_all(&mut backend, &mut playing, &tx_msg);
    debug!("[audio] thread exiting (id={:?})", std::thread::current().id());
}

/// Returns `false` when the thread should exit.
fn handle_cmd(
    cmd: AudioCmd,
    backend: &mut impl AudioBackend,
    playing: &mut FxHashSet<SoundHandle>,
    tx_msg: &Sender<AudioMessage>,
) -> bool {
    match cmd {
        AudioCmd::Play { handle, request } => match backend.play(handle, &request) {
            Ok(()) => {
                playing.insert(handle);
                let _ = tx_msg.send(AudioMessage::Started { handle });
            }
            Err(error) => {
                let _ = tx_msg.send(AudioMessage::Failed { handle, error });
            }
        },
        AudioCmd::Stop { handle } => {
            if playing.remove(&handle) {
                backend.stop(handle);
                let _ = tx_msg.send(AudioMessage::Stopped { handle });
            }
        }
        AudioCmd::StopAll => stop_all(backend, playing, tx_msg),
        AudioCmd::Shutdown => {
            debug!("[audio] shutdown requested");
            return false;
        }
    }
    true
}

fn stop_all(backend: &mut impl AudioBackend, playing: &mut FxHashSet<SoundHandle>, tx_msg: &Sender<AudioMessage>) {
    for handle in playing.drain() {
        backend.stop(handle);
        let _ = tx_msg.send(AudioMessage::Stopped { handle });
    }
}
