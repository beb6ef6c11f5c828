//! Audio commands and messages.
//!
//! Systems write [`AudioCmd`] messages; `forward_audio_cmds` sends them to the
//! background audio thread, which answers with [`AudioMessage`]s.

use bevy_ecs::message::Message;
use bevy_ecs::prelude::Entity;

use crate::resources::resourcekey::ResourceKey;
use crate::resources::soundeffect::SoundCategory;

/// Identifies one playing sound instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundHandle(pub u64);

/// Where a sound plays from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SoundAnchor {
    /// Fixed world position.
    At([f32; 3]),
    /// Follows an entity (usually the listener).
    Tracking(Entity),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatPolicy {
    Once,
    /// Play again `delay` ticks after finishing.
    Repeat { delay: u32 },
    Loop,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoundRequest {
    pub sound: ResourceKey,
    pub category: SoundCategory,
    pub volume: f32,
    pub pitch: f32,
    pub anchor: SoundAnchor,
    pub repeat: RepeatPolicy,
}

/// Commands sent *to* the audio thread.
#[derive(Message, Debug, Clone, PartialEq)]
pub enum AudioCmd {
    Play {
        handle: SoundHandle,
        request: SoundRequest,
    },
    Stop {
        handle: SoundHandle,
    },
    StopAll,
    Shutdown,
}

/// Messages sent *back* from the audio thread.
#[derive(Message, Debug, Clone, PartialEq)]
pub enum AudioMessage {
    Started { handle: SoundHandle },
    Finished { handle: SoundHandle },
    Stopped { handle: SoundHandle },
    Failed { handle: SoundHandle, error: String },
}

impl AudioMessage {
    pub fn handle(&self) -> SoundHandle {
        match self {
            AudioMessage::Started { handle }
            | AudioMessage::Finished { handle }
            | AudioMessage::Stopped { handle }
            | AudioMessage::Failed { handle, .. } => *handle,
        }
    }

    /// `true` once the instance is no longer audible.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AudioMessage::Started { .. })
    }
}
