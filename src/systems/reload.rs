//! Publishing snapshots built by the reload thread.

use std::sync::Arc;

use bevy_ecs::prelude::*;
use log::{error, info};

use crate::events::reload::ProfilesReloaded;
use crate::resources::profiles::ActiveProfiles;
use crate::resources::reload::ReloadBridge;

/// Swap in every finished snapshot. A failed load keeps the current one.
pub fn apply_reloaded_profiles(
    bridge: Res<ReloadBridge>,
    mut active: ResMut<ActiveProfiles>,
    mut reloaded: MessageWriter<ProfilesReloaded>,
) {
    for result in bridge.rx_done.try_iter() {
        match result {
            Ok(profiles) => {
                info!(
                    "Profiles #{} active (was #{})",
                    profiles.generation,
                    active.generation()
                );
                let generation = profiles.generation;
                active.0 = Arc::new(profiles);
                reloaded.write(ProfilesReloaded { generation });
            }
            Err(e) => error!("Reload failed, keeping profiles #{}: {}", active.generation(), e),
        }
    }
}

/// Advance the ECS message queue for [`ProfilesReloaded`].
pub fn update_reload_messages(mut msgs: ResMut<Messages<ProfilesReloaded>>) {
    msgs.update();
}
