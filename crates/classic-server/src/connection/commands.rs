//! Chat commands, `/`-prefixed in a 0x0D message.

use std::sync::Arc;

use tracing::info;

use classic_proto::packets::MessageType;
use classic_proto::types::SELF_ENTITY_ID;
use classic_world::SendQueue;

use crate::server::Server;

use super::{server_message, PlayerHandle};

pub(crate) fn handle(
    server: &Arc<Server>,
    player: &mut PlayerHandle,
    queue: &Arc<SendQueue>,
    command: &str,
) {
    let mut parts = command.split_whitespace();
    match parts.next() {
        Some("worlds") => {
            let names = server.worlds.names().join(", ");
            server_message(queue, format!("Worlds: {names}"));
        }
        Some("goto") => match parts.next() {
            Some(target) => goto(server, player, queue, target),
            None => server_message(queue, "Usage: /goto <world>"),
        },
        Some(other) => server_message(queue, format!("Unknown command: /{other}")),
        None => {}
    }
}

/// Move the player to another world. Membership in the old world ends
/// before the target's level streams: a connection belongs to at most
/// one world at a time, and a stale old-world broadcast must not land
/// after the new LevelInitialize. If the target turns out to be full,
/// the player re-enters the previous world.
fn goto(server: &Arc<Server>, player: &mut PlayerHandle, queue: &Arc<SendQueue>, target: &str) {
    if target == player.world.name() {
        server_message(queue, format!("You are already in {target}"));
        return;
    }
    let Some(world) = server.worlds.get(target) else {
        server_message(queue, format!("No such world: {target}"));
        return;
    };

    let old = player.world.clone();
    old.leave(player.entity_id);
    old.chat(
        None,
        MessageType::Chat,
        format!("{} left the world", player.name),
    );

    match world.join(player.name.clone(), player.caps.clone(), queue.clone()) {
        Ok(join) => {
            player.world = world;
            player.entity_id = join.entity_id;
            player.world.chat(
                None,
                MessageType::Chat,
                format!("{} joined the world", player.name),
            );
            info!(player = %player.name, world = target, "switched world");
        }
        Err(err) => match old.join(player.name.clone(), player.caps.clone(), queue.clone()) {
            Ok(back) => {
                player.entity_id = back.entity_id;
                server_message(queue, format!("Cannot enter {target}: {err}"));
            }
            Err(_) => {
                // The old world filled up in the meantime; nowhere to
                // stand. 255 is never allocated, so the disconnect
                // cleanup's leave cannot despawn someone else.
                player.entity_id = SELF_ENTITY_ID;
                queue.close("No world available");
            }
        },
    }
}
