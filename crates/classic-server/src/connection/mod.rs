//! Per-connection protocol state machine.
//!
//! Each accepted socket gets two tasks: this reader, which drives the
//! handshake and play states, and a writer draining the connection's
//! send queue. Session errors end the connection with a 0x0E
//! disconnect where the socket still permits one; they never propagate
//! past this module.

mod commands;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use classic_plugin_api::{Hook, HookBlockPos, HookPlayer, HookResult};
use classic_proto::codec::{ClassicDecode, ClassicEncode};
use classic_proto::cpe::{negotiate, NegotiatedCaps};
use classic_proto::error::ProtoError;
use classic_proto::packets::{
    id, BlockMode, DisconnectPlayer, ExtEntry, ExtInfo, Message, MessageType, Ping,
    PlayerIdentification, PositionOrientation, ServerIdentification, SetBlockClient,
    SetBlockServer, SetClickDistance, TwoWayPing,
};
use classic_proto::packets::user_type::USER_TYPE_OP;
use classic_proto::packets::UpdateUserType;
use classic_proto::spec::PacketTable;
use classic_proto::types::FShort;
use classic_proto::PROTOCOL_VERSION;
use classic_world::events::encoded;
use classic_world::{blocks, Drained, SendQueue, World, WorldError};

use crate::error::SessionError;
use crate::server::Server;

/// Default reach granted through ClickDistance, in fixed-point units
/// (5 blocks).
const DEFAULT_CLICK_DISTANCE: i16 = 160;

/// A connection's identity once it is standing in a world.
pub(crate) struct PlayerHandle {
    pub name: String,
    pub world: Arc<World>,
    pub entity_id: u8,
    pub user_type: u8,
    pub caps: NegotiatedCaps,
    pub table: PacketTable,
}

impl PlayerHandle {
    fn hook_player(&self) -> HookPlayer {
        HookPlayer {
            name: self.name.clone(),
            entity_id: self.entity_id,
            world: self.world.name().to_string(),
        }
    }
}

/// Entry point for one accepted socket.
pub async fn handle(
    server: Arc<Server>,
    socket: TcpStream,
    peer: SocketAddr,
    mut shutdown: watch::Receiver<bool>,
) {
    socket.set_nodelay(true).ok();
    let (mut reader, writer) = socket.into_split();
    let queue = Arc::new(SendQueue::new(
        server.config.network.queue_capacity,
        server.config.network.policy(),
    ));
    let writer_task = tokio::spawn(writer_loop(writer, queue.clone()));

    let mut state = "connecting";
    let mut player: Option<PlayerHandle> = None;
    let result = tokio::select! {
        result = run_session(&server, &mut reader, &queue, &mut state, &mut player) => result,
        _ = shutdown_requested(&mut shutdown) => {
            queue.close("Server shutting down");
            Ok(())
        }
    };

    match &result {
        Ok(()) => debug!(peer = %peer, "session ended"),
        Err(e) if e.is_clean_close() => debug!(peer = %peer, state, "client disconnected"),
        Err(e) => warn!(peer = %peer, state, error = %e, "session error"),
    }

    if let Some(player) = player.take() {
        player.world.leave(player.entity_id);
        player.world.chat(
            None,
            MessageType::Chat,
            format!("{} left the world", player.name),
        );
        server
            .plugins
            .lock()
            .expect("plugin lock poisoned")
            .dispatch(&Hook::PlayerQuit {
                player: player.hook_player(),
            });
        info!(peer = %peer, player = %player.name, "player disconnected");
    }

    let reason = match &result {
        Ok(()) => String::new(),
        Err(e) => e.disconnect_reason().unwrap_or_default(),
    };
    queue.close(&reason);
    let _ = writer_task.await;
}

/// Resolves once shutdown is requested. A dropped sender counts.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

async fn writer_loop(mut writer: OwnedWriteHalf, queue: Arc<SendQueue>) {
    loop {
        match queue.drain().await {
            Drained::Batch(batch) => {
                for packet in batch {
                    if writer.write_all(&packet.bytes).await.is_err() {
                        return;
                    }
                }
                if writer.flush().await.is_err() {
                    return;
                }
            }
            Drained::Closed(reason) => {
                if !reason.is_empty() {
                    let mut buf = BytesMut::new();
                    DisconnectPlayer::new(reason).encode(&mut buf);
                    let _ = writer.write_all(&buf).await;
                    let _ = writer.flush().await;
                }
                let _ = writer.shutdown().await;
                return;
            }
        }
    }
}

/// Read exactly the declared body of a packet whose id byte was
/// already consumed.
async fn read_body(reader: &mut OwnedReadHalf, len: usize) -> Result<Vec<u8>, SessionError> {
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(body)
}

/// Read one id byte and require it to be `expected`.
async fn expect_id(
    reader: &mut OwnedReadHalf,
    expected: u8,
    state: &'static str,
) -> Result<(), SessionError> {
    let mut id_buf = [0u8; 1];
    reader.read_exact(&mut id_buf).await?;
    if id_buf[0] != expected {
        return Err(SessionError::UnexpectedPacket {
            id: id_buf[0],
            state,
        });
    }
    Ok(())
}

fn push(queue: &SendQueue, packet: &impl ClassicEncode, critical: bool) {
    queue.push(encoded(packet, critical));
}

fn server_message(queue: &SendQueue, text: impl Into<String>) {
    push(queue, &Message::chat(0, text), false);
}

async fn run_session(
    server: &Arc<Server>,
    reader: &mut OwnedReadHalf,
    queue: &Arc<SendQueue>,
    state: &mut &'static str,
    player: &mut Option<PlayerHandle>,
) -> Result<(), SessionError> {
    // Connecting: identification, version check, name verification.
    *state = "connecting";
    expect_id(reader, id::IDENTIFICATION, "connecting").await?;
    let body = read_body(reader, 130).await?;
    let ident = PlayerIdentification::decode(&mut &body[..])?;

    if ident.protocol_version != PROTOCOL_VERSION {
        return Err(SessionError::UnsupportedProtocolVersion(
            ident.protocol_version,
        ));
    }
    if !server.auth.verify(&ident.username, &ident.verification_key) {
        return Err(SessionError::AuthenticationFailed(ident.username));
    }
    if server.player_count() >= server.config.server.max_players as usize {
        return Err(SessionError::ServerFull);
    }

    // Negotiating extensions, entered only for CPE-capable clients.
    let caps = if ident.supports_cpe() && server.config.server.enable_cpe {
        *state = "negotiating-extensions";
        negotiate_extensions(server, reader, queue).await?
    } else {
        NegotiatedCaps::none()
    };

    // Logging in: greet and resolve the target world.
    *state = "logging-in";
    let user_type = server.user_type(&ident.username);
    push(
        queue,
        &ServerIdentification {
            protocol_version: PROTOCOL_VERSION,
            server_name: server.config.server.name.clone(),
            motd: server.config.server.motd.clone(),
            user_type,
        },
        true,
    );
    push(queue, &UpdateUserType { user_type }, true);
    let world = server
        .default_world()
        .ok_or_else(|| SessionError::WorldUnavailable(server.config.world.name.clone()))?;

    // Spawning: level transfer, entity id allocation, announcements.
    *state = "spawning";
    let table = PacketTable::resolve(&server.caps, &caps);
    let join = world.join(ident.username.clone(), caps.clone(), queue.clone())?;
    if caps.supports(SetClickDistance::EXTENSION, 1) {
        push(
            queue,
            &SetClickDistance {
                distance: FShort(DEFAULT_CLICK_DISTANCE),
            },
            true,
        );
    }
    world.chat(
        None,
        MessageType::Chat,
        format!("{} joined the world", ident.username),
    );
    info!(
        player = %ident.username,
        entity_id = join.entity_id,
        world = world.name(),
        extensions = caps.len(),
        "player joined"
    );

    let handle = PlayerHandle {
        name: ident.username,
        world,
        entity_id: join.entity_id,
        user_type,
        caps,
        table,
    };
    server
        .plugins
        .lock()
        .expect("plugin lock poisoned")
        .dispatch(&Hook::PlayerJoin {
            player: handle.hook_player(),
        });
    *player = Some(handle);

    *state = "playing";
    match player.as_mut() {
        Some(handle) => play(server, reader, queue, handle).await,
        None => Ok(()),
    }
}

/// Server side of the ExtInfo/ExtEntry exchange: advertise the frozen
/// catalog, then collect the client's declarations.
async fn negotiate_extensions(
    server: &Arc<Server>,
    reader: &mut OwnedReadHalf,
    queue: &SendQueue,
) -> Result<NegotiatedCaps, SessionError> {
    let catalog = server.caps.list();
    push(
        queue,
        &ExtInfo {
            app_name: format!("classic-rs {}", env!("CARGO_PKG_VERSION")),
            extension_count: catalog.len() as i16,
        },
        true,
    );
    for cap in catalog {
        push(
            queue,
            &ExtEntry {
                name: cap.name.to_string(),
                version: cap.version,
            },
            true,
        );
    }

    expect_id(reader, id::EXT_INFO, "negotiating-extensions").await?;
    let body = read_body(reader, 66).await?;
    let client_info = ExtInfo::decode(&mut &body[..])?;
    debug!(app = %client_info.app_name, entries = client_info.extension_count, "client ExtInfo");

    let mut entries = Vec::with_capacity(client_info.extension_count as usize);
    for _ in 0..client_info.extension_count {
        expect_id(reader, id::EXT_ENTRY, "negotiating-extensions").await?;
        let body = read_body(reader, 68).await?;
        let entry = ExtEntry::decode(&mut &body[..])?;
        entries.push((entry.name, entry.version));
    }
    Ok(negotiate(&server.caps, &entries))
}

async fn play(
    server: &Arc<Server>,
    reader: &mut OwnedReadHalf,
    queue: &Arc<SendQueue>,
    player: &mut PlayerHandle,
) -> Result<(), SessionError> {
    let idle = Duration::from_secs(server.config.network.idle_timeout_secs.max(1));
    let mut pinged = false;
    loop {
        if queue.is_closed() {
            return Ok(());
        }

        let mut id_buf = [0u8; 1];
        match timeout(idle, reader.read_exact(&mut id_buf)).await {
            Ok(read) => {
                read?;
                pinged = false;
            }
            Err(_) if !pinged => {
                // One probe before giving up on a silent client.
                push(queue, &Ping, true);
                pinged = true;
                continue;
            }
            Err(_) => {
                queue.close("Timed out");
                return Ok(());
            }
        }

        let packet_id = id_buf[0];
        let spec = match player.table.lookup(packet_id) {
            Ok(spec) => spec.clone(),
            Err(ProtoError::RequiresExtension { id, extension }) => {
                return Err(SessionError::CapabilityViolation { id, extension });
            }
            Err(e) => return Err(e.into()),
        };
        let body = read_body(reader, spec.body_size()).await?;
        let mut buf = &body[..];

        match packet_id {
            id::SET_BLOCK_CLIENT => {
                let pkt = SetBlockClient::decode(&mut buf)?;
                on_set_block(server, player, queue, pkt);
            }
            id::POSITION_ORIENTATION => {
                let pkt = PositionOrientation::decode(&mut buf)?;
                player.world.move_entity(
                    player.entity_id,
                    pkt.pos,
                    server.config.network.echo_self_movement,
                );
            }
            id::MESSAGE => {
                let pkt = Message::decode(&mut buf)?;
                on_message(server, player, queue, pkt.text);
            }
            id::TWO_WAY_PING => {
                let pkt = TwoWayPing::decode(&mut buf)?;
                push(queue, &pkt, true);
            }
            other => {
                // Registered but unhandled extension packet.
                debug!(id = format!("0x{other:02X}"), "ignoring inbound packet");
            }
        }
    }
}

fn on_set_block(
    server: &Arc<Server>,
    player: &PlayerHandle,
    queue: &SendQueue,
    pkt: SetBlockClient,
) {
    let resync = |queue: &SendQueue| {
        if let Ok(current) = player.world.block_at(pkt.pos) {
            push(
                queue,
                &SetBlockServer {
                    pos: pkt.pos,
                    block: current,
                },
                false,
            );
        }
    };

    if pkt.block > blocks::MAX_BLOCK_ID {
        warn!(player = %player.name, block = pkt.block, "unknown block id");
        resync(queue);
        return;
    }
    if pkt.mode == BlockMode::Create
        && player.user_type != USER_TYPE_OP
        && !blocks::placeable_by_normal_user(pkt.block)
    {
        server_message(queue, "You may not place that block.");
        resync(queue);
        return;
    }

    let position = HookBlockPos {
        x: pkt.pos.x,
        y: pkt.pos.y,
        z: pkt.pos.z,
    };
    let hook = match pkt.mode {
        BlockMode::Create => Hook::BlockPlace {
            player: player.hook_player(),
            position,
            block_id: pkt.block,
        },
        BlockMode::Destroy => Hook::BlockBreak {
            player: player.hook_player(),
            position,
        },
    };
    if let HookResult::Deny { message } = server
        .plugins
        .lock()
        .expect("plugin lock poisoned")
        .dispatch(&hook)
    {
        server_message(queue, message);
        resync(queue);
        return;
    }

    match player.world.apply_block_change(pkt.pos, pkt.effective_block()) {
        Ok(()) => {}
        Err(err @ WorldError::OutOfBounds { .. }) => {
            // Mutation-local: log and keep the connection.
            warn!(player = %player.name, %err, "block change rejected");
        }
        Err(err) => warn!(player = %player.name, %err, "block change failed"),
    }
}

fn on_message(
    server: &Arc<Server>,
    player: &mut PlayerHandle,
    queue: &Arc<SendQueue>,
    text: String,
) {
    if let Some(command) = text.strip_prefix('/') {
        commands::handle(server, player, queue, command);
        return;
    }

    let verdict = server
        .plugins
        .lock()
        .expect("plugin lock poisoned")
        .dispatch(&Hook::Chat {
            player: player.hook_player(),
            message: text.clone(),
        });
    if let HookResult::Deny { message } = verdict {
        server_message(queue, message);
        return;
    }

    player.world.chat(
        Some(player.entity_id),
        MessageType::Chat,
        format!("<{}> {}", player.name, text),
    );
}
