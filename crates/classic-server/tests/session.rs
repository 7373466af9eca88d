//! End-to-end sessions over a real TCP socket.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::timeout;

use classic_proto::codec::ClassicEncode;
use classic_proto::packets::{id, BlockMode, Message, PlayerIdentification, SetBlockClient};
use classic_proto::types::{BlockPos, PlayerPos};
use classic_proto::{CPE_MAGIC, PROTOCOL_VERSION};
use classic_server::{persistence, Server, ServerConfig};
use classic_world::{mapgen, World};

const READ_TIMEOUT: Duration = Duration::from_secs(5);

struct TestServer {
    addr: SocketAddr,
    // Dropping the sender shuts the server down.
    shutdown: watch::Sender<bool>,
    data_dir: PathBuf,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.data_dir).ok();
    }
}

async fn start_server(extra: &str) -> TestServer {
    let data_dir = std::env::temp_dir().join(format!("classic_e2e_{}", rand::random::<u64>()));
    start_server_in(data_dir, extra).await
}

async fn start_server_in(data_dir: PathBuf, extra: &str) -> TestServer {
    let config: ServerConfig = toml::from_str(&format!(
        r#"
        [server]
        address = "127.0.0.1"
        port = 0
        name = "e2e"
        motd = "integration"
        {extra}

        [world]
        name = "main"
        width = 16
        height = 16
        depth = 16
        data_dir = "{}"
        auto_save_interval = 0
    "#,
        data_dir.display()
    ))
    .unwrap();

    let server = Server::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(server.serve(listener, shutdown_rx));
    TestServer {
        addr,
        shutdown: shutdown_tx,
        data_dir,
    }
}

fn body_len(packet_id: u8) -> usize {
    match packet_id {
        id::IDENTIFICATION => 130,
        id::PING | id::LEVEL_INITIALIZE => 0,
        id::LEVEL_DATA_CHUNK => 1027,
        id::LEVEL_FINALIZE => 6,
        id::SET_BLOCK_SERVER => 7,
        id::SPAWN_PLAYER => 73,
        id::POSITION_ORIENTATION => 9,
        id::DESPAWN_PLAYER | id::UPDATE_USER_TYPE => 1,
        id::MESSAGE => 65,
        id::DISCONNECT => 64,
        id::EXT_INFO => 66,
        id::EXT_ENTRY => 68,
        id::SET_CLICK_DISTANCE | id::HOLD_THIS => 2,
        id::TWO_WAY_PING => 3,
        other => panic!("unexpected packet id 0x{other:02X}"),
    }
}

fn field_string(body: &[u8], offset: usize) -> String {
    body[offset..offset + 64]
        .iter()
        .map(|&b| b as char)
        .collect::<String>()
        .trim_matches([' ', '\0'])
        .to_string()
}

struct Client {
    stream: TcpStream,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        Self { stream }
    }

    async fn send(&mut self, packet: &impl ClassicEncode) {
        let mut buf = BytesMut::new();
        packet.encode(&mut buf);
        self.stream.write_all(&buf).await.unwrap();
    }

    async fn identify(&mut self, name: &str, pad: u8, protocol: u8) {
        self.send(&PlayerIdentification {
            protocol_version: protocol,
            username: name.into(),
            verification_key: String::new(),
            pad,
        })
        .await;
    }

    async fn read_packet(&mut self) -> (u8, Vec<u8>) {
        let mut id_buf = [0u8; 1];
        timeout(READ_TIMEOUT, self.stream.read_exact(&mut id_buf))
            .await
            .expect("read timed out")
            .unwrap();
        let mut body = vec![0u8; body_len(id_buf[0])];
        timeout(READ_TIMEOUT, self.stream.read_exact(&mut body))
            .await
            .expect("read timed out")
            .unwrap();
        (id_buf[0], body)
    }

    /// Skip packets until one with the wanted id arrives.
    async fn read_until(&mut self, wanted: u8) -> Vec<u8> {
        loop {
            let (packet_id, body) = self.read_packet().await;
            if packet_id == wanted {
                return body;
            }
        }
    }

    /// Identify and consume the join sequence through the self spawn.
    async fn login(addr: SocketAddr, name: &str) -> Self {
        let mut client = Self::connect(addr).await;
        client.identify(name, 0x00, PROTOCOL_VERSION).await;
        loop {
            let (packet_id, body) = client.read_packet().await;
            if packet_id == id::SPAWN_PLAYER && body[0] == 0xFF {
                return client;
            }
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn login_streams_level_then_self_spawn() {
    let server = start_server("").await;
    let mut alice = Client::connect(server.addr).await;
    alice.identify("Alice", 0x00, PROTOCOL_VERSION).await;

    let (first, body) = alice.read_packet().await;
    assert_eq!(first, id::IDENTIFICATION);
    assert_eq!(body[0], PROTOCOL_VERSION);
    assert_eq!(field_string(&body, 1), "e2e");
    assert_eq!(field_string(&body, 65), "integration");

    let mut saw_init = false;
    let mut chunks = 0;
    loop {
        let (packet_id, body) = alice.read_packet().await;
        match packet_id {
            // Op status announcement precedes the level transfer.
            id::UPDATE_USER_TYPE => {
                assert!(!saw_init);
                assert_eq!(body[0], 0x00);
            }
            id::LEVEL_INITIALIZE => saw_init = true,
            id::LEVEL_DATA_CHUNK => {
                assert!(saw_init);
                chunks += 1;
                let percent = body[1026];
                assert!(percent > 0 && percent <= 100);
            }
            id::LEVEL_FINALIZE => {
                assert!(chunks > 0);
                assert_eq!(&body[..], &[0, 16, 0, 16, 0, 16]);
                break;
            }
            other => panic!("unexpected packet 0x{other:02X} during level transfer"),
        }
    }

    // Self spawn uses the 255 sentinel and the player's own name.
    let body = alice.read_until(id::SPAWN_PLAYER).await;
    assert_eq!(body[0], 0xFF);
    assert_eq!(field_string(&body, 1), "Alice");

    // Join announcement reaches the joiner too.
    let body = alice.read_until(id::MESSAGE).await;
    assert!(field_string(&body, 1).contains("Alice joined"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cpe_negotiation_intersects_and_drops_mismatches() {
    let server = start_server("").await;
    let mut bob = Client::connect(server.addr).await;
    bob.identify("Bob", CPE_MAGIC, PROTOCOL_VERSION).await;

    // Server advertises its frozen catalog first.
    let (packet_id, body) = bob.read_packet().await;
    assert_eq!(packet_id, id::EXT_INFO);
    let count = i16::from_be_bytes([body[64], body[65]]);
    assert_eq!(count, 4);

    let mut advertised = Vec::new();
    for _ in 0..count {
        let (packet_id, body) = bob.read_packet().await;
        assert_eq!(packet_id, id::EXT_ENTRY);
        let version = i32::from_be_bytes([body[64], body[65], body[66], body[67]]);
        assert_eq!(version, 1);
        advertised.push(field_string(&body, 0));
    }
    advertised.sort();
    assert_eq!(
        advertised,
        ["ClickDistance", "HeldBlock", "MessageTypes", "TwoWayPing"]
    );

    // Answer with one match and one version mismatch.
    bob.send(&classic_proto::packets::ExtInfo {
        app_name: "test client".into(),
        extension_count: 2,
    })
    .await;
    bob.send(&classic_proto::packets::ExtEntry {
        name: "TwoWayPing".into(),
        version: 1,
    })
    .await;
    bob.send(&classic_proto::packets::ExtEntry {
        name: "ClickDistance".into(),
        version: 2,
    })
    .await;

    // ClickDistance was dropped, so no 0x12 before the spawn.
    loop {
        let (packet_id, body) = bob.read_packet().await;
        assert_ne!(packet_id, id::SET_CLICK_DISTANCE);
        if packet_id == id::SPAWN_PLAYER && body[0] == 0xFF {
            break;
        }
    }

    // TwoWayPing was agreed: the server echoes token and direction.
    bob.send(&classic_proto::packets::TwoWayPing {
        direction: 0,
        token: 0x1234,
    })
    .await;
    let body = bob.read_until(id::TWO_WAY_PING).await;
    assert_eq!(&body[..], &[0, 0x12, 0x34]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn negotiated_click_distance_is_applied() {
    let server = start_server("").await;
    let mut carol = Client::connect(server.addr).await;
    carol.identify("Carol", CPE_MAGIC, PROTOCOL_VERSION).await;

    let (packet_id, body) = carol.read_packet().await;
    assert_eq!(packet_id, id::EXT_INFO);
    let count = i16::from_be_bytes([body[64], body[65]]);
    for _ in 0..count {
        carol.read_packet().await;
    }
    carol
        .send(&classic_proto::packets::ExtInfo {
            app_name: "test client".into(),
            extension_count: 1,
        })
        .await;
    carol
        .send(&classic_proto::packets::ExtEntry {
            name: "ClickDistance".into(),
            version: 1,
        })
        .await;

    let body = carol.read_until(id::SET_CLICK_DISTANCE).await;
    // 160 fixed-point units = 5 blocks.
    assert_eq!(&body[..], &[0, 160]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn second_joiner_sees_existing_player_before_own_spawn() {
    let server = start_server("").await;
    let mut alice = Client::login(server.addr, "Alice").await;

    let mut bob = Client::connect(server.addr).await;
    bob.identify("Bob", 0x00, PROTOCOL_VERSION).await;

    let mut spawns = Vec::new();
    let mut finalize_seen = false;
    loop {
        let (packet_id, body) = bob.read_packet().await;
        match packet_id {
            id::LEVEL_FINALIZE => finalize_seen = true,
            id::SPAWN_PLAYER => {
                assert!(finalize_seen, "spawn before level finalize");
                spawns.push((body[0], field_string(&body, 1)));
                if body[0] == 0xFF {
                    break;
                }
            }
            _ => {}
        }
    }
    assert_eq!(spawns.len(), 2);
    assert_eq!(spawns[0], (0, "Alice".to_string()));
    assert_eq!(spawns[1].1, "Bob");

    // Alice sees Bob arrive under entity id 1.
    let body = alice.read_until(id::SPAWN_PLAYER).await;
    assert_eq!(body[0], 1);
    assert_eq!(field_string(&body, 1), "Bob");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn block_change_reaches_both_players_and_bounds_are_enforced() {
    let server = start_server("").await;
    let mut alice = Client::login(server.addr, "Alice").await;
    let mut bob = Client::login(server.addr, "Bob").await;
    // Consume Bob's arrival on Alice's stream.
    alice.read_until(id::SPAWN_PLAYER).await;

    alice
        .send(&SetBlockClient {
            pos: BlockPos::new(5, 5, 5),
            mode: BlockMode::Create,
            block: 4,
        })
        .await;

    let body = bob.read_until(id::SET_BLOCK_SERVER).await;
    assert_eq!(&body[..], &[0, 5, 0, 5, 0, 5, 4]);
    // The originator gets the same broadcast.
    let body = alice.read_until(id::SET_BLOCK_SERVER).await;
    assert_eq!(&body[..], &[0, 5, 0, 5, 0, 5, 4]);

    // Out of bounds: no broadcast, connection survives.
    alice
        .send(&SetBlockClient {
            pos: BlockPos::new(99, 5, 5),
            mode: BlockMode::Create,
            block: 4,
        })
        .await;
    alice
        .send(&SetBlockClient {
            pos: BlockPos::new(6, 5, 5),
            mode: BlockMode::Create,
            block: 4,
        })
        .await;
    let body = bob.read_until(id::SET_BLOCK_SERVER).await;
    assert_eq!(&body[..], &[0, 6, 0, 5, 0, 5, 4]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn chat_is_broadcast_with_speaker_id() {
    let server = start_server("").await;
    let mut alice = Client::login(server.addr, "Alice").await;
    let mut bob = Client::login(server.addr, "Bob").await;

    alice
        .send(&Message {
            tag: 0xFF,
            text: "hello there".into(),
        })
        .await;

    loop {
        let body = bob.read_until(id::MESSAGE).await;
        let text = field_string(&body, 1);
        if text.contains("hello there") {
            assert_eq!(body[0], 0, "speaker tag should be Alice's entity id");
            assert_eq!(text, "<Alice> hello there");
            break;
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn command_lists_worlds() {
    let server = start_server("").await;
    let mut alice = Client::login(server.addr, "Alice").await;

    alice
        .send(&Message {
            tag: 0xFF,
            text: "/worlds".into(),
        })
        .await;
    loop {
        let body = alice.read_until(id::MESSAGE).await;
        let text = field_string(&body, 1);
        if text.starts_with("Worlds:") {
            assert_eq!(text, "Worlds: main");
            break;
        }
    }

    alice
        .send(&Message {
            tag: 0xFF,
            text: "/goto nowhere".into(),
        })
        .await;
    loop {
        let body = alice.read_until(id::MESSAGE).await;
        let text = field_string(&body, 1);
        if text.contains("nowhere") {
            assert_eq!(text, "No such world: nowhere");
            break;
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn wrong_protocol_version_is_refused() {
    let server = start_server("").await;
    let mut old = Client::connect(server.addr).await;
    old.identify("Relic", 0x00, 6).await;

    let body = old.read_until(id::DISCONNECT).await;
    assert!(field_string(&body, 0).contains("protocol version 6"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unnegotiated_extension_packet_disconnects() {
    let server = start_server("").await;
    let mut alice = Client::login(server.addr, "Alice").await;

    // Plain client sending a TwoWayPing it never negotiated.
    alice
        .send(&classic_proto::packets::TwoWayPing {
            direction: 0,
            token: 7,
        })
        .await;
    let body = alice.read_until(id::DISCONNECT).await;
    assert!(field_string(&body, 0).contains("TwoWayPing"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn server_full_refuses_login() {
    let server = start_server("max_players = 1").await;
    let _alice = Client::login(server.addr, "Alice").await;

    let mut bob = Client::connect(server.addr).await;
    bob.identify("Bob", 0x00, PROTOCOL_VERSION).await;
    let body = bob.read_until(id::DISCONNECT).await;
    assert_eq!(field_string(&body, 0), "Server is full");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_disconnects_connected_clients() {
    let server = start_server("").await;
    let mut alice = Client::login(server.addr, "Alice").await;

    server.shutdown.send(true).unwrap();

    let body = alice.read_until(id::DISCONNECT).await;
    assert_eq!(field_string(&body, 0), "Server shutting down");
    // The socket closes once the disconnect is flushed.
    let mut rest = Vec::new();
    let n = timeout(READ_TIMEOUT, alice.stream.read_to_end(&mut rest))
        .await
        .expect("socket should close after shutdown")
        .unwrap();
    assert_eq!(n, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn world_switch_never_mixes_old_world_broadcasts() {
    let data_dir = std::env::temp_dir().join(format!("classic_e2e_{}", rand::random::<u64>()));
    let hall = World::new(
        "hall",
        16,
        16,
        16,
        mapgen::flat(16, 16, 16),
        PlayerPos::above_block(8, 8, 8),
    )
    .unwrap();
    persistence::save_world(&data_dir, &hall).unwrap();
    let server = start_server_in(data_dir, "").await;

    let mut alice = Client::login(server.addr, "Alice").await;
    let mut bob = Client::login(server.addr, "Bob").await;
    alice.read_until(id::SPAWN_PLAYER).await;

    bob.send(&Message {
        tag: 0xFF,
        text: "/goto hall".into(),
    })
    .await;

    // Bob's old membership ends before the new level streams.
    let body = alice.read_until(id::DESPAWN_PLAYER).await;
    assert_eq!(body[0], 1);

    // A broadcast in the old world after the despawn must not reach
    // Bob, even while his new level transfer is still in flight.
    alice
        .send(&SetBlockClient {
            pos: BlockPos::new(7, 5, 7),
            mode: BlockMode::Create,
            block: 4,
        })
        .await;
    let body = alice.read_until(id::SET_BLOCK_SERVER).await;
    assert_eq!(&body[..], &[0, 7, 0, 5, 0, 7, 4]);

    bob.send(&Message {
        tag: 0xFF,
        text: "made it".into(),
    })
    .await;
    let mut saw_init = false;
    loop {
        let (packet_id, body) = bob.read_packet().await;
        assert_ne!(
            packet_id,
            id::SET_BLOCK_SERVER,
            "old-world broadcast crossed the world switch"
        );
        match packet_id {
            id::LEVEL_INITIALIZE => saw_init = true,
            id::MESSAGE if field_string(&body, 1).contains("made it") => break,
            _ => {}
        }
    }
    assert!(saw_init, "world switch never streamed the target level");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn operators_get_op_status_and_restricted_blocks() {
    let server = start_server(r#"operators = ["Alice"]"#).await;
    let mut alice = Client::connect(server.addr).await;
    alice.identify("Alice", 0x00, PROTOCOL_VERSION).await;

    let (packet_id, body) = alice.read_packet().await;
    assert_eq!(packet_id, id::IDENTIFICATION);
    assert_eq!(body[129], 0x64, "op user type in the identification");
    let (packet_id, body) = alice.read_packet().await;
    assert_eq!(packet_id, id::UPDATE_USER_TYPE);
    assert_eq!(body[0], 0x64);
    alice.read_until(id::SPAWN_PLAYER).await;

    // Ops may place blocks normal users cannot (bedrock is id 7).
    alice
        .send(&SetBlockClient {
            pos: BlockPos::new(3, 5, 3),
            mode: BlockMode::Create,
            block: 7,
        })
        .await;
    let body = alice.read_until(id::SET_BLOCK_SERVER).await;
    assert_eq!(&body[..], &[0, 3, 0, 5, 0, 3, 7]);

    // A normal login still sees the restriction.
    let mut bob = Client::login(server.addr, "Bob").await;
    bob.send(&SetBlockClient {
        pos: BlockPos::new(4, 5, 4),
        mode: BlockMode::Create,
        block: 7,
    })
    .await;
    loop {
        let body = bob.read_until(id::MESSAGE).await;
        if field_string(&body, 1).contains("may not place") {
            break;
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn leaving_player_is_despawned_for_peers() {
    let server = start_server("").await;
    let mut alice = Client::login(server.addr, "Alice").await;
    let bob = Client::login(server.addr, "Bob").await;
    alice.read_until(id::SPAWN_PLAYER).await;

    drop(bob);

    let body = alice.read_until(id::DESPAWN_PLAYER).await;
    assert_eq!(body[0], 1);
    let body = alice.read_until(id::MESSAGE).await;
    assert!(field_string(&body, 1).contains("Bob left"));
}
