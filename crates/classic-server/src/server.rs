//! Server assembly and accept loop.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{info, warn};

use classic_proto::cpe::CapabilityRegistry;
use classic_proto::packets::user_type::{USER_TYPE_NORMAL, USER_TYPE_OP};
use classic_proto::types::PlayerPos;
use classic_world::{mapgen, World, WorldRegistry};

use crate::auth::{AllowAll, Authenticator, ClassicAuthenticator};
use crate::config::ServerConfig;
use crate::connection;
use crate::error::StartupError;
use crate::persistence;
use crate::plugin_manager::{CpePlugin, PluginManager};

pub struct Server {
    pub config: ServerConfig,
    pub worlds: WorldRegistry,
    pub caps: CapabilityRegistry,
    pub auth: Box<dyn Authenticator>,
    pub plugins: Mutex<PluginManager>,
    data_dir: PathBuf,
}

impl Server {
    /// Assemble the server: enable plugins, freeze the capability
    /// catalog, and load or generate the configured world.
    pub fn new(config: ServerConfig) -> Result<Arc<Self>, StartupError> {
        let mut plugins = PluginManager::new();
        plugins.register(Box::new(CpePlugin));

        let mut caps = CapabilityRegistry::new();
        plugins.enable_all(&mut caps)?;
        caps.freeze();
        info!(capabilities = caps.len(), "capability catalog frozen");

        let data_dir = PathBuf::from(&config.world.data_dir);
        let mut worlds = WorldRegistry::new();
        for name in persistence::saved_worlds(&data_dir)? {
            if name == config.world.name {
                continue;
            }
            if let Some(world) = persistence::load_world(&data_dir, &name)? {
                worlds.insert(world);
            }
        }
        let world = match persistence::load_world(&data_dir, &config.world.name)? {
            Some(world) => world,
            None => {
                let (w, h, d) = (config.world.width, config.world.height, config.world.depth);
                info!(
                    world = %config.world.name,
                    width = w,
                    height = h,
                    depth = d,
                    "generating flat world"
                );
                World::new(
                    config.world.name.clone(),
                    w,
                    h,
                    d,
                    mapgen::flat(w, h, d),
                    PlayerPos::above_block(w / 2, h / 2, d / 2),
                )?
            }
        };
        worlds.insert(world);

        let auth: Box<dyn Authenticator> = if config.server.verify_names {
            let auth = ClassicAuthenticator::generate();
            info!(salt = auth.salt(), "name verification enabled");
            Box::new(auth)
        } else {
            Box::new(AllowAll)
        };

        Ok(Arc::new(Self {
            config,
            worlds,
            caps,
            auth,
            plugins: Mutex::new(plugins),
            data_dir,
        }))
    }

    pub fn default_world(&self) -> Option<Arc<World>> {
        self.worlds.get(&self.config.world.name)
    }

    pub fn player_count(&self) -> usize {
        self.worlds.iter().map(|w| w.member_count()).sum()
    }

    /// User type granted to a name at login.
    pub fn user_type(&self, name: &str) -> u8 {
        let is_op = self
            .config
            .server
            .operators
            .iter()
            .any(|op| op.eq_ignore_ascii_case(name));
        if is_op {
            USER_TYPE_OP
        } else {
            USER_TYPE_NORMAL
        }
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn run(
        self: Arc<Self>,
        shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> std::io::Result<()> {
        let addr = format!("{}:{}", self.config.server.address, self.config.server.port);
        let listener = TcpListener::bind(&addr).await?;
        info!(addr = %listener.local_addr()?, "listening");
        self.serve(listener, shutdown).await
    }

    /// Accept loop on an already-bound listener. Shutdown stops
    /// accepting, then waits for every connection task to run its
    /// disconnect path before saving worlds.
    pub async fn serve(
        self: Arc<Self>,
        listener: TcpListener,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> std::io::Result<()> {
        let auto_save = self.config.world.auto_save_interval;
        let mut save_timer = tokio::time::interval(std::time::Duration::from_secs(
            if auto_save == 0 { 3600 } else { auto_save },
        ));
        save_timer.tick().await; // first tick fires immediately
        let mut sessions = JoinSet::new();
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (socket, peer) = accepted?;
                    let server = self.clone();
                    let session_shutdown = shutdown.clone();
                    sessions.spawn(async move {
                        connection::handle(server, socket, peer, session_shutdown).await;
                    });
                }
                Some(_) = sessions.join_next(), if !sessions.is_empty() => {}
                _ = save_timer.tick(), if auto_save > 0 => {
                    self.save_all();
                }
                changed = shutdown.changed() => {
                    // A dropped sender counts as shutdown.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!(sessions = sessions.len(), "shutting down");
        drop(listener);
        while sessions.join_next().await.is_some() {}
        self.save_all();
        self.plugins.lock().expect("plugin lock poisoned").disable_all();
        Ok(())
    }

    pub fn save_all(&self) {
        for world in self.worlds.iter() {
            if let Err(e) = persistence::save_world(&self.data_dir, world) {
                warn!(world = world.name(), error = %e, "world save failed");
            }
        }
    }

    /// Console command. Returns false when the server should stop.
    pub fn handle_console(&self, line: &str, shutdown: &tokio::sync::watch::Sender<bool>) -> bool {
        match line.trim() {
            "stop" => {
                let _ = shutdown.send(true);
                return false;
            }
            "save" => self.save_all(),
            "worlds" => {
                for world in self.worlds.iter() {
                    info!(
                        world = world.name(),
                        players = world.member_count(),
                        "world"
                    );
                }
            }
            "players" => {
                for world in self.worlds.iter() {
                    for name in world.member_names() {
                        info!(world = world.name(), player = %name, "online");
                    }
                }
            }
            "" => {}
            other => info!("unknown command: {other} (stop, save, worlds, players)"),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(dir: &str) -> ServerConfig {
        toml::from_str(&format!(
            r#"
            [server]
            address = "127.0.0.1"
            port = 0
            name = "test"
            motd = "test"

            [world]
            name = "unit"
            width = 16
            height = 16
            depth = 16
            data_dir = "{dir}"
        "#
        ))
        .unwrap()
    }

    #[test]
    fn startup_freezes_capabilities_and_creates_world() {
        let dir = std::env::temp_dir().join(format!("classic_srv_{}", rand::random::<u64>()));
        let server = Server::new(test_config(&dir.display().to_string())).unwrap();
        assert!(server.caps.is_frozen());
        assert_eq!(server.caps.len(), 4);
        let world = server.default_world().unwrap();
        assert_eq!(world.dimensions(), (16, 16, 16));
        assert_eq!(server.player_count(), 0);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn configured_operators_get_op_status() {
        let dir = std::env::temp_dir().join(format!("classic_srv_{}", rand::random::<u64>()));
        let mut config = test_config(&dir.display().to_string());
        config.server.operators = vec!["Alice".into()];
        let server = Server::new(config).unwrap();
        assert_eq!(server.user_type("alice"), USER_TYPE_OP);
        assert_eq!(server.user_type("Bob"), USER_TYPE_NORMAL);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn startup_reloads_saved_world() {
        let dir = std::env::temp_dir().join(format!("classic_srv_{}", rand::random::<u64>()));
        let config = test_config(&dir.display().to_string());
        let server = Server::new(config).unwrap();
        server.save_all();

        // Second startup must load the saved copy, not regenerate.
        let server2 = Server::new(test_config(&dir.display().to_string())).unwrap();
        let world = server2.default_world().unwrap();
        assert_eq!(
            world.blocks_snapshot(),
            server.default_world().unwrap().blocks_snapshot()
        );
        std::fs::remove_dir_all(&dir).ok();
    }
}
