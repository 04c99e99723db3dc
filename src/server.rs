//! The server: shared state plus the accept loop.

use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::commands::Command;
use crate::config::{Config, Role};
use crate::connection::{handle_client_connection, handle_master_connection};
use crate::handshake;
use crate::pubsub::PubSub;
use crate::rdb::{self, RdbError};
use crate::replication::Replication;
use crate::resp::RespReader;
use crate::state::State;
use crate::store::KeyValueStore;

/// Process-wide shared state, handed to every connection task behind an
/// `Arc`. Each component carries its own lock: the keyspace a
/// reader-writer lock, the blocked-client registry a mutex, the pub/sub
/// bus a reader-writer lock, and the replication counters atomics.
pub struct Server {
    pub config: Config,
    pub store: RwLock<KeyValueStore>,
    pub state: Mutex<State>,
    pub pubsub: RwLock<PubSub>,
    pub replication: Replication,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Server {
            config,
            store: RwLock::new(KeyValueStore::new()),
            state: Mutex::new(State::new()),
            pubsub: RwLock::new(PubSub::new()),
            replication: Replication::new(),
        }
    }

    pub fn is_master(&self) -> bool {
        matches!(self.config.role, Role::Master)
    }

    /// Preloads the keyspace from the configured snapshot file. A
    /// missing file leaves the keyspace empty; a malformed one is fatal.
    pub async fn load_snapshot_file(&self) -> Result<usize, RdbError> {
        let path = self.config.snapshot_path();

        let Some(entries) = rdb::load_snapshot(&path)? else {
            info!(path = %path.display(), "no snapshot file, starting with an empty keyspace");
            return Ok(0);
        };

        let count = entries.len();
        let mut store = self.store.write().await;
        for (key, value) in entries {
            store.insert(key, value);
        }
        info!(keys = count, path = %path.display(), "loaded snapshot");

        Ok(count)
    }

    /// Re-encodes a successful write command to its exact RESP array
    /// form, advances the replication offset by its byte length, and
    /// fans it out to every attached replica.
    pub async fn propagate_write(&self, command: &Command) {
        let frame = command.to_resp();
        self.replication.advance_offset(frame.len() as u64);
        self.replication.propagate(frame.as_bytes()).await;
    }
}

/// Runs the server: binds the listener, connects out to the master when
/// configured as a replica (handshake failure is fatal), then accepts
/// client connections forever, one task each.
pub async fn run(server: Arc<Server>) -> std::io::Result<()> {
    let listener = TcpListener::bind(format!("127.0.0.1:{}", server.config.port)).await?;
    info!(
        port = server.config.port,
        role = server.config.role.as_str(),
        "listening"
    );

    if let Role::Replica { host, port } = &server.config.role {
        let master_addr = format!("{}:{}", host, port);
        let stream = TcpStream::connect(&master_addr).await?;

        let (read_half, write_half) = stream.into_split();
        let mut reader = RespReader::new(read_half);
        let writer = Arc::new(Mutex::new(write_half));

        handshake::perform(&mut reader, &writer, server.config.port)
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        info!(master = %master_addr, "completed handshake, applying replication stream");

        let server_clone = Arc::clone(&server);
        tokio::spawn(async move {
            handle_master_connection(reader, writer, server_clone).await;
        });
    }

    loop {
        match listener.accept().await {
            Ok((stream, client_addr)) => {
                let server = Arc::clone(&server);
                tokio::spawn(async move {
                    handle_client_connection(stream, server, client_addr.to_string()).await;
                });
            }
            Err(e) => {
                warn!(error = %e, "failed to accept connection");
            }
        }
    }
}
