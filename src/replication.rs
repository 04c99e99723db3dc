//! Replication state shared between the command layer and connections.
//!
//! On a master this tracks the replica registry, the byte offset of the
//! produced command stream and the acknowledgment counter driven by
//! `REPLCONF ACK`. On a replica the same offset field counts bytes of
//! the stream applied so far; the registry simply stays empty.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::distr::{Alphanumeric, SampleString};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::warn;

use crate::pubsub::SharedWriter;
use crate::resp::RespValue;

/// A connected replica: its socket write half behind a per-replica
/// mutex, so propagated frames never interleave mid-frame.
pub struct Replica {
    pub writer: SharedWriter,
}

pub struct Replication {
    /// 40-character replication id chosen at startup.
    pub repl_id: String,
    offset: AtomicU64,
    acks_received: AtomicU64,
    replicas: RwLock<HashMap<String, Replica>>,
}

impl Replication {
    pub fn new() -> Self {
        Replication {
            repl_id: Alphanumeric.sample_string(&mut rand::rng(), 40),
            offset: AtomicU64::new(0),
            acks_received: AtomicU64::new(0),
            replicas: RwLock::new(HashMap::new()),
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset.load(Ordering::SeqCst)
    }

    pub fn advance_offset(&self, bytes: u64) {
        self.offset.fetch_add(bytes, Ordering::SeqCst);
    }

    pub fn acks_received(&self) -> u64 {
        self.acks_received.load(Ordering::SeqCst)
    }

    pub fn reset_acks(&self) {
        self.acks_received.store(0, Ordering::SeqCst);
    }

    pub fn record_ack(&self) {
        self.acks_received.fetch_add(1, Ordering::SeqCst);
    }

    pub async fn register(&self, client_addr: &str, writer: SharedWriter) {
        let mut replicas = self.replicas.write().await;
        replicas.insert(client_addr.to_string(), Replica { writer });
    }

    pub async fn deregister(&self, client_addr: &str) {
        let mut replicas = self.replicas.write().await;
        replicas.remove(client_addr);
    }

    pub async fn replica_count(&self) -> usize {
        self.replicas.read().await.len()
    }

    /// Writes an already-encoded frame to every replica. A failed write
    /// is logged and skipped; the replica stays registered until its
    /// read side ends.
    pub async fn propagate(&self, frame: &[u8]) {
        let replicas = self.replicas.read().await;

        for (addr, replica) in replicas.iter() {
            let mut writer = replica.writer.lock().await;
            if let Err(e) = writer.write_all(frame).await {
                warn!(replica = %addr, error = %e, "failed to propagate command to replica");
                continue;
            }
            if let Err(e) = writer.flush().await {
                warn!(replica = %addr, error = %e, "failed to flush replica socket");
            }
        }
    }

    /// Fans out `REPLCONF GETACK *` to every replica.
    pub async fn broadcast_getack(&self) {
        let frame = RespValue::command_array(&[
            "REPLCONF".to_string(),
            "GETACK".to_string(),
            "*".to_string(),
        ]);
        self.propagate(frame.as_bytes()).await;
    }
}

impl Default for Replication {
    fn default() -> Self {
        Replication::new()
    }
}
