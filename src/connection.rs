//! Per-connection read loops.
//!
//! Each inbound client connection owns a buffered frame reader and a
//! shared writer handle; the writer is shared so pub/sub delivery and
//! replication propagation can reach the socket from other tasks. On a
//! replica, a single outbound connection applies the master's command
//! stream through the same execution core with replies suppressed.

use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::commands::{dispatch, execute, Action, Command, ExecutionMode};
use crate::pubsub::SharedWriter;
use crate::resp::RespReader;
use crate::server::Server;

/// Connection-local state: the transaction queue attached by MULTI and
/// the channels this connection is subscribed to. Both die with the
/// connection.
pub struct Session {
    pub client_addr: String,
    pub writer: SharedWriter,
    pub transaction: Option<Vec<Command>>,
    pub channels: Vec<String>,
}

impl Session {
    pub fn new(client_addr: String, writer: SharedWriter) -> Self {
        Session {
            client_addr,
            writer,
            transaction: None,
            channels: Vec::new(),
        }
    }

    pub fn in_subscribe_mode(&self) -> bool {
        !self.channels.is_empty()
    }
}

pub async fn handle_client_connection(
    stream: TcpStream,
    server: Arc<Server>,
    client_addr: String,
) {
    let (read_half, write_half) = stream.into_split();
    let mut reader = RespReader::new(read_half);
    let writer: SharedWriter = Arc::new(Mutex::new(write_half));
    let mut session = Session::new(client_addr.clone(), Arc::clone(&writer));
    let mut is_replica = false;

    loop {
        let frame = match reader.read_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                // Framing errors terminate the connection without a reply.
                debug!(client = %client_addr, error = %e, "closing connection on framing error");
                break;
            }
        };

        let Some(command) = Command::from_frame(&frame) else {
            continue;
        };

        // Blocking commands race against the peer closing the
        // connection, so an indefinitely blocked client that goes away
        // releases its waiter instead of parking the task forever.
        let may_block = command.name == "BLPOP"
            || (command.name == "XREAD"
                && command
                    .arguments
                    .iter()
                    .any(|arg| arg.eq_ignore_ascii_case("block")));

        let action = if may_block {
            tokio::select! {
                action = dispatch(&server, &mut session, command) => action,
                _ = reader.wait_for_close() => break,
            }
        } else {
            dispatch(&server, &mut session, command).await
        };

        match action {
            Action::Reply(reply) => {
                if let Err(e) = write_to_stream(&writer, reply.as_bytes()).await {
                    debug!(client = %client_addr, error = %e, "failed to write reply");
                    break;
                }
            }
            Action::NoReply => {}
            Action::FullResync(full_resync) => {
                let mut payload = Vec::with_capacity(
                    full_resync.header.len() + full_resync.snapshot.len() + 16,
                );
                payload.extend_from_slice(full_resync.header.as_bytes());
                payload
                    .extend_from_slice(format!("${}\r\n", full_resync.snapshot.len()).as_bytes());
                payload.extend_from_slice(&full_resync.snapshot);

                if let Err(e) = write_to_stream(&writer, &payload).await {
                    debug!(client = %client_addr, error = %e, "failed to send full resync");
                    break;
                }

                server
                    .replication
                    .register(&client_addr, Arc::clone(&writer))
                    .await;
                is_replica = true;
                info!(replica = %client_addr, "replica attached");
            }
            Action::Close(reply) => {
                let _ = write_to_stream(&writer, reply.as_bytes()).await;
                break;
            }
        }
    }

    if is_replica {
        server.replication.deregister(&client_addr).await;
        info!(replica = %client_addr, "replica detached");
    }

    let mut pubsub = server.pubsub.write().await;
    pubsub.unsubscribe_all(&client_addr);
}

/// Applies the master's replication stream on a replica.
///
/// Commands run through the shared execution core but replies are
/// suppressed, except for `REPLCONF GETACK *` which answers with the
/// offset as it stood before that frame. The offset then advances by
/// the exact byte length of every inbound frame, the GETACK included.
pub async fn handle_master_connection(
    mut reader: RespReader<OwnedReadHalf>,
    writer: SharedWriter,
    server: Arc<Server>,
) {
    loop {
        let frame = match reader.read_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                info!("master closed the replication connection");
                break;
            }
            Err(e) => {
                warn!(error = %e, "framing error on replication connection");
                break;
            }
        };

        let Some(command) = Command::from_frame(&frame) else {
            server.replication.advance_offset(frame.byte_len as u64);
            continue;
        };

        let is_getack = command.name == "REPLCONF"
            && command
                .arguments
                .first()
                .map(|sub| sub.eq_ignore_ascii_case("GETACK"))
                .unwrap_or(false);

        match execute(&server, &command, ExecutionMode::ReplicaFeed).await {
            Ok(Some(reply)) if is_getack => {
                if let Err(e) = write_to_stream(&writer, reply.as_bytes()).await {
                    warn!(error = %e, "failed to send ACK to master");
                }
            }
            Ok(_) => {}
            Err(e) => {
                debug!(command = %command.name, error = %e, "failed to apply replicated command");
            }
        }

        server.replication.advance_offset(frame.byte_len as u64);
    }
}

pub async fn write_to_stream(writer: &SharedWriter, bytes: &[u8]) -> tokio::io::Result<()> {
    let mut guard = writer.lock().await;
    guard.write_all(bytes).await?;
    guard.flush().await
}
