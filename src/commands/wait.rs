use std::time::Duration;

use tokio::time::Instant;

use crate::commands::CommandError;
use crate::resp::RespValue;
use crate::server::Server;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

struct WaitArguments {
    required_acks: i64,
    timeout: Option<Duration>,
}

impl WaitArguments {
    fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 2 {
            return Err(CommandError::WrongNumberOfArguments("wait".to_string()));
        }

        let required_acks = arguments[0]
            .parse::<i64>()
            .map_err(|_| CommandError::NotAnInteger)?;
        let timeout_ms = arguments[1]
            .parse::<u64>()
            .map_err(|_| CommandError::NotAnInteger)?;

        // A timeout of 0 waits until enough acks arrive.
        let timeout = if timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(timeout_ms))
        };

        Ok(Self {
            required_acks,
            timeout,
        })
    }
}

/// Handles the WAIT command.
///
/// Replies immediately with the replica count when no acknowledgments
/// are required, nothing has been written yet, or no replicas are
/// attached. Otherwise resets the ack counter, fans out
/// `REPLCONF GETACK *`, and polls until enough `REPLCONF ACK` replies
/// arrive or the deadline passes. Always replies with the best known
/// count, never an error.
pub async fn wait(server: &Server, arguments: Vec<String>) -> Result<String, CommandError> {
    let wait_arguments = WaitArguments::parse(arguments)?;

    let replica_count = server.replication.replica_count().await as i64;

    if wait_arguments.required_acks <= 0
        || server.replication.offset() == 0
        || replica_count == 0
    {
        return Ok(RespValue::Integer(replica_count).encode());
    }

    server.replication.reset_acks();
    server.replication.broadcast_getack().await;

    let deadline = wait_arguments
        .timeout
        .map(|timeout| Instant::now() + timeout);

    loop {
        let acks = server.replication.acks_received() as i64;
        if acks >= wait_arguments.required_acks {
            return Ok(RespValue::Integer(acks).encode());
        }

        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return Ok(RespValue::Integer(acks).encode());
            }
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
