use std::time::Duration;

use jiff::Timestamp;
use tokio::time::Instant;

use crate::commands::CommandError;
use crate::resp::RespValue;
use crate::server::Server;
use crate::store::DataType;

struct BlpopArguments {
    key: String,
    timeout: Option<Duration>,
}

impl BlpopArguments {
    fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 2 {
            return Err(CommandError::WrongNumberOfArguments("blpop".to_string()));
        }

        let seconds = arguments[1]
            .parse::<f64>()
            .map_err(|_| CommandError::InvalidTimeout)?;
        if seconds < 0.0 || !seconds.is_finite() {
            return Err(CommandError::InvalidTimeout);
        }

        // A timeout of 0 blocks indefinitely.
        let timeout = if seconds == 0.0 {
            None
        } else {
            Some(Duration::from_secs_f64(seconds))
        };

        Ok(Self {
            key: arguments[0].clone(),
            timeout,
        })
    }
}

/// Handles the BLPOP command.
///
/// Pops the front element of the list if one is available; otherwise
/// registers a waiter and suspends until a push wakes it or the timeout
/// elapses. The reply is the `[key, value]` pair, or a null bulk on
/// timeout. With `blocking_allowed` false (inside EXEC) a miss returns
/// the timeout reply immediately.
pub async fn blpop(
    server: &Server,
    arguments: Vec<String>,
    blocking_allowed: bool,
) -> Result<String, CommandError> {
    let blpop_arguments = BlpopArguments::parse(arguments)?;
    let deadline = blpop_arguments
        .timeout
        .map(|timeout| Instant::now() + timeout);

    loop {
        // Try to pop; on a miss, register the waiter before the store
        // lock is released so a concurrent push cannot slip between the
        // check and the registration.
        let receiver = {
            let mut store = server.store.write().await;
            store.remove_if_expired(&blpop_arguments.key, Timestamp::now());

            match store.get_mut(&blpop_arguments.key) {
                Some(value) => {
                    let DataType::List(ref mut elements) = value.data else {
                        return Err(CommandError::WrongType);
                    };

                    if let Some(element) = elements.pop_front() {
                        let drained = elements.is_empty();
                        if drained {
                            store.remove(&blpop_arguments.key);
                        }
                        return Ok(RespValue::Array(vec![
                            RespValue::BulkString(blpop_arguments.key.clone()),
                            RespValue::BulkString(element),
                        ])
                        .encode());
                    }

                    if !blocking_allowed {
                        return Ok(RespValue::NullBulkString.encode());
                    }

                    let mut state = server.state.lock().await;
                    state.register_list_waiter(&blpop_arguments.key)
                }
                None => {
                    if !blocking_allowed {
                        return Ok(RespValue::NullBulkString.encode());
                    }

                    let mut state = server.state.lock().await;
                    state.register_list_waiter(&blpop_arguments.key)
                }
            }
        };

        let woken = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, receiver).await.is_ok(),
            None => {
                let _ = receiver.await;
                true
            }
        };

        if !woken {
            return Ok(RespValue::NullBulkString.encode());
        }
    }
}
