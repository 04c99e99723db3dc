use tokio::io::AsyncWriteExt;

use crate::commands::CommandError;
use crate::resp::RespValue;
use crate::server::Server;

/// Handles the PUBLISH command.
///
/// The subscriber set is snapshotted under the shared bus lock, and the
/// socket writes happen after it is released so a slow subscriber
/// cannot stall subscribes on other channels. Returns the number of
/// subscribers the message was delivered to.
pub async fn publish(server: &Server, arguments: Vec<String>) -> Result<String, CommandError> {
    if arguments.len() != 2 {
        return Err(CommandError::WrongNumberOfArguments("publish".to_string()));
    }

    let channel = &arguments[0];
    let payload = &arguments[1];

    let subscribers = {
        let pubsub = server.pubsub.read().await;
        pubsub.subscribers(channel)
    };

    let message = RespValue::Array(vec![
        RespValue::BulkString("message".to_string()),
        RespValue::BulkString(channel.clone()),
        RespValue::BulkString(payload.clone()),
    ])
    .encode();

    let mut delivered = 0;
    for subscriber in subscribers {
        let mut writer = subscriber.lock().await;
        if writer.write_all(message.as_bytes()).await.is_ok() && writer.flush().await.is_ok() {
            delivered += 1;
        }
    }

    Ok(RespValue::Integer(delivered).encode())
}
