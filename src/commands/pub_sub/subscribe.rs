use crate::commands::CommandError;
use crate::connection::Session;
use crate::resp::RespValue;
use crate::server::Server;

/// Handles the SUBSCRIBE command. Registers the connection's writer on
/// the channel (a duplicate subscribe is a no-op) and replies
/// `["subscribe", channel, <count>]` where the count is the channel's
/// subscriber count.
pub async fn subscribe(
    server: &Server,
    session: &mut Session,
    arguments: Vec<String>,
) -> Result<String, CommandError> {
    if arguments.len() != 1 {
        return Err(CommandError::WrongNumberOfArguments("subscribe".to_string()));
    }

    let channel = arguments[0].clone();

    let channel_subscribers = {
        let mut pubsub = server.pubsub.write().await;
        pubsub.subscribe(&channel, &session.client_addr, session.writer.clone())
    };

    if !session.channels.contains(&channel) {
        session.channels.push(channel.clone());
    }

    Ok(RespValue::Array(vec![
        RespValue::BulkString("subscribe".to_string()),
        RespValue::BulkString(channel),
        RespValue::Integer(channel_subscribers as i64),
    ])
    .encode())
}

/// Handles the UNSUBSCRIBE command, replying with the channel's
/// remaining subscriber count. Removing the last subscription takes
/// the connection out of subscribe mode.
pub async fn unsubscribe(
    server: &Server,
    session: &mut Session,
    arguments: Vec<String>,
) -> Result<String, CommandError> {
    if arguments.len() != 1 {
        return Err(CommandError::WrongNumberOfArguments(
            "unsubscribe".to_string(),
        ));
    }

    let channel = arguments[0].clone();

    let channel_subscribers = {
        let mut pubsub = server.pubsub.write().await;
        pubsub.unsubscribe(&channel, &session.client_addr);
        pubsub.subscriber_count(&channel)
    };

    session.channels.retain(|subscribed| subscribed != &channel);

    Ok(RespValue::Array(vec![
        RespValue::BulkString("unsubscribe".to_string()),
        RespValue::BulkString(channel),
        RespValue::Integer(channel_subscribers as i64),
    ])
    .encode())
}
