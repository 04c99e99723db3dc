use crate::commands::CommandError;
use crate::resp::RespValue;

/// PING while subscribed replies the two-element `["pong", ""]` array
/// instead of `+PONG`, so it can be told apart from a pushed message.
pub fn subscribe_ping(arguments: Vec<String>) -> Result<String, CommandError> {
    if !arguments.is_empty() {
        return Err(CommandError::WrongNumberOfArguments("ping".to_string()));
    }

    Ok(RespValue::Array(vec![
        RespValue::BulkString("pong".to_string()),
        RespValue::BulkString(String::new()),
    ])
    .encode())
}
