use jiff::Timestamp;

use crate::commands::CommandError;
use crate::resp::RespValue;
use crate::server::Server;
use crate::store::DataType;

/// Handles the GET command.
///
/// Returns the string value, or a null bulk when the key is absent or
/// expired. An expired entry is deleted on the way out (lazy TTL); a
/// key holding a stream or list is a type error.
pub async fn get(server: &Server, arguments: Vec<String>) -> Result<String, CommandError> {
    if arguments.len() != 1 {
        return Err(CommandError::WrongNumberOfArguments("get".to_string()));
    }

    let key = &arguments[0];
    let now = Timestamp::now();

    {
        let store = server.store.read().await;
        match store.get(key) {
            None => return Ok(RespValue::NullBulkString.encode()),
            Some(value) if value.is_expired(now) => {
                // Fall through to delete under the write lock.
            }
            Some(value) => match &value.data {
                DataType::String(payload) => {
                    return Ok(RespValue::BulkString(payload.clone()).encode());
                }
                _ => return Err(CommandError::WrongType),
            },
        }
    }

    let mut store = server.store.write().await;
    store.remove_if_expired(key, now);
    Ok(RespValue::NullBulkString.encode())
}
