use jiff::Timestamp;

use crate::commands::CommandError;
use crate::resp::RespValue;
use crate::server::Server;
use crate::store::{DataType, Value};

/// Handles the INCR command.
///
/// An absent (or expired) key is created as `"1"`. An existing string
/// must parse as a signed 64-bit decimal; a failure to parse leaves the
/// value untouched and surfaces as an error.
pub async fn incr(server: &Server, arguments: Vec<String>) -> Result<String, CommandError> {
    if arguments.len() != 1 {
        return Err(CommandError::WrongNumberOfArguments("incr".to_string()));
    }

    let key = &arguments[0];
    let now = Timestamp::now();

    let mut store = server.store.write().await;
    store.remove_if_expired(key, now);

    let Some(value) = store.get_mut(key) else {
        store.insert(key.clone(), Value::string("1".to_string()));
        return Ok(RespValue::Integer(1).encode());
    };

    match value.data {
        DataType::String(ref mut payload) => {
            let current = payload
                .parse::<i64>()
                .map_err(|_| CommandError::NotAnInteger)?;
            let next = current.checked_add(1).ok_or(CommandError::NotAnInteger)?;
            *payload = next.to_string();

            Ok(RespValue::Integer(next).encode())
        }
        _ => Err(CommandError::WrongType),
    }
}
