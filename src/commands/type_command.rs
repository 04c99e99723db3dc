use jiff::Timestamp;

use crate::commands::CommandError;
use crate::resp::RespValue;
use crate::server::Server;

/// Handles the TYPE command: `string`, `stream`, `list` or `none`.
pub async fn type_command(server: &Server, arguments: Vec<String>) -> Result<String, CommandError> {
    if arguments.len() != 1 {
        return Err(CommandError::WrongNumberOfArguments("type".to_string()));
    }

    let store = server.store.read().await;
    let name = store
        .get_live(&arguments[0], Timestamp::now())
        .map(|value| value.type_name())
        .unwrap_or("none");

    Ok(RespValue::SimpleString(name.to_string()).encode())
}
