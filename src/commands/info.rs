use crate::commands::CommandError;
use crate::resp::RespValue;
use crate::server::Server;

/// Handles the INFO command. Only the replication section exists; it is
/// also the default reply when no section is named.
pub fn info(server: &Server, arguments: Vec<String>) -> Result<String, CommandError> {
    if arguments.len() > 1 {
        return Err(CommandError::WrongNumberOfArguments("info".to_string()));
    }

    if let Some(section) = arguments.first() {
        if !section.eq_ignore_ascii_case("replication") {
            return Err(CommandError::UnsupportedInfoSection(section.clone()));
        }
    }

    let body = format!(
        "role:{}\r\nmaster_replid:{}\r\nmaster_repl_offset:{}\r\n",
        server.config.role.as_str(),
        server.replication.repl_id,
        server.replication.offset(),
    );

    Ok(RespValue::BulkString(body).encode())
}
