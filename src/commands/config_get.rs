use crate::commands::CommandError;
use crate::resp::RespValue;
use crate::server::Server;

/// Handles `CONFIG GET <parameter> [...]`, replying a flat array of
/// `[name, value]` pairs. Only `dir` and `dbfilename` exist.
pub fn config_get(server: &Server, arguments: Vec<String>) -> Result<String, CommandError> {
    if arguments.len() < 2 {
        return Err(CommandError::WrongNumberOfArguments("config".to_string()));
    }

    if !arguments[0].eq_ignore_ascii_case("get") {
        return Err(CommandError::UnknownSubcommand(arguments[0].clone()));
    }

    let mut response = Vec::new();

    for parameter in &arguments[1..] {
        let value = match parameter.to_lowercase().as_str() {
            "dir" => server.config.dir.display().to_string(),
            "dbfilename" => server.config.dbfilename.clone(),
            _ => return Err(CommandError::UnknownConfigParameter(parameter.clone())),
        };

        response.push(RespValue::BulkString(parameter.to_lowercase()));
        response.push(RespValue::BulkString(value));
    }

    Ok(RespValue::Array(response).encode())
}
