use crate::commands::CommandError;
use crate::resp::RespValue;
use crate::server::Server;

/// Handles the REPLCONF command.
///
/// `listening-port` and `capa` are handshake steps acknowledged with
/// `+OK`. `GETACK *` replies `REPLCONF ACK <offset>` with the offset as
/// it stood before the GETACK frame itself is counted. `ACK <offset>`
/// arrives on a master from a replica; it bumps the ack counter WAIT
/// polls and produces no reply.
pub fn replconf(server: &Server, arguments: Vec<String>) -> Result<Option<String>, CommandError> {
    let Some(subcommand) = arguments.first() else {
        return Err(CommandError::WrongNumberOfArguments("replconf".to_string()));
    };

    match subcommand.to_uppercase().as_str() {
        "LISTENING-PORT" | "CAPA" => {
            if arguments.len() < 2 {
                return Err(CommandError::WrongNumberOfArguments(
                    "replconf".to_string(),
                ));
            }
            Ok(Some(RespValue::SimpleString("OK".to_string()).encode()))
        }
        "GETACK" => {
            if arguments.get(1).map(String::as_str) != Some("*") {
                return Err(CommandError::SyntaxError);
            }

            Ok(Some(RespValue::command_array(&[
                "REPLCONF".to_string(),
                "ACK".to_string(),
                server.replication.offset().to_string(),
            ])))
        }
        "ACK" => {
            let Some(offset) = arguments.get(1) else {
                return Err(CommandError::WrongNumberOfArguments(
                    "replconf".to_string(),
                ));
            };
            offset
                .parse::<u64>()
                .map_err(|_| CommandError::NotAnInteger)?;

            server.replication.record_ack();
            Ok(None)
        }
        _ => Err(CommandError::UnknownSubcommand(subcommand.clone())),
    }
}
