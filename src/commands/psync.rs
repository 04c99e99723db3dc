use crate::commands::CommandError;
use crate::rdb::empty_snapshot;
use crate::resp::RespValue;
use crate::server::Server;

#[derive(Debug)]
pub struct FullResync {
    pub header: String,
    pub snapshot: Vec<u8>,
}

/// Handles `PSYNC ? -1`: replies `+FULLRESYNC <id> 0` (a full resync
/// always starts the replica at offset 0) followed by a bulk-encoded
/// minimal snapshot. The caller promotes the connection to a replica
/// after sending both.
pub fn psync(server: &Server, arguments: Vec<String>) -> Result<FullResync, CommandError> {
    if arguments.len() != 2 {
        return Err(CommandError::WrongNumberOfArguments("psync".to_string()));
    }

    // Only full resynchronization is supported: the replica must ask
    // with an unknown id and offset -1.
    if arguments[0] != "?" || arguments[1] != "-1" {
        return Err(CommandError::SyntaxError);
    }

    let header =
        RespValue::SimpleString(format!("FULLRESYNC {} 0", server.replication.repl_id)).encode();

    Ok(FullResync {
        header,
        snapshot: empty_snapshot(),
    })
}
