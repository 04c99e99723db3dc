use globset::Glob;
use jiff::Timestamp;

use crate::commands::CommandError;
use crate::resp::RespValue;
use crate::server::Server;

/// Handles the KEYS command. The pattern is a Redis-style glob (`*`,
/// `?`, character classes); expired entries are reported as absent but
/// left for a later writer to reap.
pub async fn keys(server: &Server, arguments: Vec<String>) -> Result<String, CommandError> {
    if arguments.len() != 1 {
        return Err(CommandError::WrongNumberOfArguments("keys".to_string()));
    }

    let matcher = Glob::new(&arguments[0])
        .map_err(|e| CommandError::InvalidGlobPattern(e.to_string()))?
        .compile_matcher();

    let store = server.store.read().await;
    let matching = store
        .live_keys(Timestamp::now())
        .filter(|key| matcher.is_match(key))
        .map(|key| RespValue::BulkString(key.clone()))
        .collect::<Vec<RespValue>>();

    Ok(RespValue::Array(matching).encode())
}
