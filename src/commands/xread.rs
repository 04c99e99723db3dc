use std::time::Duration;

use jiff::Timestamp;
use tokio::time::Instant;

use crate::commands::stream_id::parse_read_after;
use crate::commands::xrange::entries_to_resp;
use crate::commands::CommandError;
use crate::resp::RespValue;
use crate::server::Server;
use crate::store::{DataType, StreamId};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

struct XreadArguments {
    block: Option<Option<Duration>>,
    keys: Vec<String>,
    raw_ids: Vec<String>,
}

impl XreadArguments {
    fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let mut block = None;
        let mut index = 0;

        while index < arguments.len() {
            if arguments[index].eq_ignore_ascii_case("block") {
                let raw = arguments
                    .get(index + 1)
                    .ok_or(CommandError::InvalidBlockDuration)?;
                let ms = raw
                    .parse::<u64>()
                    .map_err(|_| CommandError::InvalidBlockDuration)?;
                // BLOCK 0 blocks indefinitely.
                block = Some(if ms == 0 {
                    None
                } else {
                    Some(Duration::from_millis(ms))
                });
                index += 2;
            } else if arguments[index].eq_ignore_ascii_case("streams") {
                let rest = &arguments[index + 1..];
                if rest.is_empty() || rest.len() % 2 != 0 {
                    return Err(CommandError::WrongNumberOfArguments("xread".to_string()));
                }

                let (keys, raw_ids) = rest.split_at(rest.len() / 2);
                return Ok(Self {
                    block,
                    keys: keys.to_vec(),
                    raw_ids: raw_ids.to_vec(),
                });
            } else {
                return Err(CommandError::SyntaxError);
            }
        }

        Err(CommandError::WrongNumberOfArguments("xread".to_string()))
    }
}

/// Handles the XREAD command.
///
/// For each `(key, id)` pair, returns the entries with ids strictly
/// greater than `id`. `$` resolves, at entry, to the stream's current
/// newest id so only later additions match. With BLOCK the command
/// polls until some stream produces a result or the timeout elapses; a
/// miss replies the null bulk, matching the upstream wire behavior.
pub async fn xread(
    server: &Server,
    arguments: Vec<String>,
    blocking_allowed: bool,
) -> Result<String, CommandError> {
    let xread_arguments = XreadArguments::parse(arguments)?;

    let mut after_ids = Vec::with_capacity(xread_arguments.raw_ids.len());
    {
        let store = server.store.read().await;
        let now = Timestamp::now();

        for (key, raw_id) in xread_arguments.keys.iter().zip(&xread_arguments.raw_ids) {
            if raw_id == "$" {
                let last = store
                    .get_live(key, now)
                    .and_then(|value| value.last_stream_id())
                    .unwrap_or(StreamId::MIN);
                after_ids.push(last);
            } else {
                after_ids.push(parse_read_after(raw_id)?);
            }
        }
    }

    let deadline = match xread_arguments.block {
        Some(Some(timeout)) => Some(Instant::now() + timeout),
        _ => None,
    };

    loop {
        if let Some(response) = probe(server, &xread_arguments.keys, &after_ids).await? {
            return Ok(response);
        }

        let block_requested = xread_arguments.block.is_some();
        if !block_requested || !blocking_allowed {
            return Ok(RespValue::NullBulkString.encode());
        }

        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return Ok(RespValue::NullBulkString.encode());
            }
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// One pass over all requested streams. Returns the encoded reply when
/// at least one stream has matching entries.
async fn probe(
    server: &Server,
    keys: &[String],
    after_ids: &[StreamId],
) -> Result<Option<String>, CommandError> {
    let store = server.store.read().await;
    let now = Timestamp::now();
    let mut results = Vec::new();

    for (key, after) in keys.iter().zip(after_ids) {
        let Some(value) = store.get_live(key, now) else {
            continue;
        };

        let DataType::Stream(entries) = &value.data else {
            return Err(CommandError::WrongType);
        };

        let matching = entries
            .iter()
            .filter(|entry| entry.id > *after)
            .collect::<Vec<_>>();

        if !matching.is_empty() {
            results.push(RespValue::Array(vec![
                RespValue::BulkString(key.clone()),
                entries_to_resp(&matching),
            ]));
        }
    }

    if results.is_empty() {
        return Ok(None);
    }

    Ok(Some(RespValue::Array(results).encode()))
}
