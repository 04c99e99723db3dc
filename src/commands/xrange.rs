use jiff::Timestamp;

use crate::commands::stream_id::{parse_range_end, parse_range_start};
use crate::commands::CommandError;
use crate::resp::RespValue;
use crate::server::Server;
use crate::store::{DataType, StreamEntry};

/// Formats stream entries as the nested RESP array shape shared by
/// XRANGE and XREAD: each entry is `[id, [field, value, ...]]`.
pub fn entries_to_resp(entries: &[&StreamEntry]) -> RespValue {
    let encoded = entries
        .iter()
        .map(|entry| {
            let mut pairs = Vec::with_capacity(entry.fields.len() * 2);
            for (field, value) in &entry.fields {
                pairs.push(RespValue::BulkString(field.clone()));
                pairs.push(RespValue::BulkString(value.clone()));
            }

            RespValue::Array(vec![
                RespValue::BulkString(entry.id.to_string()),
                RespValue::Array(pairs),
            ])
        })
        .collect::<Vec<RespValue>>();

    RespValue::Array(encoded)
}

/// Handles the XRANGE command: entries with ids in the inclusive
/// `[start, end]` interval, in stream order. `-` and `+` select the
/// minimal and maximal ids.
pub async fn xrange(server: &Server, arguments: Vec<String>) -> Result<String, CommandError> {
    if arguments.len() != 3 {
        return Err(CommandError::WrongNumberOfArguments("xrange".to_string()));
    }

    let start = parse_range_start(&arguments[1])?;
    let end = parse_range_end(&arguments[2])?;

    let store = server.store.read().await;
    let Some(value) = store.get_live(&arguments[0], Timestamp::now()) else {
        return Ok(RespValue::Array(vec![]).encode());
    };

    let DataType::Stream(entries) = &value.data else {
        return Err(CommandError::WrongType);
    };

    let selected = entries
        .iter()
        .filter(|entry| entry.id >= start && entry.id <= end)
        .collect::<Vec<&StreamEntry>>();

    Ok(entries_to_resp(&selected).encode())
}
