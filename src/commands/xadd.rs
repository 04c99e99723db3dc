use jiff::Timestamp;

use crate::commands::stream_id::resolve_entry_id;
use crate::commands::CommandError;
use crate::resp::RespValue;
use crate::server::Server;
use crate::store::{DataType, StreamEntry, Value};

struct XaddArguments {
    key: String,
    raw_id: String,
    fields: Vec<(String, String)>,
}

impl XaddArguments {
    fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        // key, id and at least one balanced field/value pair.
        if arguments.len() < 4 || arguments[2..].len() % 2 != 0 {
            return Err(CommandError::WrongNumberOfArguments("xadd".to_string()));
        }

        Ok(Self {
            key: arguments[0].clone(),
            raw_id: arguments[1].clone(),
            fields: arguments[2..]
                .chunks(2)
                .map(|pair| (pair[0].clone(), pair[1].clone()))
                .collect(),
        })
    }
}

/// Handles the XADD command: validates or allocates the entry id
/// against the stream's newest entry, appends, and returns the final id
/// as a bulk string.
pub async fn xadd(server: &Server, arguments: Vec<String>) -> Result<String, CommandError> {
    let xadd_arguments = XaddArguments::parse(arguments)?;
    let now = Timestamp::now();
    let now_ms = now.as_millisecond().max(0) as u64;

    let mut store = server.store.write().await;
    store.remove_if_expired(&xadd_arguments.key, now);

    let entry_id = match store.get_mut(&xadd_arguments.key) {
        Some(value) => {
            let last = value.last_stream_id();
            let DataType::Stream(ref mut entries) = value.data else {
                return Err(CommandError::WrongType);
            };

            let entry_id = resolve_entry_id(&xadd_arguments.raw_id, last, now_ms)?;
            entries.push(StreamEntry {
                id: entry_id,
                fields: xadd_arguments.fields,
            });
            entry_id
        }
        None => {
            let entry_id = resolve_entry_id(&xadd_arguments.raw_id, None, now_ms)?;
            store.insert(
                xadd_arguments.key.clone(),
                Value::stream(vec![StreamEntry {
                    id: entry_id,
                    fields: xadd_arguments.fields,
                }]),
            );
            entry_id
        }
    };

    Ok(RespValue::BulkString(entry_id.to_string()).encode())
}
