use jiff::Timestamp;

use crate::commands::CommandError;
use crate::resp::RespValue;
use crate::server::Server;
use crate::store::DataType;

struct LpopArguments {
    key: String,
    count: Option<i64>,
}

impl LpopArguments {
    fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() || arguments.len() > 2 {
            return Err(CommandError::WrongNumberOfArguments("lpop".to_string()));
        }

        let count = arguments
            .get(1)
            .map(|raw| raw.parse::<i64>().map_err(|_| CommandError::NotAnInteger))
            .transpose()?;

        Ok(Self {
            key: arguments[0].clone(),
            count,
        })
    }
}

/// Handles the LPOP command.
///
/// Without a count, pops and returns the front element (null bulk when
/// the key is absent). With a count, returns up to `count` front
/// elements as an array; a count of zero or less yields the empty
/// array. A pop that drains the list removes the key, so popping a
/// missing list and popping an empty one are indistinguishable.
pub async fn lpop(server: &Server, arguments: Vec<String>) -> Result<String, CommandError> {
    let lpop_arguments = LpopArguments::parse(arguments)?;

    let mut store = server.store.write().await;
    store.remove_if_expired(&lpop_arguments.key, Timestamp::now());

    let Some(value) = store.get_mut(&lpop_arguments.key) else {
        return Ok(RespValue::NullBulkString.encode());
    };

    let DataType::List(ref mut elements) = value.data else {
        return Err(CommandError::WrongType);
    };

    let response = match lpop_arguments.count {
        None => match elements.pop_front() {
            Some(element) => RespValue::BulkString(element).encode(),
            None => RespValue::NullBulkString.encode(),
        },
        Some(count) if count <= 0 => RespValue::Array(vec![]).encode(),
        Some(count) => {
            let take = (count as usize).min(elements.len());
            let popped = elements
                .drain(..take)
                .map(RespValue::BulkString)
                .collect::<Vec<RespValue>>();
            RespValue::Array(popped).encode()
        }
    };

    if elements.is_empty() {
        store.remove(&lpop_arguments.key);
    }

    Ok(response)
}
