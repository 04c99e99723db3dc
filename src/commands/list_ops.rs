use std::collections::VecDeque;

use jiff::Timestamp;

use crate::commands::CommandError;
use crate::resp::RespValue;
use crate::server::Server;
use crate::store::{DataType, Value};

struct PushArguments {
    key: String,
    elements: Vec<String>,
}

impl PushArguments {
    fn parse(arguments: Vec<String>, command_name: &str) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            return Err(CommandError::WrongNumberOfArguments(
                command_name.to_string(),
            ));
        }

        Ok(Self {
            key: arguments[0].clone(),
            elements: arguments[1..].to_vec(),
        })
    }
}

/// Handles the RPUSH command: appends the elements in argument order and
/// returns the new length. Wakes the oldest blocked pop on the key.
pub async fn rpush(server: &Server, arguments: Vec<String>) -> Result<String, CommandError> {
    let push_arguments = PushArguments::parse(arguments, "rpush")?;
    push(server, push_arguments, false).await
}

/// Handles the LPUSH command: prepends the elements one by one, so the
/// final list order is the reverse of the argument order.
pub async fn lpush(server: &Server, arguments: Vec<String>) -> Result<String, CommandError> {
    let push_arguments = PushArguments::parse(arguments, "lpush")?;
    push(server, push_arguments, true).await
}

async fn push(
    server: &Server,
    arguments: PushArguments,
    at_front: bool,
) -> Result<String, CommandError> {
    let mut store = server.store.write().await;
    store.remove_if_expired(&arguments.key, Timestamp::now());

    let new_length = match store.get_mut(&arguments.key) {
        Some(value) => {
            let DataType::List(ref mut elements) = value.data else {
                return Err(CommandError::WrongType);
            };
            extend(elements, &arguments.elements, at_front);
            elements.len()
        }
        None => {
            let mut elements = VecDeque::new();
            extend(&mut elements, &arguments.elements, at_front);
            let new_length = elements.len();
            store.insert(arguments.key.clone(), Value::list(elements));
            new_length
        }
    };

    // Waking under the store lock keeps the wake ordered after the push
    // for any waiter registered before it.
    let mut state = server.state.lock().await;
    state.wake_list_waiter(&arguments.key);

    Ok(RespValue::Integer(new_length as i64).encode())
}

fn extend(elements: &mut VecDeque<String>, new_elements: &[String], at_front: bool) {
    for element in new_elements {
        if at_front {
            elements.push_front(element.clone());
        } else {
            elements.push_back(element.clone());
        }
    }
}

/// Handles the LLEN command: list length, 0 for a missing key.
pub async fn llen(server: &Server, arguments: Vec<String>) -> Result<String, CommandError> {
    if arguments.len() != 1 {
        return Err(CommandError::WrongNumberOfArguments("llen".to_string()));
    }

    let store = server.store.read().await;
    let length = match store.get_live(&arguments[0], Timestamp::now()) {
        Some(value) => match &value.data {
            DataType::List(elements) => elements.len(),
            _ => return Err(CommandError::WrongType),
        },
        None => 0,
    };

    Ok(RespValue::Integer(length as i64).encode())
}

struct LrangeArguments {
    key: String,
    start: i64,
    stop: i64,
}

impl LrangeArguments {
    fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 3 {
            return Err(CommandError::WrongNumberOfArguments("lrange".to_string()));
        }

        let start = arguments[1]
            .parse::<i64>()
            .map_err(|_| CommandError::NotAnInteger)?;
        let stop = arguments[2]
            .parse::<i64>()
            .map_err(|_| CommandError::NotAnInteger)?;

        Ok(Self {
            key: arguments[0].clone(),
            start,
            stop,
        })
    }
}

/// Handles the LRANGE command with Redis index semantics: negative
/// indexes count from the tail, out-of-range bounds clamp, and an
/// inverted range yields an empty array.
pub async fn lrange(server: &Server, arguments: Vec<String>) -> Result<String, CommandError> {
    let lrange_arguments = LrangeArguments::parse(arguments)?;

    let store = server.store.read().await;
    let Some(value) = store.get_live(&lrange_arguments.key, Timestamp::now()) else {
        return Ok(RespValue::Array(vec![]).encode());
    };

    let DataType::List(elements) = &value.data else {
        return Err(CommandError::WrongType);
    };

    let length = elements.len() as i64;
    let start = clamp_index(lrange_arguments.start, length);
    let stop = clamp_index(lrange_arguments.stop, length);

    if start >= length || start > stop {
        return Ok(RespValue::Array(vec![]).encode());
    }

    let stop = stop.min(length - 1);
    let selected = elements
        .iter()
        .skip(start as usize)
        .take((stop - start + 1) as usize)
        .map(|element| RespValue::BulkString(element.clone()))
        .collect::<Vec<RespValue>>();

    Ok(RespValue::Array(selected).encode())
}

fn clamp_index(index: i64, length: i64) -> i64 {
    if index < 0 {
        (length + index).max(0)
    } else {
        index
    }
}
