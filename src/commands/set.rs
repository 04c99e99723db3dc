use jiff::Timestamp;

use crate::commands::CommandError;
use crate::resp::RespValue;
use crate::server::Server;
use crate::store::Value;

struct SetArguments {
    key: String,
    value: String,
    expires_at: Option<Timestamp>,
}

impl SetArguments {
    fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 2 && arguments.len() != 4 {
            return Err(CommandError::WrongNumberOfArguments("set".to_string()));
        }

        let mut expires_at = None;

        if arguments.len() == 4 {
            if !arguments[2].eq_ignore_ascii_case("px") {
                return Err(CommandError::SyntaxError);
            }

            let px = arguments[3]
                .parse::<i64>()
                .map_err(|_| CommandError::NotAnInteger)?;
            if px <= 0 {
                return Err(CommandError::InvalidExpireTime);
            }

            let now = Timestamp::now();
            let deadline_ms = now
                .as_millisecond()
                .checked_add(px)
                .ok_or(CommandError::InvalidExpireTime)?;
            expires_at = Some(
                Timestamp::from_millisecond(deadline_ms)
                    .map_err(|_| CommandError::InvalidExpireTime)?,
            );
        }

        Ok(Self {
            key: arguments[0].clone(),
            value: arguments[1].clone(),
            expires_at,
        })
    }
}

/// Handles the SET command: stores a string value, replacing whatever
/// the key held before. `PX <ms>` arms an absolute expiry; its absence
/// clears any previous one.
pub async fn set(server: &Server, arguments: Vec<String>) -> Result<String, CommandError> {
    let set_arguments = SetArguments::parse(arguments)?;

    let mut store = server.store.write().await;
    store.insert(
        set_arguments.key,
        Value::string_with_expiry(set_arguments.value, set_arguments.expires_at),
    );

    Ok(RespValue::SimpleString("OK".to_string()).encode())
}
