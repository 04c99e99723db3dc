use crate::commands::CommandError;
use crate::resp::RespValue;

/// Handles the PING command: `+PONG` without arguments, a bulk-string
/// echo of the message with one.
pub fn ping(arguments: Vec<String>) -> Result<String, CommandError> {
    match arguments.len() {
        0 => Ok(RespValue::SimpleString("PONG".to_string()).encode()),
        1 => Ok(RespValue::BulkString(arguments[0].clone()).encode()),
        _ => Err(CommandError::WrongNumberOfArguments("ping".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping() {
        assert_eq!(ping(vec![]), Ok("+PONG\r\n".to_string()));
        assert_eq!(
            ping(vec!["hello".to_string()]),
            Ok("$5\r\nhello\r\n".to_string())
        );
        assert_eq!(
            ping(vec!["a".to_string(), "b".to_string()]),
            Err(CommandError::WrongNumberOfArguments("ping".to_string()))
        );
    }
}
