use crate::commands::CommandError;
use crate::resp::RespValue;

pub fn echo(arguments: Vec<String>) -> Result<String, CommandError> {
    if arguments.len() != 1 {
        return Err(CommandError::WrongNumberOfArguments("echo".to_string()));
    }

    Ok(RespValue::BulkString(arguments[0].clone()).encode())
}
