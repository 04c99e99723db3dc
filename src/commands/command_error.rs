use thiserror::Error;

use crate::resp::RespValue;

/// Errors surfaced to clients as RESP error frames.
///
/// The `Display` text is the message body; [`CommandError::as_resp`]
/// prepends the Redis-compatible prefix (`ERR`, `WRONGTYPE`,
/// `READONLY`) and encodes the frame.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum CommandError {
    #[error("Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("wrong number of arguments for '{0}' command")]
    WrongNumberOfArguments(String),
    #[error("value is not an integer or out of range")]
    NotAnInteger,
    #[error("invalid expire time in 'set' command")]
    InvalidExpireTime,
    #[error("timeout is not a float or out of range")]
    InvalidTimeout,
    #[error("timeout is not an integer or out of range")]
    InvalidBlockDuration,
    #[error("The ID specified in XADD must be greater than 0-0")]
    StreamIdZero,
    #[error("The ID specified in XADD is equal or smaller than the target stream top item")]
    StreamIdTooSmall,
    #[error("Invalid stream ID specified as stream command argument")]
    InvalidStreamId,
    #[error("syntax error")]
    SyntaxError,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("MULTI calls can not be nested")]
    MultiNested,
    #[error("EXEC without MULTI")]
    ExecWithoutMulti,
    #[error("DISCARD without MULTI")]
    DiscardWithoutMulti,
    #[error(
        "Can't execute '{0}': only (P)SUBSCRIBE / (P)UNSUBSCRIBE / PING / QUIT / RESET are allowed in this context"
    )]
    SubscribeModeRestricted(String),
    #[error("{0} is not allowed in transactions")]
    NotAllowedInTransaction(String),
    #[error("You can't write against a read only replica.")]
    ReadOnlyReplica,
    #[error("invalid glob pattern: {0}")]
    InvalidGlobPattern(String),
    #[error("unknown CONFIG parameter '{0}'")]
    UnknownConfigParameter(String),
    #[error("unknown subcommand '{0}'")]
    UnknownSubcommand(String),
    #[error("unsupported INFO section '{0}'")]
    UnsupportedInfoSection(String),
}

impl CommandError {
    pub fn as_resp(&self) -> String {
        let message = match self {
            CommandError::WrongType => format!("WRONGTYPE {}", self),
            CommandError::ReadOnlyReplica => format!("READONLY {}", self),
            other => format!("ERR {}", other),
        };

        RespValue::Error(message).encode()
    }
}
