//! Command parsing, dispatch and per-command handlers.

mod blpop;
mod command_error;
mod config_get;
mod dispatcher;
mod echo;
mod get;
mod incr;
mod info;
mod keys;
mod list_ops;
mod lpop;
mod ping;
mod psync;
pub mod pub_sub;
mod replconf;
mod set;
mod stream_id;
mod type_command;
mod wait;
mod xadd;
mod xrange;
mod xread;

pub use command_error::CommandError;
pub use dispatcher::{dispatch, execute, Action, ExecutionMode};
pub use psync::FullResync;

use crate::resp::{Frame, RespValue};

/// Commands that mutate the keyspace. On a master each successful one
/// is propagated to replicas; on a replica clients may not issue them.
pub const WRITE_COMMANDS: &[&str] = &["SET", "INCR", "RPUSH", "LPUSH", "LPOP", "BLPOP", "XADD"];

/// Commands a connection may issue while it has active subscriptions.
pub const SUBSCRIBE_MODE_COMMANDS: &[&str] = &[
    "SUBSCRIBE",
    "UNSUBSCRIBE",
    "PSUBSCRIBE",
    "PUNSUBSCRIBE",
    "PING",
    "QUIT",
    "RESET",
];

/// Every command name the dispatcher recognizes. A command outside this
/// list replies `unknown command` and aborts an active transaction.
pub const KNOWN_COMMANDS: &[&str] = &[
    "PING", "ECHO", "GET", "SET", "INCR", "TYPE", "KEYS", "CONFIG", "INFO", "RPUSH", "LPUSH",
    "LPOP", "LLEN", "LRANGE", "BLPOP", "XADD", "XRANGE", "XREAD", "MULTI", "EXEC", "DISCARD",
    "SUBSCRIBE", "UNSUBSCRIBE", "PUBLISH", "REPLCONF", "PSYNC", "WAIT", "QUIT", "RESET",
];

/// A parsed client command: the uppercased name used for dispatch, the
/// remaining arguments, and the original argument vector so the frame
/// can be re-encoded byte-for-byte for replication.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: String,
    pub arguments: Vec<String>,
    raw: Vec<String>,
}

impl Command {
    /// Builds a command from a decoded frame. An empty frame carries no
    /// command and yields `None`.
    pub fn from_frame(frame: &Frame) -> Option<Self> {
        let raw = frame.arguments.clone();
        let name = raw.first()?.to_uppercase();
        let arguments = raw[1..].to_vec();

        Some(Command {
            name,
            arguments,
            raw,
        })
    }

    #[cfg(test)]
    pub fn from_parts(parts: &[&str]) -> Self {
        let raw: Vec<String> = parts.iter().map(|s| s.to_string()).collect();
        Command {
            name: raw[0].to_uppercase(),
            arguments: raw[1..].to_vec(),
            raw,
        }
    }

    /// The command name exactly as the client sent it.
    pub fn raw_name(&self) -> &str {
        &self.raw[0]
    }

    /// Re-encodes the command as the RESP array it arrived in.
    pub fn to_resp(&self) -> String {
        RespValue::command_array(&self.raw)
    }

    pub fn is_write(&self) -> bool {
        WRITE_COMMANDS.contains(&self.name.as_str())
    }
}
