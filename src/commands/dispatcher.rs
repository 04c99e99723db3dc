//! Per-connection command dispatch.
//!
//! A connection runs through three gates in order: subscribe mode
//! (restricting the command set while subscriptions are active),
//! transaction mode (queueing recognized commands under MULTI), then
//! normal execution. [`execute`] is the shared execution core used by
//! normal dispatch, EXEC replay and the replica feed.

use crate::commands::psync::FullResync;
use crate::commands::{
    blpop, config_get, echo, get, incr, info, keys, list_ops, lpop, ping, psync, pub_sub,
    replconf, set, type_command, wait, xadd, xrange, xread, Command, CommandError,
    KNOWN_COMMANDS, SUBSCRIBE_MODE_COMMANDS,
};
use crate::connection::Session;
use crate::resp::RespValue;
use crate::server::Server;

/// What the connection loop should do with a dispatched command.
#[derive(Debug)]
pub enum Action {
    /// Write this reply to the client.
    Reply(String),
    /// The command produced no reply (REPLCONF ACK).
    NoReply,
    /// Reply with the FULLRESYNC header plus the bulk-encoded snapshot,
    /// then promote the connection to a replica.
    FullResync(FullResync),
    /// Write this reply, then close the connection.
    Close(String),
}

/// How a command reached the execution core. Blocking commands only
/// actually block for interactive clients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExecutionMode {
    Interactive,
    TransactionReplay,
    ReplicaFeed,
}

pub async fn dispatch(server: &Server, session: &mut Session, command: Command) -> Action {
    if session.in_subscribe_mode() {
        match command.name.as_str() {
            "SUBSCRIBE" | "UNSUBSCRIBE" | "PING" | "QUIT" | "RESET" => {
                // Handled below with their normal-mode behavior, except
                // PING which answers in the subscribe-mode shape.
            }
            name if !SUBSCRIBE_MODE_COMMANDS.contains(&name) => {
                return Action::Reply(
                    CommandError::SubscribeModeRestricted(command.name.to_lowercase()).as_resp(),
                );
            }
            _ => {}
        }

        if command.name == "PING" {
            return reply_of(pub_sub::subscribe_ping(command.arguments.clone()));
        }
    }

    if session.transaction.is_some() {
        return dispatch_in_transaction(server, session, command).await;
    }

    match command.name.as_str() {
        "MULTI" => {
            if !command.arguments.is_empty() {
                return Action::Reply(
                    CommandError::WrongNumberOfArguments("multi".to_string()).as_resp(),
                );
            }
            session.transaction = Some(Vec::new());
            Action::Reply(RespValue::SimpleString("OK".to_string()).encode())
        }
        "EXEC" => Action::Reply(CommandError::ExecWithoutMulti.as_resp()),
        "DISCARD" => Action::Reply(CommandError::DiscardWithoutMulti.as_resp()),
        "SUBSCRIBE" => {
            reply_of(pub_sub::subscribe(server, session, command.arguments.clone()).await)
        }
        "UNSUBSCRIBE" => {
            reply_of(pub_sub::unsubscribe(server, session, command.arguments.clone()).await)
        }
        "PSYNC" => match psync::psync(server, command.arguments.clone()) {
            Ok(full_resync) => Action::FullResync(full_resync),
            Err(e) => Action::Reply(e.as_resp()),
        },
        "QUIT" => Action::Close(RespValue::SimpleString("OK".to_string()).encode()),
        "RESET" => reset(server, session).await,
        _ => {
            if command.is_write() && !server.is_master() {
                return Action::Reply(CommandError::ReadOnlyReplica.as_resp());
            }

            match execute(server, &command, ExecutionMode::Interactive).await {
                Ok(Some(reply)) => Action::Reply(reply),
                Ok(None) => Action::NoReply,
                Err(e) => Action::Reply(e.as_resp()),
            }
        }
    }
}

async fn dispatch_in_transaction(
    server: &Server,
    session: &mut Session,
    command: Command,
) -> Action {
    match command.name.as_str() {
        "MULTI" => Action::Reply(CommandError::MultiNested.as_resp()),
        "EXEC" => {
            let queued = session.transaction.take().unwrap_or_default();
            run_exec(server, queued).await
        }
        "DISCARD" => {
            session.transaction = None;
            Action::Reply(RespValue::SimpleString("OK".to_string()).encode())
        }
        "SUBSCRIBE" | "UNSUBSCRIBE" | "PSYNC" | "QUIT" | "RESET" => Action::Reply(
            CommandError::NotAllowedInTransaction(command.name.clone()).as_resp(),
        ),
        name if KNOWN_COMMANDS.contains(&name) => {
            if let Some(queue) = session.transaction.as_mut() {
                queue.push(command.clone());
            }
            Action::Reply(RespValue::SimpleString("QUEUED".to_string()).encode())
        }
        _ => {
            // An unrecognized command aborts the whole transaction.
            session.transaction = None;
            Action::Reply(CommandError::UnknownCommand(command.raw_name().to_string()).as_resp())
        }
    }
}

/// Runs the queued commands in order. Per-command errors are embedded
/// in the reply array and do not stop the remaining commands.
async fn run_exec(server: &Server, queued: Vec<Command>) -> Action {
    let mut response = format!("*{}\r\n", queued.len());

    for command in &queued {
        match execute(server, command, ExecutionMode::TransactionReplay).await {
            Ok(Some(reply)) => response.push_str(&reply),
            Ok(None) => response.push_str(&RespValue::SimpleString("OK".to_string()).encode()),
            Err(e) => response.push_str(&e.as_resp()),
        }
    }

    Action::Reply(response)
}

async fn reset(server: &Server, session: &mut Session) -> Action {
    session.transaction = None;

    {
        let mut pubsub = server.pubsub.write().await;
        pubsub.unsubscribe_all(&session.client_addr);
    }
    session.channels.clear();

    Action::Reply(RespValue::SimpleString("RESET".to_string()).encode())
}

fn reply_of(result: Result<String, CommandError>) -> Action {
    match result {
        Ok(reply) => Action::Reply(reply),
        Err(e) => Action::Reply(e.as_resp()),
    }
}

/// Executes one command against the shared state and returns its
/// encoded reply (`None` for the reply-less REPLCONF ACK). On a master,
/// a successful write is propagated to every attached replica.
pub async fn execute(
    server: &Server,
    command: &Command,
    mode: ExecutionMode,
) -> Result<Option<String>, CommandError> {
    let blocking_allowed = mode == ExecutionMode::Interactive;

    let reply = match command.name.as_str() {
        "PING" => ping::ping(command.arguments.clone())?,
        "ECHO" => echo::echo(command.arguments.clone())?,
        "GET" => get::get(server, command.arguments.clone()).await?,
        "SET" => set::set(server, command.arguments.clone()).await?,
        "INCR" => incr::incr(server, command.arguments.clone()).await?,
        "TYPE" => type_command::type_command(server, command.arguments.clone()).await?,
        "KEYS" => keys::keys(server, command.arguments.clone()).await?,
        "CONFIG" => config_get::config_get(server, command.arguments.clone())?,
        "INFO" => info::info(server, command.arguments.clone())?,
        "RPUSH" => list_ops::rpush(server, command.arguments.clone()).await?,
        "LPUSH" => list_ops::lpush(server, command.arguments.clone()).await?,
        "LPOP" => lpop::lpop(server, command.arguments.clone()).await?,
        "LLEN" => list_ops::llen(server, command.arguments.clone()).await?,
        "LRANGE" => list_ops::lrange(server, command.arguments.clone()).await?,
        "BLPOP" => blpop::blpop(server, command.arguments.clone(), blocking_allowed).await?,
        "XADD" => xadd::xadd(server, command.arguments.clone()).await?,
        "XRANGE" => xrange::xrange(server, command.arguments.clone()).await?,
        "XREAD" => xread::xread(server, command.arguments.clone(), blocking_allowed).await?,
        "PUBLISH" => pub_sub::publish(server, command.arguments.clone()).await?,
        "WAIT" => wait::wait(server, command.arguments.clone()).await?,
        "REPLCONF" => return Ok(replconf::replconf(server, command.arguments.clone())?),
        _ => return Err(CommandError::UnknownCommand(command.raw_name().to_string())),
    };

    if command.is_write() && server.is_master() {
        server.propagate_write(command).await;
    }

    Ok(Some(reply))
}
