//! Shared harness for integration tests: an in-process server plus
//! sessions backed by real loopback sockets, driven straight through
//! the dispatcher.

#![allow(dead_code)]

use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use rudis::commands::{dispatch, Action, Command};
use rudis::config::Config;
use rudis::connection::Session;
use rudis::resp::Frame;
use rudis::server::Server;

/// A dispatcher-level client: its session plus the peer socket that
/// receives anything written to the session's writer (pub/sub pushes).
pub struct TestClient {
    pub session: Session,
    pub peer: TcpStream,
}

pub fn master_server() -> Arc<Server> {
    let config = Config::from_args(vec!["rudis".to_string()]).unwrap();
    Arc::new(Server::new(config))
}

pub fn replica_server() -> Arc<Server> {
    let config = Config::from_args(vec![
        "rudis".to_string(),
        "--replicaof".to_string(),
        "127.0.0.1 1".to_string(),
    ])
    .unwrap();
    Arc::new(Server::new(config))
}

pub async fn new_client(client_addr: &str) -> TestClient {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let outbound = TcpStream::connect(addr).await.unwrap();
    let (peer, _) = listener.accept().await.unwrap();

    let (_read_half, write_half) = outbound.into_split();
    TestClient {
        session: Session::new(client_addr.to_string(), Arc::new(Mutex::new(write_half))),
        peer,
    }
}

pub fn command(parts: &[&str]) -> Command {
    let frame = Frame {
        arguments: parts.iter().map(|part| part.to_string()).collect(),
        byte_len: 0,
    };
    Command::from_frame(&frame).unwrap()
}

/// Dispatches a command and returns the encoded reply.
pub async fn exec(server: &Arc<Server>, client: &mut TestClient, parts: &[&str]) -> String {
    match dispatch(server, &mut client.session, command(parts)).await {
        Action::Reply(reply) => reply,
        Action::NoReply => String::new(),
        Action::Close(reply) => reply,
        Action::FullResync(full_resync) => full_resync.header,
    }
}

pub fn bulk(value: &str) -> String {
    format!("${}\r\n{}\r\n", value.len(), value)
}

pub fn simple(value: &str) -> String {
    format!("+{}\r\n", value)
}

pub fn integer(value: i64) -> String {
    format!(":{}\r\n", value)
}

pub fn null_bulk() -> String {
    "$-1\r\n".to_string()
}

pub fn array_of_bulk(values: &[&str]) -> String {
    let mut out = format!("*{}\r\n", values.len());
    for value in values {
        out.push_str(&bulk(value));
    }
    out
}

pub async fn sleep_ms(ms: u64) {
    tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
}
