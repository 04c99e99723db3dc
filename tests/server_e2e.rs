//! End-to-end tests over real sockets: the full accept loop, framing,
//! dispatch and replication handshake.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use rudis::config::Config;
use rudis::server::{self, Server};

async fn start_server(args: &[&str]) -> Arc<Server> {
    let mut full_args = vec!["rudis".to_string()];
    full_args.extend(args.iter().map(|s| s.to_string()));

    let config = Config::from_args(full_args).unwrap();
    let port = config.port;
    let server = Arc::new(Server::new(config));

    let server_for_task = Arc::clone(&server);
    tokio::spawn(async move {
        let _ = server::run(server_for_task).await;
    });

    wait_until_listening(port).await;
    server
}

async fn wait_until_listening(port: u16) {
    for _ in 0..100 {
        if TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("server on port {} never came up", port);
}

async fn connect(port: u16) -> TcpStream {
    TcpStream::connect(("127.0.0.1", port)).await.unwrap()
}

async fn send(stream: &mut TcpStream, parts: &[&str]) {
    let mut frame = format!("*{}\r\n", parts.len());
    for part in parts {
        frame.push_str(&format!("${}\r\n{}\r\n", part.len(), part));
    }
    stream.write_all(frame.as_bytes()).await.unwrap();
}

async fn read_exact_string(stream: &mut TcpStream, len: usize) -> String {
    let mut buffer = vec![0u8; len];
    tokio::time::timeout(Duration::from_secs(3), stream.read_exact(&mut buffer))
        .await
        .expect("reply should arrive")
        .expect("socket should stay open");
    String::from_utf8(buffer).unwrap()
}

#[tokio::test]
async fn test_pipelined_commands_reply_in_order() {
    let _server = start_server(&["--port", "16490"]).await;
    let mut client = connect(16490).await;

    // Two frames in a single write.
    client
        .write_all(b"*1\r\n$4\r\nPING\r\n*2\r\n$4\r\nECHO\r\n$2\r\nhi\r\n")
        .await
        .unwrap();

    let reply = read_exact_string(&mut client, "+PONG\r\n$2\r\nhi\r\n".len()).await;
    assert_eq!(reply, "+PONG\r\n$2\r\nhi\r\n");
}

#[tokio::test]
async fn test_set_get_over_the_wire() {
    let _server = start_server(&["--port", "16491"]).await;
    let mut client = connect(16491).await;

    send(&mut client, &["SET", "foo", "bar"]).await;
    assert_eq!(read_exact_string(&mut client, 5).await, "+OK\r\n");

    send(&mut client, &["GET", "foo"]).await;
    assert_eq!(read_exact_string(&mut client, 9).await, "$3\r\nbar\r\n");

    send(&mut client, &["TYPE", "foo"]).await;
    assert_eq!(read_exact_string(&mut client, 9).await, "+string\r\n");
}

#[tokio::test]
async fn test_leader_follower_replication() {
    let master = start_server(&["--port", "16500"]).await;
    let _follower = start_server(&["--port", "16501", "--replicaof", "127.0.0.1 16500"]).await;

    // Let the follower finish its handshake and attach.
    for _ in 0..100 {
        if master.replication.replica_count().await == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(master.replication.replica_count().await, 1);

    let mut client = connect(16500).await;
    send(&mut client, &["SET", "a", "1"]).await;
    assert_eq!(read_exact_string(&mut client, 5).await, "+OK\r\n");

    send(&mut client, &["WAIT", "1", "2000"]).await;
    assert_eq!(read_exact_string(&mut client, 4).await, ":1\r\n");

    let mut follower_client = connect(16501).await;
    send(&mut follower_client, &["GET", "a"]).await;
    assert_eq!(
        read_exact_string(&mut follower_client, 7).await,
        "$1\r\n1\r\n"
    );
}

#[tokio::test]
async fn test_framing_error_terminates_connection() {
    let _server = start_server(&["--port", "16492"]).await;
    let mut client = connect(16492).await;

    client.write_all(b"+NOT-A-COMMAND\r\n").await.unwrap();

    // The server closes without replying.
    let mut buffer = [0u8; 16];
    let read = tokio::time::timeout(Duration::from_secs(3), client.read(&mut buffer))
        .await
        .expect("close should arrive")
        .expect("read should not error");
    assert_eq!(read, 0);
}

#[tokio::test]
async fn test_blocked_client_disconnect_releases_its_waiter() {
    let _server = start_server(&["--port", "16494"]).await;

    let mut blocked = connect(16494).await;
    send(&mut blocked, &["BLPOP", "jobs", "0"]).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    drop(blocked);
    tokio::time::sleep(Duration::from_millis(50)).await;

    // The push must not be consumed by the dead waiter.
    let mut client = connect(16494).await;
    send(&mut client, &["RPUSH", "jobs", "x"]).await;
    assert_eq!(read_exact_string(&mut client, 4).await, ":1\r\n");

    send(&mut client, &["LRANGE", "jobs", "0", "-1"]).await;
    assert_eq!(
        read_exact_string(&mut client, "*1\r\n$1\r\nx\r\n".len()).await,
        "*1\r\n$1\r\nx\r\n"
    );
}

#[tokio::test]
async fn test_xread_block_peer_close_exits_cleanly() {
    let _server = start_server(&["--port", "16495"]).await;

    let mut blocked = connect(16495).await;
    send(&mut blocked, &["XREAD", "BLOCK", "0", "STREAMS", "s", "$"]).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    drop(blocked);
    tokio::time::sleep(Duration::from_millis(50)).await;

    // The server keeps serving other clients.
    let mut client = connect(16495).await;
    send(&mut client, &["PING"]).await;
    assert_eq!(read_exact_string(&mut client, 7).await, "+PONG\r\n");
}

#[tokio::test]
async fn test_quit_closes_after_ok() {
    let _server = start_server(&["--port", "16493"]).await;
    let mut client = connect(16493).await;

    send(&mut client, &["QUIT"]).await;
    assert_eq!(read_exact_string(&mut client, 5).await, "+OK\r\n");

    let mut buffer = [0u8; 16];
    let read = tokio::time::timeout(Duration::from_secs(3), client.read(&mut buffer))
        .await
        .expect("close should arrive")
        .expect("read should not error");
    assert_eq!(read, 0);
}
