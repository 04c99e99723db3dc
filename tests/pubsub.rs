mod common;

use common::*;
use tokio::io::AsyncReadExt;

async fn read_reply(peer: &mut tokio::net::TcpStream, expected_len: usize) -> String {
    let mut buffer = vec![0u8; expected_len];
    tokio::time::timeout(
        std::time::Duration::from_secs(2),
        peer.read_exact(&mut buffer),
    )
    .await
    .expect("delivery should arrive")
    .expect("socket should stay open");
    String::from_utf8(buffer).unwrap()
}

#[tokio::test]
async fn test_subscribe_reply_counts_channel_subscribers() {
    let server = master_server();
    let mut client = new_client("127.0.0.1:41844").await;

    assert_eq!(
        exec(&server, &mut client, &["SUBSCRIBE", "ch"]).await,
        "*3\r\n$9\r\nsubscribe\r\n$2\r\nch\r\n:1\r\n"
    );

    // The count is per channel, not per connection.
    assert_eq!(
        exec(&server, &mut client, &["SUBSCRIBE", "other"]).await,
        "*3\r\n$9\r\nsubscribe\r\n$5\r\nother\r\n:1\r\n"
    );

    // Subscribing twice to the same channel does not double-count.
    assert_eq!(
        exec(&server, &mut client, &["SUBSCRIBE", "ch"]).await,
        "*3\r\n$9\r\nsubscribe\r\n$2\r\nch\r\n:1\r\n"
    );

    // A second connection joining an occupied channel sees the total.
    let mut second = new_client("127.0.0.1:41845").await;
    assert_eq!(
        exec(&server, &mut second, &["SUBSCRIBE", "ch"]).await,
        "*3\r\n$9\r\nsubscribe\r\n$2\r\nch\r\n:2\r\n"
    );

    // Its first unsubscribe leaves the original subscriber behind.
    assert_eq!(
        exec(&server, &mut second, &["UNSUBSCRIBE", "ch"]).await,
        "*3\r\n$11\r\nunsubscribe\r\n$2\r\nch\r\n:1\r\n"
    );
}

#[tokio::test]
async fn test_subscribe_mode_restricts_commands() {
    let server = master_server();
    let mut client = new_client("127.0.0.1:41844").await;

    exec(&server, &mut client, &["SUBSCRIBE", "ch"]).await;

    assert_eq!(
        exec(&server, &mut client, &["GET", "x"]).await,
        "-ERR Can't execute 'get': only (P)SUBSCRIBE / (P)UNSUBSCRIBE / PING / QUIT / RESET are allowed in this context\r\n"
    );
    assert_eq!(
        exec(&server, &mut client, &["PING"]).await,
        "*2\r\n$4\r\npong\r\n$0\r\n\r\n"
    );
}

#[tokio::test]
async fn test_unsubscribe_leaves_subscribe_mode() {
    let server = master_server();
    let mut client = new_client("127.0.0.1:41844").await;

    exec(&server, &mut client, &["SUBSCRIBE", "ch"]).await;
    assert_eq!(
        exec(&server, &mut client, &["UNSUBSCRIBE", "ch"]).await,
        "*3\r\n$11\r\nunsubscribe\r\n$2\r\nch\r\n:0\r\n"
    );

    // Back in normal mode: regular commands work again.
    assert_eq!(exec(&server, &mut client, &["PING"]).await, simple("PONG"));
    assert_eq!(
        exec(&server, &mut client, &["SET", "x", "1"]).await,
        simple("OK")
    );
}

#[tokio::test]
async fn test_publish_delivers_to_subscriber() {
    let server = master_server();
    let mut subscriber = new_client("127.0.0.1:41844").await;
    let mut publisher = new_client("127.0.0.1:41845").await;

    exec(&server, &mut subscriber, &["SUBSCRIBE", "ch"]).await;

    assert_eq!(
        exec(&server, &mut publisher, &["PUBLISH", "ch", "hi"]).await,
        integer(1)
    );

    let expected = "*3\r\n$7\r\nmessage\r\n$2\r\nch\r\n$2\r\nhi\r\n";
    let delivered = read_reply(&mut subscriber.peer, expected.len()).await;
    assert_eq!(delivered, expected);
}

#[tokio::test]
async fn test_publish_without_subscribers_returns_zero() {
    let server = master_server();
    let mut publisher = new_client("127.0.0.1:41845").await;

    assert_eq!(
        exec(&server, &mut publisher, &["PUBLISH", "nobody", "hi"]).await,
        integer(0)
    );
}

#[tokio::test]
async fn test_publish_counts_each_subscriber_once() {
    let server = master_server();
    let mut first = new_client("127.0.0.1:41844").await;
    let mut second = new_client("127.0.0.1:41845").await;
    let mut publisher = new_client("127.0.0.1:41846").await;

    exec(&server, &mut first, &["SUBSCRIBE", "ch"]).await;
    exec(&server, &mut first, &["SUBSCRIBE", "ch"]).await;
    exec(&server, &mut second, &["SUBSCRIBE", "ch"]).await;

    assert_eq!(
        exec(&server, &mut publisher, &["PUBLISH", "ch", "x"]).await,
        integer(2)
    );
}

#[tokio::test]
async fn test_unsubscribed_client_stops_receiving() {
    let server = master_server();
    let mut subscriber = new_client("127.0.0.1:41844").await;
    let mut publisher = new_client("127.0.0.1:41845").await;

    exec(&server, &mut subscriber, &["SUBSCRIBE", "ch"]).await;
    exec(&server, &mut subscriber, &["UNSUBSCRIBE", "ch"]).await;

    assert_eq!(
        exec(&server, &mut publisher, &["PUBLISH", "ch", "hi"]).await,
        integer(0)
    );
}

#[tokio::test]
async fn test_reset_clears_subscriptions() {
    let server = master_server();
    let mut client = new_client("127.0.0.1:41844").await;

    exec(&server, &mut client, &["SUBSCRIBE", "ch"]).await;
    assert_eq!(exec(&server, &mut client, &["RESET"]).await, simple("RESET"));

    // Out of subscribe mode, and the bus no longer delivers to us.
    assert_eq!(
        exec(&server, &mut client, &["SET", "x", "1"]).await,
        simple("OK")
    );
    let mut publisher = new_client("127.0.0.1:41845").await;
    assert_eq!(
        exec(&server, &mut publisher, &["PUBLISH", "ch", "hi"]).await,
        integer(0)
    );
}
