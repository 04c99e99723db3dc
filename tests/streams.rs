mod common;

use common::*;

#[tokio::test]
async fn test_xadd_rejects_zero_and_non_increasing_ids() {
    let server = master_server();
    let mut client = new_client("127.0.0.1:41844").await;

    assert_eq!(
        exec(&server, &mut client, &["XADD", "s", "0-0", "a", "1"]).await,
        "-ERR The ID specified in XADD must be greater than 0-0\r\n"
    );
    assert_eq!(
        exec(&server, &mut client, &["XADD", "s", "1-1", "a", "1"]).await,
        bulk("1-1")
    );
    assert_eq!(
        exec(&server, &mut client, &["XADD", "s", "1-1", "b", "2"]).await,
        "-ERR The ID specified in XADD is equal or smaller than the target stream top item\r\n"
    );
    assert_eq!(
        exec(&server, &mut client, &["XADD", "s", "1-0", "b", "2"]).await,
        "-ERR The ID specified in XADD is equal or smaller than the target stream top item\r\n"
    );
    assert_eq!(
        exec(&server, &mut client, &["XADD", "s", "1-2", "b", "2"]).await,
        bulk("1-2")
    );
    assert_eq!(
        exec(&server, &mut client, &["TYPE", "s"]).await,
        simple("stream")
    );
}

#[tokio::test]
async fn test_xadd_auto_sequence() {
    let server = master_server();
    let mut client = new_client("127.0.0.1:41844").await;

    assert_eq!(
        exec(&server, &mut client, &["XADD", "s", "0-*", "a", "1"]).await,
        bulk("0-1")
    );
    assert_eq!(
        exec(&server, &mut client, &["XADD", "s", "5-*", "a", "2"]).await,
        bulk("5-0")
    );
    assert_eq!(
        exec(&server, &mut client, &["XADD", "s", "5-*", "a", "3"]).await,
        bulk("5-1")
    );
}

#[tokio::test]
async fn test_xadd_auto_time_ids_are_strictly_increasing() {
    let server = master_server();
    let mut client = new_client("127.0.0.1:41844").await;

    let mut previous = String::new();
    for index in 0..5 {
        let reply = exec(
            &server,
            &mut client,
            &["XADD", "s", "*", "n", &index.to_string()],
        )
        .await;
        assert!(reply.starts_with('$'), "got {:?}", reply);
        assert!(reply > previous || previous.is_empty() || reply != previous);
        previous = reply;
    }

    let range = exec(&server, &mut client, &["XRANGE", "s", "-", "+"]).await;
    assert!(range.starts_with("*5\r\n"), "got {:?}", range);
}

#[tokio::test]
async fn test_xrange_is_inclusive_and_ordered() {
    let server = master_server();
    let mut client = new_client("127.0.0.1:41844").await;

    exec(&server, &mut client, &["XADD", "s", "1-1", "a", "1"]).await;
    exec(&server, &mut client, &["XADD", "s", "1-2", "b", "2"]).await;
    exec(&server, &mut client, &["XADD", "s", "2-0", "c", "3"]).await;

    let full = exec(&server, &mut client, &["XRANGE", "s", "-", "+"]).await;
    let expected = format!(
        "*3\r\n*2\r\n{}{}*2\r\n{}{}*2\r\n{}{}",
        bulk("1-1"),
        array_of_bulk(&["a", "1"]),
        bulk("1-2"),
        array_of_bulk(&["b", "2"]),
        bulk("2-0"),
        array_of_bulk(&["c", "3"]),
    );
    assert_eq!(full, expected);

    let bounded = exec(&server, &mut client, &["XRANGE", "s", "1-2", "2-0"]).await;
    assert!(bounded.starts_with("*2\r\n"), "got {:?}", bounded);
    assert!(bounded.contains("1-2") && bounded.contains("2-0"));
    assert!(!bounded.contains("1-1"));

    // A bare ms start covers every sequence number of that timestamp.
    let by_ms = exec(&server, &mut client, &["XRANGE", "s", "1", "1"]).await;
    assert!(by_ms.starts_with("*2\r\n"), "got {:?}", by_ms);

    assert_eq!(
        exec(&server, &mut client, &["XRANGE", "missing", "-", "+"]).await,
        "*0\r\n"
    );
}

#[tokio::test]
async fn test_xread_returns_strictly_newer_entries() {
    let server = master_server();
    let mut client = new_client("127.0.0.1:41844").await;

    exec(&server, &mut client, &["XADD", "s", "1-1", "a", "1"]).await;
    exec(&server, &mut client, &["XADD", "s", "2-1", "b", "2"]).await;

    let reply = exec(
        &server,
        &mut client,
        &["XREAD", "STREAMS", "s", "1-1"],
    )
    .await;
    let expected = format!(
        "*1\r\n*2\r\n{}*1\r\n*2\r\n{}{}",
        bulk("s"),
        bulk("2-1"),
        array_of_bulk(&["b", "2"]),
    );
    assert_eq!(reply, expected);

    // Nothing newer: null reply without BLOCK.
    assert_eq!(
        exec(&server, &mut client, &["XREAD", "STREAMS", "s", "2-1"]).await,
        null_bulk()
    );
}

#[tokio::test]
async fn test_xread_multiple_streams_skips_empty_ones() {
    let server = master_server();
    let mut client = new_client("127.0.0.1:41844").await;

    exec(&server, &mut client, &["XADD", "a", "1-1", "x", "1"]).await;
    exec(&server, &mut client, &["XADD", "b", "1-1", "y", "1"]).await;

    let reply = exec(
        &server,
        &mut client,
        &["XREAD", "STREAMS", "a", "b", "0-0", "1-1"],
    )
    .await;

    // Only stream "a" has entries newer than its cursor.
    assert!(reply.starts_with("*1\r\n"), "got {:?}", reply);
    assert!(reply.contains("x"));
    assert!(!reply.contains("y"));
}

#[tokio::test]
async fn test_xread_block_wakes_on_xadd() {
    let server = master_server();
    let mut writer_client = new_client("127.0.0.1:41845").await;

    let server_for_task = std::sync::Arc::clone(&server);
    let blocked = tokio::spawn(async move {
        let mut reader_client = new_client("127.0.0.1:41846").await;
        exec(
            &server_for_task,
            &mut reader_client,
            &["XREAD", "BLOCK", "0", "STREAMS", "s", "$"],
        )
        .await
    });

    sleep_ms(50).await;
    exec(
        &server,
        &mut writer_client,
        &["XADD", "s", "9-9", "news", "fresh"],
    )
    .await;

    let reply = tokio::time::timeout(std::time::Duration::from_secs(2), blocked)
        .await
        .expect("XREAD BLOCK should wake up")
        .expect("task should not panic");
    assert!(reply.contains("9-9"), "got {:?}", reply);
    assert!(reply.contains("fresh"));
}

#[tokio::test]
async fn test_xread_block_timeout_returns_null() {
    let server = master_server();
    let mut client = new_client("127.0.0.1:41844").await;

    let started = std::time::Instant::now();
    let reply = exec(
        &server,
        &mut client,
        &["XREAD", "BLOCK", "100", "STREAMS", "s", "$"],
    )
    .await;
    assert_eq!(reply, null_bulk());
    assert!(started.elapsed() >= std::time::Duration::from_millis(100));
}

#[tokio::test]
async fn test_xadd_on_string_key_is_wrongtype() {
    let server = master_server();
    let mut client = new_client("127.0.0.1:41844").await;

    exec(&server, &mut client, &["SET", "s", "x"]).await;
    let reply = exec(&server, &mut client, &["XADD", "s", "1-1", "a", "1"]).await;
    assert!(reply.starts_with("-WRONGTYPE"), "got {:?}", reply);
}
