//! Integration tests driving a real server over TCP.
//!
//! Each test binds its own server on port 0 and talks to it with plain
//! line-framed sockets, the same framing the CLI client uses.

use std::{net::SocketAddr, time::Duration};

use futures_util::{SinkExt, StreamExt, future::join_all};
use hiroba_server::{
    RunningServer, Server, ServerConfig, ServerError,
    domain::EventKind,
    ui::ConsoleAction,
    usecase::KICK_NOTICE,
};
use tokio::{io::AsyncWriteExt, net::TcpStream, time::timeout};
use tokio_util::codec::{Framed, LinesCodec};

const TIMEOUT: Duration = Duration::from_secs(5);

fn test_config() -> ServerConfig {
    ServerConfig {
        port: 0,
        echo_events: false,
        ..ServerConfig::default()
    }
}

async fn start_server(config: ServerConfig) -> RunningServer {
    match Server::new(config).start().await {
        Ok(server) => server,
        Err(e) => panic!("Failed to start server: {}", e),
    }
}

/// Helper struct wrapping one raw client connection
struct TestClient {
    lines: Framed<TcpStream, LinesCodec>,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr)
            .await
            .expect("Failed to connect to server");
        Self {
            lines: Framed::new(stream, LinesCodec::new()),
        }
    }

    /// Connect, send the username and read up to our own join notice.
    ///
    /// Returns the client and the history lines replayed before the notice.
    async fn join(addr: SocketAddr, username: &str) -> (Self, Vec<String>) {
        let mut client = Self::connect(addr).await;
        client.send(username).await;
        let joined = format!("SERVER: {} has joined the chat!", username);
        let mut replay = Vec::new();
        loop {
            let line = client
                .recv()
                .await
                .unwrap_or_else(|| panic!("'{}' was disconnected while joining", username));
            if line == joined {
                return (client, replay);
            }
            replay.push(line);
        }
    }

    async fn send(&mut self, line: &str) {
        self.lines
            .send(line.to_string())
            .await
            .expect("Failed to send line");
    }

    /// Next line, or `None` once the server closed the connection
    async fn recv(&mut self) -> Option<String> {
        match timeout(TIMEOUT, self.lines.next()).await {
            Ok(Some(Ok(line))) => Some(line),
            Ok(Some(Err(_))) | Ok(None) => None,
            Err(_) => panic!("Timed out waiting for a line"),
        }
    }

    async fn expect_line(&mut self, expected: &str) {
        assert_eq!(self.recv().await.as_deref(), Some(expected));
    }

    async fn expect_closed(&mut self) {
        assert_eq!(self.recv().await, None);
    }
}

async fn broadcast_marker(server: &RunningServer, text: &str) {
    let action = server.console().handle_line(text).await;
    assert_eq!(action, ConsoleAction::Continue(Vec::new()));
}

async fn wait_for_user_count(server: &RunningServer, expected: usize) -> Vec<String> {
    timeout(TIMEOUT, async {
        loop {
            let users = server.connected_usernames().await;
            if users.len() == expected {
                return users;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("Registry never reached the expected size")
}

#[tokio::test]
async fn test_message_and_whisper_end_to_end() {
    // テスト項目: alice のメッセージは全員に届き、bob のささやきは alice と bob にだけ届く
    // given (前提条件):
    let server = start_server(test_config()).await;
    let addr = server.local_addr();
    let (mut alice, _) = TestClient::join(addr, "alice").await;
    let (mut bob, _) = TestClient::join(addr, "bob").await;
    alice.expect_line("SERVER: bob has joined the chat!").await;
    let (mut carol, _) = TestClient::join(addr, "carol").await;
    alice.expect_line("SERVER: carol has joined the chat!").await;
    bob.expect_line("SERVER: carol has joined the chat!").await;

    // when (操作):
    alice.send("hello").await;

    // then (期待する結果):
    alice.expect_line("alice: hello").await;
    bob.expect_line("alice: hello").await;
    carol.expect_line("alice: hello").await;
    server.flush().await;
    let rendered: Vec<String> = server.history().await.iter().map(|e| e.render()).collect();
    assert!(rendered.contains(&"alice: hello".to_string()));

    // when (操作):
    bob.send("/whisper alice secret").await;

    // then (期待する結果):
    alice.expect_line("[whisper from bob]: secret").await;
    bob.expect_line("[whisper to alice]: secret").await;
    broadcast_marker(&server, "marker").await;
    alice.expect_line("SERVER: marker").await;
    bob.expect_line("SERVER: marker").await;
    carol.expect_line("SERVER: marker").await;

    server.flush().await;
    let whispers: Vec<String> = server
        .history()
        .await
        .iter()
        .filter(|e| e.kind() == EventKind::Whisper)
        .map(|e| e.render())
        .collect();
    assert_eq!(whispers, vec!["bob -> alice (whisper): secret"]);

    server.shutdown().await;
}

#[tokio::test]
async fn test_history_is_replayed_to_new_user_without_whispers() {
    // テスト項目: 新しく参加したユーザーには公開履歴だけが古い順に再送される
    // given (前提条件):
    let server = start_server(test_config()).await;
    let addr = server.local_addr();
    let (mut alice, _) = TestClient::join(addr, "alice").await;
    alice.send("first post").await;
    alice.expect_line("alice: first post").await;
    alice.send("/whisper alice note to self").await;
    alice.expect_line("[whisper from alice]: note to self").await;
    alice.expect_line("[whisper to alice]: note to self").await;

    // when (操作):
    let (_bob, replay) = TestClient::join(addr, "bob").await;

    // then (期待する結果):
    assert_eq!(
        replay,
        vec!["SERVER: alice has joined the chat!", "alice: first post"]
    );

    server.shutdown().await;
}

#[tokio::test]
async fn test_history_replay_is_bounded() {
    // テスト項目: 履歴の容量を超えた分は古いものから捨てられ、最後の N 件だけが再送される
    // given (前提条件):
    let server = start_server(ServerConfig {
        history_capacity: 5,
        ..test_config()
    })
    .await;
    for i in 0..10 {
        broadcast_marker(&server, &format!("Test message {}", i)).await;
    }

    // when (操作):
    let (_alice, replay) = TestClient::join(server.local_addr(), "alice").await;

    // then (期待する結果):
    let expected: Vec<String> = (5..10)
        .map(|i| format!("SERVER: Test message {}", i))
        .collect();
    assert_eq!(replay, expected);

    server.shutdown().await;
}

#[tokio::test]
async fn test_duplicate_username_is_rejected() {
    // テスト項目: 使用中のユーザー名での接続は拒否され、レジストリは変わらない
    // given (前提条件):
    let server = start_server(test_config()).await;
    let addr = server.local_addr();
    let (_alice, _) = TestClient::join(addr, "alice").await;

    // when (操作):
    let mut impostor = TestClient::connect(addr).await;
    impostor.send("alice").await;

    // then (期待する結果):
    impostor
        .expect_line("ERROR: Username 'alice' is already taken")
        .await;
    impostor.expect_closed().await;
    assert_eq!(server.connected_usernames().await, vec!["alice"]);

    server.shutdown().await;
}

#[tokio::test]
async fn test_invalid_username_is_rejected() {
    // テスト項目: 空のユーザー名は拒否され、登録されずに切断される
    // given (前提条件):
    let server = start_server(test_config()).await;

    // when (操作):
    let mut client = TestClient::connect(server.local_addr()).await;
    client.send("   ").await;

    // then (期待する結果):
    client.expect_line("ERROR: Username must not be empty").await;
    client.expect_closed().await;
    assert!(server.connected_usernames().await.is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn test_kick_closes_target_and_announces_once() {
    // テスト項目: kick された bob は通知を受けて切断され、alice には kick 通知が一度だけ届く
    // given (前提条件):
    let server = start_server(test_config()).await;
    let addr = server.local_addr();
    let (mut alice, _) = TestClient::join(addr, "alice").await;
    let (mut bob, _) = TestClient::join(addr, "bob").await;
    alice.expect_line("SERVER: bob has joined the chat!").await;

    // when (操作):
    let action = server.console().handle_line("/kick bob").await;

    // then (期待する結果):
    assert_eq!(action, ConsoleAction::Continue(vec!["Kicked 'bob'.".to_string()]));
    bob.expect_line(KICK_NOTICE).await;
    bob.expect_closed().await;
    alice
        .expect_line("SERVER: bob has been kicked from the chat.")
        .await;
    broadcast_marker(&server, "after kick").await;
    alice.expect_line("SERVER: after kick").await;
    assert_eq!(server.connected_usernames().await, vec!["alice"]);

    server.shutdown().await;
}

#[tokio::test]
async fn test_kick_unknown_user_is_reported_locally() {
    // テスト項目: 存在しないユーザーの kick はオペレーターにだけ報告される
    // given (前提条件):
    let server = start_server(test_config()).await;
    let (mut alice, _) = TestClient::join(server.local_addr(), "alice").await;

    // when (操作):
    let action = server.console().handle_line("/kick mallory").await;

    // then (期待する結果):
    assert_eq!(
        action,
        ConsoleAction::Continue(vec!["User 'mallory' not found.".to_string()])
    );
    broadcast_marker(&server, "still here").await;
    alice.expect_line("SERVER: still here").await;
    assert_eq!(server.connected_usernames().await, vec!["alice"]);

    server.shutdown().await;
}

#[tokio::test]
async fn test_peer_disconnect_is_announced() {
    // テスト項目: クライアントが切断すると残りのユーザーに left 通知が届く
    // given (前提条件):
    let server = start_server(test_config()).await;
    let addr = server.local_addr();
    let (mut alice, _) = TestClient::join(addr, "alice").await;
    let (bob, _) = TestClient::join(addr, "bob").await;
    alice.expect_line("SERVER: bob has joined the chat!").await;

    // when (操作):
    drop(bob);

    // then (期待する結果):
    alice.expect_line("SERVER: bob has left the chat.").await;
    assert_eq!(wait_for_user_count(&server, 1).await, vec!["alice"]);

    server.shutdown().await;
}

#[tokio::test]
async fn test_concurrent_joins_and_leaves_are_counted() {
    // テスト項目: 同時に参加・退出しても、レジストリの人数は参加数から退出数を引いた値になる
    // given (前提条件):
    let server = start_server(test_config()).await;
    let addr = server.local_addr();

    // when (操作):
    let names: Vec<String> = (0..8).map(|i| format!("user{}", i)).collect();
    let joins = names.iter().map(|name| TestClient::join(addr, name));
    let mut clients: Vec<TestClient> = join_all(joins)
        .await
        .into_iter()
        .map(|(client, _)| client)
        .collect();
    assert_eq!(wait_for_user_count(&server, 8).await.len(), 8);
    clients.truncate(5);

    // then (期待する結果):
    assert_eq!(wait_for_user_count(&server, 5).await.len(), 5);

    drop(clients);
    server.shutdown().await;
}

#[tokio::test]
async fn test_lines_are_framed_independently_of_tcp_segments() {
    // テスト項目: 一度の書き込みに複数行があっても、一行が分割されて届いても、行単位で処理される
    // given (前提条件):
    let server = start_server(test_config()).await;
    let (mut alice, _) = TestClient::join(server.local_addr(), "alice").await;

    // when (操作):
    let stream = alice.lines.get_mut();
    stream.write_all(b"frag").await.unwrap();
    stream.flush().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    stream.write_all(b"ment\r\none\ntwo\n").await.unwrap();
    stream.flush().await.unwrap();

    // then (期待する結果):
    alice.expect_line("alice: fragment").await;
    alice.expect_line("alice: one").await;
    alice.expect_line("alice: two").await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_oversized_line_closes_session() {
    // テスト項目: 最大長を超える行を送ったセッションは切断され、left 通知が出る
    // given (前提条件):
    let server = start_server(ServerConfig {
        max_line_length: 64,
        ..test_config()
    })
    .await;
    let addr = server.local_addr();
    let (mut alice, _) = TestClient::join(addr, "alice").await;
    let (mut bob, _) = TestClient::join(addr, "bob").await;
    alice.expect_line("SERVER: bob has joined the chat!").await;

    // when (操作):
    bob.send(&"x".repeat(200)).await;

    // then (期待する結果):
    alice.expect_line("SERVER: bob has left the chat.").await;
    assert_eq!(wait_for_user_count(&server, 1).await, vec!["alice"]);

    server.shutdown().await;
}

#[tokio::test]
async fn test_commands_only_reply_to_invoker() {
    // テスト項目: /users や未知のコマンドへの返答は呼び出し元だけに届く
    // given (前提条件):
    let server = start_server(test_config()).await;
    let addr = server.local_addr();
    let (mut alice, _) = TestClient::join(addr, "alice").await;
    let (mut bob, _) = TestClient::join(addr, "bob").await;
    alice.expect_line("SERVER: bob has joined the chat!").await;

    // when (操作):
    bob.send("/users").await;
    bob.send("/frobnicate").await;
    bob.send("/whisper nobody hi").await;

    // then (期待する結果):
    bob.expect_line("Connected users: alice, bob").await;
    let unknown = bob.recv().await.unwrap();
    assert!(unknown.starts_with("ERROR: Unknown command '/frobnicate'"));
    bob.expect_line("ERROR: User 'nobody' not found").await;
    broadcast_marker(&server, "marker").await;
    alice.expect_line("SERVER: marker").await;
    bob.expect_line("SERVER: marker").await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_notifies_clients_and_refuses_new_connections() {
    // テスト項目: シャットダウン時に全クライアントへ通知が届いてから切断され、以後の接続は拒否される
    // given (前提条件):
    let server = start_server(test_config()).await;
    let addr = server.local_addr();
    let (mut alice, _) = TestClient::join(addr, "alice").await;
    let (mut bob, _) = TestClient::join(addr, "bob").await;
    alice.expect_line("SERVER: bob has joined the chat!").await;

    // when (操作):
    server.shutdown().await;

    // then (期待する結果):
    alice.expect_line("SERVER: Server is shutting down.").await;
    alice.expect_closed().await;
    bob.expect_line("SERVER: Server is shutting down.").await;
    bob.expect_closed().await;
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_port_already_bound_is_a_bind_error() {
    // テスト項目: 使用中のポートでの起動は Bind エラーになる
    // given (前提条件):
    let server = start_server(test_config()).await;
    let port = server.local_addr().port();

    // when (操作):
    let result = Server::new(ServerConfig {
        port,
        ..test_config()
    })
    .start()
    .await;

    // then (期待する結果):
    let Err(err) = result else {
        panic!("Second server unexpectedly bound port {}", port);
    };
    assert!(matches!(err, ServerError::Bind { .. }));

    server.shutdown().await;
}
