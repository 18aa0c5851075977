// room_server/tests/chat_flow_test.rs

//! 端到端测试：在临时端口上启动完整的服务（axum + 协调器），
//! 通过 `rust_websocket_utils` 的客户端模拟浏览器。

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use common_models::ws_payloads::{
    ChatMessagePayload, DeleteRoomPayload, EnterRoomPayload, RenameRoomPayload, RoomListPayload, SendMessagePayload,
    UserListPayload, ADMIN_NAME,
};
use futures_util::SinkExt;
use room_server::config::ServerConfig;
use room_server::ws_server::broadcast_router::BroadcastRouter;
use room_server::ws_server::connection_manager::ConnectionManager;
use room_server::ws_server::coordinator::Coordinator;
use room_server::ws_server::service::WsService;
use rust_websocket_utils::client::transport::{connect_client, receive_message, ClientConnection};
use rust_websocket_utils::message::WsMessage;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::protocol::Message;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

struct TestServer {
    url: String,
    connection_manager: Arc<ConnectionManager>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn start_server() -> TestServer {
    let _ = env_logger::builder().is_test(true).try_init();

    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        static_dir: PathBuf::from("does-not-exist-for-tests"),
        ..ServerConfig::default()
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("绑定测试端口失败");
    let addr: SocketAddr = listener.local_addr().expect("获取测试端口失败");

    let connection_manager = Arc::new(ConnectionManager::new());
    let (coordinator, _task) = Coordinator::spawn(BroadcastRouter::new(Arc::clone(&connection_manager)), 64);
    let service = WsService::new(config, Arc::clone(&connection_manager), coordinator);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let shutdown = async {
            let _ = shutdown_rx.await;
        };
        if let Err(e) = service.serve(listener, shutdown).await {
            panic!("测试服务异常退出: {}", e);
        }
    });

    TestServer {
        url: format!("ws://{}/ws", addr),
        connection_manager,
        shutdown: Some(shutdown_tx),
    }
}

async fn connect(server: &TestServer) -> ClientConnection {
    let mut conn = connect_client(&server.url).await.expect("连接测试服务失败");
    // 每个新连接首先收到一份房间快照
    let first = next_message(&mut conn).await;
    assert_eq!(first.message_type, "roomList");
    conn
}

async fn next_message(conn: &mut ClientConnection) -> WsMessage {
    match tokio::time::timeout(RECV_TIMEOUT, receive_message(&mut conn.ws_receiver)).await {
        Ok(Some(Ok(message))) => message,
        Ok(Some(Err(e))) => panic!("接收消息出错: {}", e),
        Ok(None) => panic!("连接意外关闭"),
        Err(_) => panic!("等待消息超时"),
    }
}

/// 跳过其他类型，直到收到指定类型的消息。
async fn next_of_type(conn: &mut ClientConnection, message_type: &str) -> WsMessage {
    loop {
        let message = next_message(conn).await;
        if message.message_type == message_type {
            return message;
        }
    }
}

async fn next_chat(conn: &mut ClientConnection) -> ChatMessagePayload {
    next_of_type(conn, "message")
        .await
        .deserialize_payload()
        .expect("message 负载解析失败")
}

async fn next_rooms(conn: &mut ClientConnection) -> Vec<String> {
    next_of_type(conn, "roomList")
        .await
        .deserialize_payload::<RoomListPayload>()
        .expect("roomList 负载解析失败")
        .rooms
}

async fn enter(conn: &mut ClientConnection, name: &str, room: &str) {
    conn.emit("enterRoom", &EnterRoomPayload { name: name.to_string(), room: room.to_string() })
        .await
        .expect("发送 enterRoom 失败");
}

async fn wait_for_client_count(server: &TestServer, expected: usize) {
    let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
    while server.connection_manager.client_count() != expected {
        assert!(tokio::time::Instant::now() < deadline, "在线连接数未能变为 {}", expected);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_enter_room_and_chat() {
    let server = start_server().await;
    let mut bob = connect(&server).await;
    let mut eve = connect(&server).await;

    enter(&mut bob, "Bob", "lobby").await;
    let joined = next_chat(&mut bob).await;
    assert_eq!(joined.name, ADMIN_NAME);
    assert_eq!(joined.text, "You joined lobby");
    let users: UserListPayload = next_of_type(&mut bob, "userList")
        .await
        .deserialize_payload()
        .expect("userList 负载解析失败");
    assert_eq!(users.users.len(), 1);
    assert_eq!(users.users[0].name, "Bob");
    assert_eq!(users.users[0].room, "lobby");
    assert_eq!(next_rooms(&mut bob).await, vec!["lobby"]);
    // 房间外的连接也会收到新的房间列表
    assert_eq!(next_rooms(&mut eve).await, vec!["lobby"]);

    enter(&mut eve, "Eve", "lobby").await;
    assert_eq!(next_chat(&mut bob).await.text, "Eve joined the room");
    assert_eq!(next_chat(&mut eve).await.text, "You joined lobby");
    assert_eq!(next_rooms(&mut eve).await, vec!["lobby"]);

    bob.emit("message", &SendMessagePayload { name: "Bob".to_string(), text: "hi".to_string() })
        .await
        .expect("发送 message 失败");
    for conn in [&mut bob, &mut eve] {
        let chat = next_chat(conn).await;
        assert_eq!(chat.name, "Bob");
        assert_eq!(chat.text, "hi");
        assert!(chat.time > 0);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_malformed_frames_are_ignored() {
    let server = start_server().await;
    let mut bob = connect(&server).await;

    bob.ws_sender
        .send(Message::Text("this is not json".to_string()))
        .await
        .expect("发送原始帧失败");
    bob.emit("enterRoom", &serde_json::json!({ "name": "Bob" }))
        .await
        .expect("发送缺少字段的 enterRoom 失败");
    bob.emit("shout", &serde_json::json!({ "text": "???" }))
        .await
        .expect("发送未知事件失败");

    // 连接仍然可用，后续合法事件照常处理
    enter(&mut bob, "Bob", "lobby").await;
    assert_eq!(next_chat(&mut bob).await.text, "You joined lobby");
    assert_eq!(server.connection_manager.client_count(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rename_then_delete_room() {
    let server = start_server().await;
    let mut bob = connect(&server).await;
    let mut watcher = connect(&server).await;

    enter(&mut bob, "Bob", "lobby").await;
    assert_eq!(next_rooms(&mut bob).await, vec!["lobby"]);
    assert_eq!(next_rooms(&mut watcher).await, vec!["lobby"]);

    bob.emit("renameRoom", &RenameRoomPayload { old_room: "lobby".to_string(), new_room: "hall".to_string() })
        .await
        .expect("发送 renameRoom 失败");
    assert_eq!(next_chat(&mut watcher).await.text, "Room \"lobby\" was renamed to \"hall\"");
    assert_eq!(next_rooms(&mut watcher).await, vec!["hall"]);
    assert_eq!(next_rooms(&mut bob).await, vec!["hall"]);

    // 有人的房间不能删除；由 Bob 自己发出，保证先于他切换房间被处理
    bob.emit("deleteRoom", &DeleteRoomPayload { room: "hall".to_string() })
        .await
        .expect("发送 deleteRoom 失败");
    enter(&mut bob, "Bob", "attic").await;
    assert_eq!(next_rooms(&mut watcher).await, vec!["hall", "attic"]);

    watcher
        .emit("deleteRoom", &DeleteRoomPayload { room: "hall".to_string() })
        .await
        .expect("发送 deleteRoom 失败");
    assert_eq!(next_chat(&mut watcher).await.text, "Room \"hall\" has been deleted");
    assert_eq!(next_rooms(&mut watcher).await, vec!["attic"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_disconnect_notifies_room() {
    let server = start_server().await;
    let mut bob = connect(&server).await;
    let mut eve = connect(&server).await;

    enter(&mut bob, "Bob", "lobby").await;
    assert_eq!(next_chat(&mut bob).await.text, "You joined lobby");
    enter(&mut eve, "Eve", "lobby").await;
    assert_eq!(next_chat(&mut eve).await.text, "You joined lobby");
    // 先取走 Eve 进入房间时产生的快照，后面读到的 roomList 才是断开之后广播的
    next_of_type(&mut eve, "userList").await;
    assert_eq!(next_rooms(&mut eve).await, vec!["lobby"]);

    bob.close().await.expect("关闭连接失败");
    assert_eq!(next_chat(&mut eve).await.text, "Bob has left the room");
    // 断开不会清理空房间
    assert_eq!(next_rooms(&mut eve).await, vec!["lobby"]);
    wait_for_client_count(&server, 1).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_message_burst_reaches_every_member() {
    const BURST: usize = 200;
    let server = start_server().await;
    let mut bob = connect(&server).await;
    let mut eve = connect(&server).await;

    enter(&mut bob, "Bob", "lobby").await;
    assert_eq!(next_chat(&mut bob).await.text, "You joined lobby");
    enter(&mut eve, "Eve", "lobby").await;
    assert_eq!(next_chat(&mut eve).await.text, "You joined lobby");
    assert_eq!(next_chat(&mut bob).await.text, "Eve joined the room");

    for i in 0..BURST {
        bob.emit("message", &SendMessagePayload { name: "Bob".to_string(), text: format!("#{}", i) })
            .await
            .expect("发送 message 失败");
    }

    for conn in [&mut eve, &mut bob] {
        for i in 0..BURST {
            let chat = next_chat(conn).await;
            assert_eq!(chat.name, "Bob");
            assert_eq!(chat.text, format!("#{}", i), "消息应按发送顺序完整到达");
        }
    }
}
