// rust_websocket_utils/tests/client_transport_integration_test.rs

use common_models::ws_payloads::{self, EnterRoomPayload};
use futures_util::{SinkExt, StreamExt};
use log::{info, LevelFilter};
use rust_websocket_utils::client::transport::{connect_client, receive_message};
use rust_websocket_utils::message::WsMessage;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, tungstenite::protocol::Message};

fn init_test_logger() {
    let _ = env_logger::builder().filter_level(LevelFilter::Info).is_test(true).try_init();
}

/// 启动一个只服务一个连接的回显服务器：先发一帧二进制数据，之后把收到的文本帧原样发回。
async fn spawn_echo_server() -> (String, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("无法绑定到随机端口");
    let addr = listener.local_addr().expect("无法获取本地监听地址");

    let handle = tokio::spawn(async move {
        let (tcp_stream, peer_addr) = listener.accept().await.expect("接受 TCP 连接失败");
        let mut ws_stream = accept_async(tcp_stream).await.expect("WebSocket 握手失败");
        info!("[测试回显服务端] 新连接来自 {}", peer_addr);

        ws_stream.send(Message::Binary(vec![1, 2, 3])).await.expect("发送二进制帧失败");
        while let Some(Ok(msg)) = ws_stream.next().await {
            match msg {
                Message::Text(text) => {
                    if ws_stream.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                // Close 帧之后继续读取，让 tungstenite 把关闭确认帧写回去
                _ => {}
            }
        }
        info!("[测试回显服务端] 连接处理结束");
    });

    (format!("ws://{}", addr), handle)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_client_emit_and_receive_echo() {
    init_test_logger();
    let (url, server_handle) = spawn_echo_server().await;

    let mut conn = connect_client(&url).await.expect("客户端连接失败");

    // 服务端先发的二进制帧应被报告为错误，而不是被静默吞掉
    let first = timeout(Duration::from_secs(5), receive_message(&mut conn.ws_receiver))
        .await
        .expect("等待第一帧超时");
    assert!(matches!(first, Some(Err(_))), "二进制帧应返回错误: {:?}", first);

    let payload = EnterRoomPayload { name: "Bob".to_string(), room: "lobby".to_string() };
    conn.emit(ws_payloads::ENTER_ROOM_MESSAGE_TYPE, &payload).await.expect("发送 enterRoom 失败");

    let echoed: WsMessage = timeout(Duration::from_secs(5), receive_message(&mut conn.ws_receiver))
        .await
        .expect("等待回显超时")
        .expect("连接意外关闭")
        .expect("回显帧解析失败");
    assert_eq!(echoed.message_type, ws_payloads::ENTER_ROOM_MESSAGE_TYPE);
    assert_eq!(echoed.deserialize_payload::<EnterRoomPayload>().expect("载荷解析失败"), payload);

    conn.close().await.expect("关闭连接失败");
    let after_close = timeout(Duration::from_secs(5), receive_message(&mut conn.ws_receiver))
        .await
        .expect("等待关闭确认超时");
    assert!(after_close.is_none(), "关闭后应返回 None: {:?}", after_close);

    let _ = timeout(Duration::from_secs(5), server_handle).await;
}
