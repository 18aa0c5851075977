// rust_websocket_utils/src/client/transport.rs

//! 客户端 WebSocket 传输层核心逻辑。
//!
//! 负责建立与服务器的连接、发送和接收结构化的 `WsMessage`。
//! 底层的 Ping/Pong 控制帧由 `tokio-tungstenite` 自动处理，不会暴露给调用方。

use crate::error::WsError;
use crate::message::WsMessage;
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use log::{debug, error, info};
use tokio_tungstenite::{
    WebSocketStream, connect_async,
    tungstenite::Error as TungsteniteError,
    tungstenite::protocol::Message,
};
use url::Url;

/// 一个可能经过 TLS 加密的 TCP WebSocket 流。
pub type ClientWsStream = WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// `ClientConnection` 代表一个活动的客户端 WebSocket 连接。
///
/// 发送端与接收端被拆开存放，方便调用方在一个任务里发送、在另一个任务里轮询接收。
pub struct ClientConnection {
    pub ws_sender: SplitSink<ClientWsStream, Message>,
    pub ws_receiver: SplitStream<ClientWsStream>,
}

impl ClientConnection {
    /// 把 `WsMessage` 编码为 JSON 文本帧并发送给服务器。
    pub async fn send_message(&mut self, message: &WsMessage) -> Result<(), WsError> {
        let msg_json = message.to_json()?;
        debug!("客户端：准备发送消息: {}", msg_json);
        self.ws_sender.send(Message::Text(msg_json)).await?;
        debug!("客户端：消息已发送 (类型: {})", message.message_type);
        Ok(())
    }

    /// 构造并发送一个事件，省去调用方手工创建 `WsMessage` 的步骤。
    pub async fn emit<T: serde::Serialize>(&mut self, message_type: &str, payload: &T) -> Result<(), WsError> {
        let message = WsMessage::new(message_type, payload)?;
        self.send_message(&message).await
    }

    /// 发送 Close 帧并关闭发送端。
    pub async fn close(&mut self) -> Result<(), WsError> {
        self.ws_sender.close().await?;
        info!("客户端：连接已主动关闭。");
        Ok(())
    }
}

/// 异步连接到指定的 WebSocket 服务器。
///
/// # Arguments
/// * `url_str` - 服务器的完整 URL，例如 `ws://127.0.0.1:3500/ws`。
///
/// # Returns
/// URL 非法时返回 `WsError::InvalidUrl`；连接或握手失败时返回 `WsError::WebSocketProtocolError`。
pub async fn connect_client(url_str: &str) -> Result<ClientConnection, WsError> {
    info!("客户端：开始尝试连接到 WebSocket 服务器，URL: {}", url_str);
    let parsed_url =
        Url::parse(url_str).map_err(|e| WsError::InvalidUrl(format!("无效的 WebSocket URL '{}': {}", url_str, e)))?;

    match connect_async(parsed_url.as_str()).await {
        Ok((ws_stream, response)) => {
            info!("客户端：已成功连接到 {} (HTTP 状态码: {})", url_str, response.status());
            let (ws_sender, ws_receiver) = ws_stream.split();
            Ok(ClientConnection { ws_sender, ws_receiver })
        }
        Err(e) => {
            error!("客户端：连接到 {} 失败，错误: {}", url_str, e);
            Err(WsError::WebSocketProtocolError(e))
        }
    }
}

/// 从接收流中读取下一条 `WsMessage`。
///
/// 跳过 Ping/Pong 等控制帧。
///
/// # Returns
/// - `Some(Ok(msg))`：成功收到并解析了一条消息。
/// - `Some(Err(e))`：收到了无法解析的帧（例如二进制帧、非法 JSON）或底层出错。
/// - `None`：连接已关闭。
pub async fn receive_message(ws_receiver: &mut SplitStream<ClientWsStream>) -> Option<Result<WsMessage, WsError>> {
    loop {
        match ws_receiver.next().await {
            Some(Ok(Message::Text(text))) => {
                debug!("客户端：收到原始文本消息: '{}'", text);
                break Some(WsMessage::from_json(&text));
            }
            Some(Ok(Message::Binary(bin))) => {
                debug!("客户端：收到二进制消息，长度: {} 字节", bin.len());
                break Some(Err(WsError::Message("客户端收到了非预期的 WebSocket 二进制消息".to_string())));
            }
            Some(Ok(Message::Close(close_frame))) => {
                debug!("客户端：收到 Close 控制帧: {:?}", close_frame);
                break None;
            }
            Some(Ok(_)) => continue, // Ping / Pong / Frame
            Some(Err(TungsteniteError::ConnectionClosed | TungsteniteError::AlreadyClosed)) => {
                debug!("客户端：连接已关闭。");
                break None;
            }
            Some(Err(e)) => {
                error!("客户端：从 WebSocket 流接收消息时发生底层错误: {}", e);
                break Some(Err(WsError::WebSocketProtocolError(e)));
            }
            None => {
                debug!("客户端：WebSocket 接收流已结束。");
                break None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_client_rejects_invalid_url() {
        match connect_client("not a url").await {
            Err(WsError::InvalidUrl(details)) => assert!(details.contains("not a url")),
            Err(other) => panic!("预期 InvalidUrl，实际为: {:?}", other),
            Ok(_) => panic!("非法 URL 不应连接成功"),
        }
    }
}
