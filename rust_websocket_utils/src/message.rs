// rust_websocket_utils/src/message.rs

//! 定义 WebSocket 通信中使用的核心消息结构。
//!
//! `WsMessage` 是客户端与服务端之间所有 WebSocket 文本帧的统一格式：
//! `message_type` 指明事件名称（例如 `enterRoom`、`roomList`），
//! `payload` 是该事件负载序列化后的 JSON 字符串。

use crate::error::WsError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `WsMessage` 代表在客户端与 WebSocket 服务器之间交换的标准消息信封。
///
/// # 字段
/// - `message_id`: UUID v4 字符串，用于追踪单条消息。客户端发来的消息可以省略。
/// - `message_type`: 事件名称，接收方据此决定如何解释 `payload`。
/// - `payload`: 事件负载的 JSON 字符串，其结构由 `message_type` 决定。
/// - `timestamp`: 消息创建时的 UTC 时间戳（毫秒）。客户端发来的消息可以省略。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WsMessage {
    #[serde(default)]
    pub message_id: String,

    pub message_type: String,

    /// 无负载的事件可以省略此字段，此时视为 JSON `null`。
    #[serde(default = "null_payload")]
    pub payload: String,

    #[serde(default)]
    pub timestamp: i64,
}

fn null_payload() -> String {
    "null".to_string()
}

impl WsMessage {
    /// 创建一个新的 `WsMessage` 实例。
    ///
    /// 自动生成 `message_id` 与当前 UTC 时间戳，并把 `payload_data` 序列化为 JSON 字符串。
    ///
    /// # Returns
    /// 序列化失败时返回 `WsError::SerializationError`。
    pub fn new<T: Serialize>(message_type: impl Into<String>, payload_data: &T) -> Result<WsMessage, WsError> {
        let message_type = message_type.into();
        let payload = serde_json::to_string(payload_data).map_err(|e| {
            WsError::SerializationError(format!("创建 WsMessage ({}) 时序列化载荷失败: {}", message_type, e))
        })?;
        Ok(WsMessage {
            message_id: Uuid::new_v4().to_string(),
            message_type,
            payload,
            timestamp: Utc::now().timestamp_millis(),
        })
    }

    /// 将内部存储的 JSON 字符串载荷反序列化为指定的目标类型 `T`。
    pub fn deserialize_payload<T: for<'de> Deserialize<'de>>(&self) -> Result<T, WsError> {
        serde_json::from_str(&self.payload).map_err(|e| {
            WsError::DeserializationError(format!(
                "{} 消息的载荷反序列化失败: {}, 原始载荷: '{}'",
                self.message_type, e, self.payload
            ))
        })
    }

    /// 把整个信封编码为一帧 WebSocket 文本。
    pub fn to_json(&self) -> Result<String, WsError> {
        serde_json::to_string(self)
            .map_err(|e| WsError::SerializationError(format!("WsMessage 序列化为 JSON 失败: {}", e)))
    }

    /// 从一帧 WebSocket 文本解码出信封。
    pub fn from_json(text: &str) -> Result<WsMessage, WsError> {
        serde_json::from_str(text).map_err(|e| {
            WsError::DeserializationError(format!("文本消息反序列化为 WsMessage 失败: {}, 原始文本: '{}'", e, text))
        })
    }
}
