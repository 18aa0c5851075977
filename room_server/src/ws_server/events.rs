// room_server/src/ws_server/events.rs

//! 入站 / 出站事件的强类型表示。
//!
//! 线路上的 `WsMessage` 在传输边界就被解析成 [`InboundEvent`]，
//! 解析失败的帧不会进入协调器。`Connect` 与 `Disconnect` 不来自线路，
//! 由传输层在连接建立和结束时合成。

use std::fmt;

use common_models::ws_payloads::{
    self, ChatMessagePayload, DeleteRoomPayload, EnterRoomPayload, RenameRoomPayload, RoomListPayload,
    SendMessagePayload, UserListPayload,
};
use rust_websocket_utils::error::WsError;
use rust_websocket_utils::message::WsMessage;

/// 入站事件种类，作为分发表的键。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connect,
    EnterRoom,
    RenameRoom,
    DeleteRoom,
    Message,
    Disconnect,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Connect => "connect",
            EventKind::EnterRoom => ws_payloads::ENTER_ROOM_MESSAGE_TYPE,
            EventKind::RenameRoom => ws_payloads::RENAME_ROOM_MESSAGE_TYPE,
            EventKind::DeleteRoom => ws_payloads::DELETE_ROOM_MESSAGE_TYPE,
            EventKind::Message => ws_payloads::CHAT_MESSAGE_TYPE,
            EventKind::Disconnect => "disconnect",
        };
        f.write_str(name)
    }
}

/// 一个已通过校验的入站事件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Connect,
    EnterRoom(EnterRoomPayload),
    RenameRoom(RenameRoomPayload),
    DeleteRoom(DeleteRoomPayload),
    Message(SendMessagePayload),
    Disconnect,
}

impl InboundEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            InboundEvent::Connect => EventKind::Connect,
            InboundEvent::EnterRoom(_) => EventKind::EnterRoom,
            InboundEvent::RenameRoom(_) => EventKind::RenameRoom,
            InboundEvent::DeleteRoom(_) => EventKind::DeleteRoom,
            InboundEvent::Message(_) => EventKind::Message,
            InboundEvent::Disconnect => EventKind::Disconnect,
        }
    }
}

impl TryFrom<&WsMessage> for InboundEvent {
    type Error = WsError;

    /// 按 `message_type` 解析负载。
    ///
    /// `connect` / `disconnect` 只能由传输层合成，客户端发来的同名帧视为未知类型。
    fn try_from(message: &WsMessage) -> Result<Self, Self::Error> {
        match message.message_type.as_str() {
            ws_payloads::ENTER_ROOM_MESSAGE_TYPE => Ok(InboundEvent::EnterRoom(message.deserialize_payload()?)),
            ws_payloads::RENAME_ROOM_MESSAGE_TYPE => Ok(InboundEvent::RenameRoom(message.deserialize_payload()?)),
            ws_payloads::DELETE_ROOM_MESSAGE_TYPE => Ok(InboundEvent::DeleteRoom(message.deserialize_payload()?)),
            ws_payloads::CHAT_MESSAGE_TYPE => Ok(InboundEvent::Message(message.deserialize_payload()?)),
            other => Err(WsError::UnknownMessageType(other.to_string())),
        }
    }
}

/// 一个待下发的出站事件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    RoomList(RoomListPayload),
    UserList(UserListPayload),
    Message(ChatMessagePayload),
}

impl OutboundEvent {
    pub fn message_type(&self) -> &'static str {
        match self {
            OutboundEvent::RoomList(_) => ws_payloads::ROOM_LIST_MESSAGE_TYPE,
            OutboundEvent::UserList(_) => ws_payloads::USER_LIST_MESSAGE_TYPE,
            OutboundEvent::Message(_) => ws_payloads::CHAT_MESSAGE_TYPE,
        }
    }

    /// 编码为线路信封。
    pub fn to_ws_message(&self) -> Result<WsMessage, WsError> {
        match self {
            OutboundEvent::RoomList(payload) => WsMessage::new(self.message_type(), payload),
            OutboundEvent::UserList(payload) => WsMessage::new(self.message_type(), payload),
            OutboundEvent::Message(payload) => WsMessage::new(self.message_type(), payload),
        }
    }
}

/// 协调器队列中的一项：哪个连接、发生了什么。
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    pub connection_id: uuid::Uuid,
    pub event: InboundEvent,
}
