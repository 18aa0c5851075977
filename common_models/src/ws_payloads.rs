// common_models/src/ws_payloads.rs

//! 包含聊天室 WebSocket 通信中使用的各种 Payload 结构体定义。
//!
//! 每个事件在线路上都是一条 `WsMessage`，其 `message_type` 为下面定义的事件名称常量之一，
//! `payload` 为对应结构体序列化后的 JSON 字符串。

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 客户端进入（或切换到）某个房间。
pub const ENTER_ROOM_MESSAGE_TYPE: &str = "enterRoom";
/// 客户端请求重命名房间。
pub const RENAME_ROOM_MESSAGE_TYPE: &str = "renameRoom";
/// 客户端请求删除房间（仅当房间为空时生效）。
pub const DELETE_ROOM_MESSAGE_TYPE: &str = "deleteRoom";
/// 聊天消息。入站和出站共用同一个事件名称。
pub const CHAT_MESSAGE_TYPE: &str = "message";
/// 服务端下发的房间列表快照。
pub const ROOM_LIST_MESSAGE_TYPE: &str = "roomList";
/// 服务端下发的某个房间内的用户列表快照。
pub const USER_LIST_MESSAGE_TYPE: &str = "userList";

/// 系统通知（管理员消息）使用的发送者名称。
pub const ADMIN_NAME: &str = "Admin";

/// `enterRoom` 事件负载。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EnterRoomPayload {
    /// 用户的显示名称（不要求唯一）。
    pub name: String,
    /// 目标房间名称。
    pub room: String,
}

/// `renameRoom` 事件负载。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RenameRoomPayload {
    pub old_room: String,
    pub new_room: String,
}

/// `deleteRoom` 事件负载。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DeleteRoomPayload {
    pub room: String,
}

/// 客户端发出的 `message` 事件负载。
///
/// 注意：`name` 由客户端自行填写，服务端按原样转发，不与注册表中的名称做比对。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SendMessagePayload {
    pub name: String,
    pub text: String,
}

/// 服务端广播的 `message` 事件负载。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatMessagePayload {
    /// 发送者名称；系统通知为 [`ADMIN_NAME`]。
    pub name: String,
    pub text: String,
    /// 服务端生成消息时的 UTC 时间戳（毫秒）。
    pub time: i64,
}

impl ChatMessagePayload {
    /// 以当前时间构造一条聊天消息。
    pub fn now(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            time: Utc::now().timestamp_millis(),
        }
    }

    /// 以当前时间构造一条系统通知。
    pub fn admin(text: impl Into<String>) -> Self {
        Self::now(ADMIN_NAME, text)
    }
}

/// `roomList` 事件负载。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct RoomListPayload {
    pub rooms: Vec<String>,
}

/// `userList` 中的单个用户条目。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    /// 连接标识（服务端为每个 WebSocket 连接生成的 UUID）。
    pub id: Uuid,
    pub name: String,
    pub room: String,
}

/// `userList` 事件负载。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct UserListPayload {
    pub users: Vec<UserInfo>,
}
