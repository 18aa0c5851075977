//! `common_models` 公共模型库 crate。
//!
//! 本 crate 集中定义了聊天室服务端 (`room_server`)、WebSocket 工具库 (`rust_websocket_utils`)
//! 以及浏览器客户端之间共享的消息负载结构体和事件名称常量。
//!
//! 主要包含：
//! - **WebSocket 消息负载 (`ws_payloads`)**: 客户端发往服务端的 `enterRoom`、`renameRoom`、
//!   `deleteRoom`、`message` 事件负载，以及服务端下发的 `roomList`、`userList`、`message` 事件负载。
//!
//! 所有模型都派生 `Serialize`、`Deserialize`、`Debug`、`Clone`，
//! 字段名在 JSON 中采用 camelCase，与浏览器端脚本保持一致。

pub mod ws_payloads;
