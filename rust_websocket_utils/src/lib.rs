//! `rust_websocket_utils` 是一个提供 WebSocket 通信实用功能的 Rust Crate。
//!
//! 聊天室服务端与各类客户端（浏览器、测试工具）之间的每一帧文本都是一个 JSON 编码的
//! [`message::WsMessage`] 信封。本 crate 负责信封的构造、编解码，
//! 并提供一个基于 `tokio-tungstenite` 的客户端传输层。
//!
//! 主要模块包括：
//! - `message`: 定义核心消息信封 `WsMessage`。
//! - `error`: 定义库中使用的统一错误类型 `WsError`。
//! - `client`: 提供 WebSocket 客户端传输层（连接、发送、接收）。

pub mod client;
pub mod error;
pub mod message;
