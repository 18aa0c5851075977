// room_server/src/ws_server/mod.rs

//! WebSocket 服务模块：传输层适配、连接管理、聊天协调器及其事件处理。

pub mod broadcast_router;
pub mod client_session;
pub mod connection_manager;
pub mod connection_registry;
pub mod coordinator;
pub mod event_handlers;
pub mod events;
pub mod room_directory;
pub mod service;
