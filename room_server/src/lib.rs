//! `room_server` 服务端核心库。
//!
//! 房间制实时聊天的单进程协调服务：客户端通过 WebSocket 连接，选择显示名称后进入房间，
//! 在房间内收发消息，并可以重命名或删除房间。
//!
//! 主要模块包括：
//! - `config`: 配置文件与环境变量的加载。
//! - `error`: 应用特定的错误类型。
//! - `ws_server`: WebSocket 传输层、连接管理与聊天协调器。

pub mod config;
pub mod error;
pub mod ws_server;
