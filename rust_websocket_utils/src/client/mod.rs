// rust_websocket_utils/src/client/mod.rs

//! WebSocket 客户端模块。
//!
//! `transport` 子模块封装了 `tokio-tungstenite` 的连接建立与收发细节，
//! 对上层只暴露 `WsMessage` 级别的 API。服务端的集成测试和命令行调试工具都通过它连接聊天室。

pub mod transport;
