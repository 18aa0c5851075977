use thiserror::Error;

/// 服务端的主要错误类型
///
/// 协调器内部的事件处理不会产生错误（无效操作一律静默忽略），
/// 这里只覆盖启动与运行服务本身可能出现的失败。
#[derive(Error, Debug)]
pub enum AppError {
    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("绑定监听地址 {addr} 失败: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("WebSocket 服务错误: {0}")]
    WebSocketService(String),

    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
}
