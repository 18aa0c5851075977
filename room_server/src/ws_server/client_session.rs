use chrono::{DateTime, Utc};
use rust_websocket_utils::message::WsMessage;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendError;
use uuid::Uuid;

/// 代表一个已连接到服务器的 WebSocket 客户端的会话句柄。
///
/// 每个成功升级的 WebSocket 连接都对应一个 `ClientSession`。它只持有传输层资源
/// （出站队列发送端、对端地址），聊天相关的状态（显示名称、所在房间）由协调器的
/// `ConnectionRegistry` 单独维护。
#[derive(Debug)]
pub struct ClientSession {
    /// 服务端为此连接生成的唯一标识 (UUID v4)，也是聊天协议中用户的 `id`。
    pub client_id: Uuid,

    /// 出站消息队列的发送端。连接的写任务从对应的接收端取出消息并写入 socket。
    ///
    /// 队列不设上限：协调器从不等待某个慢连接，而已投递的消息也不会被丢弃。
    pub sender: mpsc::UnboundedSender<WsMessage>,

    /// 客户端的源网络地址
    pub addr: SocketAddr,

    /// 会话创建时间 (UTC)
    pub creation_time: DateTime<Utc>,
}

impl ClientSession {
    pub fn new(client_id: Uuid, sender: mpsc::UnboundedSender<WsMessage>, addr: SocketAddr) -> Self {
        Self {
            client_id,
            sender,
            addr,
            creation_time: Utc::now(),
        }
    }

    /// 把一条消息放入出站队列，不会阻塞。
    ///
    /// 只有写任务已退出（连接正在关闭）时才返回错误。
    pub fn send(&self, message: WsMessage) -> Result<(), SendError<WsMessage>> {
        self.sender.send(message)
    }

    /// 会话持续时长（秒）。
    pub fn age_secs(&self) -> i64 {
        (Utc::now() - self.creation_time).num_seconds()
    }
}
