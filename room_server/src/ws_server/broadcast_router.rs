//! 出站事件的扇出。
//!
//! `BroadcastRouter` 只依赖传输层的组成员关系（`ConnectionManager`），不读取连接注册表。
//! 每个连接的出站队列不设上限，因此在线连接不会漏收任何一条消息。
//! 只有写任务已退出（连接正在关闭）时投递才会失败：此时记录 debug 日志并跳过该连接，
//! 不影响其余接收方，也不会让事件处理失败。

use std::sync::Arc;

use log::{debug, error};
use rust_websocket_utils::message::WsMessage;
use uuid::Uuid;

use crate::ws_server::client_session::ClientSession;
use crate::ws_server::connection_manager::ConnectionManager;
use crate::ws_server::events::OutboundEvent;

#[derive(Debug, Clone)]
pub struct BroadcastRouter {
    connections: Arc<ConnectionManager>,
}

impl BroadcastRouter {
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self { connections }
    }

    /// 投递给恰好一个连接。返回是否成功放入其出站队列。
    pub fn send_to(&self, connection_id: &Uuid, event: &OutboundEvent) -> bool {
        let Some(session) = self.connections.get_client(connection_id) else {
            debug!("[广播路由] 连接 {} 已不在线，丢弃 {} 事件", connection_id, event.message_type());
            return false;
        };
        match Self::encode(event) {
            Some(message) => Self::deliver(&session, message),
            None => false,
        }
    }

    /// 投递给加入了 `room` 组的所有连接，可选排除一个连接（通常是发送者）。
    ///
    /// 返回成功投递的连接数。
    pub fn broadcast_room(&self, room: &str, event: &OutboundEvent, exclude: Option<&Uuid>) -> usize {
        let members = self.connections.group_members(room);
        let recipients: Vec<_> = members
            .iter()
            .filter(|session| exclude != Some(&session.client_id))
            .collect();
        if recipients.is_empty() {
            debug!("[广播路由] 房间 '{}' 没有可投递的连接 ({})", room, event.message_type());
            return 0;
        }
        let Some(message) = Self::encode(event) else {
            return 0;
        };

        debug!(
            "[广播路由] 向房间 '{}' 的 {} 个连接广播 {}",
            room,
            recipients.len(),
            event.message_type()
        );
        recipients
            .into_iter()
            .filter(|session| Self::deliver(session, message.clone()))
            .count()
    }

    /// 投递给所有在线连接。返回成功投递的连接数。
    pub fn broadcast_all(&self, event: &OutboundEvent) -> usize {
        let sessions = self.connections.all_clients();
        if sessions.is_empty() {
            return 0;
        }
        let Some(message) = Self::encode(event) else {
            return 0;
        };

        debug!("[广播路由] 向全部 {} 个连接广播 {}", sessions.len(), event.message_type());
        sessions
            .iter()
            .filter(|session| Self::deliver(session, message.clone()))
            .count()
    }

    /// 让连接订阅房间组的广播。
    pub fn join(&self, connection_id: &Uuid, room: &str) -> bool {
        self.connections.join_group(connection_id, room)
    }

    pub fn leave(&self, connection_id: &Uuid, room: &str) {
        self.connections.leave_group(connection_id, room);
    }

    /// 连接结束：注销会话并退出所有组。
    pub fn release(&self, connection_id: &Uuid) -> Option<Arc<ClientSession>> {
        self.connections.remove_client(connection_id)
    }

    pub fn is_live(&self, connection_id: &Uuid) -> bool {
        self.connections.get_client(connection_id).is_some()
    }

    fn encode(event: &OutboundEvent) -> Option<WsMessage> {
        match event.to_ws_message() {
            Ok(message) => Some(message),
            Err(e) => {
                error!("[广播路由] 编码 {} 事件失败: {}", event.message_type(), e);
                None
            }
        }
    }

    fn deliver(session: &ClientSession, message: WsMessage) -> bool {
        match session.send(message) {
            Ok(()) => true,
            Err(e) => {
                // 快速断开时出站队列可能已关闭，属于预期情况
                debug!("[广播路由] 投递到连接 {} 失败 (写任务已退出): {}", session.client_id, e);
                false
            }
        }
    }
}
