// room_server/src/ws_server/connection_manager.rs

//! WebSocket 连接管理。
//!
//! `ConnectionManager` 是传输层的一部分：它保存所有活动连接的会话句柄，
//! 以及“房间组”成员关系（哪些连接订阅了哪个组的广播）。
//! 组成员关系与协调器中 `ConnectionRegistry` 的 `room` 字段在逻辑上是同一份状态，
//! 只能由协调器在同一次事件处理中同步修改两边。

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;

use dashmap::DashMap;
use log::{debug, info, warn};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::ws_server::client_session::ClientSession;
use rust_websocket_utils::message::WsMessage;

/// 管理所有活动的 WebSocket 客户端会话及其组成员关系
#[derive(Debug, Default)]
pub struct ConnectionManager {
    /// Key: client_id，Value: 会话句柄
    clients: DashMap<Uuid, Arc<ClientSession>>,
    /// Key: 组名（即房间名），Value: 已加入该组的连接 ID 集合
    groups: DashMap<String, HashSet<Uuid>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为新接受的连接创建会话并登记。
    ///
    /// # Arguments
    /// * `addr` - 新连接客户端的 SocketAddr。
    /// * `sender` - 用于向该客户端发送消息的无界 mpsc 发送端。
    pub fn add_client(&self, addr: SocketAddr, sender: mpsc::UnboundedSender<WsMessage>) -> Arc<ClientSession> {
        let client_id = Uuid::new_v4();
        let client_session = Arc::new(ClientSession::new(client_id, sender, addr));
        self.clients.insert(client_id, Arc::clone(&client_session));

        info!("[连接管理器] 新客户端连接成功: id={}, addr={}", client_id, addr);
        debug!("[连接管理器] 当前活动客户端总数: {}", self.clients.len());
        client_session
    }

    pub fn get_client(&self, client_id: &Uuid) -> Option<Arc<ClientSession>> {
        self.clients.get(client_id).map(|entry| Arc::clone(entry.value()))
    }

    /// 移除一个客户端会话，并把它从所有组中剔除。
    ///
    /// # Returns
    /// 如果找到并移除了会话，返回被移除的 `Arc<ClientSession>`。
    pub fn remove_client(&self, client_id: &Uuid) -> Option<Arc<ClientSession>> {
        match self.clients.remove(client_id) {
            Some((_id, session)) => {
                self.groups.iter_mut().for_each(|mut group| {
                    group.value_mut().remove(client_id);
                });
                self.groups.retain(|_, members| !members.is_empty());

                info!(
                    "[连接管理器] 客户端断开连接: id={}, addr={}, 在线 {} 秒",
                    session.client_id,
                    session.addr,
                    session.age_secs()
                );
                debug!("[连接管理器] 移除后当前活动客户端总数: {}", self.clients.len());
                Some(session)
            }
            None => {
                warn!("[连接管理器] 尝试移除不存在的客户端: id={}", client_id);
                None
            }
        }
    }

    /// 让连接加入指定组。连接不存在时返回 `false`。
    pub fn join_group(&self, client_id: &Uuid, group: &str) -> bool {
        if !self.clients.contains_key(client_id) {
            debug!("[连接管理器] 客户端 {} 已不在线，忽略加入组 '{}' 的请求", client_id, group);
            return false;
        }
        self.groups.entry(group.to_string()).or_default().insert(*client_id);
        debug!("[连接管理器] 客户端 {} 加入组 '{}'", client_id, group);
        true
    }

    /// 让连接离开指定组；组变空时一并删除该组条目。
    pub fn leave_group(&self, client_id: &Uuid, group: &str) {
        let now_empty = match self.groups.get_mut(group) {
            Some(mut members) => {
                members.remove(client_id);
                members.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.groups.remove_if(group, |_, members| members.is_empty());
        }
        debug!("[连接管理器] 客户端 {} 离开组 '{}'", client_id, group);
    }

    pub fn is_in_group(&self, client_id: &Uuid, group: &str) -> bool {
        self.groups.get(group).is_some_and(|members| members.contains(client_id))
    }

    /// 返回当前加入了指定组、且仍在线的所有会话。
    pub fn group_members(&self, group: &str) -> Vec<Arc<ClientSession>> {
        let Some(member_ids) = self.groups.get(group).map(|members| members.value().clone()) else {
            return Vec::new();
        };
        member_ids.iter().filter_map(|id| self.get_client(id)).collect()
    }

    /// 所有活动会话的快照。
    pub fn all_clients(&self) -> Vec<Arc<ClientSession>> {
        self.clients.iter().map(|entry| Arc::clone(entry.value())).collect()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }
}
