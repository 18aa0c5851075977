// room_server/src/ws_server/coordinator.rs

//! 聊天协调器。
//!
//! 进程内只有一个 `Coordinator`，它独占连接注册表与房间目录，运行在单独的异步任务中。
//! 所有连接的入站事件（包括传输层合成的 connect / disconnect）经由同一个有界队列送达，
//! 协调器逐个处理、每个事件处理完毕后才取下一个。事件处理函数本身是同步的，
//! 因此一次处理中对注册表、目录和组成员关系的修改对其他事件而言是原子的。

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::ws_server::broadcast_router::BroadcastRouter;
use crate::ws_server::connection_registry::ConnectionRegistry;
use crate::ws_server::events::{EventEnvelope, InboundEvent};
use crate::ws_server::room_directory::RoomDirectory;

/// 单个连接在协调器视角下的状态。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// 已连接，尚未进入任何房间
    Connected,
    /// 位于某个房间
    InRoom(String),
    /// 已断开（终态），或从未连接过
    Disconnected,
}

pub struct Coordinator {
    pub(crate) registry: ConnectionRegistry,
    pub(crate) directory: RoomDirectory,
    pub(crate) router: BroadcastRouter,
}

impl Coordinator {
    pub fn new(router: BroadcastRouter) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            directory: RoomDirectory::new(),
            router,
        }
    }

    /// 创建入站队列并在后台任务中运行协调器。
    pub fn spawn(router: BroadcastRouter, queue_capacity: usize) -> (CoordinatorHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let coordinator = Coordinator::new(router);
        let join_handle = tokio::spawn(coordinator.run(rx));
        (CoordinatorHandle { tx }, join_handle)
    }

    /// 事件循环：直到所有发送端都被丢弃为止。
    pub async fn run(mut self, mut events: mpsc::Receiver<EventEnvelope>) {
        info!("[协调器] 事件循环已启动。");
        while let Some(envelope) = events.recv().await {
            self.dispatch(envelope.connection_id, envelope.event);
        }
        info!(
            "[协调器] 入站队列已关闭，事件循环结束。剩余用户: {}，已知房间: {}",
            self.registry.len(),
            self.directory.list().len()
        );
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn directory(&self) -> &RoomDirectory {
        &self.directory
    }

    pub fn connection_state(&self, connection_id: &Uuid) -> ConnectionState {
        if let Some(user) = self.registry.get(connection_id) {
            ConnectionState::InRoom(user.room.clone())
        } else if self.router.is_live(connection_id) {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }
}

/// 向协调器提交事件的句柄，可在各连接任务间克隆。
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<EventEnvelope>,
}

impl CoordinatorHandle {
    /// 把事件放入协调器队列；队列满时等待。协调器已停止时返回 `false`。
    pub async fn submit(&self, connection_id: Uuid, event: InboundEvent) -> bool {
        let kind = event.kind();
        match self.tx.send(EventEnvelope { connection_id, event }).await {
            Ok(()) => {
                debug!("[协调器] 已接收来自连接 {} 的 {} 事件", connection_id, kind);
                true
            }
            Err(_) => {
                warn!("[协调器] 协调器已停止，丢弃来自连接 {} 的 {} 事件", connection_id, kind);
                false
            }
        }
    }
}
