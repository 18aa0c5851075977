//! 房间目录：当前已知的房间名称集合。

use crate::ws_server::connection_registry::ConnectionRegistry;

/// 已知房间名称，按首次创建的先后排列。
///
/// 房间是否存在与是否有人在其中无关；只有显式的 `remove` 才会删除房间。
#[derive(Debug, Default)]
pub struct RoomDirectory {
    rooms: Vec<String>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 幂等插入。返回房间是否为新建。
    pub fn add(&mut self, room: &str) -> bool {
        if self.contains(room) {
            return false;
        }
        self.rooms.push(room.to_string());
        true
    }

    /// 仅当 `registry` 中没有任何用户位于 `room` 时才删除它。返回是否真的删除了。
    pub fn remove(&mut self, room: &str, registry: &ConnectionRegistry) -> bool {
        if registry.is_room_occupied(room) {
            return false;
        }
        let before = self.rooms.len();
        self.rooms.retain(|known| known != room);
        self.rooms.len() != before
    }

    pub fn contains(&self, room: &str) -> bool {
        self.rooms.iter().any(|known| known == room)
    }

    /// 当前房间列表的快照。
    pub fn list(&self) -> Vec<String> {
        self.rooms.clone()
    }
}
