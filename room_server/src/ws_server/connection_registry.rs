//! 连接注册表：记录每个在线连接当前的显示名称和所在房间。
//!
//! 只有进入过房间的连接才有条目。注册表不持有任何传输层资源。

use common_models::ws_payloads::UserInfo;
use uuid::Uuid;

/// 注册表中的一个用户条目。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub room: String,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        UserInfo {
            id: user.id,
            name: user.name.clone(),
            room: user.room.clone(),
        }
    }
}

/// 连接 ID → 用户条目。
///
/// 条目按最近一次 upsert 的先后排列；`list_by_room` 不承诺任何顺序。
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    users: Vec<User>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或整体替换 `id` 对应的条目。
    pub fn upsert(&mut self, id: Uuid, name: impl Into<String>, room: impl Into<String>) {
        self.users.retain(|user| user.id != id);
        self.users.push(User {
            id,
            name: name.into(),
            room: room.into(),
        });
    }

    /// 移除并返回 `id` 对应的条目；不存在时返回 `None`。
    pub fn remove(&mut self, id: &Uuid) -> Option<User> {
        let index = self.users.iter().position(|user| user.id == *id)?;
        Some(self.users.remove(index))
    }

    pub fn get(&self, id: &Uuid) -> Option<&User> {
        self.users.iter().find(|user| user.id == *id)
    }

    pub fn list_by_room(&self, room: &str) -> Vec<User> {
        self.users.iter().filter(|user| user.room == room).cloned().collect()
    }

    pub fn is_room_occupied(&self, room: &str) -> bool {
        self.users.iter().any(|user| user.room == room)
    }

    /// 把所有位于 `old_room` 的用户改写到 `new_room`，返回被改写的连接 ID。
    pub fn reassign_room(&mut self, old_room: &str, new_room: &str) -> Vec<Uuid> {
        self.users
            .iter_mut()
            .filter(|user| user.room == old_room)
            .map(|user| {
                user.room = new_room.to_string();
                user.id
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
