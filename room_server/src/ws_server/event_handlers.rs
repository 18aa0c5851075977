// room_server/src/ws_server/event_handlers.rs

//! 入站事件的处理函数，每种事件一个。
//!
//! 处理函数先同步修改注册表 / 目录 / 组成员关系，再通过 `BroadcastRouter` 通知受影响的连接。
//! 无效或无意义的请求（删除有人的房间、未进房间就发消息等）一律静默忽略，不向客户端回报错误。

use common_models::ws_payloads::{
    ChatMessagePayload, DeleteRoomPayload, EnterRoomPayload, RenameRoomPayload, RoomListPayload,
    SendMessagePayload, UserInfo, UserListPayload,
};
use log::{debug, info, warn};
use uuid::Uuid;

use crate::ws_server::coordinator::Coordinator;
use crate::ws_server::events::{EventKind, InboundEvent, OutboundEvent};

fn admin_notice(text: String) -> OutboundEvent {
    OutboundEvent::Message(ChatMessagePayload::admin(text))
}

impl Coordinator {
    /// 分发表：按事件种类调用对应的处理函数。
    pub fn dispatch(&mut self, connection_id: Uuid, event: InboundEvent) {
        let kind = event.kind();
        if !matches!(kind, EventKind::Connect | EventKind::Disconnect) && !self.router.is_live(&connection_id) {
            warn!("[事件处理] 连接 {} 已不在线，忽略其 {} 事件", connection_id, kind);
            return;
        }
        debug!("[事件处理] 处理连接 {} 的 {} 事件", connection_id, kind);

        match event {
            InboundEvent::Connect => self.on_connect(connection_id),
            InboundEvent::EnterRoom(payload) => self.on_enter_room(connection_id, payload),
            InboundEvent::RenameRoom(payload) => self.on_rename_room(payload),
            InboundEvent::DeleteRoom(payload) => self.on_delete_room(payload),
            InboundEvent::Message(payload) => self.on_message(connection_id, payload),
            InboundEvent::Disconnect => self.on_disconnect(connection_id),
        }
    }

    fn on_connect(&mut self, connection_id: Uuid) {
        info!("[事件处理] 用户 {} 已连接", connection_id);
        self.router.send_to(&connection_id, &self.room_list_event());
    }

    fn on_enter_room(&mut self, connection_id: Uuid, payload: EnterRoomPayload) {
        let EnterRoomPayload { name, room } = payload;
        self.directory.add(&room);

        let previous_room = self.registry.get(&connection_id).map(|user| user.room.clone());
        if let Some(previous_room) = previous_room {
            self.router.leave(&connection_id, &previous_room);
            self.router
                .broadcast_room(&previous_room, &admin_notice(format!("{} has left the room", name)), None);
        }

        self.registry.upsert(connection_id, name.as_str(), room.as_str());
        self.router.join(&connection_id, &room);
        info!("[事件处理] 用户 {} ({}) 进入房间 '{}'", name, connection_id, room);

        self.router
            .send_to(&connection_id, &admin_notice(format!("You joined {}", room)));
        self.router.broadcast_room(
            &room,
            &admin_notice(format!("{} joined the room", name)),
            Some(&connection_id),
        );
        self.broadcast_user_list(&room);
        self.broadcast_room_list();
    }

    fn on_rename_room(&mut self, payload: RenameRoomPayload) {
        let RenameRoomPayload { old_room, new_room } = payload;
        self.directory.add(&new_room);

        if old_room != new_room {
            let moved = self.registry.reassign_room(&old_room, &new_room);
            for id in &moved {
                self.router.leave(id, &old_room);
                self.router.join(id, &new_room);
            }
            info!(
                "[事件处理] 房间 '{}' 重命名为 '{}'，迁移了 {} 个连接",
                old_room,
                new_room,
                moved.len()
            );
        }
        // 同名重命名时房间若为空也会被删除
        self.directory.remove(&old_room, &self.registry);

        self.router.broadcast_all(&admin_notice(format!(
            "Room \"{}\" was renamed to \"{}\"",
            old_room, new_room
        )));
        self.broadcast_room_list();
    }

    fn on_delete_room(&mut self, payload: DeleteRoomPayload) {
        let room = payload.room;
        if !self.registry.list_by_room(&room).is_empty() {
            debug!("[事件处理] 房间 '{}' 仍有用户，忽略删除请求", room);
            return;
        }

        self.directory.remove(&room, &self.registry);
        info!("[事件处理] 房间 '{}' 已删除", room);
        self.router
            .broadcast_all(&admin_notice(format!("Room \"{}\" has been deleted", room)));
        self.broadcast_room_list();
    }

    fn on_disconnect(&mut self, connection_id: Uuid) {
        let user = self.registry.remove(&connection_id);
        self.router.release(&connection_id);

        if let Some(user) = user {
            self.router
                .broadcast_room(&user.room, &admin_notice(format!("{} has left the room", user.name)), None);
        }
        self.broadcast_room_list();
        info!("[事件处理] 用户 {} 已断开", connection_id);
    }

    fn on_message(&mut self, connection_id: Uuid, payload: SendMessagePayload) {
        let Some(room) = self.registry.get(&connection_id).map(|user| user.room.clone()) else {
            debug!("[事件处理] 连接 {} 不在任何房间，忽略其消息", connection_id);
            return;
        };
        let SendMessagePayload { name, text } = payload;
        let delivered = self
            .router
            .broadcast_room(&room, &OutboundEvent::Message(ChatMessagePayload::now(name, text)), None);
        debug!("[事件处理] 房间 '{}' 的消息已投递给 {} 个连接", room, delivered);
    }

    fn room_list_event(&self) -> OutboundEvent {
        OutboundEvent::RoomList(RoomListPayload {
            rooms: self.directory.list(),
        })
    }

    fn broadcast_room_list(&self) {
        self.router.broadcast_all(&self.room_list_event());
    }

    fn broadcast_user_list(&self, room: &str) {
        let users = self
            .registry
            .list_by_room(room)
            .iter()
            .map(UserInfo::from)
            .collect();
        self.router
            .broadcast_room(room, &OutboundEvent::UserList(UserListPayload { users }), None);
    }
}
