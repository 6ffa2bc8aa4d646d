use serde_json::json;

use super::{BroadcastEvent, Channel};
use crate::entities::{ChatRoom, UserSummary};

/// 输入状态，推送给操作者以外的参与者
#[derive(Debug, Clone)]
pub struct TypingStatus {
    pub room: ChatRoom,
    pub user: UserSummary,
    pub is_typing: bool,
}

impl BroadcastEvent for TypingStatus {
    fn broadcast_on(&self) -> Vec<Channel> {
        self.room
            .participants_except(self.user.id)
            .map(|user_id| Channel::RoomParticipant {
                room_id: self.room.id,
                user_id,
            })
            .collect()
    }

    fn broadcast_as(&self) -> &'static str {
        "typing.status"
    }

    fn broadcast_with(&self) -> serde_json::Value {
        json!({
            "user": {
                "id": self.user.id,
                "name": self.user.name,
            },
            "is_typing": self.is_typing,
        })
    }
}
