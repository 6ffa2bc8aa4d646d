use serde_json::json;

use super::{BroadcastEvent, Channel, ReplyPreview};
use crate::entities::{ChatMessage, ChatRoom, UserSummary};

/// 聊天室新消息，逐个推送给作者以外的参与者
#[derive(Debug, Clone)]
pub struct MessageSent {
    pub message: ChatMessage,
    pub author: UserSummary,
    pub reply_to: Option<ReplyPreview>,
    pub room: ChatRoom,
}

impl BroadcastEvent for MessageSent {
    fn broadcast_on(&self) -> Vec<Channel> {
        self.room
            .participants_except(self.message.author_id)
            .map(|user_id| Channel::RoomParticipant {
                room_id: self.room.id,
                user_id,
            })
            .collect()
    }

    fn broadcast_as(&self) -> &'static str {
        "message.sent"
    }

    fn broadcast_with(&self) -> serde_json::Value {
        let reply_to = self.reply_to.as_ref().map(|reply| {
            json!({
                "id": reply.message.id,
                "message": reply.message.message,
                "author_name": reply.author.name,
            })
        });

        json!({
            "message": {
                "id": self.message.id,
                "message": self.message.message,
                "message_type": self.message.message_type,
                "created_at": self.message.created_at,
                "author": self.author,
                "reply_to": reply_to,
            },
            "chat_room": {
                "id": self.room.id,
                "concern_id": self.room.concern_id,
                "last_activity_at": self.room.last_activity_at,
            }
        })
    }
}
