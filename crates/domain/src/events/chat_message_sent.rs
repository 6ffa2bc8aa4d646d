use serde_json::json;

use super::{BroadcastEvent, Channel};
use crate::entities::{ChatMessage, UserSummary};

/// 被回复消息及其作者
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyPreview {
    pub message: ChatMessage,
    pub author: UserSummary,
}

/// 聊天室新消息，推送到整个聊天室的私有频道
#[derive(Debug, Clone)]
pub struct ChatMessageSent {
    pub message: ChatMessage,
    pub author: UserSummary,
    pub reply_to: Option<ReplyPreview>,
}

impl BroadcastEvent for ChatMessageSent {
    fn broadcast_on(&self) -> Vec<Channel> {
        vec![Channel::ChatRoom(self.message.room_id)]
    }

    fn broadcast_as(&self) -> &'static str {
        "chat.message.sent"
    }

    fn broadcast_with(&self) -> serde_json::Value {
        let reply_to = self.reply_to.as_ref().map(|reply| {
            json!({
                "id": reply.message.id,
                "message": reply.message.message,
                "author": reply.author,
            })
        });

        json!({
            "message": {
                "id": self.message.id,
                "room_id": self.message.room_id,
                "message": self.message.message,
                "message_type": self.message.message_type,
                "created_at": self.message.created_at,
                "author": self.author,
                "reply_to": reply_to,
            }
        })
    }
}
