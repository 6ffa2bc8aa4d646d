//! 聊天消息实体

use serde::Serialize;

use crate::errors::DomainResult;
use crate::value_objects::{bounded_text, MessageId, RoomId, Timestamp, UserId};

/// 消息内容最大字符数
pub const MAX_MESSAGE_CHARS: usize = 5000;

string_enum! {
    /// 消息类型
    pub enum MessageType ("message_type") {
        Text => "text",
        File => "file",
        System => "system",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub room_id: RoomId,
    pub author_id: UserId,
    pub message: String,
    pub message_type: MessageType,
    pub reply_to: Option<MessageId>,
    pub created_at: Timestamp,
}

impl ChatMessage {
    pub fn new(
        id: MessageId,
        room_id: RoomId,
        author_id: UserId,
        message: impl Into<String>,
        message_type: MessageType,
        reply_to: Option<MessageId>,
        now: Timestamp,
    ) -> DomainResult<Self> {
        let message = bounded_text("message", message, MAX_MESSAGE_CHARS)?;
        Ok(Self {
            id,
            room_id,
            author_id,
            message,
            message_type,
            reply_to,
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn content_is_trimmed_and_bounded() {
        let msg = ChatMessage::new(
            MessageId::generate(),
            RoomId::generate(),
            UserId::generate(),
            "  hello  ",
            MessageType::Text,
            None,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(msg.message, "hello");

        let too_long = "x".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(ChatMessage::new(
            MessageId::generate(),
            RoomId::generate(),
            UserId::generate(),
            too_long,
            MessageType::Text,
            None,
            Utc::now(),
        )
        .is_err());
    }
}
