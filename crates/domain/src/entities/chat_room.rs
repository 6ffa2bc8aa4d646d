use serde::Serialize;

use crate::errors::{DomainError, DomainResult};
use crate::value_objects::{ConcernId, RoomId, Timestamp, UserId};

/// 聊天室：可选关联某个诉求，参与者按加入顺序去重保存
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRoom {
    pub id: RoomId,
    pub concern_id: Option<ConcernId>,
    pub participants: Vec<UserId>,
    pub last_activity_at: Timestamp,
    pub created_at: Timestamp,
}

impl ChatRoom {
    pub fn open(
        id: RoomId,
        concern_id: Option<ConcernId>,
        participants: impl IntoIterator<Item = UserId>,
        now: Timestamp,
    ) -> DomainResult<Self> {
        let mut unique = Vec::new();
        for participant in participants {
            if !unique.contains(&participant) {
                unique.push(participant);
            }
        }
        if unique.len() < 2 {
            return Err(DomainError::invalid_argument(
                "participants",
                "a chat room needs at least two participants",
            ));
        }

        Ok(Self {
            id,
            concern_id,
            participants: unique,
            last_activity_at: now,
            created_at: now,
        })
    }

    pub fn is_participant(&self, user_id: UserId) -> bool {
        self.participants.contains(&user_id)
    }

    /// 除操作者外的参与者，保持原有顺序
    pub fn participants_except(&self, actor: UserId) -> impl Iterator<Item = UserId> + '_ {
        self.participants
            .iter()
            .copied()
            .filter(move |participant| *participant != actor)
    }

    pub fn touch(&mut self, now: Timestamp) {
        self.last_activity_at = now;
    }
}
