use std::fmt;

use serde::{Serialize, Serializer};

use crate::value_objects::{DepartmentId, RoomId, UserId};

const PRIVATE_PREFIX: &str = "private-";

/// 推送频道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// 公共频道 `concerns`
    Concerns,
    /// 院系私有频道 `private-concerns.department.{id}`
    Department(DepartmentId),
    /// 聊天室私有频道 `private-chat.room.{id}`
    ChatRoom(RoomId),
    /// 聊天室内单个参与者的私有频道 `private-chat.room.{room}.user.{user}`
    RoomParticipant { room_id: RoomId, user_id: UserId },
}

impl Channel {
    pub fn is_private(&self) -> bool {
        !matches!(self, Channel::Concerns)
    }

    /// 不带 `private-` 前缀的频道名
    pub fn base_name(&self) -> String {
        match self {
            Channel::Concerns => "concerns".to_owned(),
            Channel::Department(id) => format!("concerns.department.{id}"),
            Channel::ChatRoom(id) => format!("chat.room.{id}"),
            Channel::RoomParticipant { room_id, user_id } => {
                format!("chat.room.{room_id}.user.{user_id}")
            }
        }
    }

    /// 线上传输使用的频道名
    pub fn name(&self) -> String {
        if self.is_private() {
            format!("{PRIVATE_PREFIX}{}", self.base_name())
        } else {
            self.base_name()
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl Serialize for Channel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn wire_names() {
        let room = RoomId::new(Uuid::nil());
        let user = UserId::new(Uuid::nil());
        let dept = DepartmentId::new(Uuid::nil());
        let nil = Uuid::nil();

        assert_eq!(Channel::Concerns.name(), "concerns");
        assert_eq!(
            Channel::Department(dept).name(),
            format!("private-concerns.department.{nil}")
        );
        assert_eq!(
            Channel::ChatRoom(room).name(),
            format!("private-chat.room.{nil}")
        );
        assert_eq!(
            Channel::RoomParticipant {
                room_id: room,
                user_id: user
            }
            .base_name(),
            format!("chat.room.{nil}.user.{nil}")
        );
    }

    #[test]
    fn serializes_as_wire_name() {
        let json = serde_json::to_value(Channel::Concerns).unwrap();
        assert_eq!(json, serde_json::json!("concerns"));
    }
}
