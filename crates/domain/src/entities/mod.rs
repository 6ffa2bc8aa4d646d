//! 领域实体定义
//!
//! 包含系统的核心实体：用户、部门、诉求、聊天室、消息、公告。

/// 以小写字符串持久化/传输的枚举。
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident ($field:literal) {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        $vis enum $name {
            $($(#[$vmeta])* #[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::errors::DomainError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::errors::DomainError::invalid_argument(
                        $field,
                        format!("unknown value '{other}'"),
                    )),
                }
            }
        }
    };
}

pub mod announcement;
pub mod chat_room;
pub mod concern;
pub mod department;
pub mod message;
pub mod user;

pub use announcement::{
    Announcement, AnnouncementPriority, AnnouncementStatus, AnnouncementType, NewAnnouncement,
};
pub use chat_room::ChatRoom;
pub use concern::{
    Concern, ConcernAction, ConcernPriority, ConcernStatus, ConcernType, NewConcern,
};
pub use department::{Department, DepartmentType};
pub use message::{ChatMessage, MessageType};
pub use user::{NewUser, User, UserRole, UserSummary};
