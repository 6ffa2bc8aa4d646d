//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务，处理权限判断、输入校验，
//! 以及对外部适配器（例如仓储、密码哈希、实时推送）的抽象。

pub mod broadcaster;
pub mod clock;
pub mod error;
pub mod memory;
pub mod password;
pub mod repository;
pub mod services;

pub use broadcaster::{dispatch, BroadcastError, EventBroadcaster};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ApplicationError, ApplicationResult};
pub use password::{PasswordHasher, PasswordHasherError, PlainPasswordHasher};
pub use repository::{
    AnnouncementRepository, ChatMessageRepository, ChatRoomRepository, ConcernQuery,
    ConcernRepository, DepartmentRepository, UserRepository,
};
pub use services::*;
