//! 基础设施层实现。
//!
//! 提供 Postgres 仓储、密码哈希、实时推送等适配器，实现应用层定义的接口。

pub mod broadcast;
pub mod migrations;
pub mod password;
pub mod repository;

pub use broadcast::{FanoutBroadcaster, LocalEventBroadcaster, RedisEventBroadcaster};
pub use migrations::MIGRATOR;
pub use password::BcryptPasswordHasher;
pub use repository::{
    create_pg_pool, PgAnnouncementRepository, PgChatMessageRepository, PgChatRoomRepository,
    PgConcernRepository, PgDepartmentRepository, PgStorage, PgUserRepository,
};
