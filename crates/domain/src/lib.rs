//! StudentLink 核心领域模型
//!
//! 包含用户、院系、诉求、聊天室、公告等核心实体，广播事件定义以及报表统计。

pub mod entities;
pub mod errors;
pub mod events;
pub mod reports;
pub mod value_objects;

// 重新导出常用类型
pub use entities::*;
pub use errors::*;
pub use events::*;
pub use value_objects::*;
