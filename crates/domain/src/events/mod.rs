//! 实时推送事件定义
//!
//! 每个事件根据领域对象计算接收频道集合，并生成固定结构的推送载荷。
//! 频道的选择只取决于参与者列表与当前操作者，操作者本人永远不会收到频道。

mod channel;
pub mod chat_message_sent;
pub mod concern_updated;
pub mod message_sent;
pub mod typing_status;

pub use channel::Channel;
pub use chat_message_sent::{ChatMessageSent, ReplyPreview};
pub use concern_updated::ConcernUpdated;
pub use message_sent::MessageSent;
pub use typing_status::TypingStatus;

use serde::Serialize;

/// 交给广播器的完整推送单元
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BroadcastEnvelope {
    pub event: &'static str,
    pub channels: Vec<Channel>,
    pub payload: serde_json::Value,
}

/// 可推送事件
pub trait BroadcastEvent {
    /// 接收频道
    fn broadcast_on(&self) -> Vec<Channel>;

    /// 事件名
    fn broadcast_as(&self) -> &'static str;

    /// 推送载荷
    fn broadcast_with(&self) -> serde_json::Value;

    fn envelope(&self) -> BroadcastEnvelope {
        BroadcastEnvelope {
            event: self.broadcast_as(),
            channels: self.broadcast_on(),
            payload: self.broadcast_with(),
        }
    }
}
