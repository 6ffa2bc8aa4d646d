use async_trait::async_trait;
use domain::{BroadcastEnvelope, BroadcastEvent};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("broadcast failed: {0}")]
    Failed(String),
}

impl BroadcastError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// 实时推送出口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventBroadcaster: Send + Sync {
    async fn publish(&self, envelope: BroadcastEnvelope) -> Result<(), BroadcastError>;
}

/// 推送事件，失败只记录日志，不影响调用方
pub async fn dispatch<E: BroadcastEvent + ?Sized>(broadcaster: &dyn EventBroadcaster, event: &E) {
    let envelope = event.envelope();
    let name = envelope.event;
    let channels = envelope.channels.len();
    if channels == 0 {
        return;
    }
    if let Err(error) = broadcaster.publish(envelope).await {
        tracing::warn!(event = name, channels, error = %error, "事件推送失败");
    }
}
