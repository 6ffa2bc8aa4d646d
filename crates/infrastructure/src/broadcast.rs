//! 实时推送适配器
//!
//! 本地广播供 WebSocket 端点消费；Redis 广播按 Laravel Echo 服务端约定的
//! `{"event", "data", "socket"}` 格式向每个频道 PUBLISH。

use std::sync::Arc;

use application::broadcaster::{BroadcastError, EventBroadcaster};
use async_trait::async_trait;
use domain::BroadcastEnvelope;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::json;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct LocalEventBroadcaster {
    sender: broadcast::Sender<BroadcastEnvelope>,
}

impl LocalEventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEnvelope> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl EventBroadcaster for LocalEventBroadcaster {
    async fn publish(&self, envelope: BroadcastEnvelope) -> Result<(), BroadcastError> {
        if self.sender.receiver_count() == 0 {
            return Ok(());
        }
        self.sender
            .send(envelope)
            .map_err(|err| BroadcastError::failed(err.to_string()))?;
        Ok(())
    }
}

/// Redis 频道广播
#[derive(Clone)]
pub struct RedisEventBroadcaster {
    connection: ConnectionManager,
    channel_prefix: String,
}

impl RedisEventBroadcaster {
    pub async fn connect(redis_url: &str, channel_prefix: impl Into<String>) -> redis::RedisResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;
        tracing::info!(redis_url, "Redis 广播已连接");
        Ok(Self {
            connection,
            channel_prefix: channel_prefix.into(),
        })
    }

    fn channel_key(&self, wire_name: &str) -> String {
        format!("{}{}", self.channel_prefix, wire_name)
    }
}

/// Echo 服务端消费的消息体
pub fn redis_payload(envelope: &BroadcastEnvelope) -> String {
    json!({
        "event": envelope.event,
        "data": envelope.payload,
        "socket": null,
    })
    .to_string()
}

#[async_trait]
impl EventBroadcaster for RedisEventBroadcaster {
    async fn publish(&self, envelope: BroadcastEnvelope) -> Result<(), BroadcastError> {
        let payload = redis_payload(&envelope);
        let mut connection = self.connection.clone();
        for channel in &envelope.channels {
            let key = self.channel_key(&channel.name());
            let receivers: i64 = connection
                .publish(&key, &payload)
                .await
                .map_err(|err| BroadcastError::failed(format!("PUBLISH {key}: {err}")))?;
            tracing::debug!(channel = %key, event = envelope.event, receivers, "已推送");
        }
        Ok(())
    }
}

/// 同时推送到多个广播器：每个都会尝试，返回第一个错误
pub struct FanoutBroadcaster {
    targets: Vec<Arc<dyn EventBroadcaster>>,
}

impl FanoutBroadcaster {
    pub fn new(targets: Vec<Arc<dyn EventBroadcaster>>) -> Self {
        Self { targets }
    }
}

#[async_trait]
impl EventBroadcaster for FanoutBroadcaster {
    async fn publish(&self, envelope: BroadcastEnvelope) -> Result<(), BroadcastError> {
        let mut first_error = None;
        for target in &self.targets {
            if let Err(err) = target.publish(envelope.clone()).await {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
