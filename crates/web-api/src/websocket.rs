//! WebSocket 实时推送
//!
//! 连接通过 `?token=` 认证，之后按频道权限转发本地广播中的事件帧
//! `{"event", "channel", "data"}`。

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;

use domain::{BroadcastEnvelope, Channel, User};

use crate::{error::ApiError, middleware::resolve_principal, state::AppState};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

/// 推送给客户端的事件帧
#[derive(Debug, Serialize)]
pub struct PushFrame<'a> {
    pub event: &'a str,
    pub channel: String,
    pub data: &'a serde_json::Value,
}

pub async fn websocket_upgrade(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let user = resolve_principal(&state, query.token.as_deref()).await?;
    tracing::info!(user_id = %user.id, "WebSocket 连接已认证");
    Ok(ws.on_upgrade(move |socket| websocket_handler(socket, state, user)))
}

/// 用户可以收听的频道
async fn may_listen(state: &AppState, user: &User, channel: &Channel) -> bool {
    match channel {
        Channel::Concerns => true,
        Channel::Department(department_id) => {
            user.is_admin() || user.department_id == Some(*department_id)
        }
        Channel::RoomParticipant { user_id, .. } => *user_id == user.id,
        Channel::ChatRoom(room_id) => match state.chat_service.rooms_for(user).await {
            Ok(rooms) => rooms.iter().any(|room| room.id == *room_id),
            Err(err) => {
                tracing::warn!(error = %err, "查询聊天室参与情况失败");
                false
            }
        },
    }
}

async fn frames_for(state: &AppState, user: &User, envelope: &BroadcastEnvelope) -> Vec<String> {
    let mut frames = Vec::new();
    for channel in &envelope.channels {
        if !may_listen(state, user, channel).await {
            continue;
        }
        let frame = PushFrame {
            event: envelope.event,
            channel: channel.name(),
            data: &envelope.payload,
        };
        match serde_json::to_string(&frame) {
            Ok(json) => frames.push(json),
            Err(err) => tracing::warn!(error = %err, "failed to serialize websocket payload"),
        }
    }
    frames
}

async fn websocket_handler(socket: WebSocket, state: AppState, user: User) {
    let mut receiver = state.live_events.subscribe();
    let (mut sender, mut incoming) = socket.split();
    let user_id = user.id;

    let mut send_task = tokio::spawn(async move {
        loop {
            let envelope = match receiver.recv().await {
                Ok(envelope) => envelope,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(%user_id, skipped, "推送积压，已丢弃部分事件");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            for frame in frames_for(&state, &user, &envelope).await {
                if sender.send(WsMessage::Text(frame.into())).await.is_err() {
                    return;
                }
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = incoming.next().await {
            if matches!(message, WsMessage::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    tracing::info!(%user_id, "WebSocket 连接已关闭");
}
