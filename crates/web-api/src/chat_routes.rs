use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use application::{HistoryQuery, OpenRoomRequest, SendMessageRequest};
use domain::{ChatMessage, ChatRoom, ConcernId, MessageId, MessageType, RoomId, UserId};

use crate::{
    error::ApiError, extract::ApiJson, middleware::AuthUser, response::ApiResponse,
    state::AppState,
};

#[derive(Debug, Deserialize)]
struct OpenRoomPayload {
    concern_id: Option<ConcernId>,
    #[serde(default)]
    participant_ids: Vec<UserId>,
}

#[derive(Debug, Deserialize)]
struct SendMessagePayload {
    message: String,
    message_type: Option<MessageType>,
    reply_to: Option<MessageId>,
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    before: Option<MessageId>,
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TypingPayload {
    is_typing: bool,
}

#[derive(Debug, Serialize)]
struct TypingAck {
    is_typing: bool,
}

/// 聊天路由，参与者校验在服务层完成
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/chat/rooms", get(list_rooms).post(open_room))
        .route(
            "/chat/rooms/{room_id}/messages",
            get(get_history).post(send_message),
        )
        .route("/chat/rooms/{room_id}/typing", post(typing))
}

async fn list_rooms(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Result<ApiResponse<Vec<ChatRoom>>, ApiError> {
    Ok(ApiResponse::ok(state.chat_service.rooms_for(&actor).await?))
}

async fn open_room(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiJson(payload): ApiJson<OpenRoomPayload>,
) -> Result<ApiResponse<ChatRoom>, ApiError> {
    let room = state
        .chat_service
        .open_room(
            &actor,
            OpenRoomRequest {
                concern_id: payload.concern_id,
                participant_ids: payload.participant_ids,
            },
        )
        .await?;
    Ok(ApiResponse::created(room))
}

async fn send_message(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(room_id): Path<RoomId>,
    ApiJson(payload): ApiJson<SendMessagePayload>,
) -> Result<ApiResponse<ChatMessage>, ApiError> {
    let message = state
        .chat_service
        .send_message(
            &actor,
            room_id,
            SendMessageRequest {
                message: payload.message,
                message_type: payload.message_type.unwrap_or(MessageType::Text),
                reply_to: payload.reply_to,
            },
        )
        .await?;
    Ok(ApiResponse::created(message))
}

async fn get_history(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(room_id): Path<RoomId>,
    Query(params): Query<HistoryParams>,
) -> Result<ApiResponse<Vec<ChatMessage>>, ApiError> {
    let messages = state
        .chat_service
        .history(
            &actor,
            room_id,
            HistoryQuery {
                limit: params.limit,
                before: params.before,
            },
        )
        .await?;
    Ok(ApiResponse::ok(messages))
}

async fn typing(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(room_id): Path<RoomId>,
    ApiJson(payload): ApiJson<TypingPayload>,
) -> Result<ApiResponse<TypingAck>, ApiError> {
    state
        .chat_service
        .typing(&actor, room_id, payload.is_typing)
        .await?;
    Ok(ApiResponse::ok(TypingAck {
        is_typing: payload.is_typing,
    }))
}
