use std::sync::Arc;

use domain::{
    ChatMessage, ChatMessageSent, ChatRoom, ConcernId, DomainError, MessageId, MessageSent,
    MessageType, ReplyPreview, RepositoryError, RoomId, Timestamp, TypingStatus, User, UserId,
};

use crate::{
    broadcaster::{dispatch, EventBroadcaster},
    clock::Clock,
    error::ApplicationError,
    repository::{ChatMessageRepository, ChatRoomRepository, ConcernRepository, UserRepository},
};

pub const DEFAULT_HISTORY_LIMIT: u32 = 50;
pub const MAX_HISTORY_LIMIT: u32 = 100;

#[derive(Debug, Clone, Default)]
pub struct OpenRoomRequest {
    pub concern_id: Option<ConcernId>,
    pub participant_ids: Vec<UserId>,
}

#[derive(Debug, Clone)]
pub struct SendMessageRequest {
    pub message: String,
    pub message_type: MessageType,
    pub reply_to: Option<MessageId>,
}

#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
    pub before: Option<MessageId>,
}

pub struct ChatServiceDependencies {
    pub room_repository: Arc<dyn ChatRoomRepository>,
    pub message_repository: Arc<dyn ChatMessageRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub concern_repository: Arc<dyn ConcernRepository>,
    pub broadcaster: Arc<dyn EventBroadcaster>,
    pub clock: Arc<dyn Clock>,
}

pub struct ChatService {
    deps: ChatServiceDependencies,
}

impl ChatService {
    pub fn new(deps: ChatServiceDependencies) -> Self {
        Self { deps }
    }

    /// 创建聊天室；关联诉求的聊天室已存在时直接返回（必要时把操作者加入）
    pub async fn open_room(
        &self,
        actor: &User,
        request: OpenRoomRequest,
    ) -> Result<ChatRoom, ApplicationError> {
        let now = self.deps.clock.now();
        let mut participants = vec![actor.id];

        if let Some(concern_id) = request.concern_id {
            let concern = self
                .deps
                .concern_repository
                .find_by_id(concern_id)
                .await?
                .ok_or_else(|| ApplicationError::not_found("concern"))?;
            if !concern.is_visible_to(actor) {
                return Err(ApplicationError::forbidden("open a room for this concern"));
            }

            if let Some(room) = self.deps.room_repository.find_by_concern(concern_id).await? {
                return self.join(actor, room, now).await;
            }

            participants.push(concern.student_id);
            participants.extend(concern.assigned_to);
        }

        for participant in request.participant_ids {
            if participants.contains(&participant) {
                continue;
            }
            let user = self
                .deps
                .user_repository
                .find_by_id(participant)
                .await?
                .filter(|user| user.is_active)
                .ok_or_else(|| {
                    DomainError::invalid_argument("participants", format!("unknown user {participant}"))
                })?;
            participants.push(user.id);
        }

        let room = ChatRoom::open(RoomId::generate(), request.concern_id, participants, now)?;
        match (self.deps.room_repository.create(room).await, request.concern_id) {
            (Ok(room), _) => {
                tracing::info!(room_id = %room.id, participants = room.participants.len(), "创建聊天室");
                Ok(room)
            }
            // 并发请求抢先为该诉求建好了聊天室
            (Err(RepositoryError::Conflict), Some(concern_id)) => {
                let room = self
                    .deps
                    .room_repository
                    .find_by_concern(concern_id)
                    .await?
                    .ok_or(RepositoryError::Conflict)?;
                self.join(actor, room, now).await
            }
            (Err(err), _) => Err(err.into()),
        }
    }

    async fn join(
        &self,
        actor: &User,
        room: ChatRoom,
        now: Timestamp,
    ) -> Result<ChatRoom, ApplicationError> {
        if room.is_participant(actor.id) {
            return Ok(room);
        }
        let room = self
            .deps
            .room_repository
            .add_participant(room.id, actor.id, now)
            .await?;
        tracing::info!(room_id = %room.id, user_id = %actor.id, "加入聊天室");
        Ok(room)
    }

    pub async fn rooms_for(&self, actor: &User) -> Result<Vec<ChatRoom>, ApplicationError> {
        Ok(self.deps.room_repository.list_for_user(actor.id).await?)
    }

    pub async fn send_message(
        &self,
        actor: &User,
        room_id: RoomId,
        request: SendMessageRequest,
    ) -> Result<ChatMessage, ApplicationError> {
        let room = self.participant_room(actor, room_id).await?;

        let reply_to = match request.reply_to {
            Some(reply_id) => {
                let original = self
                    .deps
                    .message_repository
                    .find_by_id(reply_id)
                    .await?
                    .filter(|message| message.room_id == room.id)
                    .ok_or_else(|| {
                        DomainError::invalid_argument("reply_to", "message is not in this room")
                    })?;
                Some(original)
            }
            None => None,
        };

        let now = self.deps.clock.now();
        let message = ChatMessage::new(
            MessageId::generate(),
            room.id,
            actor.id,
            request.message,
            request.message_type,
            reply_to.as_ref().map(|original| original.id),
            now,
        )?;
        let stored = self.deps.message_repository.create(message).await?;

        let room = self.deps.room_repository.touch(room.id, now).await?;

        let reply_preview = match reply_to {
            Some(original) => self.reply_preview(original).await?,
            None => None,
        };

        let chat_event = ChatMessageSent {
            message: stored.clone(),
            author: actor.summary(),
            reply_to: reply_preview.clone(),
        };
        dispatch(self.deps.broadcaster.as_ref(), &chat_event).await;

        let participant_event = MessageSent {
            message: stored.clone(),
            author: actor.summary(),
            reply_to: reply_preview,
            room,
        };
        dispatch(self.deps.broadcaster.as_ref(), &participant_event).await;

        Ok(stored)
    }

    /// 最新的排在前面，`limit` 限制在 1..=100
    pub async fn history(
        &self,
        actor: &User,
        room_id: RoomId,
        query: HistoryQuery,
    ) -> Result<Vec<ChatMessage>, ApplicationError> {
        let room = self.participant_room(actor, room_id).await?;
        let limit = query
            .limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);
        Ok(self
            .deps
            .message_repository
            .history(room.id, limit, query.before)
            .await?)
    }

    pub async fn typing(
        &self,
        actor: &User,
        room_id: RoomId,
        is_typing: bool,
    ) -> Result<(), ApplicationError> {
        let room = self.participant_room(actor, room_id).await?;
        let event = TypingStatus {
            room,
            user: actor.summary(),
            is_typing,
        };
        dispatch(self.deps.broadcaster.as_ref(), &event).await;
        Ok(())
    }

    async fn participant_room(
        &self,
        actor: &User,
        room_id: RoomId,
    ) -> Result<ChatRoom, ApplicationError> {
        let room = self
            .deps
            .room_repository
            .find_by_id(room_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("chat room"))?;
        if !room.is_participant(actor.id) {
            return Err(ApplicationError::forbidden("access this chat room"));
        }
        Ok(room)
    }

    async fn reply_preview(
        &self,
        original: ChatMessage,
    ) -> Result<Option<ReplyPreview>, ApplicationError> {
        let author = self
            .deps
            .user_repository
            .find_by_id(original.author_id)
            .await?;
        Ok(author.map(|author| ReplyPreview {
            message: original,
            author: author.summary(),
        }))
    }
}
