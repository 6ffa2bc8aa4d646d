use async_trait::async_trait;
use domain::{
    Announcement, AnnouncementId, AnnouncementStatus, ChatMessage, ChatRoom, Concern, ConcernId,
    ConcernStatus, Department, DepartmentId, MessageId, RepositoryError, RoomId, Timestamp, User,
    UserEmail, UserId,
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 邮箱重复时返回 `RepositoryError::Conflict`
    async fn create(&self, user: User) -> Result<User, RepositoryError>;
    async fn update(&self, user: User) -> Result<User, RepositoryError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    async fn find_by_email(&self, email: &UserEmail) -> Result<Option<User>, RepositoryError>;
    /// 按姓名排序
    async fn list(&self) -> Result<Vec<User>, RepositoryError>;
}

#[async_trait]
pub trait DepartmentRepository: Send + Sync {
    /// 代码重复时返回 `RepositoryError::Conflict`
    async fn create(&self, department: Department) -> Result<Department, RepositoryError>;
    async fn find_by_id(&self, id: DepartmentId) -> Result<Option<Department>, RepositoryError>;
    async fn list(&self) -> Result<Vec<Department>, RepositoryError>;
}

/// 诉求查询条件，`None` 表示不限
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConcernQuery {
    pub student_id: Option<UserId>,
    pub department_id: Option<DepartmentId>,
    pub status: Option<ConcernStatus>,
}

impl ConcernQuery {
    pub fn matches(&self, concern: &Concern) -> bool {
        self.student_id.map_or(true, |id| concern.student_id == id)
            && self
                .department_id
                .map_or(true, |id| concern.department_id == id)
            && self.status.map_or(true, |status| concern.status == status)
    }
}

#[async_trait]
pub trait ConcernRepository: Send + Sync {
    async fn create(&self, concern: Concern) -> Result<Concern, RepositoryError>;
    /// 仅当存储中的记录仍与 `read` 一致时写入，否则返回 `RepositoryError::Stale`
    async fn update(&self, concern: Concern, read: &Concern) -> Result<Concern, RepositoryError>;
    async fn find_by_id(&self, id: ConcernId) -> Result<Option<Concern>, RepositoryError>;
    /// 最新提交的排在前面
    async fn list(&self, query: ConcernQuery) -> Result<Vec<Concern>, RepositoryError>;
}

#[async_trait]
pub trait ChatRoomRepository: Send + Sync {
    /// 同一诉求已有聊天室时返回 `RepositoryError::Conflict`
    async fn create(&self, room: ChatRoom) -> Result<ChatRoom, RepositoryError>;
    /// 原子地追加参与者（已在其中则不变）并刷新活跃时间
    async fn add_participant(
        &self,
        room_id: RoomId,
        user_id: UserId,
        at: Timestamp,
    ) -> Result<ChatRoom, RepositoryError>;
    /// 只刷新活跃时间，不会早于已记录的时间
    async fn touch(&self, room_id: RoomId, at: Timestamp) -> Result<ChatRoom, RepositoryError>;
    async fn find_by_id(&self, id: RoomId) -> Result<Option<ChatRoom>, RepositoryError>;
    async fn find_by_concern(
        &self,
        concern_id: ConcernId,
    ) -> Result<Option<ChatRoom>, RepositoryError>;
    /// 最近活跃的排在前面
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<ChatRoom>, RepositoryError>;
}

#[async_trait]
pub trait ChatMessageRepository: Send + Sync {
    async fn create(&self, message: ChatMessage) -> Result<ChatMessage, RepositoryError>;
    async fn find_by_id(&self, id: MessageId) -> Result<Option<ChatMessage>, RepositoryError>;
    /// 最新的排在前面；`before` 为游标消息，只返回比它更早的消息
    async fn history(
        &self,
        room_id: RoomId,
        limit: u32,
        before: Option<MessageId>,
    ) -> Result<Vec<ChatMessage>, RepositoryError>;
}

#[async_trait]
pub trait AnnouncementRepository: Send + Sync {
    async fn create(&self, announcement: Announcement) -> Result<Announcement, RepositoryError>;
    /// 仅当状态仍为 `read_status` 时写入，否则返回 `RepositoryError::Stale`；浏览计数不受影响
    async fn update(
        &self,
        announcement: Announcement,
        read_status: AnnouncementStatus,
    ) -> Result<Announcement, RepositoryError>;
    /// 浏览次数原子加一
    async fn record_view(&self, id: AnnouncementId) -> Result<Announcement, RepositoryError>;
    async fn find_by_id(
        &self,
        id: AnnouncementId,
    ) -> Result<Option<Announcement>, RepositoryError>;
    /// 最新创建的排在前面
    async fn list(&self) -> Result<Vec<Announcement>, RepositoryError>;
}
