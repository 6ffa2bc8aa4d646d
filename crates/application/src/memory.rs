//! 内存仓储实现
//!
//! 用于测试以及未配置数据库时的本地运行。

use std::collections::HashMap;

use async_trait::async_trait;
use domain::{
    Announcement, AnnouncementId, AnnouncementStatus, ChatMessage, ChatRoom, Concern, ConcernId,
    Department, DepartmentId, MessageId, RepositoryError, RoomId, Timestamp, User, UserEmail,
    UserId,
};
use tokio::sync::RwLock;

use crate::repository::{
    AnnouncementRepository, ChatMessageRepository, ChatRoomRepository, ConcernQuery,
    ConcernRepository, DepartmentRepository, UserRepository,
};

#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(RepositoryError::Conflict);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;
        let slot = users.get_mut(&user.id).ok_or(RepositoryError::NotFound)?;
        *slot = user.clone();
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &UserEmail) -> Result<Option<User>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| &user.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }
}

#[derive(Default)]
pub struct MemoryDepartmentRepository {
    departments: RwLock<HashMap<DepartmentId, Department>>,
}

impl MemoryDepartmentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DepartmentRepository for MemoryDepartmentRepository {
    async fn create(&self, department: Department) -> Result<Department, RepositoryError> {
        let mut departments = self.departments.write().await;
        if departments
            .values()
            .any(|existing| existing.code == department.code)
        {
            return Err(RepositoryError::Conflict);
        }
        departments.insert(department.id, department.clone());
        Ok(department)
    }

    async fn find_by_id(&self, id: DepartmentId) -> Result<Option<Department>, RepositoryError> {
        Ok(self.departments.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Department>, RepositoryError> {
        let mut departments: Vec<Department> =
            self.departments.read().await.values().cloned().collect();
        departments.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(departments)
    }
}

#[derive(Default)]
pub struct MemoryConcernRepository {
    concerns: RwLock<HashMap<ConcernId, Concern>>,
}

impl MemoryConcernRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConcernRepository for MemoryConcernRepository {
    async fn create(&self, concern: Concern) -> Result<Concern, RepositoryError> {
        let mut concerns = self.concerns.write().await;
        if concerns
            .values()
            .any(|existing| existing.reference_number == concern.reference_number)
        {
            return Err(RepositoryError::Conflict);
        }
        concerns.insert(concern.id, concern.clone());
        Ok(concern)
    }

    async fn update(&self, concern: Concern, read: &Concern) -> Result<Concern, RepositoryError> {
        let mut concerns = self.concerns.write().await;
        let slot = concerns
            .get_mut(&concern.id)
            .ok_or(RepositoryError::NotFound)?;
        if slot != read {
            return Err(RepositoryError::Stale);
        }
        *slot = concern.clone();
        Ok(concern)
    }

    async fn find_by_id(&self, id: ConcernId) -> Result<Option<Concern>, RepositoryError> {
        Ok(self.concerns.read().await.get(&id).cloned())
    }

    async fn list(&self, query: ConcernQuery) -> Result<Vec<Concern>, RepositoryError> {
        let mut concerns: Vec<Concern> = self
            .concerns
            .read()
            .await
            .values()
            .filter(|concern| query.matches(concern))
            .cloned()
            .collect();
        concerns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(concerns)
    }
}

#[derive(Default)]
pub struct MemoryChatRoomRepository {
    rooms: RwLock<HashMap<RoomId, ChatRoom>>,
}

impl MemoryChatRoomRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatRoomRepository for MemoryChatRoomRepository {
    async fn create(&self, room: ChatRoom) -> Result<ChatRoom, RepositoryError> {
        let mut rooms = self.rooms.write().await;
        if room.concern_id.is_some()
            && rooms
                .values()
                .any(|existing| existing.concern_id == room.concern_id)
        {
            return Err(RepositoryError::Conflict);
        }
        rooms.insert(room.id, room.clone());
        Ok(room)
    }

    async fn add_participant(
        &self,
        room_id: RoomId,
        user_id: UserId,
        at: Timestamp,
    ) -> Result<ChatRoom, RepositoryError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms.get_mut(&room_id).ok_or(RepositoryError::NotFound)?;
        if !room.is_participant(user_id) {
            room.participants.push(user_id);
        }
        room.touch(room.last_activity_at.max(at));
        Ok(room.clone())
    }

    async fn touch(&self, room_id: RoomId, at: Timestamp) -> Result<ChatRoom, RepositoryError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms.get_mut(&room_id).ok_or(RepositoryError::NotFound)?;
        room.touch(room.last_activity_at.max(at));
        Ok(room.clone())
    }

    async fn find_by_id(&self, id: RoomId) -> Result<Option<ChatRoom>, RepositoryError> {
        Ok(self.rooms.read().await.get(&id).cloned())
    }

    async fn find_by_concern(
        &self,
        concern_id: ConcernId,
    ) -> Result<Option<ChatRoom>, RepositoryError> {
        let rooms = self.rooms.read().await;
        Ok(rooms
            .values()
            .find(|room| room.concern_id == Some(concern_id))
            .cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<ChatRoom>, RepositoryError> {
        let mut rooms: Vec<ChatRoom> = self
            .rooms
            .read()
            .await
            .values()
            .filter(|room| room.is_participant(user_id))
            .cloned()
            .collect();
        rooms.sort_by(|a, b| b.last_activity_at.cmp(&a.last_activity_at));
        Ok(rooms)
    }
}

/// 每个聊天室按写入顺序保存消息
#[derive(Default)]
pub struct MemoryChatMessageRepository {
    rooms: RwLock<HashMap<RoomId, Vec<ChatMessage>>>,
}

impl MemoryChatMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatMessageRepository for MemoryChatMessageRepository {
    async fn create(&self, message: ChatMessage) -> Result<ChatMessage, RepositoryError> {
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(message.room_id)
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Option<ChatMessage>, RepositoryError> {
        let rooms = self.rooms.read().await;
        Ok(rooms
            .values()
            .flat_map(|messages| messages.iter())
            .find(|message| message.id == id)
            .cloned())
    }

    async fn history(
        &self,
        room_id: RoomId,
        limit: u32,
        before: Option<MessageId>,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rooms = self.rooms.read().await;
        let Some(messages) = rooms.get(&room_id) else {
            return Ok(Vec::new());
        };

        let end = match before {
            Some(cursor) => messages
                .iter()
                .position(|message| message.id == cursor)
                .unwrap_or(messages.len()),
            None => messages.len(),
        };

        Ok(messages[..end]
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryAnnouncementRepository {
    announcements: RwLock<HashMap<AnnouncementId, Announcement>>,
}

impl MemoryAnnouncementRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnnouncementRepository for MemoryAnnouncementRepository {
    async fn create(&self, announcement: Announcement) -> Result<Announcement, RepositoryError> {
        let mut announcements = self.announcements.write().await;
        announcements.insert(announcement.id, announcement.clone());
        Ok(announcement)
    }

    async fn update(
        &self,
        mut announcement: Announcement,
        read_status: AnnouncementStatus,
    ) -> Result<Announcement, RepositoryError> {
        let mut announcements = self.announcements.write().await;
        let slot = announcements
            .get_mut(&announcement.id)
            .ok_or(RepositoryError::NotFound)?;
        if slot.status != read_status {
            return Err(RepositoryError::Stale);
        }
        announcement.view_count = slot.view_count;
        announcement.bookmark_count = slot.bookmark_count;
        *slot = announcement.clone();
        Ok(announcement)
    }

    async fn record_view(&self, id: AnnouncementId) -> Result<Announcement, RepositoryError> {
        let mut announcements = self.announcements.write().await;
        let announcement = announcements.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        announcement.record_view();
        Ok(announcement.clone())
    }

    async fn find_by_id(
        &self,
        id: AnnouncementId,
    ) -> Result<Option<Announcement>, RepositoryError> {
        Ok(self.announcements.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Announcement>, RepositoryError> {
        let mut announcements: Vec<Announcement> =
            self.announcements.read().await.values().cloned().collect();
        announcements.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(announcements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use domain::{
        AnnouncementPriority, AnnouncementType, ConcernStatus, ConcernType, MessageType,
        NewAnnouncement, NewConcern, NewUser, PasswordHash, UserRole,
    };

    #[tokio::test]
    async fn history_pages_backwards_from_cursor() {
        let repo = MemoryChatMessageRepository::new();
        let room_id = RoomId::generate();
        let author = UserId::generate();
        let mut ids = Vec::new();
        for n in 0..5 {
            let message = ChatMessage::new(
                MessageId::generate(),
                room_id,
                author,
                format!("m{n}"),
                MessageType::Text,
                None,
                Utc::now(),
            )
            .unwrap();
            ids.push(repo.create(message).await.unwrap().id);
        }

        let latest = repo.history(room_id, 2, None).await.unwrap();
        assert_eq!(
            latest.iter().map(|m| m.message.as_str()).collect::<Vec<_>>(),
            vec!["m4", "m3"]
        );

        let older = repo.history(room_id, 10, Some(ids[3])).await.unwrap();
        assert_eq!(
            older.iter().map(|m| m.message.as_str()).collect::<Vec<_>>(),
            vec!["m2", "m1", "m0"]
        );
    }

    #[tokio::test]
    async fn only_one_room_per_concern() {
        let repo = MemoryChatRoomRepository::new();
        let concern_id = Some(ConcernId::generate());
        let members = [UserId::generate(), UserId::generate()];
        let first = ChatRoom::open(RoomId::generate(), concern_id, members, Utc::now()).unwrap();
        let second = ChatRoom::open(RoomId::generate(), concern_id, members, Utc::now()).unwrap();

        repo.create(first).await.unwrap();
        assert_eq!(repo.create(second).await, Err(RepositoryError::Conflict));
    }

    fn student() -> User {
        User::register(
            UserId::generate(),
            NewUser {
                name: "Stu Dent".into(),
                email: "stu@campus.edu".into(),
                role: UserRole::Student,
                department_id: None,
                employee_id: None,
                student_id: Some("S-1".into()),
                phone: None,
            },
            PasswordHash::new("plain:pw").unwrap(),
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn concern_write_from_stale_read_is_rejected() {
        let repo = MemoryConcernRepository::new();
        let submitted_at = Utc::now();
        let concern = Concern::submit(
            ConcernId::generate(),
            "CN-20260101-ABCDEF".into(),
            &student(),
            NewConcern {
                subject: "Transcript".into(),
                description: "Missing grade".into(),
                concern_type: ConcernType::Academic,
                priority: None,
                department_id: DepartmentId::generate(),
            },
            submitted_at,
        )
        .unwrap();
        let stored = repo.create(concern).await.unwrap();

        // 两个请求读到同一个版本
        let mut cancelled = stored.clone();
        let mut started = stored.clone();
        cancelled
            .transition_to(ConcernStatus::Cancelled, submitted_at + Duration::seconds(1))
            .unwrap();
        started
            .transition_to(ConcernStatus::InProgress, submitted_at + Duration::seconds(2))
            .unwrap();

        repo.update(cancelled, &stored).await.unwrap();
        assert_eq!(
            repo.update(started, &stored).await,
            Err(RepositoryError::Stale)
        );
        let current = repo.find_by_id(stored.id).await.unwrap().unwrap();
        assert_eq!(current.status, ConcernStatus::Cancelled);
    }

    #[tokio::test]
    async fn touch_keeps_participants_added_meanwhile() {
        let repo = MemoryChatRoomRepository::new();
        let opened_at = Utc::now();
        let members = [UserId::generate(), UserId::generate()];
        let room = repo
            .create(ChatRoom::open(RoomId::generate(), None, members, opened_at).unwrap())
            .await
            .unwrap();

        let joiner = UserId::generate();
        let later = opened_at + Duration::seconds(5);
        let joined = repo.add_participant(room.id, joiner, later).await.unwrap();
        assert_eq!(joined.participants.len(), 3);
        let again = repo.add_participant(room.id, joiner, later).await.unwrap();
        assert_eq!(again.participants.len(), 3);

        // 较早的活跃时间不会回退
        let touched = repo.touch(room.id, opened_at + Duration::seconds(1)).await.unwrap();
        assert!(touched.is_participant(joiner));
        assert_eq!(touched.last_activity_at, later);

        assert_eq!(
            repo.touch(RoomId::generate(), later).await,
            Err(RepositoryError::NotFound)
        );
    }

    #[tokio::test]
    async fn announcement_views_survive_publish() {
        let repo = MemoryAnnouncementRepository::new();
        let now = Utc::now();
        let draft = Announcement::draft(
            AnnouncementId::generate(),
            UserId::generate(),
            NewAnnouncement {
                title: "Library".into(),
                content: "Open late".into(),
                announcement_type: AnnouncementType::General,
                priority: AnnouncementPriority::Low,
                department_id: None,
                expires_at: None,
                publish: false,
            },
            now,
        )
        .unwrap();
        let stored = repo.create(draft).await.unwrap();

        let mut published = stored.clone();
        published.publish(now).unwrap();
        for _ in 0..3 {
            repo.record_view(stored.id).await.unwrap();
        }

        let saved = repo
            .update(published.clone(), AnnouncementStatus::Draft)
            .await
            .unwrap();
        assert_eq!(saved.status, AnnouncementStatus::Published);
        assert_eq!(saved.view_count, 3);

        // 已被发布过一次，基于草稿的第二次写入失效
        assert_eq!(
            repo.update(published, AnnouncementStatus::Draft).await,
            Err(RepositoryError::Stale)
        );
        assert_eq!(repo.record_view(stored.id).await.unwrap().view_count, 4);
    }
}
