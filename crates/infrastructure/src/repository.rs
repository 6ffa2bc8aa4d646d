use std::str::FromStr;

use application::repository::{
    AnnouncementRepository, ChatMessageRepository, ChatRoomRepository, ConcernQuery,
    ConcernRepository, DepartmentRepository, UserRepository,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    Announcement, AnnouncementId, AnnouncementStatus, ChatMessage, ChatRoom, Concern, ConcernId,
    Department, DepartmentId, MessageId, PasswordHash, RepositoryError, RoomId, Timestamp, User,
    UserEmail, UserId,
};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Conflict,
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        _ => RepositoryError::storage(err.to_string()),
    }
}

/// 条件更新没有命中时区分记录不存在与记录已被修改
async fn missing_or_stale(pool: &PgPool, table: &str, id: Uuid) -> RepositoryError {
    let sql = format!("SELECT EXISTS (SELECT 1 FROM {table} WHERE id = $1)");
    match sqlx::query_scalar::<_, bool>(&sql).bind(id).fetch_one(pool).await {
        Ok(true) => RepositoryError::Stale,
        Ok(false) => RepositoryError::NotFound,
        Err(err) => map_sqlx_err(err),
    }
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

/// 文本列解析为领域枚举
fn parse_column<T>(value: &str) -> Result<T, RepositoryError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|err: T::Err| invalid_data(err.to_string()))
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, department_id, employee_id, \
     student_id, phone, is_active, preferences, last_login_at, created_at, updated_at";

#[derive(Debug, FromRow)]
struct UserRecord {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    department_id: Option<Uuid>,
    employee_id: Option<String>,
    student_id: Option<String>,
    phone: Option<String>,
    is_active: bool,
    preferences: serde_json::Value,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRecord> for User {
    type Error = RepositoryError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        let email = UserEmail::parse(value.email).map_err(|err| invalid_data(err.to_string()))?;
        let password =
            PasswordHash::new(value.password_hash).map_err(|err| invalid_data(err.to_string()))?;

        Ok(User {
            id: UserId::from(value.id),
            name: value.name,
            email,
            password,
            role: parse_column(&value.role)?,
            department_id: value.department_id.map(DepartmentId::from),
            employee_id: value.employee_id,
            student_id: value.student_id,
            phone: value.phone,
            is_active: value.is_active,
            preferences: value.preferences,
            last_login_at: value.last_login_at,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct DepartmentRecord {
    id: Uuid,
    name: String,
    code: String,
    #[sqlx(rename = "type")]
    department_type: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<DepartmentRecord> for Department {
    type Error = RepositoryError;

    fn try_from(value: DepartmentRecord) -> Result<Self, Self::Error> {
        Ok(Department {
            id: DepartmentId::from(value.id),
            name: value.name,
            code: value.code,
            department_type: parse_column(&value.department_type)?,
            is_active: value.is_active,
            created_at: value.created_at,
        })
    }
}

const CONCERN_COLUMNS: &str = "id, reference_number, subject, description, type, priority, \
     status, department_id, student_id, assigned_to, resolved_at, escalated_at, \
     escalation_level, created_at, updated_at";

#[derive(Debug, FromRow)]
struct ConcernRecord {
    id: Uuid,
    reference_number: String,
    subject: String,
    description: String,
    #[sqlx(rename = "type")]
    concern_type: String,
    priority: String,
    status: String,
    department_id: Uuid,
    student_id: Uuid,
    assigned_to: Option<Uuid>,
    resolved_at: Option<DateTime<Utc>>,
    escalated_at: Option<DateTime<Utc>>,
    escalation_level: i16,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ConcernRecord> for Concern {
    type Error = RepositoryError;

    fn try_from(value: ConcernRecord) -> Result<Self, Self::Error> {
        let escalation_level = u8::try_from(value.escalation_level)
            .map_err(|_| invalid_data(format!("escalation level {}", value.escalation_level)))?;

        Ok(Concern {
            id: ConcernId::from(value.id),
            reference_number: value.reference_number,
            subject: value.subject,
            description: value.description,
            concern_type: parse_column(&value.concern_type)?,
            priority: parse_column(&value.priority)?,
            status: parse_column(&value.status)?,
            department_id: DepartmentId::from(value.department_id),
            student_id: UserId::from(value.student_id),
            assigned_to: value.assigned_to.map(UserId::from),
            resolved_at: value.resolved_at,
            escalated_at: value.escalated_at,
            escalation_level,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct RoomRecord {
    id: Uuid,
    concern_id: Option<Uuid>,
    participants: Vec<Uuid>,
    last_activity_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<RoomRecord> for ChatRoom {
    fn from(value: RoomRecord) -> Self {
        ChatRoom {
            id: RoomId::from(value.id),
            concern_id: value.concern_id.map(ConcernId::from),
            participants: value.participants.into_iter().map(UserId::from).collect(),
            last_activity_at: value.last_activity_at,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MessageRecord {
    id: Uuid,
    room_id: Uuid,
    author_id: Uuid,
    message: String,
    message_type: String,
    reply_to: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRecord> for ChatMessage {
    type Error = RepositoryError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        Ok(ChatMessage {
            id: MessageId::from(value.id),
            room_id: RoomId::from(value.room_id),
            author_id: UserId::from(value.author_id),
            message: value.message,
            message_type: parse_column(&value.message_type)?,
            reply_to: value.reply_to.map(MessageId::from),
            created_at: value.created_at,
        })
    }
}

const ANNOUNCEMENT_COLUMNS: &str = "id, title, content, type, priority, status, department_id, \
     author_id, view_count, bookmark_count, published_at, expires_at, created_at";

#[derive(Debug, FromRow)]
struct AnnouncementRecord {
    id: Uuid,
    title: String,
    content: String,
    #[sqlx(rename = "type")]
    announcement_type: String,
    priority: String,
    status: String,
    department_id: Option<Uuid>,
    author_id: Uuid,
    view_count: i64,
    bookmark_count: i64,
    published_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AnnouncementRecord> for Announcement {
    type Error = RepositoryError;

    fn try_from(value: AnnouncementRecord) -> Result<Self, Self::Error> {
        Ok(Announcement {
            id: AnnouncementId::from(value.id),
            title: value.title,
            content: value.content,
            announcement_type: parse_column(&value.announcement_type)?,
            priority: parse_column(&value.priority)?,
            status: parse_column(&value.status)?,
            department_id: value.department_id.map(DepartmentId::from),
            author_id: UserId::from(value.author_id),
            view_count: value.view_count.max(0) as u64,
            bookmark_count: value.bookmark_count.max(0) as u64,
            published_at: value.published_at,
            expires_at: value.expires_at,
            created_at: value.created_at,
        })
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO users ({USER_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {USER_COLUMNS}
            "#
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(Uuid::from(user.id))
            .bind(&user.name)
            .bind(user.email.as_str())
            .bind(user.password.as_str())
            .bind(user.role.as_str())
            .bind(user.department_id.map(Uuid::from))
            .bind(&user.employee_id)
            .bind(&user.student_id)
            .bind(&user.phone)
            .bind(user.is_active)
            .bind(&user.preferences)
            .bind(user.last_login_at)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        User::try_from(record)
    }

    async fn update(&self, user: User) -> Result<User, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE users
            SET name = $2, email = $3, password_hash = $4, role = $5, department_id = $6,
                employee_id = $7, student_id = $8, phone = $9, is_active = $10,
                preferences = $11, last_login_at = $12, updated_at = $13
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(Uuid::from(user.id))
            .bind(&user.name)
            .bind(user.email.as_str())
            .bind(user.password.as_str())
            .bind(user.role.as_str())
            .bind(user.department_id.map(Uuid::from))
            .bind(&user.employee_id)
            .bind(&user.student_id)
            .bind(&user.phone)
            .bind(user.is_active)
            .bind(&user.preferences)
            .bind(user.last_login_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        User::try_from(record)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &UserEmail) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY name");
        let records = sqlx::query_as::<_, UserRecord>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        records.into_iter().map(User::try_from).collect()
    }
}

#[derive(Clone)]
pub struct PgDepartmentRepository {
    pool: PgPool,
}

impl PgDepartmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DepartmentRepository for PgDepartmentRepository {
    async fn create(&self, department: Department) -> Result<Department, RepositoryError> {
        let record = sqlx::query_as::<_, DepartmentRecord>(
            r#"
            INSERT INTO departments (id, name, code, type, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, code, type, is_active, created_at
            "#,
        )
        .bind(Uuid::from(department.id))
        .bind(&department.name)
        .bind(&department.code)
        .bind(department.department_type.as_str())
        .bind(department.is_active)
        .bind(department.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Department::try_from(record)
    }

    async fn find_by_id(&self, id: DepartmentId) -> Result<Option<Department>, RepositoryError> {
        let record = sqlx::query_as::<_, DepartmentRecord>(
            r#"SELECT id, name, code, type, is_active, created_at FROM departments WHERE id = $1"#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Department::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<Department>, RepositoryError> {
        let records = sqlx::query_as::<_, DepartmentRecord>(
            r#"SELECT id, name, code, type, is_active, created_at FROM departments ORDER BY name"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Department::try_from).collect()
    }
}

#[derive(Clone)]
pub struct PgConcernRepository {
    pool: PgPool,
}

impl PgConcernRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConcernRepository for PgConcernRepository {
    async fn create(&self, concern: Concern) -> Result<Concern, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO concerns ({CONCERN_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {CONCERN_COLUMNS}
            "#
        );
        let record = sqlx::query_as::<_, ConcernRecord>(&sql)
            .bind(Uuid::from(concern.id))
            .bind(&concern.reference_number)
            .bind(&concern.subject)
            .bind(&concern.description)
            .bind(concern.concern_type.as_str())
            .bind(concern.priority.as_str())
            .bind(concern.status.as_str())
            .bind(Uuid::from(concern.department_id))
            .bind(Uuid::from(concern.student_id))
            .bind(concern.assigned_to.map(Uuid::from))
            .bind(concern.resolved_at)
            .bind(concern.escalated_at)
            .bind(i16::from(concern.escalation_level))
            .bind(concern.created_at)
            .bind(concern.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Concern::try_from(record)
    }

    async fn update(&self, concern: Concern, read: &Concern) -> Result<Concern, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE concerns
            SET priority = $2, status = $3, assigned_to = $4, resolved_at = $5,
                escalated_at = $6, escalation_level = $7, updated_at = $8
            WHERE id = $1
              AND priority = $9 AND status = $10
              AND assigned_to IS NOT DISTINCT FROM $11::uuid
              AND escalation_level = $12 AND updated_at = $13
            RETURNING {CONCERN_COLUMNS}
            "#
        );
        let record = sqlx::query_as::<_, ConcernRecord>(&sql)
            .bind(Uuid::from(concern.id))
            .bind(concern.priority.as_str())
            .bind(concern.status.as_str())
            .bind(concern.assigned_to.map(Uuid::from))
            .bind(concern.resolved_at)
            .bind(concern.escalated_at)
            .bind(i16::from(concern.escalation_level))
            .bind(concern.updated_at)
            .bind(read.priority.as_str())
            .bind(read.status.as_str())
            .bind(read.assigned_to.map(Uuid::from))
            .bind(i16::from(read.escalation_level))
            .bind(read.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        match record {
            Some(record) => Concern::try_from(record),
            None => Err(missing_or_stale(&self.pool, "concerns", Uuid::from(concern.id)).await),
        }
    }

    async fn find_by_id(&self, id: ConcernId) -> Result<Option<Concern>, RepositoryError> {
        let sql = format!("SELECT {CONCERN_COLUMNS} FROM concerns WHERE id = $1");
        let record = sqlx::query_as::<_, ConcernRecord>(&sql)
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        record.map(Concern::try_from).transpose()
    }

    async fn list(&self, query: ConcernQuery) -> Result<Vec<Concern>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {CONCERN_COLUMNS} FROM concerns
            WHERE ($1::uuid IS NULL OR student_id = $1)
              AND ($2::uuid IS NULL OR department_id = $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY created_at DESC
            "#
        );
        let records = sqlx::query_as::<_, ConcernRecord>(&sql)
            .bind(query.student_id.map(Uuid::from))
            .bind(query.department_id.map(Uuid::from))
            .bind(query.status.map(|status| status.as_str()))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        records.into_iter().map(Concern::try_from).collect()
    }
}

#[derive(Clone)]
pub struct PgChatRoomRepository {
    pool: PgPool,
}

impl PgChatRoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn participant_ids(room: &ChatRoom) -> Vec<Uuid> {
    room.participants.iter().copied().map(Uuid::from).collect()
}

#[async_trait]
impl ChatRoomRepository for PgChatRoomRepository {
    async fn create(&self, room: ChatRoom) -> Result<ChatRoom, RepositoryError> {
        let record = sqlx::query_as::<_, RoomRecord>(
            r#"
            INSERT INTO chat_rooms (id, concern_id, participants, last_activity_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, concern_id, participants, last_activity_at, created_at
            "#,
        )
        .bind(Uuid::from(room.id))
        .bind(room.concern_id.map(Uuid::from))
        .bind(participant_ids(&room))
        .bind(room.last_activity_at)
        .bind(room.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(ChatRoom::from(record))
    }

    async fn add_participant(
        &self,
        room_id: RoomId,
        user_id: UserId,
        at: Timestamp,
    ) -> Result<ChatRoom, RepositoryError> {
        let record = sqlx::query_as::<_, RoomRecord>(
            r#"
            UPDATE chat_rooms
            SET participants = CASE
                    WHEN $2::uuid = ANY(participants) THEN participants
                    ELSE array_append(participants, $2::uuid)
                END,
                last_activity_at = GREATEST(last_activity_at, $3)
            WHERE id = $1
            RETURNING id, concern_id, participants, last_activity_at, created_at
            "#,
        )
        .bind(Uuid::from(room_id))
        .bind(Uuid::from(user_id))
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(ChatRoom::from).ok_or(RepositoryError::NotFound)
    }

    async fn touch(&self, room_id: RoomId, at: Timestamp) -> Result<ChatRoom, RepositoryError> {
        let record = sqlx::query_as::<_, RoomRecord>(
            r#"
            UPDATE chat_rooms
            SET last_activity_at = GREATEST(last_activity_at, $2)
            WHERE id = $1
            RETURNING id, concern_id, participants, last_activity_at, created_at
            "#,
        )
        .bind(Uuid::from(room_id))
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(ChatRoom::from).ok_or(RepositoryError::NotFound)
    }

    async fn find_by_id(&self, id: RoomId) -> Result<Option<ChatRoom>, RepositoryError> {
        let record = sqlx::query_as::<_, RoomRecord>(
            r#"SELECT id, concern_id, participants, last_activity_at, created_at FROM chat_rooms WHERE id = $1"#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.map(ChatRoom::from))
    }

    async fn find_by_concern(
        &self,
        concern_id: ConcernId,
    ) -> Result<Option<ChatRoom>, RepositoryError> {
        let record = sqlx::query_as::<_, RoomRecord>(
            r#"SELECT id, concern_id, participants, last_activity_at, created_at FROM chat_rooms WHERE concern_id = $1"#,
        )
        .bind(Uuid::from(concern_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.map(ChatRoom::from))
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<ChatRoom>, RepositoryError> {
        let records = sqlx::query_as::<_, RoomRecord>(
            r#"
            SELECT id, concern_id, participants, last_activity_at, created_at
            FROM chat_rooms
            WHERE $1 = ANY(participants)
            ORDER BY last_activity_at DESC
            "#,
        )
        .bind(Uuid::from(user_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(ChatRoom::from).collect())
    }
}

#[derive(Clone)]
pub struct PgChatMessageRepository {
    pool: PgPool,
}

impl PgChatMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatMessageRepository for PgChatMessageRepository {
    async fn create(&self, message: ChatMessage) -> Result<ChatMessage, RepositoryError> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            INSERT INTO chat_messages (id, room_id, author_id, message, message_type, reply_to, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, room_id, author_id, message, message_type, reply_to, created_at
            "#,
        )
        .bind(Uuid::from(message.id))
        .bind(Uuid::from(message.room_id))
        .bind(Uuid::from(message.author_id))
        .bind(&message.message)
        .bind(message.message_type.as_str())
        .bind(message.reply_to.map(Uuid::from))
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        ChatMessage::try_from(record)
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Option<ChatMessage>, RepositoryError> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"SELECT id, room_id, author_id, message, message_type, reply_to, created_at FROM chat_messages WHERE id = $1"#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(ChatMessage::try_from).transpose()
    }

    async fn history(
        &self,
        room_id: RoomId,
        limit: u32,
        before: Option<MessageId>,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        // 游标不存在时等同于无游标
        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, room_id, author_id, message, message_type, reply_to, created_at
            FROM chat_messages
            WHERE room_id = $1
              AND seq < COALESCE(
                    (SELECT seq FROM chat_messages WHERE id = $2 AND room_id = $1),
                    9223372036854775807
                  )
            ORDER BY seq DESC
            LIMIT $3
            "#,
        )
        .bind(Uuid::from(room_id))
        .bind(before.map(Uuid::from))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(ChatMessage::try_from).collect()
    }
}

#[derive(Clone)]
pub struct PgAnnouncementRepository {
    pool: PgPool,
}

impl PgAnnouncementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnnouncementRepository for PgAnnouncementRepository {
    async fn create(&self, announcement: Announcement) -> Result<Announcement, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO announcements ({ANNOUNCEMENT_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {ANNOUNCEMENT_COLUMNS}
            "#
        );
        let record = sqlx::query_as::<_, AnnouncementRecord>(&sql)
            .bind(Uuid::from(announcement.id))
            .bind(&announcement.title)
            .bind(&announcement.content)
            .bind(announcement.announcement_type.as_str())
            .bind(announcement.priority.as_str())
            .bind(announcement.status.as_str())
            .bind(announcement.department_id.map(Uuid::from))
            .bind(Uuid::from(announcement.author_id))
            .bind(announcement.view_count as i64)
            .bind(announcement.bookmark_count as i64)
            .bind(announcement.published_at)
            .bind(announcement.expires_at)
            .bind(announcement.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Announcement::try_from(record)
    }

    async fn update(
        &self,
        announcement: Announcement,
        read_status: AnnouncementStatus,
    ) -> Result<Announcement, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE announcements
            SET title = $2, content = $3, priority = $4, status = $5,
                published_at = $6, expires_at = $7
            WHERE id = $1 AND status = $8
            RETURNING {ANNOUNCEMENT_COLUMNS}
            "#
        );
        let record = sqlx::query_as::<_, AnnouncementRecord>(&sql)
            .bind(Uuid::from(announcement.id))
            .bind(&announcement.title)
            .bind(&announcement.content)
            .bind(announcement.priority.as_str())
            .bind(announcement.status.as_str())
            .bind(announcement.published_at)
            .bind(announcement.expires_at)
            .bind(read_status.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        match record {
            Some(record) => Announcement::try_from(record),
            None => {
                Err(missing_or_stale(&self.pool, "announcements", Uuid::from(announcement.id)).await)
            }
        }
    }

    async fn record_view(&self, id: AnnouncementId) -> Result<Announcement, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE announcements SET view_count = view_count + 1
            WHERE id = $1
            RETURNING {ANNOUNCEMENT_COLUMNS}
            "#
        );
        let record = sqlx::query_as::<_, AnnouncementRecord>(&sql)
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        record
            .ok_or(RepositoryError::NotFound)
            .and_then(Announcement::try_from)
    }

    async fn find_by_id(
        &self,
        id: AnnouncementId,
    ) -> Result<Option<Announcement>, RepositoryError> {
        let sql = format!("SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements WHERE id = $1");
        let record = sqlx::query_as::<_, AnnouncementRecord>(&sql)
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        record.map(Announcement::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<Announcement>, RepositoryError> {
        let sql = format!("SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements ORDER BY created_at DESC");
        let records = sqlx::query_as::<_, AnnouncementRecord>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        records.into_iter().map(Announcement::try_from).collect()
    }
}

/// 所有 Postgres 仓储的集合
#[derive(Clone)]
pub struct PgStorage {
    pub pool: PgPool,
    pub user_repository: PgUserRepository,
    pub department_repository: PgDepartmentRepository,
    pub concern_repository: PgConcernRepository,
    pub room_repository: PgChatRoomRepository,
    pub message_repository: PgChatMessageRepository,
    pub announcement_repository: PgAnnouncementRepository,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self {
            user_repository: PgUserRepository::new(pool.clone()),
            department_repository: PgDepartmentRepository::new(pool.clone()),
            concern_repository: PgConcernRepository::new(pool.clone()),
            room_repository: PgChatRoomRepository::new(pool.clone()),
            message_repository: PgChatMessageRepository::new(pool.clone()),
            announcement_repository: PgAnnouncementRepository::new(pool.clone()),
            pool,
        }
    }
}

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
