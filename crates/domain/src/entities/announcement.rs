//! 公告实体

use serde::Serialize;

use crate::errors::{DomainError, DomainResult};
use crate::value_objects::{bounded_text, AnnouncementId, DepartmentId, Timestamp, UserId};

string_enum! {
    /// 公告类型
    pub enum AnnouncementType ("type") {
        General => "general",
        Academic => "academic",
        Event => "event",
        Emergency => "emergency",
    }
}

string_enum! {
    /// 公告优先级
    pub enum AnnouncementPriority ("priority") {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

string_enum! {
    /// 公告状态
    pub enum AnnouncementStatus ("status") {
        Draft => "draft",
        Published => "published",
        Archived => "archived",
    }
}

#[derive(Debug, Clone)]
pub struct NewAnnouncement {
    pub title: String,
    pub content: String,
    pub announcement_type: AnnouncementType,
    pub priority: AnnouncementPriority,
    pub department_id: Option<DepartmentId>,
    pub expires_at: Option<Timestamp>,
    pub publish: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Announcement {
    pub id: AnnouncementId,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub announcement_type: AnnouncementType,
    pub priority: AnnouncementPriority,
    pub status: AnnouncementStatus,
    pub department_id: Option<DepartmentId>,
    pub author_id: UserId,
    pub view_count: u64,
    pub bookmark_count: u64,
    pub published_at: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Announcement {
    pub fn draft(
        id: AnnouncementId,
        author_id: UserId,
        input: NewAnnouncement,
        now: Timestamp,
    ) -> DomainResult<Self> {
        let title = bounded_text("title", input.title, 255)?;
        let content = bounded_text("content", input.content, 50_000)?;
        if matches!(input.expires_at, Some(expires_at) if expires_at <= now) {
            return Err(DomainError::invalid_argument(
                "expires_at",
                "must be in the future",
            ));
        }

        let mut announcement = Self {
            id,
            title,
            content,
            announcement_type: input.announcement_type,
            priority: input.priority,
            status: AnnouncementStatus::Draft,
            department_id: input.department_id,
            author_id,
            view_count: 0,
            bookmark_count: 0,
            published_at: None,
            expires_at: input.expires_at,
            created_at: now,
        };
        if input.publish {
            announcement.publish(now)?;
        }
        Ok(announcement)
    }

    pub fn publish(&mut self, now: Timestamp) -> DomainResult<()> {
        match self.status {
            AnnouncementStatus::Draft => {
                self.status = AnnouncementStatus::Published;
                self.published_at = Some(now);
                Ok(())
            }
            AnnouncementStatus::Published => Ok(()),
            AnnouncementStatus::Archived => Err(DomainError::business_rule_violation(
                "archived announcements cannot be published",
            )),
        }
    }

    /// 已发布且未过期
    pub fn is_visible(&self, now: Timestamp) -> bool {
        self.status == AnnouncementStatus::Published
            && self.expires_at.map_or(true, |expires_at| expires_at > now)
    }

    pub fn record_view(&mut self) {
        self.view_count = self.view_count.saturating_add(1);
    }
}
