use std::sync::Arc;

use domain::{Announcement, AnnouncementId, DomainError, NewAnnouncement, User, UserRole};

use crate::{
    clock::Clock,
    error::ApplicationError,
    repository::{AnnouncementRepository, DepartmentRepository},
};

pub struct AnnouncementServiceDependencies {
    pub announcement_repository: Arc<dyn AnnouncementRepository>,
    pub department_repository: Arc<dyn DepartmentRepository>,
    pub clock: Arc<dyn Clock>,
}

pub struct AnnouncementService {
    deps: AnnouncementServiceDependencies,
}

impl AnnouncementService {
    pub fn new(deps: AnnouncementServiceDependencies) -> Self {
        Self { deps }
    }

    /// 管理员可面向全校或任一院系发布；院系负责人只能面向本院系
    pub async fn create(
        &self,
        actor: &User,
        mut input: NewAnnouncement,
    ) -> Result<Announcement, ApplicationError> {
        match actor.role {
            UserRole::Admin => {}
            UserRole::DepartmentHead => {
                if input.department_id.is_some() && input.department_id != actor.department_id {
                    return Err(ApplicationError::forbidden(
                        "announce to another department",
                    ));
                }
                input.department_id = actor.department_id;
            }
            UserRole::Student | UserRole::Staff => {
                return Err(ApplicationError::forbidden("create announcements"));
            }
        }

        if let Some(department_id) = input.department_id {
            self.deps
                .department_repository
                .find_by_id(department_id)
                .await?
                .ok_or_else(|| DomainError::invalid_argument("department_id", "unknown department"))?;
        }

        let announcement = Announcement::draft(
            AnnouncementId::generate(),
            actor.id,
            input,
            self.deps.clock.now(),
        )?;
        let stored = self
            .deps
            .announcement_repository
            .create(announcement)
            .await?;
        tracing::info!(announcement_id = %stored.id, status = %stored.status, author = %actor.id, "创建公告");
        Ok(stored)
    }

    pub async fn publish(
        &self,
        actor: &User,
        id: AnnouncementId,
    ) -> Result<Announcement, ApplicationError> {
        let mut announcement = self.load(id).await?;
        if !Self::can_manage(actor, &announcement) {
            return Err(ApplicationError::forbidden("publish this announcement"));
        }

        let read_status = announcement.status;
        announcement.publish(self.deps.clock.now())?;
        let announcement = self
            .deps
            .announcement_repository
            .update(announcement, read_status)
            .await?;
        tracing::info!(announcement_id = %announcement.id, "公告已发布");
        Ok(announcement)
    }

    /// 当前可见的公告：全校公告加上本院系公告，管理员可见全部院系
    pub async fn list_visible(&self, actor: &User) -> Result<Vec<Announcement>, ApplicationError> {
        let now = self.deps.clock.now();
        let announcements = self.deps.announcement_repository.list().await?;
        Ok(announcements
            .into_iter()
            .filter(|announcement| announcement.is_visible(now))
            .filter(|announcement| Self::is_audience(actor, announcement))
            .collect())
    }

    /// 查看单条公告并累计浏览次数
    pub async fn view(
        &self,
        actor: &User,
        id: AnnouncementId,
    ) -> Result<Announcement, ApplicationError> {
        let announcement = self.load(id).await?;
        let now = self.deps.clock.now();
        let readable = (announcement.is_visible(now) && Self::is_audience(actor, &announcement))
            || Self::can_manage(actor, &announcement);
        if !readable {
            return Err(ApplicationError::not_found("announcement"));
        }

        Ok(self
            .deps
            .announcement_repository
            .record_view(announcement.id)
            .await?)
    }

    async fn load(&self, id: AnnouncementId) -> Result<Announcement, ApplicationError> {
        self.deps
            .announcement_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("announcement"))
    }

    fn is_audience(actor: &User, announcement: &Announcement) -> bool {
        actor.is_admin()
            || announcement.department_id.is_none()
            || announcement.department_id == actor.department_id
    }

    fn can_manage(actor: &User, announcement: &Announcement) -> bool {
        actor.is_admin()
            || announcement.author_id == actor.id
            || (actor.role == UserRole::DepartmentHead
                && announcement.department_id.is_some()
                && announcement.department_id == actor.department_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::Fixture;
    use domain::{AnnouncementPriority, AnnouncementStatus, AnnouncementType, DepartmentId};

    fn service(fixture: &Fixture) -> AnnouncementService {
        AnnouncementService::new(AnnouncementServiceDependencies {
            announcement_repository: fixture.announcements.clone(),
            department_repository: fixture.departments.clone(),
            clock: fixture.clock.clone(),
        })
    }

    fn input(department_id: Option<DepartmentId>, publish: bool) -> NewAnnouncement {
        NewAnnouncement {
            title: "Enrollment opens".into(),
            content: "Enrollment for the next term opens Monday.".into(),
            announcement_type: AnnouncementType::Academic,
            priority: AnnouncementPriority::High,
            department_id,
            expires_at: None,
            publish,
        }
    }

    #[tokio::test]
    async fn head_announcements_are_scoped_to_own_department() {
        let fixture = Fixture::new();
        let eng = fixture.department("Engineering", "ENG").await;
        let reg = fixture.department("Registrar", "REG").await;
        let head = fixture.user("Head", UserRole::DepartmentHead, Some(&eng)).await;
        let service = service(&fixture);

        let created = service.create(&head, input(None, false)).await.unwrap();
        assert_eq!(created.department_id, Some(eng.id));
        assert_eq!(created.status, AnnouncementStatus::Draft);

        assert!(service.create(&head, input(Some(reg.id), true)).await.is_err());
    }

    #[tokio::test]
    async fn drafts_are_hidden_until_published() {
        let fixture = Fixture::new();
        let eng = fixture.department("Engineering", "ENG").await;
        let admin = fixture.user("Root", UserRole::Admin, None).await;
        let student = fixture.user("Stu", UserRole::Student, None).await;
        let staff = fixture.user("Staff", UserRole::Staff, Some(&eng)).await;
        let service = service(&fixture);

        let draft = service.create(&admin, input(None, false)).await.unwrap();
        service.create(&admin, input(Some(eng.id), true)).await.unwrap();

        assert!(service.list_visible(&student).await.unwrap().is_empty());
        assert_eq!(service.list_visible(&staff).await.unwrap().len(), 1);
        assert!(service.view(&student, draft.id).await.is_err());

        service.publish(&admin, draft.id).await.unwrap();
        assert_eq!(service.list_visible(&student).await.unwrap().len(), 1);
        assert_eq!(service.list_visible(&staff).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn viewing_counts_and_expiry_hides() {
        let fixture = Fixture::new();
        let admin = fixture.user("Root", UserRole::Admin, None).await;
        let student = fixture.user("Stu", UserRole::Student, None).await;
        let service = service(&fixture);

        let mut expiring = input(None, true);
        expiring.expires_at = Some(fixture.clock_now() + chrono::Duration::hours(1));
        let announcement = service.create(&admin, expiring).await.unwrap();

        service.view(&student, announcement.id).await.unwrap();
        let viewed = service.view(&student, announcement.id).await.unwrap();
        assert_eq!(viewed.view_count, 2);

        fixture.clock.advance(chrono::Duration::hours(2));
        assert!(service.list_visible(&student).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn students_cannot_announce() {
        let fixture = Fixture::new();
        let student = fixture.user("Stu", UserRole::Student, None).await;
        assert!(service(&fixture)
            .create(&student, input(None, true))
            .await
            .is_err());
    }
}
