use std::sync::Arc;

use domain::reports::{
    AnnouncementReport, ConcernReport, DepartmentReport, FilterLine, ReportFilters, ReportKind,
    UserReport,
};
use domain::{Timestamp, User, UserRole};

use crate::{
    clock::Clock,
    error::ApplicationError,
    repository::{
        AnnouncementRepository, ConcernQuery, ConcernRepository, DepartmentRepository,
        UserRepository,
    },
};

#[derive(Debug, Clone)]
pub enum ReportBody {
    Announcements(AnnouncementReport),
    Concerns(ConcernReport),
    Departments(DepartmentReport),
    Users(UserReport),
}

/// 渲染所需的完整报表：标题、生成时间、过滤摘要与统计主体
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub kind: ReportKind,
    pub generated_at: Timestamp,
    pub filter_summary: Vec<FilterLine>,
    pub body: ReportBody,
}

pub struct ReportServiceDependencies {
    pub concern_repository: Arc<dyn ConcernRepository>,
    pub announcement_repository: Arc<dyn AnnouncementRepository>,
    pub department_repository: Arc<dyn DepartmentRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub clock: Arc<dyn Clock>,
}

pub struct ReportService {
    deps: ReportServiceDependencies,
}

impl ReportService {
    pub fn new(deps: ReportServiceDependencies) -> Self {
        Self { deps }
    }

    /// 院系负责人的报表固定为本院系
    pub async fn generate(
        &self,
        actor: &User,
        kind: ReportKind,
        mut filters: ReportFilters,
    ) -> Result<GeneratedReport, ApplicationError> {
        match actor.role {
            UserRole::Admin => {}
            UserRole::DepartmentHead => {
                let department_id = actor
                    .department_id
                    .ok_or_else(|| ApplicationError::forbidden("view reports"))?;
                filters.department_id = Some(department_id);
            }
            UserRole::Student | UserRole::Staff => {
                return Err(ApplicationError::forbidden("view reports"));
            }
        }

        let departments = self.deps.department_repository.list().await?;
        let filter_summary = filters.summary(|id| {
            departments
                .iter()
                .find(|department| department.id == id)
                .map(|department| department.name.clone())
        });

        let body = match kind {
            ReportKind::Announcements => {
                let announcements = self.deps.announcement_repository.list().await?;
                ReportBody::Announcements(AnnouncementReport::build(announcements, filters))
            }
            ReportKind::Concerns => {
                let concerns = self
                    .deps
                    .concern_repository
                    .list(ConcernQuery {
                        department_id: filters.department_id,
                        ..Default::default()
                    })
                    .await?;
                ReportBody::Concerns(ConcernReport::build(concerns, filters))
            }
            ReportKind::Departments => {
                let concerns = self
                    .deps
                    .concern_repository
                    .list(ConcernQuery::default())
                    .await?;
                ReportBody::Departments(DepartmentReport::build(departments, &concerns, filters))
            }
            ReportKind::Users => {
                let users = self.deps.user_repository.list().await?;
                ReportBody::Users(UserReport::build(users, filters))
            }
        };

        tracing::info!(report = kind.title(), actor = %actor.id, "生成报表");
        Ok(GeneratedReport {
            kind,
            generated_at: self.deps.clock.now(),
            filter_summary,
            body,
        })
    }
}
