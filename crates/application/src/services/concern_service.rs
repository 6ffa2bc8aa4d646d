use std::sync::Arc;

use domain::{
    Concern, ConcernAction, ConcernId, ConcernStatus, ConcernUpdated, DomainError, NewConcern,
    RepositoryError, User, UserId, UserRole,
};
use rand::distr::Alphanumeric;
use rand::Rng;

use crate::{
    broadcaster::{dispatch, EventBroadcaster},
    clock::Clock,
    error::ApplicationError,
    repository::{ConcernQuery, ConcernRepository, DepartmentRepository, UserRepository},
};

/// 编号冲突时的最大重试次数
const REFERENCE_ATTEMPTS: usize = 3;

pub struct ConcernServiceDependencies {
    pub concern_repository: Arc<dyn ConcernRepository>,
    pub department_repository: Arc<dyn DepartmentRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub broadcaster: Arc<dyn EventBroadcaster>,
    pub clock: Arc<dyn Clock>,
}

pub struct ConcernService {
    deps: ConcernServiceDependencies,
}

impl ConcernService {
    pub fn new(deps: ConcernServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn submit(
        &self,
        student: &User,
        input: NewConcern,
    ) -> Result<Concern, ApplicationError> {
        let department = self
            .deps
            .department_repository
            .find_by_id(input.department_id)
            .await?
            .ok_or_else(|| DomainError::invalid_argument("department_id", "unknown department"))?;
        if !department.is_active {
            return Err(DomainError::invalid_argument(
                "department_id",
                "department is not accepting concerns",
            )
            .into());
        }

        let now = self.deps.clock.now();
        let mut attempts = 0;
        let stored = loop {
            attempts += 1;
            let reference = Concern::reference_for(now, &reference_suffix());
            let concern =
                Concern::submit(ConcernId::generate(), reference, student, input.clone(), now)?;
            match self.deps.concern_repository.create(concern).await {
                Ok(stored) => break stored,
                Err(RepositoryError::Conflict) if attempts < REFERENCE_ATTEMPTS => continue,
                Err(err) => return Err(err.into()),
            }
        };

        tracing::info!(
            concern_id = %stored.id,
            reference = %stored.reference_number,
            department_id = %stored.department_id,
            "提交诉求"
        );
        self.notify(&stored, ConcernAction::Created).await;
        Ok(stored)
    }

    /// 学生看自己的，院系人员看本院系的，管理员看全部
    pub async fn list_for(
        &self,
        actor: &User,
        status: Option<ConcernStatus>,
    ) -> Result<Vec<Concern>, ApplicationError> {
        let mut query = ConcernQuery {
            status,
            ..Default::default()
        };
        match actor.role {
            UserRole::Admin => {}
            UserRole::Student => query.student_id = Some(actor.id),
            UserRole::Staff | UserRole::DepartmentHead => match actor.department_id {
                Some(department_id) => query.department_id = Some(department_id),
                None => return Ok(Vec::new()),
            },
        }
        Ok(self.deps.concern_repository.list(query).await?)
    }

    pub async fn get(&self, actor: &User, id: ConcernId) -> Result<Concern, ApplicationError> {
        let concern = self.load(id).await?;
        if !concern.is_visible_to(actor) {
            return Err(ApplicationError::forbidden("view this concern"));
        }
        Ok(concern)
    }

    pub async fn update_status(
        &self,
        actor: &User,
        id: ConcernId,
        status: ConcernStatus,
    ) -> Result<Concern, ApplicationError> {
        let mut concern = self.load(id).await?;
        if !concern.can_be_handled_by(actor) {
            return Err(ApplicationError::forbidden("update this concern"));
        }

        let read = concern.clone();
        concern.transition_to(status, self.deps.clock.now())?;
        let concern = self.deps.concern_repository.update(concern, &read).await?;
        let from = read.status;

        tracing::info!(concern_id = %concern.id, %from, to = %concern.status, actor = %actor.id, "诉求状态变更");
        self.notify(&concern, ConcernAction::StatusChanged).await;
        Ok(concern)
    }

    pub async fn assign(
        &self,
        actor: &User,
        id: ConcernId,
        assignee_id: UserId,
    ) -> Result<Concern, ApplicationError> {
        let mut concern = self.load(id).await?;
        Self::ensure_supervisor(actor, &concern, "assign this concern")?;

        let assignee = self
            .deps
            .user_repository
            .find_by_id(assignee_id)
            .await?
            .ok_or_else(|| DomainError::invalid_argument("assignee", "unknown user"))?;
        let read = concern.clone();
        concern.assign_to(&assignee, self.deps.clock.now())?;
        let concern = self.deps.concern_repository.update(concern, &read).await?;

        tracing::info!(concern_id = %concern.id, assignee = %assignee.id, actor = %actor.id, "诉求已分派");
        self.notify(&concern, ConcernAction::Assigned).await;
        Ok(concern)
    }

    pub async fn escalate(&self, actor: &User, id: ConcernId) -> Result<Concern, ApplicationError> {
        let mut concern = self.load(id).await?;
        Self::ensure_supervisor(actor, &concern, "escalate this concern")?;

        let read = concern.clone();
        concern.escalate(self.deps.clock.now())?;
        let concern = self.deps.concern_repository.update(concern, &read).await?;

        tracing::info!(
            concern_id = %concern.id,
            level = concern.escalation_level,
            priority = %concern.priority,
            "诉求升级"
        );
        self.notify(&concern, ConcernAction::Escalated).await;
        Ok(concern)
    }

    async fn load(&self, id: ConcernId) -> Result<Concern, ApplicationError> {
        self.deps
            .concern_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("concern"))
    }

    /// 管理员或本院系负责人
    fn ensure_supervisor(
        actor: &User,
        concern: &Concern,
        action: &str,
    ) -> Result<(), ApplicationError> {
        let allowed = actor.is_admin()
            || (actor.role == UserRole::DepartmentHead && actor.works_in(concern.department_id));
        if allowed {
            Ok(())
        } else {
            Err(ApplicationError::forbidden(action))
        }
    }

    async fn notify(&self, concern: &Concern, action: ConcernAction) {
        let event = ConcernUpdated::new(concern.clone(), action, self.deps.clock.now());
        dispatch(self.deps.broadcaster.as_ref(), &event).await;
    }
}

fn reference_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect()
}
