use std::sync::Arc;

use domain::{Department, DepartmentId, DepartmentType, DomainError, RepositoryError, User};

use crate::{clock::Clock, error::ApplicationError, repository::DepartmentRepository};

#[derive(Debug, Clone)]
pub struct CreateDepartmentRequest {
    pub name: String,
    pub code: String,
    pub department_type: DepartmentType,
}

pub struct DepartmentServiceDependencies {
    pub department_repository: Arc<dyn DepartmentRepository>,
    pub clock: Arc<dyn Clock>,
}

pub struct DepartmentService {
    deps: DepartmentServiceDependencies,
}

impl DepartmentService {
    pub fn new(deps: DepartmentServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn create(
        &self,
        actor: &User,
        request: CreateDepartmentRequest,
    ) -> Result<Department, ApplicationError> {
        if !actor.is_admin() {
            return Err(ApplicationError::forbidden("create departments"));
        }
        let department = Department::new(
            DepartmentId::generate(),
            request.name,
            request.code,
            request.department_type,
            self.deps.clock.now(),
        )?;
        let code = department.code.clone();

        match self.deps.department_repository.create(department).await {
            Ok(stored) => {
                tracing::info!(department_id = %stored.id, code = %stored.code, "创建院系");
                Ok(stored)
            }
            Err(RepositoryError::Conflict) => {
                Err(DomainError::already_exists("department", code).into())
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn list(&self) -> Result<Vec<Department>, ApplicationError> {
        Ok(self.deps.department_repository.list().await?)
    }
}
