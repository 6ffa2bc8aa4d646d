use std::sync::Arc;

use domain::{DepartmentId, DomainError, NewUser, RepositoryError, User, UserId, UserRole};

use crate::{
    clock::Clock,
    error::ApplicationError,
    password::PasswordHasher,
    repository::{DepartmentRepository, UserRepository},
};

/// 密码最短长度
const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub department_id: Option<DepartmentId>,
    pub employee_id: Option<String>,
    pub student_id: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UserListFilter {
    pub role: Option<UserRole>,
    pub department_id: Option<DepartmentId>,
}

pub struct UserServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub department_repository: Arc<dyn DepartmentRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
}

pub struct UserService {
    deps: UserServiceDependencies,
}

impl UserService {
    pub fn new(deps: UserServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn create_user(
        &self,
        actor: &User,
        request: CreateUserRequest,
    ) -> Result<User, ApplicationError> {
        if !actor.is_admin() {
            return Err(ApplicationError::forbidden("create users"));
        }
        if request.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(DomainError::invalid_argument(
                "password",
                format!("must be at least {MIN_PASSWORD_CHARS} characters"),
            )
            .into());
        }
        if let Some(department_id) = request.department_id {
            self.deps
                .department_repository
                .find_by_id(department_id)
                .await?
                .ok_or_else(|| DomainError::invalid_argument("department_id", "unknown department"))?;
        }

        let password = self.deps.password_hasher.hash(&request.password).await?;
        let email = request.email.clone();
        let user = User::register(
            UserId::generate(),
            NewUser {
                name: request.name,
                email: request.email,
                role: request.role,
                department_id: request.department_id,
                employee_id: request.employee_id,
                student_id: request.student_id,
                phone: request.phone,
            },
            password,
            self.deps.clock.now(),
        )?;

        let stored = match self.deps.user_repository.create(user).await {
            Ok(stored) => stored,
            Err(RepositoryError::Conflict) => {
                return Err(DomainError::already_exists("user", email.trim().to_lowercase()).into())
            }
            Err(err) => return Err(err.into()),
        };
        tracing::info!(user_id = %stored.id, role = %stored.role, created_by = %actor.id, "创建用户");
        Ok(stored)
    }

    pub async fn list_users(
        &self,
        actor: &User,
        filter: UserListFilter,
    ) -> Result<Vec<User>, ApplicationError> {
        if !actor.is_admin() {
            return Err(ApplicationError::forbidden("list users"));
        }
        let users = self.deps.user_repository.list().await?;
        Ok(users
            .into_iter()
            .filter(|user| filter.role.map_or(true, |role| user.role == role))
            .filter(|user| {
                filter
                    .department_id
                    .map_or(true, |id| user.department_id == Some(id))
            })
            .collect())
    }

    /// 启用或停用账号，管理员不能停用自己
    pub async fn set_active(
        &self,
        actor: &User,
        user_id: UserId,
        active: bool,
    ) -> Result<User, ApplicationError> {
        if !actor.is_admin() {
            return Err(ApplicationError::forbidden("change account status"));
        }
        if actor.id == user_id && !active {
            return Err(DomainError::business_rule_violation(
                "administrators cannot deactivate their own account",
            )
            .into());
        }

        let mut user = self
            .deps
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("user"))?;
        user.set_active(active, self.deps.clock.now());
        let user = self.deps.user_repository.update(user).await?;
        tracing::info!(user_id = %user.id, active, changed_by = %actor.id, "账号状态变更");
        Ok(user)
    }
}
