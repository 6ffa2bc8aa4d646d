use std::sync::Arc;

use domain::{User, UserEmail, UserId};

use crate::{
    clock::Clock, error::ApplicationError, password::PasswordHasher, repository::UserRepository,
};

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub struct AuthServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
}

pub struct AuthService {
    deps: AuthServiceDependencies,
}

impl AuthService {
    pub fn new(deps: AuthServiceDependencies) -> Self {
        Self { deps }
    }

    /// 邮箱 + 密码登录，成功后记录登录时间
    pub async fn login(&self, request: LoginRequest) -> Result<User, ApplicationError> {
        let email = UserEmail::parse(request.email).map_err(|_| ApplicationError::Authentication)?;
        let mut user = self
            .deps
            .user_repository
            .find_by_email(&email)
            .await?
            .ok_or(ApplicationError::Authentication)?;

        let password_ok = self
            .deps
            .password_hasher
            .verify(&request.password, &user.password)
            .await?;
        if !password_ok || !user.is_active {
            tracing::debug!(user_id = %user.id, "登录失败");
            return Err(ApplicationError::Authentication);
        }

        user.record_login(self.deps.clock.now());
        let user = self.deps.user_repository.update(user).await?;
        tracing::info!(user_id = %user.id, role = %user.role, "用户登录");
        Ok(user)
    }

    /// 令牌对应的当前用户；不存在或已停用时返回 `None`
    pub async fn principal(&self, user_id: UserId) -> Result<Option<User>, ApplicationError> {
        let user = self.deps.user_repository.find_by_id(user_id).await?;
        Ok(user.filter(|user| user.is_active))
    }

    pub async fn me(&self, user_id: UserId) -> Result<User, ApplicationError> {
        self.deps
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("user"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::UserRepository;
    use crate::services::test_support::Fixture;
    use domain::UserRole;

    fn service(fixture: &Fixture) -> AuthService {
        AuthService::new(AuthServiceDependencies {
            user_repository: fixture.users.clone(),
            password_hasher: fixture.hasher.clone(),
            clock: fixture.clock.clone(),
        })
    }

    #[tokio::test]
    async fn login_stamps_last_login() {
        let fixture = Fixture::new();
        let user = fixture.user("Ana Cruz", UserRole::Student, None).await;
        let service = service(&fixture);

        let logged_in = service
            .login(LoginRequest {
                email: "ANA.CRUZ@campus.edu".into(),
                password: "secret-pass".into(),
            })
            .await
            .unwrap();

        assert_eq!(logged_in.id, user.id);
        assert_eq!(logged_in.last_login_at, Some(fixture.clock_now()));
    }

    #[tokio::test]
    async fn wrong_password_and_inactive_user_are_rejected() {
        let fixture = Fixture::new();
        let mut user = fixture.user("Ben Lim", UserRole::Student, None).await;
        let service = service(&fixture);

        let wrong = service
            .login(LoginRequest {
                email: "ben.lim@campus.edu".into(),
                password: "nope".into(),
            })
            .await;
        assert!(matches!(wrong, Err(ApplicationError::Authentication)));

        user.set_active(false, fixture.clock_now());
        fixture.users.update(user.clone()).await.unwrap();
        let inactive = service
            .login(LoginRequest {
                email: "ben.lim@campus.edu".into(),
                password: "secret-pass".into(),
            })
            .await;
        assert!(matches!(inactive, Err(ApplicationError::Authentication)));
        assert!(service.principal(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_email_is_an_authentication_error() {
        let fixture = Fixture::new();
        let result = service(&fixture)
            .login(LoginRequest {
                email: "ghost@campus.edu".into(),
                password: "secret-pass".into(),
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::Authentication)));
    }
}
