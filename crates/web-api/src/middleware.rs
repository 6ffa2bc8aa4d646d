//! 认证与角色授权中间件
//!
//! `authenticate` 校验 Bearer token 并把当前用户放入请求扩展；
//! `require_role` 在其后按路由注册时给定的角色集合放行。

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use domain::{User, UserRole};

use crate::{
    auth::{bearer_token, TokenError},
    error::ApiError,
    state::AppState,
};

pub const TOKEN_EXPIRED: &str = "Token has expired";
pub const TOKEN_INVALID: &str = "Token is invalid";
pub const TOKEN_NOT_FOUND: &str = "Authorization token not found";
pub const UNAUTHENTICATED: &str = "Unauthenticated";
pub const INSUFFICIENT_PERMISSIONS: &str = "Unauthorized. Insufficient permissions.";

/// 已认证的当前用户
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized(UNAUTHENTICATED))
    }
}

/// token 解析为处于激活状态的用户
pub(crate) async fn resolve_principal(
    state: &AppState,
    token: Option<&str>,
) -> Result<User, ApiError> {
    let token = token.ok_or_else(|| ApiError::unauthorized(TOKEN_NOT_FOUND))?;

    let claims = state.jwt_service.verify_token(token).map_err(|err| {
        tracing::debug!(reason = ?err, "token 校验失败");
        match err {
            TokenError::Expired => ApiError::unauthorized(TOKEN_EXPIRED),
            TokenError::Invalid => ApiError::unauthorized(TOKEN_INVALID),
        }
    })?;

    match state.auth_service.principal(claims.user_id()).await? {
        Some(user) => Ok(user),
        None => {
            tracing::debug!(user_id = %claims.sub, "token 对应的用户不存在或已停用");
            Err(ApiError::unauthorized(TOKEN_INVALID))
        }
    }
}

pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = resolve_principal(&state, bearer_token(request.headers())).await?;
    request.extensions_mut().insert(AuthUser(user));
    Ok(next.run(request).await)
}

/// 路由允许的角色集合
#[derive(Debug, Clone)]
pub struct RoleGate {
    roles: Arc<[UserRole]>,
}

impl RoleGate {
    pub fn new(roles: impl IntoIterator<Item = UserRole>) -> Self {
        Self {
            roles: roles.into_iter().collect(),
        }
    }

    /// 按角色名构建，无法识别的名字不会放行任何用户
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(names.into_iter().filter_map(|name| {
            let name = name.as_ref();
            match name.parse::<UserRole>() {
                Ok(role) => Some(role),
                Err(_) => {
                    tracing::warn!(role = name, "未知角色名，已忽略");
                    None
                }
            }
        }))
    }

    pub fn allows(&self, role: UserRole) -> bool {
        self.roles.contains(&role)
    }
}

pub async fn require_role(
    State(gate): State<RoleGate>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let role = request
        .extensions()
        .get::<AuthUser>()
        .map(|AuthUser(user)| user.role)
        .ok_or_else(|| ApiError::unauthorized(UNAUTHENTICATED))?;

    if !gate.allows(role) {
        tracing::debug!(role = role.as_str(), "角色不在允许范围内");
        return Err(ApiError::forbidden(INSUFFICIENT_PERMISSIONS));
    }
    Ok(next.run(request).await)
}
