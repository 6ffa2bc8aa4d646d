use axum::{extract::State, routing::get, Router};
use serde::{Deserialize, Serialize};

use application::LoginRequest;
use domain::User;

use crate::{
    error::ApiError, extract::ApiJson, middleware::AuthUser, response::ApiResponse,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    email: String,
    password: String,
}

/// 登录响应结构
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: User,
}

/// 需要认证的账户路由
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginPayload>,
) -> Result<ApiResponse<LoginResponse>, ApiError> {
    let user = state
        .auth_service
        .login(LoginRequest {
            email: payload.email,
            password: payload.password,
        })
        .await?;
    let issued = state.jwt_service.generate_token(&user)?;

    Ok(ApiResponse::ok(LoginResponse {
        token: issued.token,
        token_type: "bearer",
        expires_in: issued.expires_in,
        user,
    })
    .with_message("Login successful"))
}

async fn me(AuthUser(user): AuthUser) -> ApiResponse<User> {
    ApiResponse::ok(user)
}
