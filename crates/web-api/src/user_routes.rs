use axum::{
    extract::{Path, Query, State},
    middleware::from_fn_with_state,
    routing::{get, patch},
    Router,
};
use serde::Deserialize;

use application::{CreateUserRequest, UserListFilter};
use domain::{DepartmentId, User, UserId, UserRole};

use crate::{
    error::ApiError,
    extract::ApiJson,
    middleware::{require_role, AuthUser, RoleGate},
    response::ApiResponse,
    state::AppState,
};

#[derive(Debug, Deserialize)]
struct CreateUserPayload {
    name: String,
    email: String,
    password: String,
    role: UserRole,
    department_id: Option<DepartmentId>,
    employee_id: Option<String>,
    student_id: Option<String>,
    phone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserListQuery {
    role: Option<UserRole>,
    department_id: Option<DepartmentId>,
}

#[derive(Debug, Deserialize)]
struct UserStatusPayload {
    is_active: bool,
}

/// 用户管理路由，仅管理员可用
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{user_id}/status", patch(set_user_status))
        .route_layer(from_fn_with_state(
            RoleGate::from_names(["admin"]),
            require_role,
        ))
}

async fn list_users(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<UserListQuery>,
) -> Result<ApiResponse<Vec<User>>, ApiError> {
    let users = state
        .user_service
        .list_users(
            &actor,
            UserListFilter {
                role: query.role,
                department_id: query.department_id,
            },
        )
        .await?;
    Ok(ApiResponse::ok(users))
}

async fn create_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiJson(payload): ApiJson<CreateUserPayload>,
) -> Result<ApiResponse<User>, ApiError> {
    let user = state
        .user_service
        .create_user(
            &actor,
            CreateUserRequest {
                name: payload.name,
                email: payload.email,
                password: payload.password,
                role: payload.role,
                department_id: payload.department_id,
                employee_id: payload.employee_id,
                student_id: payload.student_id,
                phone: payload.phone,
            },
        )
        .await?;
    Ok(ApiResponse::created(user).with_message("User created"))
}

async fn set_user_status(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(user_id): Path<UserId>,
    ApiJson(payload): ApiJson<UserStatusPayload>,
) -> Result<ApiResponse<User>, ApiError> {
    let user = state
        .user_service
        .set_active(&actor, user_id, payload.is_active)
        .await?;
    Ok(ApiResponse::ok(user))
}
