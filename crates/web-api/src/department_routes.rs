use axum::{
    extract::State,
    handler::Handler,
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use serde::Deserialize;

use application::CreateDepartmentRequest;
use domain::{Department, DepartmentType};

use crate::{
    error::ApiError,
    extract::ApiJson,
    middleware::{require_role, AuthUser, RoleGate},
    response::ApiResponse,
    state::AppState,
};

#[derive(Debug, Deserialize)]
struct CreateDepartmentPayload {
    name: String,
    code: String,
    #[serde(rename = "type")]
    department_type: DepartmentType,
}

pub fn routes() -> Router<AppState> {
    let admin_only = from_fn_with_state(RoleGate::from_names(["admin"]), require_role);
    Router::new().route(
        "/departments",
        get(list_departments).post(create_department.layer(admin_only)),
    )
}

async fn list_departments(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<ApiResponse<Vec<Department>>, ApiError> {
    Ok(ApiResponse::ok(state.department_service.list().await?))
}

async fn create_department(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiJson(payload): ApiJson<CreateDepartmentPayload>,
) -> Result<ApiResponse<Department>, ApiError> {
    let department = state
        .department_service
        .create(
            &actor,
            CreateDepartmentRequest {
                name: payload.name,
                code: payload.code,
                department_type: payload.department_type,
            },
        )
        .await?;
    Ok(ApiResponse::created(department))
}
