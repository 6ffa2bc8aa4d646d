use axum::{
    extract::{Path, Query, State},
    handler::Handler,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;

use domain::{
    Concern, ConcernId, ConcernPriority, ConcernStatus, ConcernType, DepartmentId, NewConcern,
    UserId,
};

use crate::{
    error::ApiError,
    extract::ApiJson,
    middleware::{require_role, AuthUser, RoleGate},
    response::ApiResponse,
    state::AppState,
};

#[derive(Debug, Deserialize)]
struct SubmitConcernPayload {
    subject: String,
    description: String,
    #[serde(rename = "type")]
    concern_type: ConcernType,
    priority: Option<ConcernPriority>,
    department_id: DepartmentId,
}

#[derive(Debug, Deserialize)]
struct ConcernListQuery {
    status: Option<ConcernStatus>,
}

#[derive(Debug, Deserialize)]
struct StatusPayload {
    status: ConcernStatus,
}

#[derive(Debug, Deserialize)]
struct AssignPayload {
    assigned_to: UserId,
}

pub fn routes() -> Router<AppState> {
    let students = from_fn_with_state(RoleGate::from_names(["student"]), require_role);
    let handlers = from_fn_with_state(
        RoleGate::from_names(["staff", "department_head", "admin"]),
        require_role,
    );
    let supervisors = from_fn_with_state(
        RoleGate::from_names(["department_head", "admin"]),
        require_role,
    );

    Router::new()
        .route(
            "/concerns",
            get(list_concerns).post(submit_concern.layer(students)),
        )
        .route("/concerns/{concern_id}", get(get_concern))
        .route(
            "/concerns/{concern_id}/status",
            patch(update_status.layer(handlers)),
        )
        .route(
            "/concerns/{concern_id}/assign",
            post(assign_concern.layer(supervisors.clone())),
        )
        .route(
            "/concerns/{concern_id}/escalate",
            post(escalate_concern.layer(supervisors)),
        )
}

async fn list_concerns(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<ConcernListQuery>,
) -> Result<ApiResponse<Vec<Concern>>, ApiError> {
    let concerns = state.concern_service.list_for(&actor, query.status).await?;
    Ok(ApiResponse::ok(concerns))
}

async fn submit_concern(
    State(state): State<AppState>,
    AuthUser(student): AuthUser,
    ApiJson(payload): ApiJson<SubmitConcernPayload>,
) -> Result<ApiResponse<Concern>, ApiError> {
    let concern = state
        .concern_service
        .submit(
            &student,
            NewConcern {
                subject: payload.subject,
                description: payload.description,
                concern_type: payload.concern_type,
                priority: payload.priority,
                department_id: payload.department_id,
            },
        )
        .await?;
    Ok(ApiResponse::created(concern).with_message("Concern submitted"))
}

async fn get_concern(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(concern_id): Path<ConcernId>,
) -> Result<ApiResponse<Concern>, ApiError> {
    Ok(ApiResponse::ok(
        state.concern_service.get(&actor, concern_id).await?,
    ))
}

async fn update_status(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(concern_id): Path<ConcernId>,
    ApiJson(payload): ApiJson<StatusPayload>,
) -> Result<ApiResponse<Concern>, ApiError> {
    let concern = state
        .concern_service
        .update_status(&actor, concern_id, payload.status)
        .await?;
    Ok(ApiResponse::ok(concern).with_message("Concern status updated"))
}

async fn assign_concern(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(concern_id): Path<ConcernId>,
    ApiJson(payload): ApiJson<AssignPayload>,
) -> Result<ApiResponse<Concern>, ApiError> {
    let concern = state
        .concern_service
        .assign(&actor, concern_id, payload.assigned_to)
        .await?;
    Ok(ApiResponse::ok(concern).with_message("Concern assigned"))
}

async fn escalate_concern(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(concern_id): Path<ConcernId>,
) -> Result<ApiResponse<Concern>, ApiError> {
    let concern = state.concern_service.escalate(&actor, concern_id).await?;
    Ok(ApiResponse::ok(concern).with_message("Concern escalated"))
}
