use axum::{
    extract::{Path, State},
    handler::Handler,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use domain::{
    Announcement, AnnouncementId, AnnouncementPriority, AnnouncementType, DepartmentId,
    NewAnnouncement,
};

use crate::{
    error::ApiError,
    extract::ApiJson,
    middleware::{require_role, AuthUser, RoleGate},
    response::ApiResponse,
    state::AppState,
};

#[derive(Debug, Deserialize)]
struct CreateAnnouncementPayload {
    title: String,
    content: String,
    #[serde(rename = "type")]
    announcement_type: AnnouncementType,
    priority: Option<AnnouncementPriority>,
    department_id: Option<DepartmentId>,
    expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    publish: bool,
}

pub fn routes() -> Router<AppState> {
    let authors = from_fn_with_state(
        RoleGate::from_names(["admin", "department_head"]),
        require_role,
    );

    Router::new()
        .route(
            "/announcements",
            get(list_announcements).post(create_announcement.layer(authors.clone())),
        )
        .route("/announcements/{announcement_id}", get(view_announcement))
        .route(
            "/announcements/{announcement_id}/publish",
            post(publish_announcement.layer(authors)),
        )
}

async fn list_announcements(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Result<ApiResponse<Vec<Announcement>>, ApiError> {
    Ok(ApiResponse::ok(
        state.announcement_service.list_visible(&actor).await?,
    ))
}

async fn view_announcement(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(announcement_id): Path<AnnouncementId>,
) -> Result<ApiResponse<Announcement>, ApiError> {
    Ok(ApiResponse::ok(
        state
            .announcement_service
            .view(&actor, announcement_id)
            .await?,
    ))
}

async fn create_announcement(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiJson(payload): ApiJson<CreateAnnouncementPayload>,
) -> Result<ApiResponse<Announcement>, ApiError> {
    let announcement = state
        .announcement_service
        .create(
            &actor,
            NewAnnouncement {
                title: payload.title,
                content: payload.content,
                announcement_type: payload.announcement_type,
                priority: payload.priority.unwrap_or(AnnouncementPriority::Medium),
                department_id: payload.department_id,
                expires_at: payload.expires_at,
                publish: payload.publish,
            },
        )
        .await?;
    Ok(ApiResponse::created(announcement))
}

async fn publish_announcement(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(announcement_id): Path<AnnouncementId>,
) -> Result<ApiResponse<Announcement>, ApiError> {
    let announcement = state
        .announcement_service
        .publish(&actor, announcement_id)
        .await?;
    Ok(ApiResponse::ok(announcement).with_message("Announcement published"))
}
