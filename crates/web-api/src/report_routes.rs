use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    middleware::from_fn_with_state,
    response::Html,
    routing::get,
    Router,
};

use domain::reports::{ReportFilters, ReportKind};

use crate::{
    error::ApiError,
    middleware::{require_role, AuthUser, RoleGate},
    reports::render_report,
    state::AppState,
};

/// HTML 报表路由，院系负责人只能看到本院系数据
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/{kind}", get(render))
        .route_layer(from_fn_with_state(
            RoleGate::from_names(["admin", "department_head"]),
            require_role,
        ))
}

async fn render(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(kind): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Html<String>, ApiError> {
    let kind = ReportKind::parse(&kind)
        .ok_or_else(|| ApiError::not_found(format!("unknown report '{kind}'")))?;
    let filters = ReportFilters::from_query(kind, &query);

    let report = state.report_service.generate(&actor, kind, filters).await?;
    let department_names = state
        .department_service
        .list()
        .await?
        .into_iter()
        .map(|department| (department.id, department.name))
        .collect();

    let html = render_report(&report, &department_names).map_err(|err| {
        tracing::error!(error = %err, report = kind.title(), "报表渲染失败");
        ApiError::internal_server_error()
    })?;
    tracing::info!(report = kind.title(), user_id = %actor.id, "报表已生成");
    Ok(Html(html))
}
