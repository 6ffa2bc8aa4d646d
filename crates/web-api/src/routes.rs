use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{
    announcement_routes, auth_routes, chat_routes, concern_routes, department_routes,
    middleware::authenticate, report_routes, state::AppState, user_routes,
    websocket::websocket_upgrade,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .merge(auth_routes::protected_routes())
        .merge(department_routes::routes())
        .merge(user_routes::routes())
        .merge(concern_routes::routes())
        .merge(chat_routes::routes())
        .merge(announcement_routes::routes())
        .merge(report_routes::routes())
        .route_layer(from_fn_with_state(state, authenticate));

    Router::new()
        .route("/auth/login", post(auth_routes::login))
        .route("/ws", get(websocket_upgrade))
        .merge(protected)
}

async fn health() -> Json<Value> {
    Json(json!({ "success": true, "status": "ok" }))
}
