//! Web API 层。
//!
//! 提供 Axum 路由，将 HTTP / WebSocket 请求委托给应用层的用例服务。

mod announcement_routes;
mod auth;
mod auth_routes;
mod chat_routes;
mod concern_routes;
mod department_routes;
mod error;
mod extract;
pub mod middleware;
mod report_routes;
mod reports;
mod response;
mod routes;
mod state;
mod user_routes;
mod websocket;

pub use auth::{bearer_token, Claims, IssuedToken, JwtService, TokenError, TtlOutOfRange};
pub use auth_routes::LoginResponse;
pub use config::JwtConfig;
pub use error::ApiError;
pub use extract::ApiJson;
pub use middleware::{AuthUser, RoleGate};
pub use reports::render_report;
pub use response::ApiResponse;
pub use routes::router;
pub use state::{AppState, Broadcasting, Repositories};
