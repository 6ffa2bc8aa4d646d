mod announcement_service;
mod auth_service;
mod chat_service;
mod concern_service;
mod department_service;
mod report_service;
mod user_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use announcement_service::{AnnouncementService, AnnouncementServiceDependencies};
pub use auth_service::{AuthService, AuthServiceDependencies, LoginRequest};
pub use chat_service::{
    ChatService, ChatServiceDependencies, HistoryQuery, OpenRoomRequest, SendMessageRequest,
    DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT,
};
pub use concern_service::{ConcernService, ConcernServiceDependencies};
pub use department_service::{
    CreateDepartmentRequest, DepartmentService, DepartmentServiceDependencies,
};
pub use report_service::{
    GeneratedReport, ReportBody, ReportService, ReportServiceDependencies,
};
pub use user_service::{CreateUserRequest, UserListFilter, UserService, UserServiceDependencies};
