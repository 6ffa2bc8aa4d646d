use std::sync::Arc;

use application::{
    memory::{
        MemoryAnnouncementRepository, MemoryChatMessageRepository, MemoryChatRoomRepository,
        MemoryConcernRepository, MemoryDepartmentRepository, MemoryUserRepository,
    },
    AnnouncementRepository, AnnouncementService, AnnouncementServiceDependencies, AuthService,
    AuthServiceDependencies, ChatMessageRepository, ChatRoomRepository, ChatService,
    ChatServiceDependencies, Clock, ConcernRepository, ConcernService,
    ConcernServiceDependencies, DepartmentRepository, DepartmentService,
    DepartmentServiceDependencies, EventBroadcaster, PasswordHasher, ReportService,
    ReportServiceDependencies, UserRepository, UserService, UserServiceDependencies,
};
use infrastructure::{LocalEventBroadcaster, PgStorage};

use crate::JwtService;

/// 服务共享的仓储集合
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub departments: Arc<dyn DepartmentRepository>,
    pub concerns: Arc<dyn ConcernRepository>,
    pub rooms: Arc<dyn ChatRoomRepository>,
    pub messages: Arc<dyn ChatMessageRepository>,
    pub announcements: Arc<dyn AnnouncementRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(MemoryUserRepository::new()),
            departments: Arc::new(MemoryDepartmentRepository::new()),
            concerns: Arc::new(MemoryConcernRepository::new()),
            rooms: Arc::new(MemoryChatRoomRepository::new()),
            messages: Arc::new(MemoryChatMessageRepository::new()),
            announcements: Arc::new(MemoryAnnouncementRepository::new()),
        }
    }

    pub fn postgres(storage: &PgStorage) -> Self {
        Self {
            users: Arc::new(storage.user_repository.clone()),
            departments: Arc::new(storage.department_repository.clone()),
            concerns: Arc::new(storage.concern_repository.clone()),
            rooms: Arc::new(storage.room_repository.clone()),
            messages: Arc::new(storage.message_repository.clone()),
            announcements: Arc::new(storage.announcement_repository.clone()),
        }
    }
}

/// 推送相关组件：业务事件写入 `broadcaster`，WebSocket 端点订阅 `live_events`
#[derive(Clone)]
pub struct Broadcasting {
    pub broadcaster: Arc<dyn EventBroadcaster>,
    pub live_events: LocalEventBroadcaster,
}

impl Broadcasting {
    /// 仅本地推送
    pub fn local(live_events: LocalEventBroadcaster) -> Self {
        Self {
            broadcaster: Arc::new(live_events.clone()),
            live_events,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub department_service: Arc<DepartmentService>,
    pub concern_service: Arc<ConcernService>,
    pub chat_service: Arc<ChatService>,
    pub announcement_service: Arc<AnnouncementService>,
    pub report_service: Arc<ReportService>,
    pub jwt_service: Arc<JwtService>,
    pub live_events: LocalEventBroadcaster,
}

impl AppState {
    pub fn new(
        repositories: Repositories,
        password_hasher: Arc<dyn PasswordHasher>,
        broadcasting: Broadcasting,
        clock: Arc<dyn Clock>,
        jwt_service: JwtService,
    ) -> Self {
        let Repositories {
            users,
            departments,
            concerns,
            rooms,
            messages,
            announcements,
        } = repositories;
        let Broadcasting {
            broadcaster,
            live_events,
        } = broadcasting;

        let auth_service = AuthService::new(AuthServiceDependencies {
            user_repository: users.clone(),
            password_hasher: password_hasher.clone(),
            clock: clock.clone(),
        });
        let user_service = UserService::new(UserServiceDependencies {
            user_repository: users.clone(),
            department_repository: departments.clone(),
            password_hasher,
            clock: clock.clone(),
        });
        let department_service = DepartmentService::new(DepartmentServiceDependencies {
            department_repository: departments.clone(),
            clock: clock.clone(),
        });
        let concern_service = ConcernService::new(ConcernServiceDependencies {
            concern_repository: concerns.clone(),
            department_repository: departments.clone(),
            user_repository: users.clone(),
            broadcaster: broadcaster.clone(),
            clock: clock.clone(),
        });
        let chat_service = ChatService::new(ChatServiceDependencies {
            room_repository: rooms,
            message_repository: messages,
            user_repository: users.clone(),
            concern_repository: concerns.clone(),
            broadcaster,
            clock: clock.clone(),
        });
        let announcement_service = AnnouncementService::new(AnnouncementServiceDependencies {
            announcement_repository: announcements.clone(),
            department_repository: departments.clone(),
            clock: clock.clone(),
        });
        let report_service = ReportService::new(ReportServiceDependencies {
            concern_repository: concerns,
            announcement_repository: announcements,
            department_repository: departments,
            user_repository: users,
            clock,
        });

        Self {
            auth_service: Arc::new(auth_service),
            user_service: Arc::new(user_service),
            department_service: Arc::new(department_service),
            concern_service: Arc::new(concern_service),
            chat_service: Arc::new(chat_service),
            announcement_service: Arc::new(announcement_service),
            report_service: Arc::new(report_service),
            jwt_service: Arc::new(jwt_service),
            live_events,
        }
    }
}
