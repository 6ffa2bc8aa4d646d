//! 服务测试共用的内存夹具

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use domain::{
    Department, DepartmentId, DepartmentType, NewUser, PasswordHash, User, UserId, UserRole,
};

use crate::broadcaster::MockEventBroadcaster;
use crate::clock::FixedClock;
use crate::memory::{
    MemoryAnnouncementRepository, MemoryChatMessageRepository, MemoryChatRoomRepository,
    MemoryConcernRepository, MemoryDepartmentRepository, MemoryUserRepository,
};
use crate::password::PlainPasswordHasher;
use crate::repository::{DepartmentRepository, UserRepository};

pub struct Fixture {
    pub users: Arc<MemoryUserRepository>,
    pub departments: Arc<MemoryDepartmentRepository>,
    pub concerns: Arc<MemoryConcernRepository>,
    pub rooms: Arc<MemoryChatRoomRepository>,
    pub messages: Arc<MemoryChatMessageRepository>,
    pub announcements: Arc<MemoryAnnouncementRepository>,
    pub hasher: Arc<PlainPasswordHasher>,
    pub clock: Arc<FixedClock>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            users: Arc::new(MemoryUserRepository::new()),
            departments: Arc::new(MemoryDepartmentRepository::new()),
            concerns: Arc::new(MemoryConcernRepository::new()),
            rooms: Arc::new(MemoryChatRoomRepository::new()),
            messages: Arc::new(MemoryChatMessageRepository::new()),
            announcements: Arc::new(MemoryAnnouncementRepository::new()),
            hasher: Arc::new(PlainPasswordHasher),
            clock: Arc::new(FixedClock::new(
                Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
            )),
        }
    }

    pub async fn department(&self, name: &str, code: &str) -> Department {
        let department = Department::new(
            DepartmentId::generate(),
            name,
            code,
            DepartmentType::Academic,
            self.clock_now(),
        )
        .unwrap();
        self.departments.create(department).await.unwrap()
    }

    /// 密码统一为 `secret-pass`
    pub async fn user(&self, name: &str, role: UserRole, department: Option<&Department>) -> User {
        let input = NewUser {
            name: name.to_owned(),
            email: format!("{}@campus.edu", name.to_lowercase().replace(' ', ".")),
            role,
            department_id: department.map(|d| d.id),
            employee_id: None,
            student_id: (role == UserRole::Student).then(|| format!("S-{name}")),
            phone: None,
        };
        let user = User::register(
            UserId::generate(),
            input,
            PasswordHash::new("plain:secret-pass").unwrap(),
            self.clock_now(),
        )
        .unwrap();
        self.users.create(user).await.unwrap()
    }

    pub fn clock_now(&self) -> domain::Timestamp {
        crate::clock::Clock::now(self.clock.as_ref())
    }
}

/// 接受任意推送的广播器
pub fn quiet_broadcaster() -> Arc<MockEventBroadcaster> {
    let mut broadcaster = MockEventBroadcaster::new();
    broadcaster.expect_publish().returning(|_| Ok(()));
    Arc::new(broadcaster)
}
