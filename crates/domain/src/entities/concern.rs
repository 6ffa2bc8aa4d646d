//! 学生诉求（Concern）实体
//!
//! 诉求由学生提交并路由到院系，院系职员处理、负责人分派与升级。

use serde::Serialize;

use crate::entities::user::{User, UserRole};
use crate::errors::{DomainError, DomainResult};
use crate::value_objects::{bounded_text, ConcernId, DepartmentId, Timestamp, UserId};

string_enum! {
    /// 诉求类型
    pub enum ConcernType ("type") {
        Academic => "academic",
        Financial => "financial",
        Administrative => "administrative",
        Technical => "technical",
        Personal => "personal",
        Other => "other",
    }
}

string_enum! {
    /// 诉求优先级
    pub enum ConcernPriority ("priority") {
        Low => "low",
        Medium => "medium",
        High => "high",
        Urgent => "urgent",
    }
}

impl ConcernPriority {
    /// 提升一级，已是最高级时保持不变
    pub fn raised(self) -> Self {
        match self {
            ConcernPriority::Low => ConcernPriority::Medium,
            ConcernPriority::Medium => ConcernPriority::High,
            ConcernPriority::High | ConcernPriority::Urgent => ConcernPriority::Urgent,
        }
    }
}

string_enum! {
    /// 诉求状态
    pub enum ConcernStatus ("status") {
        Pending => "pending",
        InProgress => "in_progress",
        Resolved => "resolved",
        Closed => "closed",
        Cancelled => "cancelled",
    }
}

impl ConcernStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConcernStatus::Closed | ConcernStatus::Cancelled)
    }

    /// 计入解决率的状态
    pub fn counts_as_resolved(&self) -> bool {
        matches!(self, ConcernStatus::Resolved | ConcernStatus::Closed)
    }

    pub fn can_transition_to(&self, next: ConcernStatus) -> bool {
        use ConcernStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress)
                | (Pending, Cancelled)
                | (InProgress, Resolved)
                | (InProgress, Pending)
                | (Resolved, Closed)
                | (Resolved, InProgress)
        )
    }
}

string_enum! {
    /// 诉求变更推送中的动作标签
    pub enum ConcernAction ("action") {
        Created => "created",
        StatusChanged => "status_changed",
        Assigned => "assigned",
        Escalated => "escalated",
    }
}

/// 提交诉求的输入
#[derive(Debug, Clone)]
pub struct NewConcern {
    pub subject: String,
    pub description: String,
    pub concern_type: ConcernType,
    pub priority: Option<ConcernPriority>,
    pub department_id: DepartmentId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Concern {
    pub id: ConcernId,
    pub reference_number: String,
    pub subject: String,
    pub description: String,
    #[serde(rename = "type")]
    pub concern_type: ConcernType,
    pub priority: ConcernPriority,
    pub status: ConcernStatus,
    pub department_id: DepartmentId,
    pub student_id: UserId,
    pub assigned_to: Option<UserId>,
    pub resolved_at: Option<Timestamp>,
    pub escalated_at: Option<Timestamp>,
    pub escalation_level: u8,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Concern {
    /// 生成编号：`CN-YYYYMMDD-XXXXXX`
    pub fn reference_for(now: Timestamp, suffix: &str) -> String {
        format!("CN-{}-{}", now.format("%Y%m%d"), suffix.to_ascii_uppercase())
    }

    pub fn submit(
        id: ConcernId,
        reference_number: String,
        student: &User,
        input: NewConcern,
        now: Timestamp,
    ) -> DomainResult<Self> {
        if student.role != UserRole::Student {
            return Err(DomainError::permission_denied("only students submit concerns"));
        }
        let subject = bounded_text("subject", input.subject, 255)?;
        let description = bounded_text("description", input.description, 10_000)?;

        Ok(Self {
            id,
            reference_number,
            subject,
            description,
            concern_type: input.concern_type,
            priority: input.priority.unwrap_or(ConcernPriority::Medium),
            status: ConcernStatus::Pending,
            department_id: input.department_id,
            student_id: student.id,
            assigned_to: None,
            resolved_at: None,
            escalated_at: None,
            escalation_level: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn transition_to(&mut self, next: ConcernStatus, now: Timestamp) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        match next {
            ConcernStatus::Resolved => self.resolved_at = Some(now),
            ConcernStatus::Closed => {}
            _ => self.resolved_at = None,
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// 分派给本院系的在职人员，待处理的诉求随即进入处理中
    pub fn assign_to(&mut self, assignee: &User, now: Timestamp) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::business_rule_violation(format!(
                "concern is {}",
                self.status
            )));
        }
        if !assignee.is_active || !assignee.works_in(self.department_id) {
            return Err(DomainError::invalid_argument(
                "assignee",
                "must be active staff of the concern's department",
            ));
        }

        self.assigned_to = Some(assignee.id);
        if self.status == ConcernStatus::Pending {
            self.status = ConcernStatus::InProgress;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn escalate(&mut self, now: Timestamp) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::business_rule_violation(format!(
                "concern is {}",
                self.status
            )));
        }
        self.escalation_level = self.escalation_level.saturating_add(1);
        self.escalated_at = Some(now);
        self.priority = self.priority.raised();
        self.updated_at = now;
        Ok(())
    }

    /// 学生只能看自己的，院系人员看本院系的，管理员看全部
    pub fn is_visible_to(&self, user: &User) -> bool {
        match user.role {
            UserRole::Admin => true,
            UserRole::Student => self.student_id == user.id,
            UserRole::Staff | UserRole::DepartmentHead => user.works_in(self.department_id),
        }
    }

    pub fn can_be_handled_by(&self, user: &User) -> bool {
        user.is_admin() || user.works_in(self.department_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::user::NewUser;
    use crate::value_objects::PasswordHash;
    use chrono::{TimeZone, Utc};

    fn user(role: UserRole, department_id: Option<DepartmentId>) -> User {
        User::register(
            UserId::generate(),
            NewUser {
                name: "Test".into(),
                email: "test@campus.edu".into(),
                role,
                department_id,
                employee_id: None,
                student_id: Some("S-1".into()),
                phone: None,
            },
            PasswordHash::new("hash").unwrap(),
            Utc::now(),
        )
        .unwrap()
    }

    fn concern(department_id: DepartmentId, student: &User) -> Concern {
        Concern::submit(
            ConcernId::generate(),
            "CN-20260101-ABC123".into(),
            student,
            NewConcern {
                subject: "Missing grade".into(),
                description: "My final grade is not posted".into(),
                concern_type: ConcernType::Academic,
                priority: None,
                department_id,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn reference_number_format() {
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 10, 0, 0).unwrap();
        assert_eq!(Concern::reference_for(now, "a1b2c3"), "CN-20260309-A1B2C3");
    }

    #[test]
    fn only_students_submit() {
        let dept = DepartmentId::generate();
        let staff = user(UserRole::Staff, Some(dept));
        let err = Concern::submit(
            ConcernId::generate(),
            "CN-1".into(),
            &staff,
            NewConcern {
                subject: "x".into(),
                description: "y".into(),
                concern_type: ConcernType::Other,
                priority: None,
                department_id: dept,
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied { .. }));
    }

    #[test]
    fn resolving_stamps_and_reopening_clears_resolved_at() {
        let dept = DepartmentId::generate();
        let student = user(UserRole::Student, None);
        let mut c = concern(dept, &student);
        assert_eq!(c.priority, ConcernPriority::Medium);

        c.transition_to(ConcernStatus::InProgress, Utc::now()).unwrap();
        c.transition_to(ConcernStatus::Resolved, Utc::now()).unwrap();
        assert!(c.resolved_at.is_some());

        c.transition_to(ConcernStatus::InProgress, Utc::now()).unwrap();
        assert!(c.resolved_at.is_none());
    }

    #[test]
    fn closing_keeps_resolved_at() {
        let student = user(UserRole::Student, None);
        let mut c = concern(DepartmentId::generate(), &student);
        c.transition_to(ConcernStatus::InProgress, Utc::now()).unwrap();
        c.transition_to(ConcernStatus::Resolved, Utc::now()).unwrap();
        c.transition_to(ConcernStatus::Closed, Utc::now()).unwrap();
        assert!(c.resolved_at.is_some());
        assert!(c.status.is_terminal());
    }

    #[test]
    fn invalid_transition_is_rejected() {
        let student = user(UserRole::Student, None);
        let mut c = concern(DepartmentId::generate(), &student);
        let err = c.transition_to(ConcernStatus::Closed, Utc::now()).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidTransition {
                from: ConcernStatus::Pending,
                to: ConcernStatus::Closed
            }
        );
        assert_eq!(c.status, ConcernStatus::Pending);
    }

    #[test]
    fn assignment_requires_department_staff() {
        let dept = DepartmentId::generate();
        let student = user(UserRole::Student, None);
        let mut c = concern(dept, &student);

        let outsider = user(UserRole::Staff, Some(DepartmentId::generate()));
        assert!(c.assign_to(&outsider, Utc::now()).is_err());

        let staff = user(UserRole::Staff, Some(dept));
        c.assign_to(&staff, Utc::now()).unwrap();
        assert_eq!(c.assigned_to, Some(staff.id));
        assert_eq!(c.status, ConcernStatus::InProgress);
    }

    #[test]
    fn escalation_raises_priority_and_level() {
        let student = user(UserRole::Student, None);
        let mut c = concern(DepartmentId::generate(), &student);
        c.escalate(Utc::now()).unwrap();
        c.escalate(Utc::now()).unwrap();
        c.escalate(Utc::now()).unwrap();
        assert_eq!(c.escalation_level, 3);
        assert_eq!(c.priority, ConcernPriority::Urgent);
        assert!(c.escalated_at.is_some());
    }

    #[test]
    fn visibility_rules() {
        let dept = DepartmentId::generate();
        let student = user(UserRole::Student, None);
        let other_student = user(UserRole::Student, None);
        let staff = user(UserRole::Staff, Some(dept));
        let foreign_head = user(UserRole::DepartmentHead, Some(DepartmentId::generate()));
        let admin = user(UserRole::Admin, None);
        let c = concern(dept, &student);

        assert!(c.is_visible_to(&student));
        assert!(!c.is_visible_to(&other_student));
        assert!(c.is_visible_to(&staff));
        assert!(!c.is_visible_to(&foreign_head));
        assert!(c.is_visible_to(&admin));
    }
}
