//! 用户实体
//!
//! 学生、院系职员、院系负责人与管理员共用同一实体，通过角色区分。

use serde::Serialize;

use crate::errors::{DomainError, DomainResult};
use crate::value_objects::{bounded_text, DepartmentId, PasswordHash, Timestamp, UserEmail, UserId};

string_enum! {
    /// 用户角色
    pub enum UserRole ("role") {
        Student => "student",
        Staff => "staff",
        DepartmentHead => "department_head",
        Admin => "admin",
    }
}

impl UserRole {
    /// 是否属于院系处理人员（职员或负责人）
    pub fn is_department_staff(&self) -> bool {
        matches!(self, UserRole::Staff | UserRole::DepartmentHead)
    }
}

/// 创建用户所需的数据
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub department_id: Option<DepartmentId>,
    pub employee_id: Option<String>,
    pub student_id: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: UserEmail,
    #[serde(skip_serializing)] // 密码字段不暴露给客户端
    pub password: PasswordHash,
    pub role: UserRole,
    pub department_id: Option<DepartmentId>,
    pub employee_id: Option<String>,
    pub student_id: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub preferences: serde_json::Value,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// 推送载荷中使用的用户摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub role: UserRole,
}

impl User {
    pub fn register(
        id: UserId,
        input: NewUser,
        password: PasswordHash,
        now: Timestamp,
    ) -> DomainResult<Self> {
        let name = bounded_text("name", input.name, 255)?;
        let email = UserEmail::parse(input.email)?;

        if input.role.is_department_staff() && input.department_id.is_none() {
            return Err(DomainError::invalid_argument(
                "department_id",
                "staff and department heads must belong to a department",
            ));
        }
        if input.role == UserRole::Student
            && input
                .student_id
                .as_deref()
                .map_or(true, |value| value.trim().is_empty())
        {
            return Err(DomainError::invalid_argument(
                "student_id",
                "students require a student number",
            ));
        }

        Ok(Self {
            id,
            name,
            email,
            password,
            role: input.role,
            department_id: input.department_id,
            employee_id: non_blank(input.employee_id),
            student_id: non_blank(input.student_id),
            phone: non_blank(input.phone),
            is_active: true,
            preferences: serde_json::Value::Object(Default::default()),
            last_login_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn record_login(&mut self, now: Timestamp) {
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    pub fn set_active(&mut self, active: bool, now: Timestamp) {
        self.is_active = active;
        self.updated_at = now;
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// 是否为指定院系的职员或负责人
    pub fn works_in(&self, department_id: DepartmentId) -> bool {
        self.role.is_department_staff() && self.department_id == Some(department_id)
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            role: self.role,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
