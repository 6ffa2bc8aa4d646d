//! 用户列表与导出

use std::{fs, path::Path};

use anyhow::Context;
use application::UserRepository;
use chrono::{DateTime, Utc};
use domain::{DepartmentId, User, UserId};
use infrastructure::PgUserRepository;
use serde::Serialize;
use sqlx::PgPool;

pub const DEFAULT_EXPORT_FILE: &str = "exported_users.json";

/// 导出记录，不包含密码哈希与偏好设置
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: &'static str,
    pub department_id: Option<DepartmentId>,
    pub employee_id: Option<String>,
    pub student_id: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for ExportedUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.as_str().to_owned(),
            role: user.role.as_str(),
            department_id: user.department_id,
            employee_id: user.employee_id.clone(),
            student_id: user.student_id.clone(),
            phone: user.phone.clone(),
            is_active: user.is_active,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

pub async fn load(pool: PgPool) -> anyhow::Result<Vec<User>> {
    let users = PgUserRepository::new(pool)
        .list()
        .await
        .context("failed to load users")?;
    tracing::info!(count = users.len(), "users loaded");
    Ok(users)
}

pub fn format_table(users: &[User]) -> String {
    let mut out = format!(
        "{:<36}  {:<24}  {:<32}  {:<16}  {}\n",
        "ID", "NAME", "EMAIL", "ROLE", "STATUS"
    );
    for user in users {
        out.push_str(&format!(
            "{:<36}  {:<24}  {:<32}  {:<16}  {}\n",
            user.id,
            user.name,
            user.email.as_str(),
            user.role.as_str(),
            if user.is_active { "active" } else { "inactive" },
        ));
    }
    out.push_str(&format!("{} users\n", users.len()));
    out
}

/// 写入格式化 JSON 数组，返回导出条数
pub fn write_export(users: &[User], path: &Path) -> anyhow::Result<usize> {
    let records: Vec<ExportedUser> = users.iter().map(ExportedUser::from).collect();
    let json = serde_json::to_string_pretty(&records)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(records.len())
}
