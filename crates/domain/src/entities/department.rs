//! 部门实体定义

use serde::Serialize;

use crate::errors::{DomainError, DomainResult};
use crate::value_objects::{bounded_text, DepartmentId, Timestamp};

string_enum! {
    /// 部门类型
    pub enum DepartmentType ("type") {
        Academic => "academic",
        Administrative => "administrative",
        Support => "support",
    }
}

/// 部门实体
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    /// 部门代码（大写字母数字，2~10 位）
    pub code: String,
    #[serde(rename = "type")]
    pub department_type: DepartmentType,
    pub is_active: bool,
    pub created_at: Timestamp,
}

impl Department {
    pub fn new(
        id: DepartmentId,
        name: impl Into<String>,
        code: impl Into<String>,
        department_type: DepartmentType,
        now: Timestamp,
    ) -> DomainResult<Self> {
        let name = bounded_text("name", name, 255)?;
        let code = Self::normalize_code(code.into())?;

        Ok(Self {
            id,
            name,
            code,
            department_type,
            is_active: true,
            created_at: now,
        })
    }

    fn normalize_code(code: String) -> DomainResult<String> {
        let code = code.trim().to_ascii_uppercase();
        if !(2..=10).contains(&code.len()) {
            return Err(DomainError::invalid_argument(
                "code",
                "must be 2 to 10 characters",
            ));
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::invalid_argument(
                "code",
                "must be alphanumeric",
            ));
        }
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn code_is_upper_cased() {
        let dept = Department::new(
            DepartmentId::generate(),
            "College of Engineering",
            "coe",
            DepartmentType::Academic,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(dept.code, "COE");
        assert!(dept.is_active);
    }

    #[test]
    fn invalid_codes_are_rejected() {
        for code in ["x", "TOO-LONG-CODE", "A B"] {
            assert!(Department::new(
                DepartmentId::generate(),
                "Registrar",
                code,
                DepartmentType::Administrative,
                Utc::now(),
            )
            .is_err());
        }
    }

    #[test]
    fn type_serializes_under_type_key() {
        let dept = Department::new(
            DepartmentId::generate(),
            "Guidance Office",
            "GO",
            DepartmentType::Support,
            Utc::now(),
        )
        .unwrap();
        let json = serde_json::to_value(&dept).unwrap();
        assert_eq!(json["type"], "support");
    }
}
