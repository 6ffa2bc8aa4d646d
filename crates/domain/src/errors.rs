//! 领域模型错误定义
//!
//! 定义了系统中所有可能的错误类型，提供清晰的错误上下文。

use thiserror::Error;

use crate::entities::concern::ConcernStatus;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 参数校验失败
    #[error("{field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    /// 资源不存在
    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    /// 资源已存在
    #[error("{resource} already exists: {identifier}")]
    AlreadyExists {
        resource: &'static str,
        identifier: String,
    },

    /// 权限不足
    #[error("permission denied: {action}")]
    PermissionDenied { action: String },

    /// 诉求状态流转不合法
    #[error("cannot move concern from {from} to {to}")]
    InvalidTransition {
        from: ConcernStatus,
        to: ConcernStatus,
    },

    /// 业务规则违反
    #[error("{rule}")]
    BusinessRuleViolation { rule: String },
}

impl DomainError {
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn already_exists(resource: &'static str, identifier: impl Into<String>) -> Self {
        Self::AlreadyExists {
            resource,
            identifier: identifier.into(),
        }
    }

    pub fn permission_denied(action: impl Into<String>) -> Self {
        Self::PermissionDenied {
            action: action.into(),
        }
    }

    pub fn business_rule_violation(rule: impl Into<String>) -> Self {
        Self::BusinessRuleViolation { rule: rule.into() }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;

/// 仓储层错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("record conflicts with an existing one")]
    Conflict,
    /// 读取之后记录已被其他请求修改
    #[error("record was modified concurrently")]
    Stale,
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}
