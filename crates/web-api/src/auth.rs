//! JWT 认证模块
//!
//! 提供 JWT token 生成、验证

use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use config::{JwtConfig, MAX_JWT_TTL_MINUTES};
use domain::{User, UserId};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// JWT Claims 结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: String,
    pub iat: i64,
    pub exp: i64, // 过期时间 (Unix timestamp)
}

impl Claims {
    pub fn user_id(&self) -> UserId {
        UserId::from(self.sub)
    }
}

/// token 校验失败的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// 签名有效但已过期
    #[error("token expired")]
    Expired,
    #[error("token invalid")]
    Invalid,
}

/// 有效期不在 1 分钟到一年之间
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("jwt ttl of {0} minutes is out of range")]
pub struct TtlOutOfRange(pub i64);

/// 签发结果
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
}

/// JWT Token 服务
#[derive(Clone)]
pub struct JwtService {
    ttl: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Result<Self, TtlOutOfRange> {
        let ttl = Some(config.ttl_minutes)
            .filter(|minutes| (1..=MAX_JWT_TTL_MINUTES).contains(minutes))
            .and_then(Duration::try_minutes)
            .ok_or(TtlOutOfRange(config.ttl_minutes))?;
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            ttl,
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        })
    }

    /// 为用户签发 token
    pub fn generate_token(&self, user: &User) -> Result<IssuedToken, ApiError> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(self.ttl).ok_or_else(|| {
            tracing::error!(ttl_minutes = self.ttl.num_minutes(), "token 过期时间溢出");
            ApiError::internal_server_error()
        })?;
        let claims = Claims {
            sub: user.id.0,
            role: user.role.as_str().to_owned(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        self.encode(&claims).map(|token| IssuedToken {
            token,
            expires_in: self.ttl.num_seconds(),
        })
    }

    pub(crate) fn encode(&self, claims: &Claims) -> Result<String, ApiError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(|err| {
            tracing::error!(error = %err, "token 签发失败");
            ApiError::internal_server_error()
        })
    }

    /// 验证并解析 JWT token
    pub fn verify_token(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

/// 取出 `Authorization: Bearer <token>` 中的 token
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
