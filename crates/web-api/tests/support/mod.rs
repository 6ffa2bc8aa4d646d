#![allow(dead_code)]

use std::sync::Arc;

use application::{DepartmentRepository, PlainPasswordHasher, SystemClock, UserRepository};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use domain::{
    Department, DepartmentId, DepartmentType, NewUser, PasswordHash, User, UserId, UserRole,
};
use infrastructure::LocalEventBroadcaster;
use serde_json::{json, Value};
use tower::ServiceExt;

use web_api::{router, AppState, Broadcasting, JwtConfig, JwtService, Repositories};

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const PASSWORD: &str = "secret-pass";

pub struct TestApp {
    pub router: Router,
    pub repositories: Repositories,
    pub live_events: LocalEventBroadcaster,
    pub jwt: JwtService,
}

impl TestApp {
    pub fn new() -> Self {
        let repositories = Repositories::in_memory();
        let live_events = LocalEventBroadcaster::new(64);
        let config = JwtConfig {
            secret: SECRET.to_owned(),
            ttl_minutes: 60,
        };
        let jwt = JwtService::new(&config).expect("valid jwt config");

        let state = AppState::new(
            repositories.clone(),
            Arc::new(PlainPasswordHasher),
            Broadcasting::local(live_events.clone()),
            Arc::new(SystemClock),
            jwt.clone(),
        );

        Self {
            router: router(state),
            repositories,
            live_events,
            jwt,
        }
    }

    pub async fn department(&self, name: &str, code: &str) -> Department {
        let department = Department::new(
            DepartmentId::generate(),
            name,
            code,
            DepartmentType::Academic,
            Utc::now(),
        )
        .expect("department");
        self.repositories
            .departments
            .create(department)
            .await
            .expect("store department")
    }

    /// 直接写入仓储的用户，密码统一为 `PASSWORD`
    pub async fn user(&self, name: &str, role: UserRole, department: Option<&Department>) -> User {
        let user = User::register(
            UserId::generate(),
            NewUser {
                name: name.to_owned(),
                email: email_of(name),
                role,
                department_id: department.map(|d| d.id),
                employee_id: None,
                student_id: (role == UserRole::Student).then(|| format!("S-{name}")),
                phone: None,
            },
            PasswordHash::new(format!("plain:{PASSWORD}")).expect("hash"),
            Utc::now(),
        )
        .expect("user");
        self.repositories.users.create(user).await.expect("store user")
    }

    pub fn token_for(&self, user: &User) -> String {
        self.jwt.generate_token(user).expect("token").token
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, text) = self.send_raw(method, uri, token, body).await;
        (status, serde_json::from_str(&text).unwrap_or(json!({})))
    }

    pub async fn send_raw(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, String) {
        match body {
            Some(body) => {
                self.send_body(method, uri, token, Some("application/json"), body.to_string())
                    .await
            }
            None => self.send_body(method, uri, token, None, String::new()).await,
        }
    }

    /// 原样发送请求体，`content_type` 为 None 时不带该头
    pub async fn send_body(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        content_type: Option<&str>,
        body: String,
    ) -> (StatusCode, String) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder.body(Body::from(body)).expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }
}

pub fn email_of(name: &str) -> String {
    format!("{}@campus.edu", name.to_lowercase().replace(' ', "."))
}
