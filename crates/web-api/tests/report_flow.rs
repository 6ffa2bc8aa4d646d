mod support;

use axum::http::StatusCode;
use domain::UserRole;
use serde_json::json;

use support::TestApp;

async fn submit(app: &TestApp, token: &str, department_id: String, subject: &str) -> String {
    let (status, body) = app
        .send(
            "POST",
            "/api/concerns",
            Some(token),
            Some(json!({
                "subject": subject,
                "description": "details",
                "type": "administrative",
                "department_id": department_id
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_str().unwrap().to_owned()
}

async fn set_status(app: &TestApp, token: &str, concern_id: &str, status: &str) {
    let (code, _) = app
        .send(
            "PATCH",
            &format!("/api/concerns/{concern_id}/status"),
            Some(token),
            Some(json!({ "status": status })),
        )
        .await;
    assert_eq!(code, StatusCode::OK, "{status}");
}

#[tokio::test]
async fn concern_report_aggregates_counts() {
    let app = TestApp::new();
    let registrar = app.department("Registrar", "REG").await;
    let finance = app.department("Finance Office", "FIN").await;
    let admin = app.user("Ada Admin", UserRole::Admin, None).await;
    let head = app.user("Hal Head", UserRole::DepartmentHead, Some(&registrar)).await;
    let student = app.user("Stu Dent", UserRole::Student, None).await;
    let student_token = app.token_for(&student);
    let admin_token = app.token_for(&admin);

    let a = submit(&app, &student_token, registrar.id.to_string(), "Alpha subject").await;
    let b = submit(&app, &student_token, registrar.id.to_string(), "Bravo subject").await;
    submit(&app, &student_token, registrar.id.to_string(), "Charlie subject").await;
    submit(&app, &student_token, finance.id.to_string(), "Delta subject").await;

    for id in [&a, &b] {
        set_status(&app, &admin_token, id, "in_progress").await;
        set_status(&app, &admin_token, id, "resolved").await;
    }
    set_status(&app, &admin_token, &b, "closed").await;

    let (status, html) = app
        .send_raw("GET", "/api/reports/concerns", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Concerns Report"));
    assert!(html.contains("Alpha subject"));
    assert!(html.contains("Delta subject"));
    // 4 条中 2 条已解决
    assert!(html.contains("50.0%"));
    assert!(html.contains("card rate-low"));

    // 负责人只能看到本院系
    let (status, html) = app
        .send_raw("GET", "/api/reports/concerns", Some(&app.token_for(&head)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Department:</strong> Registrar"));
    assert!(!html.contains("Delta subject"));
    assert!(html.contains("66.7%"));
    assert!(html.contains("card rate-medium"));

    let (status, html) = app
        .send_raw(
            "GET",
            &format!("/api/reports/concerns?status=closed&department_id={}", registrar.id),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Status:</strong> closed"));
    assert!(html.contains("Bravo subject"));
    assert!(!html.contains("Alpha subject"));
    assert!(html.contains("100.0%"));
    assert!(html.contains("card rate-high"));
}

#[tokio::test]
async fn report_access_is_restricted() {
    let app = TestApp::new();
    let registrar = app.department("Registrar", "REG").await;
    let staff = app.user("Sam Staff", UserRole::Staff, Some(&registrar)).await;
    let admin = app.user("Ada Admin", UserRole::Admin, None).await;

    let (status, body) = app
        .send("GET", "/api/reports/users", Some(&app.token_for(&staff)), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Unauthorized. Insufficient permissions.");

    let (status, _) = app
        .send("GET", "/api/reports/invoices", Some(&app.token_for(&admin)), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_and_department_reports_render() {
    let app = TestApp::new();
    let registrar = app.department("Registrar", "REG").await;
    let admin = app.user("Ada Admin", UserRole::Admin, None).await;
    app.user("Sam Staff", UserRole::Staff, Some(&registrar)).await;
    let token = app.token_for(&admin);

    let (status, html) = app
        .send_raw("GET", "/api/reports/users?status=active", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Users Report"));
    assert!(html.contains("sam.staff@campus.edu"));
    assert!(html.contains("Registrar"));

    let (status, html) = app
        .send_raw("GET", "/api/reports/departments", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Departments Report"));
    assert!(html.contains("REG"));
}

#[tokio::test]
async fn unknown_status_filter_is_ignored() {
    let app = TestApp::new();
    let registrar = app.department("Registrar", "REG").await;
    let admin = app.user("Ada Admin", UserRole::Admin, None).await;
    let student = app.user("Stu Dent", UserRole::Student, None).await;
    let student_token = app.token_for(&student);
    let admin_token = app.token_for(&admin);

    let a = submit(&app, &student_token, registrar.id.to_string(), "Alpha subject").await;
    submit(&app, &student_token, registrar.id.to_string(), "Bravo subject").await;
    set_status(&app, &admin_token, &a, "in_progress").await;
    set_status(&app, &admin_token, &a, "resolved").await;

    let (status, html) = app
        .send_raw("GET", "/api/reports/concerns?status=bogus", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!html.contains("Status:</strong>"));
    assert!(html.contains("Alpha subject"));
    assert!(html.contains("Bravo subject"));
    assert!(html.contains("50.0%"));

    // 大小写不同的合法状态照常过滤
    let (status, html) = app
        .send_raw("GET", "/api/reports/concerns?status=RESOLVED", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Status:</strong> resolved"));
    assert!(html.contains("Alpha subject"));
    assert!(!html.contains("Bravo subject"));
}

#[tokio::test]
async fn announcement_report_filters_by_status() {
    let app = TestApp::new();
    let admin = app.user("Ada Admin", UserRole::Admin, None).await;
    let token = app.token_for(&admin);

    let mut ids = Vec::new();
    for (title, publish) in [("Library hours", true), ("Exam draft", false)] {
        let (status, body) = app
            .send(
                "POST",
                "/api/announcements",
                Some(&token),
                Some(json!({
                    "title": title,
                    "content": "details",
                    "type": "academic",
                    "publish": publish
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(body["data"]["id"].as_str().unwrap().to_owned());
    }
    for _ in 0..3 {
        let (status, _) = app
            .send("GET", &format!("/api/announcements/{}", ids[0]), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, html) = app
        .send_raw("GET", "/api/reports/announcements", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Announcements Report"));
    assert!(html.contains("Library hours"));
    assert!(html.contains("Exam draft"));

    let (status, html) = app
        .send_raw(
            "GET",
            "/api/reports/announcements?status=published",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Status:</strong> published"));
    assert!(html.contains("Library hours"));
    assert!(!html.contains("Exam draft"));
    assert!(html.contains(r#"<div class="value">3</div>"#));
}
