mod support;

use axum::http::StatusCode;
use domain::{Channel, RoomId, UserRole};
use serde_json::json;

use support::TestApp;

#[tokio::test]
async fn concern_room_conversation() {
    let app = TestApp::new();
    let registrar = app.department("Registrar", "REG").await;
    let student = app.user("Stu Dent", UserRole::Student, None).await;
    let staff = app.user("Sam Staff", UserRole::Staff, Some(&registrar)).await;
    let head = app.user("Hal Head", UserRole::DepartmentHead, Some(&registrar)).await;
    let outsider = app.user("Oli Other", UserRole::Student, None).await;
    let student_token = app.token_for(&student);
    let staff_token = app.token_for(&staff);

    let (_, body) = app
        .send(
            "POST",
            "/api/concerns",
            Some(&student_token),
            Some(json!({
                "subject": "Enrollment hold",
                "description": "Hold on my account",
                "type": "administrative",
                "department_id": registrar.id
            })),
        )
        .await;
    let concern_id = body["data"]["id"].as_str().unwrap().to_owned();
    let (status, _) = app
        .send(
            "POST",
            &format!("/api/concerns/{concern_id}/assign"),
            Some(&app.token_for(&head)),
            Some(json!({ "assigned_to": staff.id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // 诉求聊天室包含提交人与处理人
    let (status, body) = app
        .send(
            "POST",
            "/api/chat/rooms",
            Some(&student_token),
            Some(json!({ "concern_id": concern_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let room_id: RoomId = serde_json::from_value(body["data"]["id"].clone()).unwrap();
    let participants = body["data"]["participants"].as_array().unwrap();
    assert_eq!(participants.len(), 2);

    // 再次打开返回同一个聊天室
    let (_, body) = app
        .send(
            "POST",
            "/api/chat/rooms",
            Some(&staff_token),
            Some(json!({ "concern_id": concern_id })),
        )
        .await;
    assert_eq!(body["data"]["id"], json!(room_id));

    let mut events = app.live_events.subscribe();
    let (status, body) = app
        .send(
            "POST",
            &format!("/api/chat/rooms/{room_id}/messages"),
            Some(&student_token),
            Some(json!({ "message": "Hello, any update?" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["message_type"], "text");
    let first_id = body["data"]["id"].clone();

    let room_event = events.recv().await.unwrap();
    assert_eq!(room_event.event, "chat.message.sent");
    assert_eq!(room_event.channels, vec![Channel::ChatRoom(room_id)]);
    assert_eq!(room_event.payload["message"]["message"], "Hello, any update?");

    let participant_event = events.recv().await.unwrap();
    assert_eq!(participant_event.event, "message.sent");
    assert_eq!(
        participant_event.channels,
        vec![Channel::RoomParticipant {
            room_id,
            user_id: staff.id
        }]
    );

    // 回复
    let (status, body) = app
        .send(
            "POST",
            &format!("/api/chat/rooms/{room_id}/messages"),
            Some(&staff_token),
            Some(json!({ "message": "Looking into it", "reply_to": first_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["reply_to"], first_id);
    let reply_event = events.recv().await.unwrap();
    assert_eq!(reply_event.payload["message"]["reply_to"]["id"], first_id);
    events.recv().await.unwrap();

    let (status, body) = app
        .send(
            "GET",
            &format!("/api/chat/rooms/{room_id}/messages?limit=10"),
            Some(&student_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let history = body["data"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["message"], "Looking into it");

    // 输入状态只推给其他参与者
    let (status, body) = app
        .send(
            "POST",
            &format!("/api/chat/rooms/{room_id}/typing"),
            Some(&staff_token),
            Some(json!({ "is_typing": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_typing"], true);
    let typing = events.recv().await.unwrap();
    assert_eq!(typing.event, "typing.status");
    assert_eq!(
        typing.channels,
        vec![Channel::RoomParticipant {
            room_id,
            user_id: student.id
        }]
    );

    let (status, body) = app.send("GET", "/api/chat/rooms", Some(&staff_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // 非参与者
    let outsider_token = app.token_for(&outsider);
    let (status, _) = app
        .send(
            "POST",
            &format!("/api/chat/rooms/{room_id}/messages"),
            Some(&outsider_token),
            Some(json!({ "message": "let me in" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .send(
            "GET",
            &format!("/api/chat/rooms/{room_id}/messages"),
            Some(&outsider_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn message_validation_and_unknown_room() {
    let app = TestApp::new();
    let registrar = app.department("Registrar", "REG").await;
    let student = app.user("Stu Dent", UserRole::Student, None).await;
    let staff = app.user("Sam Staff", UserRole::Staff, Some(&registrar)).await;
    let token = app.token_for(&student);

    let (status, body) = app
        .send(
            "POST",
            "/api/chat/rooms",
            Some(&token),
            Some(json!({ "participant_ids": [staff.id] })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let room_id = body["data"]["id"].as_str().unwrap().to_owned();

    let (status, _) = app
        .send(
            "POST",
            &format!("/api/chat/rooms/{room_id}/messages"),
            Some(&token),
            Some(json!({ "message": "   " })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app
        .send(
            "POST",
            &format!("/api/chat/rooms/{}/messages", RoomId::generate()),
            Some(&token),
            Some(json!({ "message": "hello" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // 只有自己一人的聊天室不合法
    let (status, _) = app
        .send("POST", "/api/chat/rooms", Some(&token), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
