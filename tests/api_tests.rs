use campus_facilities::{
    AppConfig, AppState, MemoryRepository, create_router,
    models::{Profile, Role, User},
    repository::RepositoryState,
};
use chrono::Utc;
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub repo: RepositoryState,
}

async fn spawn_app() -> TestApp {
    let repo: RepositoryState = Arc::new(MemoryRepository::new());
    let state = AppState {
        repo: repo.clone(),
        config: AppConfig::default(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address, repo }
}

/// Seeds a user with the given role directly through the repository and
/// returns its id, for use with the local 'x-user-id' auth bypass.
async fn seed_user(repo: &RepositoryState, email: &str, role: Role) -> Uuid {
    let user = repo
        .create_user(User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: campus_facilities::auth::hash_password("pw123").unwrap(),
            created_at: Utc::now(),
        })
        .await;
    repo.save_profile(Profile {
        user_id: user.id,
        role,
        department: None,
        manager_type: None,
    })
    .await;
    user.id
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_register_then_login_returns_same_user() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/register", app.address))
        .json(&serde_json::json!({ "email": "a@x.com", "password": "pw123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let registered: serde_json::Value = response.json().await.unwrap();
    assert!(registered["token"].as_str().is_some_and(|t| !t.is_empty()));
    let registered_id = registered["user"]["id"].as_str().unwrap().to_string();
    assert_eq!(registered["user"]["role"], "student");

    let response = client
        .post(format!("{}/login", app.address))
        .json(&serde_json::json!({ "email": "a@x.com", "password": "pw123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let logged_in: serde_json::Value = response.json().await.unwrap();
    assert_eq!(logged_in["user"]["id"].as_str().unwrap(), registered_id);
}

#[tokio::test]
async fn test_role_elevation_approval_flow() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Student registers and requests elevation to manager.
    let response = client
        .post(format!("{}/register", app.address))
        .json(&serde_json::json!({ "email": "s@x.com", "password": "pw123" }))
        .send()
        .await
        .unwrap();
    let registered: serde_json::Value = response.json().await.unwrap();
    let token = registered["token"].as_str().unwrap().to_string();

    let response = client
        .post(format!("{}/role", app.address))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "role": "manager", "reason": "need access" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["pending_request"], true);
    let request_id = body["request_id"].as_str().unwrap().to_string();
    // Effective role stays student until the request is decided.
    assert_eq!(body["user"]["role"], "student");

    // A second identical request returns the existing pending row.
    let response = client
        .post(format!("{}/role", app.address))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "role": "manager" }))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["request_id"].as_str().unwrap(), request_id);

    // Admin approves.
    let admin_id = seed_user(&app.repo, "admin@x.com", Role::Admin).await;
    let response = client
        .post(format!(
            "{}/admin/role-requests/{}/approve",
            app.address, request_id
        ))
        .header("x-user-id", admin_id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // The student's profile now shows the elevated role.
    let response = client
        .get(format!("{}/me", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["user"]["role"], "manager");
}

#[tokio::test]
async fn test_lab_update_pending_then_approved() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let manager_id = seed_user(&app.repo, "m@x.com", Role::Manager).await;
    let student_id = seed_user(&app.repo, "st@x.com", Role::Student).await;

    // Manager creates the lab.
    let response = client
        .post(format!("{}/labs", app.address))
        .header("x-user-id", manager_id.to_string())
        .json(&serde_json::json!({
            "building": "B1", "room_number": "101", "max_capacity": 30
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let lab: serde_json::Value = response.json().await.unwrap();
    let lab_id = lab["id"].as_str().unwrap().to_string();
    assert_eq!(lab["name"], "Lab 101");

    // Student's update becomes a pending request; the response carries the
    // unchanged current state.
    let response = client
        .post(format!("{}/labs/{}/update", app.address, lab_id))
        .header("x-user-id", student_id.to_string())
        .json(&serde_json::json!({ "current_occupancy": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "pending");
    assert_eq!(body["lab"]["current_occupancy"], 0);
    let request_id = body["request_id"].as_str().unwrap().to_string();

    // The request shows up in the manager's review queue.
    let response = client
        .get(format!("{}/updates/pending", app.address))
        .header("x-user-id", manager_id.to_string())
        .send()
        .await
        .unwrap();
    let queue: serde_json::Value = response.json().await.unwrap();
    assert_eq!(queue["total_pending"], 1);
    assert_eq!(queue["lab_requests"][0]["requested_occupancy"], 10);

    // Approval applies the captured occupancy change.
    let response = client
        .post(format!(
            "{}/updates/lab/{}/approve",
            app.address, request_id
        ))
        .header("x-user-id", manager_id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .get(format!("{}/labs", app.address))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["labs"][0]["current_occupancy"], 10);
    // The availability flag was not part of the request and is untouched.
    assert_eq!(body["labs"][0]["is_available"], true);
}

#[tokio::test]
async fn test_room_booking_approval_assigns_room() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let manager_id = seed_user(&app.repo, "mgr@x.com", Role::Manager).await;
    let lecturer_id = seed_user(&app.repo, "lect@x.com", Role::Lecturer).await;

    let response = client
        .post(format!("{}/classrooms", app.address))
        .header("x-user-id", manager_id.to_string())
        .json(&serde_json::json!({
            "building": "Main", "room_number": "204", "max_capacity": 50
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let classroom: serde_json::Value = response.json().await.unwrap();
    let classroom_id = classroom["id"].as_str().unwrap().to_string();

    let response = client
        .post(format!("{}/room-requests", app.address))
        .header("x-user-id", lecturer_id.to_string())
        .json(&serde_json::json!({
            "room_type": "classroom",
            "purpose": "Guest lecture",
            "expected_attendees": 40,
            "requested_date": "2025-01-10",
            "start_time": "09:00",
            "end_time": "10:00"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let request: serde_json::Value = response.json().await.unwrap();
    assert_eq!(request["status"], "pending");
    let request_id = request["id"].as_str().unwrap().to_string();

    let response = client
        .post(format!(
            "{}/room-requests/{}/approve",
            app.address, request_id
        ))
        .header("x-user-id", manager_id.to_string())
        .json(&serde_json::json!({ "room_id": classroom_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let approved: serde_json::Value = response.json().await.unwrap();
    assert_eq!(approved["status"], "approved");
    assert_eq!(
        approved["assigned_room"]["id"].as_str().unwrap(),
        classroom_id
    );

    // The assigned classroom is no longer available.
    let response = client
        .get(format!("{}/classrooms", app.address))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["classrooms"][0]["is_available"], false);
}
