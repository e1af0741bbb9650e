use campus_facilities::{
    AppConfig, AppState, MemoryRepository, create_router,
    auth::Claims,
    models::{Profile, Role, User},
    repository::RepositoryState,
};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;

struct TestApp {
    address: String,
    repo: RepositoryState,
    config: AppConfig,
}

async fn spawn_app() -> TestApp {
    let repo: RepositoryState = Arc::new(MemoryRepository::new());
    let config = AppConfig::default();
    let state = AppState {
        repo: repo.clone(),
        config: config.clone(),
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

    TestApp {
        address,
        repo,
        config,
    }
}

async fn register(client: &reqwest::Client, address: &str, email: &str) -> serde_json::Value {
    let response = client
        .post(format!("{address}/register"))
        .json(&serde_json::json!({ "email": email, "password": "pw123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    response.json().await.unwrap()
}

#[tokio::test]
async fn register_rejects_missing_fields() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/register", app.address))
        .json(&serde_json::json!({ "email": "", "password": "pw123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Email and password are required");
}

#[tokio::test]
async fn register_duplicate_email_conflicts() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    register(&client, &app.address, "dup@x.com").await;

    // Same address modulo case/whitespace: emails are normalized on entry.
    let response = client
        .post(format!("{}/register", app.address))
        .json(&serde_json::json!({ "email": "  DUP@x.com ", "password": "other" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "User already exists");
}

#[tokio::test]
async fn login_rejects_wrong_password_and_unknown_email() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    register(&client, &app.address, "who@x.com").await;

    let response = client
        .post(format!("{}/login", app.address))
        .json(&serde_json::json!({ "email": "who@x.com", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Invalid credentials");

    let response = client
        .post(format!("{}/login", app.address))
        .json(&serde_json::json!({ "email": "nobody@x.com", "password": "pw123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn me_requires_a_valid_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // No credential at all.
    let response = client
        .get(format!("{}/me", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Unauthorized");

    // Garbage bearer token.
    let response = client
        .get(format!("{}/me", app.address))
        .bearer_auth("not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn me_returns_profile_for_valid_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let registered = register(&client, &app.address, "valid@x.com").await;
    let token = registered["token"].as_str().unwrap();

    let response = client
        .get(format!("{}/me", app.address))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["user"]["email"], "valid@x.com");
    assert_eq!(body["user"]["role"], "student");
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let user = app
        .repo
        .create_user(User {
            id: Uuid::new_v4(),
            email: "old@x.com".to_string(),
            password_hash: campus_facilities::auth::hash_password("pw123").unwrap(),
            created_at: Utc::now(),
        })
        .await;

    // A token whose exp is in the past, signed with the correct secret.
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user.id,
        iat: (now - 10_000) as usize,
        exp: (now - 5_000) as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(app.config.jwt_secret.as_bytes()),
    )
    .unwrap();

    let response = client
        .get(format!("{}/me", app.address))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn valid_token_for_deleted_user_is_rejected() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Sign a token for a user id that never existed in the store.
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: Uuid::new_v4(),
        iat: now as usize,
        exp: (now + 3600) as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(app.config.jwt_secret.as_bytes()),
    )
    .unwrap();

    let response = client
        .get(format!("{}/me", app.address))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn dev_bypass_header_resolves_seeded_user() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let user = app
        .repo
        .create_user(User {
            id: Uuid::new_v4(),
            email: "bypass@x.com".to_string(),
            password_hash: campus_facilities::auth::hash_password("pw123").unwrap(),
            created_at: Utc::now(),
        })
        .await;
    app.repo
        .save_profile(Profile {
            user_id: user.id,
            role: Role::Manager,
            department: None,
            manager_type: None,
        })
        .await;

    let response = client
        .get(format!("{}/me", app.address))
        .header("x-user-id", user.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["user"]["role"], "manager");

    // An unknown id in the bypass header falls through to token validation
    // and is rejected without one.
    let response = client
        .get(format!("{}/me", app.address))
        .header("x-user-id", Uuid::new_v4().to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn admin_role_is_not_requestable() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let registered = register(&client, &app.address, "plain@x.com").await;
    let token = registered["token"].as_str().unwrap();

    let response = client
        .post(format!("{}/role", app.address))
        .bearer_auth(token)
        .json(&serde_json::json!({ "role": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Invalid role");
}

#[tokio::test]
async fn student_role_applies_immediately() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let registered = register(&client, &app.address, "st@x.com").await;
    let token = registered["token"].as_str().unwrap();

    let response = client
        .post(format!("{}/role", app.address))
        .bearer_auth(token)
        .json(&serde_json::json!({ "role": "student" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["pending_request"], false);
    assert!(body.get("request_id").is_none());
}

#[tokio::test]
async fn admin_profile_is_immutable_via_self_service() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let user = app
        .repo
        .create_user(User {
            id: Uuid::new_v4(),
            email: "root@x.com".to_string(),
            password_hash: campus_facilities::auth::hash_password("pw123").unwrap(),
            created_at: Utc::now(),
        })
        .await;
    app.repo
        .save_profile(Profile {
            user_id: user.id,
            role: Role::Admin,
            department: None,
            manager_type: None,
        })
        .await;

    let response = client
        .post(format!("{}/role", app.address))
        .header("x-user-id", user.id.to_string())
        .json(&serde_json::json!({ "role": "student" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["pending_request"], false);
    assert_eq!(body["user"]["role"], "admin");
    assert_eq!(body["message"], "Admin role cannot be changed");
}
