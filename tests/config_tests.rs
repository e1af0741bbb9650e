use campus_facilities::{
    bootstrap,
    config::{AppConfig, Env},
    models::Role,
    repository::{MemoryRepository, Repository, RepositoryState},
};
use serial_test::serial;
use std::env;
use std::sync::Arc;

// Environment variables are process-global, so every test touching them is
// serialized.

fn set(key: &str, value: &str) {
    unsafe { env::set_var(key, value) }
}

fn unset(key: &str) {
    unsafe { env::remove_var(key) }
}

#[test]
#[serial]
fn load_defaults_to_local_env() {
    unset("APP_ENV");
    unset("JWT_SECRET");
    set("DATABASE_URL", "postgres://localhost/facilities_test");

    let config = AppConfig::load();
    assert_eq!(config.env, Env::Local);
    assert_eq!(config.db_url, "postgres://localhost/facilities_test");
    // Local falls back to the development signing secret.
    assert!(!config.jwt_secret.is_empty());
    assert_eq!(config.seed_admin_email, "admin@campus.edu");
}

#[test]
#[serial]
fn load_reads_production_settings() {
    set("APP_ENV", "production");
    set("DATABASE_URL", "postgres://db.internal/facilities");
    set("JWT_SECRET", "prod-secret");
    set("SEED_ADMIN_EMAIL", "ops@campus.edu");

    let config = AppConfig::load();
    assert_eq!(config.env, Env::Production);
    assert_eq!(config.jwt_secret, "prod-secret");
    assert_eq!(config.seed_admin_email, "ops@campus.edu");

    unset("APP_ENV");
    unset("JWT_SECRET");
    unset("SEED_ADMIN_EMAIL");
}

#[test]
#[serial]
fn default_config_is_usable_without_environment() {
    // No env vars required: the Default impl exists exactly for test setup.
    let config = AppConfig::default();
    assert_eq!(config.env, Env::Local);
    assert!(!config.jwt_secret.is_empty());
    assert!(!config.seed_admin_password.is_empty());
}

#[tokio::test]
async fn seed_provisions_admin_and_default_library_once() {
    let repo: RepositoryState = Arc::new(MemoryRepository::new());
    let config = AppConfig::default();

    bootstrap::seed(&repo, &config).await;

    let admin = repo
        .find_user_by_email(&config.seed_admin_email)
        .await
        .expect("admin seeded");
    let profile = repo.get_or_create_profile(admin.id).await;
    assert_eq!(profile.role, Role::Admin);

    let library = repo
        .find_library_by_name("Main Library")
        .await
        .expect("default library seeded");
    assert!(library.is_open);
    assert!(library.max_capacity > 0);

    // Idempotent: a second run leaves existing rows in place.
    bootstrap::seed(&repo, &config).await;
    assert_eq!(repo.list_accounts().await.len(), 1);
    assert_eq!(repo.list_libraries().await.len(), 1);

    // The seeded credentials actually verify.
    assert!(campus_facilities::auth::verify_password(
        &config.seed_admin_password,
        &admin.password_hash
    ));
}
