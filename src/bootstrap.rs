//! Explicit startup seeding.
//!
//! The store starts empty; first-run provisioning is an explicit bootstrap
//! step rather than get-or-create-by-name logic hidden inside request
//! handlers. All request-path lookups are identifier-based.

use chrono::Utc;
use uuid::Uuid;

use crate::{
    auth::hash_password,
    config::AppConfig,
    models::{Library, Profile, Role, User},
    repository::RepositoryState,
};

/// Name of the library row provisioned on first run.
const DEFAULT_LIBRARY_NAME: &str = "Main Library";
const DEFAULT_LIBRARY_CAPACITY: i32 = 100;

/// seed
///
/// Ensures the baseline rows exist: the administrator account (credentials
/// from configuration) and the default library. Safe to call on every
/// startup; existing rows are left untouched.
pub async fn seed(repo: &RepositoryState, config: &AppConfig) {
    seed_admin(repo, config).await;
    seed_default_library(repo).await;
}

async fn seed_admin(repo: &RepositoryState, config: &AppConfig) {
    let email = config.seed_admin_email.trim().to_lowercase();
    if repo.find_user_by_email(&email).await.is_some() {
        tracing::debug!("admin account already present, skipping seed");
        return;
    }

    let password_hash = match hash_password(&config.seed_admin_password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("failed to hash seed admin password: {e}");
            return;
        }
    };

    let user = repo
        .create_user(User {
            id: Uuid::new_v4(),
            email: email.clone(),
            password_hash,
            created_at: Utc::now(),
        })
        .await;

    repo.save_profile(Profile {
        user_id: user.id,
        role: Role::Admin,
        department: None,
        manager_type: None,
    })
    .await;

    tracing::info!("seeded admin account: {email}");
}

async fn seed_default_library(repo: &RepositoryState) {
    if repo.find_library_by_name(DEFAULT_LIBRARY_NAME).await.is_some() {
        return;
    }

    repo.create_library(Library {
        id: Uuid::new_v4(),
        name: DEFAULT_LIBRARY_NAME.to_string(),
        current_occupancy: 0,
        max_capacity: DEFAULT_LIBRARY_CAPACITY,
        is_open: true,
        last_updated: Utc::now(),
        updated_by: None,
    })
    .await;

    tracing::info!("seeded default library: {DEFAULT_LIBRARY_NAME}");
}
