use std::sync::Arc;

use serde_json::Map;

use shared_config::{AppConfig, StorageBackend};
use shared_database::{InMemoryStore, UserDirectory};
use shared_models::clinic::{Role, Service, UserRecord};

use crate::jwt::issue_email_token;
use crate::state::AppState;

pub struct TestConfig {
    pub token_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            token_secret: "test-secret-key-for-token-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            storage_backend: StorageBackend::Memory,
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            access_token_secret: self.token_secret.clone(),
            ..AppConfig::default()
        }
    }

    pub fn to_state(&self, store: Arc<InMemoryStore>) -> Arc<AppState> {
        Arc::new(AppState::new(self.to_app_config(), store))
    }
}

pub struct TestUser {
    pub email: String,
    pub role: Role,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::patient("test@example.com")
    }
}

impl TestUser {
    pub fn patient(email: &str) -> Self {
        Self { email: email.to_string(), role: Role::None }
    }

    pub fn admin(email: &str) -> Self {
        Self { email: email.to_string(), role: Role::Admin }
    }

    pub fn to_record(&self) -> UserRecord {
        UserRecord {
            email: self.email.clone(),
            role: self.role,
            profile: Map::new(),
        }
    }

    /// Registers the user (with its role) in the given store.
    pub async fn register(&self, store: &InMemoryStore) {
        store.upsert_user(&self.to_record()).await.expect("in-memory upsert");
        store.set_role(&self.email, self.role).await.expect("in-memory set_role");
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        issue_email_token(&user.email, secret, exp_hours.unwrap_or(24))
            .expect("test token")
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Catalog used across cell tests.
pub fn sample_catalog() -> Vec<Service> {
    vec![
        Service::new("Cleaning", &["9am", "10am", "11am"]),
        Service::new("Whitening", &["1pm", "2pm"]),
        Service::new("Orthodontics", &["8am", "9am", "3pm"]),
    ]
}

pub fn seeded_store() -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::with_services(sample_catalog()))
}
