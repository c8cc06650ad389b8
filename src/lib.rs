pub mod auth;
pub mod client;
pub mod config;
pub mod directory;
pub mod error;
pub mod store;

use std::sync::Arc;

use actix_web::HttpResponse;
use tracing::info;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::{AuthGuard, AuthService, CredentialHasher, PlaintextCredentials};
pub use client::{ClientError, DirectoryClient};
pub use directory::{DirectoryService, UserUpdate};
pub use store::{FileStore, UserRecord};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub store: Arc<FileStore>,
    pub auth: Arc<AuthService>,
    pub directory: Arc<DirectoryService>,
}

impl AppState {
    pub async fn new(config: Settings) -> Result<Self> {
        let store = Arc::new(FileStore::new(&config.store.path));

        // Fail fast when the backing file is missing or corrupt.
        let records = store.load_all().await?;
        info!(
            "User store {} loaded with {} records",
            config.store.path,
            records.len()
        );

        let hasher: Arc<dyn CredentialHasher> = Arc::new(PlaintextCredentials);
        let auth = Arc::new(AuthService::new(
            store.clone(),
            hasher.clone(),
            config.auth.jwt_secret.clone(),
            config.auth.token_expiry_hours,
        ));
        let directory = Arc::new(DirectoryService::new(store.clone(), hasher));

        Ok(Self {
            config: Arc::new(config),
            store,
            auth,
            directory,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn test_config_with_store(path: &str) -> Settings {
        let mut config = Settings::new_for_test().expect("Failed to load test config");
        config.store.path = path.to_string();
        config
    }

    #[tokio::test]
    async fn test_app_state_requires_readable_store() {
        let path = std::env::temp_dir().join(format!("userdir-missing-{}.json", Uuid::new_v4()));
        let config = test_config_with_store(&path.to_string_lossy());

        let state = AppState::new(config).await;
        assert!(state.is_err());
        if let Err(e) = state {
            assert!(matches!(e, AppError::Store(_)));
        }
    }

    #[tokio::test]
    async fn test_app_state_clone_shares_components() {
        let path = std::env::temp_dir().join(format!("userdir-state-{}.json", Uuid::new_v4()));
        std::fs::write(&path, b"[]").unwrap();
        let config = test_config_with_store(&path.to_string_lossy());

        let state = AppState::new(config).await.unwrap();
        let cloned = state.clone();

        // Verify Arc references are shared
        assert!(Arc::ptr_eq(&state.config, &cloned.config));
        assert!(Arc::ptr_eq(&state.store, &cloned.store));
        assert!(Arc::ptr_eq(&state.auth, &cloned.auth));
        assert!(Arc::ptr_eq(&state.directory, &cloned.directory));
    }
}
