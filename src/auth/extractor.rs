use std::future::{ready, Ready};

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};

use crate::auth::Claims;
use crate::error::{AppError, AuthError};
use crate::AppState;

/// Request guard for protected routes.
///
/// Pulls the bearer token from the `Authorization` header and verifies it
/// before the handler runs. A missing header fails with `TokenMissing`
/// (unauthorized); a token that fails verification fails with
/// `TokenInvalid` (forbidden). On success the decoded claims are exposed
/// to the handler.
#[derive(Debug)]
pub struct AuthGuard(pub Claims);

impl FromRequest for AuthGuard {
    type Error = AppError;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> std::result::Result<AuthGuard, AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("Application state is not configured".to_string()))?;

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AuthError::TokenMissing)?;

    let claims = state.auth.verify_token(token)?;
    Ok(AuthGuard(claims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthService, PlaintextCredentials};
    use crate::config::Settings;
    use crate::directory::DirectoryService;
    use crate::store::{FileStore, UserRecord};
    use actix_web::test::TestRequest;
    use std::sync::Arc;
    use uuid::Uuid;

    async fn seeded_state() -> web::Data<AppState> {
        let path = std::env::temp_dir().join(format!("userdir-guard-{}.json", Uuid::new_v4()));
        let store = Arc::new(FileStore::new(path));
        store
            .save_all(&[UserRecord::new(
                "A".to_string(),
                "a@x.com".to_string(),
                "admin".to_string(),
                "p".to_string(),
            )])
            .await
            .unwrap();

        let hasher = Arc::new(PlaintextCredentials);
        let auth = Arc::new(AuthService::new(
            store.clone(),
            hasher.clone(),
            "test_secret".to_string(),
            1,
        ));
        let directory = Arc::new(DirectoryService::new(store.clone(), hasher));

        web::Data::new(AppState {
            config: Arc::new(Settings::new_for_test().unwrap()),
            store,
            auth,
            directory,
        })
    }

    #[actix_web::test]
    async fn test_missing_header_is_token_missing() {
        let state = seeded_state().await;
        let req = TestRequest::default().app_data(state).to_http_request();

        let err = authenticate(&req).unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::TokenMissing)));
    }

    #[actix_web::test]
    async fn test_header_without_bearer_prefix_is_token_missing() {
        let state = seeded_state().await;
        let req = TestRequest::default()
            .app_data(state)
            .insert_header(("Authorization", "Basic abc"))
            .to_http_request();

        let err = authenticate(&req).unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::TokenMissing)));
    }

    #[actix_web::test]
    async fn test_garbage_token_is_token_invalid() {
        let state = seeded_state().await;
        let req = TestRequest::default()
            .app_data(state)
            .insert_header(("Authorization", "Bearer garbage"))
            .to_http_request();

        let err = authenticate(&req).unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::TokenInvalid)));
    }

    #[actix_web::test]
    async fn test_valid_token_exposes_claims() {
        let state = seeded_state().await;
        let token = state.auth.login("a@x.com", "p").await.unwrap();
        let req = TestRequest::default()
            .app_data(state)
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_http_request();

        let guard = authenticate(&req).unwrap();
        assert_eq!(guard.0.email, "a@x.com");
        assert_eq!(guard.0.role, "admin");
    }
}
