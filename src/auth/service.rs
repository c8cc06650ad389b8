use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AppError, AuthError};
use crate::store::{FileStore, UserRecord};
use crate::Result;

/// Claims carried by a session token.
///
/// The claims are advisory context for the handler that receives them;
/// they are not re-verified against the store on later requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    #[serde(rename = "type")]
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Capability for preparing and checking stored passwords.
///
/// The store never sees a raw password directly: everything persisted goes
/// through `protect`, and login checks go through `verify`. The default
/// [`PlaintextCredentials`] keeps both as identity/equality.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialHasher: Send + Sync {
    /// Prepare a raw password for persistence.
    fn protect(&self, raw: &str) -> String;

    /// Check a submitted password against its stored form.
    fn verify(&self, candidate: &str, stored: &str) -> bool;
}

/// Stores and compares passwords verbatim.
pub struct PlaintextCredentials;

impl CredentialHasher for PlaintextCredentials {
    fn protect(&self, raw: &str) -> String {
        raw.to_string()
    }

    fn verify(&self, candidate: &str, stored: &str) -> bool {
        candidate == stored
    }
}

pub struct AuthService {
    store: Arc<FileStore>,
    hasher: Arc<dyn CredentialHasher>,
    jwt_secret: String,
    token_expiry: Duration,
}

impl AuthService {
    pub fn new(
        store: Arc<FileStore>,
        hasher: Arc<dyn CredentialHasher>,
        jwt_secret: String,
        token_expiry_hours: i64,
    ) -> Self {
        Self {
            store,
            hasher,
            jwt_secret,
            token_expiry: Duration::hours(token_expiry_hours),
        }
    }

    /// Verify the submitted credentials and issue a session token.
    ///
    /// An unknown email and a wrong password are indistinguishable to the
    /// caller: both fail with `InvalidCredentials`.
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let users = self.store.load_all().await?;

        let user = users
            .iter()
            .find(|u| u.email == email && self.hasher.verify(password, &u.password))
            .ok_or(AuthError::InvalidCredentials)?;

        self.issue_token(user)
    }

    /// Issue a signed token embedding the record's email and role.
    pub fn issue_token(&self, user: &UserRecord) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            email: user.email.clone(),
            role: user.role.clone(),
            iat: now.timestamp(),
            exp: (now + self.token_expiry).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))
    }

    /// Verify a token's signature and expiry and return its claims.
    ///
    /// Expiry is checked with zero leeway: a token is valid until, but not
    /// after, its `exp` timestamp.
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            warn!("Token verification failed: {}", e);
            AuthError::TokenInvalid.into()
        })
    }
}
