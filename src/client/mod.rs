//! Typed client for the directory API.
//!
//! [`DirectoryClient`] holds the session token issued by `/login` and
//! attaches it as a bearer header to every subsequent call. It also
//! enforces the caller-side contract the server does not: a password must
//! be present when creating a record, a create is refused when the email
//! already appears in the most recent listing, and an update requires the
//! record's current password as confirmation before the request is sent.
//! That confirmation is a usability control, not a security one; the
//! server never re-checks it.

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::directory::UserUpdate;
use crate::store::UserRecord;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Not authenticated")]
    NotAuthenticated,

    /// A local pre-check refused the call before any request was issued.
    #[error("{0}")]
    Rejected(String),

    #[error("Server returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

pub struct DirectoryClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    // Most recent listing, used by the local pre-checks.
    known_users: Vec<UserRecord>,
}

impl DirectoryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: None,
            known_users: Vec::new(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Drop the held token. Tokens are not revocable server-side, so this
    /// only clears the client's session state.
    pub fn logout(&mut self) {
        self.token = None;
        self.known_users.clear();
    }

    /// Exchange credentials for a session token and hold it for
    /// subsequent calls.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), ClientError> {
        let resp = self
            .http
            .post(format!("{}/login", self.base_url))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }

        let body: TokenResponse = resp.json().await?;
        self.token = Some(body.token);
        info!("Session established for {}", email);
        Ok(())
    }

    /// Fetch the full listing and remember it for the local pre-checks.
    pub async fn list(&mut self) -> Result<Vec<UserRecord>, ClientError> {
        let resp = self
            .authorized(self.http.get(format!("{}/users", self.base_url)))?
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }

        let users: Vec<UserRecord> = resp.json().await?;
        self.known_users = users.clone();
        debug!("Fetched {} users", users.len());
        Ok(users)
    }

    /// Create a new record.
    ///
    /// Refused locally when the password is blank or the email already
    /// appears in the most recent listing.
    pub async fn create(
        &mut self,
        name: &str,
        email: &str,
        role: &str,
        password: &str,
    ) -> Result<(), ClientError> {
        if password.trim().is_empty() {
            return Err(ClientError::Rejected("Password is required".to_string()));
        }
        if self.known_users.iter().any(|u| u.email == email) {
            return Err(ClientError::Rejected(
                "E-mail already registered".to_string(),
            ));
        }

        let resp = self
            .authorized(self.http.post(format!("{}/users", self.base_url)))?
            .json(&serde_json::json!({
                "name": name,
                "email": email,
                "type": role,
                "password": password,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }
        Ok(())
    }

    /// Update the record with the given email.
    ///
    /// The record must appear in the most recent listing and
    /// `current_password` must match its stored password, otherwise the
    /// call is refused before any request is issued.
    pub async fn update(
        &mut self,
        email: &str,
        current_password: &str,
        update: UserUpdate,
    ) -> Result<(), ClientError> {
        match self.known_users.iter().find(|u| u.email == email) {
            Some(user) if user.password == current_password => {}
            _ => {
                return Err(ClientError::Rejected(
                    "Current password is incorrect".to_string(),
                ));
            }
        }

        let resp = self
            .authorized(self.http.put(format!("{}/users/{}", self.base_url, email)))?
            .json(&update)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }
        Ok(())
    }

    /// Delete the record with the given email.
    pub async fn delete(&mut self, email: &str) -> Result<(), ClientError> {
        let resp = self
            .authorized(
                self.http
                    .delete(format!("{}/users/{}", self.base_url, email)),
            )?
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }

        self.known_users.retain(|u| u.email != email);
        Ok(())
    }

    fn authorized(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, ClientError> {
        let token = self.token.as_ref().ok_or(ClientError::NotAuthenticated)?;
        Ok(builder.bearer_auth(token))
    }
}

async fn api_error(resp: reqwest::Response) -> ClientError {
    let status = resp.status().as_u16();
    let message = match resp.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => "Unknown error".to_string(),
    };
    ClientError::Api { status, message }
}
