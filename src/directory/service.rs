use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::CredentialHasher;
use crate::error::AppError;
use crate::store::{FileStore, UserRecord};
use crate::Result;

/// Partial update for a stored record, keyed by the record's original email.
///
/// A field that is absent or an empty string leaves the stored value
/// unchanged. The email itself is not updatable: the patch deliberately
/// carries no email field.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

pub struct DirectoryService {
    store: Arc<FileStore>,
    hasher: Arc<dyn CredentialHasher>,
}

impl DirectoryService {
    pub fn new(store: Arc<FileStore>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { store, hasher }
    }

    /// Return the full collection in store order.
    pub async fn list(&self) -> Result<Vec<UserRecord>> {
        self.store.load_all().await
    }

    /// Append a new record, enforcing email uniqueness.
    ///
    /// Presence of the password is a caller-side contract; an empty
    /// password is accepted here.
    pub async fn create(&self, name: &str, email: &str, role: &str, password: &str) -> Result<()> {
        let record = UserRecord::new(
            name.to_string(),
            email.to_string(),
            role.to_string(),
            self.hasher.protect(password),
        );

        self.store
            .modify(|users| {
                if users.iter().any(|u| u.email == record.email) {
                    return Err(AppError::EmailTaken);
                }
                users.push(record);
                Ok(())
            })
            .await?;

        info!("User created: {}", email);
        Ok(())
    }

    /// Apply a partial update to the record with the given email.
    pub async fn update(&self, email: &str, update: UserUpdate) -> Result<()> {
        // Protect the new password outside the store closure; empty means
        // "keep the current one", matching create's caller-side contract.
        let password = update
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| self.hasher.protect(p));

        self.store
            .modify(|users| {
                let user = users
                    .iter_mut()
                    .find(|u| u.email == email)
                    .ok_or(AppError::NotFound)?;

                apply_field(&mut user.name, update.name);
                apply_field(&mut user.role, update.role);
                if let Some(password) = password {
                    user.password = password;
                }
                Ok(())
            })
            .await?;

        info!("User updated: {}", email);
        Ok(())
    }

    /// Remove every record matching the email. Succeeds even when none
    /// match, so repeated deletes are idempotent.
    pub async fn delete(&self, email: &str) -> Result<()> {
        let removed = self
            .store
            .modify(|users| {
                let before = users.len();
                users.retain(|u| u.email != email);
                Ok(before - users.len())
            })
            .await?;

        info!("User delete for {}: {} records removed", email, removed);
        Ok(())
    }
}

fn apply_field(field: &mut String, value: Option<String>) {
    if let Some(value) = value {
        if !value.is_empty() {
            *field = value;
        }
    }
}
