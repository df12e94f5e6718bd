//! Registration and login across the two stores.

use super::collaborators::CredentialHasher;
use crate::dal::UserDao;
use crate::error::StoreError;
use crate::profile_store::ProfileStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct RegisteredUser {
    pub user_id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub username: String,
    pub email: String,
}

pub struct AccountService {
    users: UserDao,
    profiles: Arc<dyn ProfileStore>,
    hasher: Arc<dyn CredentialHasher>,
}

impl AccountService {
    pub fn new(
        users: UserDao,
        profiles: Arc<dyn ProfileStore>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Self {
        AccountService {
            users,
            profiles,
            hasher,
        }
    }

    /// Create the relational user row, then the profile document. The stores
    /// share no transaction: a profile conflict triggers a best-effort
    /// compensating delete of the fresh row before the error surfaces.
    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<RegisteredUser, StoreError> {
        if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(StoreError::InvalidInput(
                "username, email and password are required".to_string(),
            ));
        }

        if self.users.get_by_username(username)?.is_some() {
            return Err(StoreError::ConstraintViolation(
                "username already exists".to_string(),
            ));
        }
        if self.users.get_by_email(email)?.is_some() {
            return Err(StoreError::ConstraintViolation(
                "email already exists".to_string(),
            ));
        }

        let password_hash = self.hasher.hash(password);
        let user_id = self.users.insert_user(username, email, &password_hash)?;

        if let Err(e) = self.profiles.create_profile(username) {
            warn!(
                "Profile creation failed for {}, removing fresh user row: {}",
                username, e
            );
            if let Err(del) = self.users.delete_user(user_id) {
                warn!("Compensating delete failed for {}: {}", username, del);
            }
            return Err(e);
        }

        info!("Registered user {} ({})", username, user_id);
        Ok(RegisteredUser {
            user_id,
            username: username.to_string(),
            email: email.to_string(),
        })
    }

    /// Verify credentials and refresh `last_login` in both stores. The
    /// document-side update is best-effort; a missing profile is recreated
    /// rather than failing the login.
    pub fn login(&self, username: &str, password: &str) -> Result<AuthenticatedUser, StoreError> {
        let user = self
            .users
            .get_by_username(username)?
            .ok_or_else(|| StoreError::NotFound(format!("user: {}", username)))?;

        if !self.hasher.verify(password, &user.password_hash) {
            return Err(StoreError::InvalidCredentials);
        }

        self.users.update_last_login(user.id)?;

        match self.profiles.touch_last_login(username) {
            Ok(()) => {}
            Err(StoreError::NotFound(_)) => {
                if let Err(e) = self.profiles.create_profile(username) {
                    warn!("Could not recreate missing profile for {}: {}", username, e);
                }
            }
            Err(e) => warn!("Profile last_login update failed for {}: {}", username, e),
        }

        Ok(AuthenticatedUser {
            user_id: user.id,
            username: user.username,
            email: user.email,
        })
    }
}
