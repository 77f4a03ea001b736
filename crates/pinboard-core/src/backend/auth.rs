//! Session operations and credential persistence.
//!
//! The backend owns the session; the client holds only the access token,
//! stored at `${PINBOARD_HOME}/auth.json` with owner-only permissions.
//! Whether the token still names a live session is decided by the backend
//! on every check; nothing is cached beyond the token itself.

use std::fs;

use anyhow::{Context, Result};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::errors::{BackendError, BackendErrorKind};
use super::BackendClient;
use crate::paths::auth_path;
use crate::types::UserInfo;

/// Stored session credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
}

/// Response from a successful password sign-in.
#[derive(Debug, Clone, Deserialize)]
pub struct SignInResponse {
    pub access_token: String,
    pub user: UserInfo,
}

impl BackendClient {
    /// Exchanges email + password for a session token.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignInResponse, BackendError> {
        let response = self
            .request(Method::POST, "/auth/v1/token?grant_type=password")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| Self::classify_reqwest_error(BackendErrorKind::Auth, e))?;

        let response = Self::check_status(BackendErrorKind::Auth, response).await?;
        response
            .json::<SignInResponse>()
            .await
            .map_err(|e| BackendError::auth(format!("Malformed sign-in response: {}", e)))
    }

    /// Queries the backend for the current session's user.
    ///
    /// Any failure (missing token, expired session, transport error)
    /// is an auth error; the caller treats all of them as "no session".
    pub async fn current_user(&self) -> Result<UserInfo, BackendError> {
        if !self.has_token() {
            return Err(BackendError::auth("Not signed in"));
        }

        let response = self
            .request(Method::GET, "/auth/v1/user")
            .send()
            .await
            .map_err(|e| Self::classify_reqwest_error(BackendErrorKind::Auth, e))?;

        let response = Self::check_status(BackendErrorKind::Auth, response).await?;
        response
            .json::<UserInfo>()
            .await
            .map_err(|e| BackendError::auth(format!("Malformed user response: {}", e)))
    }

    /// Terminates the current session on the backend.
    pub async fn sign_out(&self) -> Result<(), BackendError> {
        if !self.has_token() {
            return Err(BackendError::auth("Not signed in"));
        }

        let response = self
            .request(Method::POST, "/auth/v1/logout")
            .send()
            .await
            .map_err(|e| Self::classify_reqwest_error(BackendErrorKind::Auth, e))?;

        Self::check_status(BackendErrorKind::Auth, response).await?;
        Ok(())
    }
}

/// Saves credentials to auth.json with owner-only permissions.
pub fn save_credentials(creds: &Credentials) -> Result<()> {
    let path = auth_path();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).context("Failed to create pinboard home")?;
    }

    let json = serde_json::to_string_pretty(creds).context("Failed to serialize credentials")?;
    fs::write(&path, json).context("Failed to write auth.json")?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))
            .context("Failed to set auth.json permissions")?;
    }

    Ok(())
}

/// Loads stored credentials, if any.
pub fn load_credentials() -> Result<Option<Credentials>> {
    let path = auth_path();
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path).context("Failed to read auth.json")?;
    let creds = serde_json::from_str(&content).context("Failed to parse auth.json")?;
    Ok(Some(creds))
}

/// Removes stored credentials. Returns true if anything was removed.
pub fn clear_credentials() -> Result<bool> {
    let path = auth_path();
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(&path).context("Failed to remove auth.json")?;
    Ok(true)
}
