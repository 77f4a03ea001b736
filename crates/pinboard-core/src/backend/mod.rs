//! Backend boundary client.
//!
//! The hosted backend owns auth, row storage, object storage, and change
//! fan-out; this module is the single client surface for all of it. One
//! `BackendClient` is constructed at startup and passed explicitly to every
//! component; there is no global client.

pub mod auth;
pub mod errors;
pub mod posts;
pub mod realtime;
pub mod storage;

pub use auth::Credentials;
pub use errors::{BackendError, BackendErrorKind};
pub use realtime::{ChangeEvent, ChangeOp};

use reqwest::{Method, RequestBuilder, Response};

use crate::config::Config;

/// Client for the hosted message-board backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    config: Config,
    token: Option<String>,
    http: reqwest::Client,
}

impl BackendClient {
    /// Creates a new backend client with the given configuration and an
    /// optional session token.
    ///
    /// # Panics
    /// - In test builds (`#[cfg(test)]`), panics if `base_url` is not a
    ///   loopback address.
    /// - At runtime, panics if `PINBOARD_BLOCK_REAL_API=1` and `base_url`
    ///   is not a loopback address.
    ///
    /// This prevents tests from accidentally reaching a real backend.
    /// Point `PINBOARD_BASE_URL` at a mock server (e.g., wiremock).
    pub fn new(config: Config, token: Option<String>) -> Self {
        // Compile-time guard for unit tests
        #[cfg(test)]
        if !is_loopback(&config.base_url) {
            panic!(
                "Tests must not use a real backend!\n\
                 Set PINBOARD_BASE_URL to a mock server (e.g., wiremock).\n\
                 Found base_url: {}",
                config.base_url
            );
        }

        // Runtime guard for integration tests (set PINBOARD_BLOCK_REAL_API=1 in test harness)
        #[cfg(not(test))]
        if std::env::var("PINBOARD_BLOCK_REAL_API").is_ok_and(|v| v == "1")
            && !is_loopback(&config.base_url)
        {
            panic!(
                "PINBOARD_BLOCK_REAL_API=1 but trying to use a real backend!\n\
                 Set PINBOARD_BASE_URL to a mock server.\n\
                 Found base_url: {}",
                config.base_url
            );
        }

        Self {
            config,
            token,
            http: reqwest::Client::new(),
        }
    }

    /// Returns the configuration this client was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns true if a session token is attached.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Starts a request against the backend with the shared headers.
    ///
    /// Every request carries the `apikey` header; a bearer token is added
    /// when a session token is attached.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.base_url, path);
        let mut builder = self
            .http
            .request(method, url)
            .header("apikey", &self.config.anon_key);
        if let Some(token) = &self.token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        builder
    }

    /// Classifies a reqwest transport error into the operation's domain.
    pub(crate) fn classify_reqwest_error(
        kind: BackendErrorKind,
        e: reqwest::Error,
    ) -> BackendError {
        if e.is_timeout() {
            BackendError::new(kind, format!("Request timed out: {}", e))
        } else if e.is_connect() {
            BackendError::new(kind, format!("Connection failed: {}", e))
        } else {
            BackendError::new(kind, format!("Network error: {}", e))
        }
    }

    /// Maps a non-success response into a `BackendError` of the given kind.
    pub(crate) async fn check_status(
        kind: BackendErrorKind,
        response: Response,
    ) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::http_status(kind, status.as_u16(), &body))
    }
}

/// Returns true if the URL points at a loopback host.
fn is_loopback(base_url: &str) -> bool {
    url::Url::parse(base_url).is_ok_and(|u| {
        matches!(u.host_str(), Some("127.0.0.1" | "localhost" | "[::1]"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_loopback() {
        assert!(is_loopback("http://127.0.0.1:8080"));
        assert!(is_loopback("http://localhost:3000"));
        assert!(!is_loopback("https://board.example.com"));
        assert!(!is_loopback(""));
    }

    #[test]
    #[should_panic(expected = "Tests must not use a real backend")]
    fn test_new_rejects_real_backend_in_tests() {
        let config = Config {
            base_url: "https://board.example.com".to_string(),
            ..Config::default()
        };
        let _ = BackendClient::new(config, None);
    }
}
