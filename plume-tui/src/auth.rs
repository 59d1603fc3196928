use once_cell::sync::Lazy;
use plume_types::{ErrorBody, User};
use regex::Regex;
use thiserror::Error;

use crate::api::{ApiClient, ApiError};

pub const LOGIN_TITLE: &str = "Welcome Back";
pub const REGISTER_TITLE: &str = "Register";
pub const REGISTERED_NOTICE: &str = "Successfully registered!";
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred. Please try again.";

pub const USERNAME_LENGTH: std::ops::RangeInclusive<usize> = 3..=20;
pub const PASSWORD_LENGTH: std::ops::RangeInclusive<usize> = 8..=20;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9._%+-]+@[a-z0-9.-]+[.][a-z]{2,}$").expect("email pattern is valid")
});

#[derive(Debug, Error)]
pub enum AuthError {
    /// Form input rejected before any request was sent
    #[error("{0}")]
    Invalid(String),

    /// Registration refused with a field message (400)
    #[error("{0}")]
    Rejected(String),

    /// Login refused or the backend unreachable
    #[error("{0}")]
    Failed(String),

    #[error("Failed to persist session: {0}")]
    Storage(String),
}

impl AuthError {
    /// A rejected registration clears the whole form
    pub fn clears_form(&self) -> bool {
        matches!(self, AuthError::Rejected(_))
    }
}

/// Fields of the registration form after local checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    pub fn new(username: &str, email: &str, password: &str) -> Result<Self, AuthError> {
        let username = username.trim();
        let email = email.trim();

        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AuthError::Invalid("All fields are required".to_string()));
        }
        if !USERNAME_LENGTH.contains(&username.chars().count()) {
            return Err(AuthError::Invalid(
                "Username must be 3 to 20 characters".to_string(),
            ));
        }
        if !EMAIL_PATTERN.is_match(email) {
            return Err(AuthError::Invalid("Please enter a valid email address".to_string()));
        }
        if !PASSWORD_LENGTH.contains(&password.chars().count()) {
            return Err(AuthError::Invalid(
                "Password must be 8 to 20 characters".to_string(),
            ));
        }

        Ok(Self {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        })
    }
}

/// Login, registration and logout against the backend.
///
/// A successful login writes the session keys in a fixed order: user,
/// access token and username first, refresh token last. The writes are
/// independent; an interruption in between leaves a partial session that the
/// next refresh attempt will tear down.
#[derive(Clone)]
pub struct AuthFlow {
    api: ApiClient,
}

impl AuthFlow {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Invalid("Email and password are required".to_string()));
        }

        let response = self
            .api
            .login(email.to_string(), password.to_string())
            .await
            .map_err(login_failure)?;

        let session = self.api.session();
        session
            .set_credentials(&response.user, &response.access)
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        session
            .set_refresh_token(&response.refresh)
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        log::info!("Logged in as {}", response.user.username);
        Ok(response.user)
    }

    pub async fn register(&self, registration: Registration) -> Result<(), AuthError> {
        let Registration {
            username,
            email,
            password,
        } = registration;

        match self.api.register(username.clone(), email, password).await {
            Ok(()) => {
                log::info!("Registered account {}", username);
                Ok(())
            }
            Err(ApiError::BadRequest(body)) => {
                let message = ErrorBody::parse(&body)
                    .registration_message()
                    .unwrap_or_else(|| UNEXPECTED_ERROR.to_string());
                log::warn!("Registration rejected: {}", message);
                Err(AuthError::Rejected(message))
            }
            Err(e) => {
                log::error!("Registration failed: {}", e);
                Err(AuthError::Failed(UNEXPECTED_ERROR.to_string()))
            }
        }
    }

    /// Destroy the session: all four storage keys and the in-memory state
    pub fn logout(&self) {
        log::info!("Logging out");
        self.api.session().teardown();
    }
}

fn login_failure(error: ApiError) -> AuthError {
    log::warn!("Login failed: {}", error);
    let message = match &error {
        ApiError::Network(_) => "Cannot connect to server. Please check the server URL.".to_string(),
        other => other
            .body()
            .and_then(|body| ErrorBody::parse(body).detail_message())
            .unwrap_or_else(|| UNEXPECTED_ERROR.to_string()),
    };
    AuthError::Failed(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionContext;
    use crate::storage::{keys, MemoryStorage, StorageAdapter};
    use crate::testutil::{logged_in_session, ScriptedTransport};
    use std::sync::Arc;

    fn flow(transport: &Arc<ScriptedTransport>, session: SessionContext) -> AuthFlow {
        AuthFlow::new(ApiClient::with_transport(
            transport.clone(),
            "http://api.test",
            session,
        ))
    }

    #[tokio::test]
    async fn test_login_persists_all_keys() {
        let transport = ScriptedTransport::new();
        transport.push(
            200,
            r#"{"user": {"id": 7, "username": "bea", "email": "bea@example.com"},
                "access": "acc", "refresh": "ref"}"#,
        );
        let storage = Arc::new(MemoryStorage::new());
        let session = SessionContext::hydrate(storage.clone());

        let user = flow(&transport, session.clone())
            .login(" bea@example.com ", "hunter22")
            .await
            .unwrap();

        assert_eq!(user.username, "bea");
        assert!(session.is_authenticated());
        assert_eq!(storage.get(keys::ACCESS_TOKEN).unwrap().as_deref(), Some("acc"));
        assert_eq!(storage.get(keys::REFRESH_TOKEN).unwrap().as_deref(), Some("ref"));
        assert_eq!(storage.get(keys::USERNAME).unwrap().as_deref(), Some("bea"));
        assert!(storage.get(keys::USER).unwrap().is_some());
        assert_eq!(
            transport.requests()[0].body,
            Some(serde_json::json!({ "email": "bea@example.com", "password": "hunter22" }))
        );
    }

    #[tokio::test]
    async fn test_login_failure_shows_detail() {
        let transport = ScriptedTransport::new();
        transport.push(401, r#"{"detail": "No active account found with the given credentials"}"#);
        let storage = Arc::new(MemoryStorage::new());

        let err = flow(&transport, SessionContext::hydrate(storage))
            .login("bea@example.com", "wrong")
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "No active account found with the given credentials"
        );
        // Login is public: a 401 here must not trigger the refresh protocol
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_registration_checks_fields_locally() {
        assert!(Registration::new("al", "al@example.com", "password1").is_err());
        assert!(Registration::new("alice", "not-an-email", "password1").is_err());
        assert!(Registration::new("alice", "Alice@Example.com", "password1").is_err());
        assert!(Registration::new("alice", "alice@example.com", "short").is_err());
        assert!(Registration::new("alice", "alice@example.com", "password1").is_ok());
    }

    #[tokio::test]
    async fn test_register_field_error_prefers_email() {
        let transport = ScriptedTransport::new();
        transport.push(
            400,
            r#"{"username": ["A user with that username already exists."],
                "email": ["user with this email already exists."]}"#,
        );
        let storage = Arc::new(MemoryStorage::new());
        let registration = Registration::new("alice", "alice@example.com", "password1").unwrap();

        let err = flow(&transport, SessionContext::hydrate(storage))
            .register(registration)
            .await
            .unwrap_err();

        assert!(err.clears_form());
        assert_eq!(err.to_string(), "user with this email already exists.");
    }

    #[tokio::test]
    async fn test_register_server_error_is_generic() {
        let transport = ScriptedTransport::new();
        transport.push(500, "boom");
        let storage = Arc::new(MemoryStorage::new());
        let registration = Registration::new("alice", "alice@example.com", "password1").unwrap();

        let err = flow(&transport, SessionContext::hydrate(storage))
            .register(registration)
            .await
            .unwrap_err();

        assert!(!err.clears_form());
        assert_eq!(err.to_string(), UNEXPECTED_ERROR);
    }

    #[test]
    fn test_logout_clears_every_key() {
        let transport = ScriptedTransport::new();
        let (session, storage) = logged_in_session();

        flow(&transport, session.clone()).logout();

        assert!(!session.is_authenticated());
        for key in keys::ALL {
            assert_eq!(storage.get(key).unwrap(), None);
        }
    }
}
