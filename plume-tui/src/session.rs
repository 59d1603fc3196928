use anyhow::{Context, Result};
use plume_types::{User, UserId};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::storage::{keys, StorageAdapter};

/// In-memory view of who is logged in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_authenticated: bool,
}

impl AuthState {
    fn new(user: Option<User>, token: Option<String>) -> Self {
        let is_authenticated = token.is_some();
        Self {
            user,
            token,
            is_authenticated,
        }
    }
}

/// Session context shared by the API client and the application.
///
/// Durable storage is the source of truth for tokens; the in-memory
/// [`AuthState`] mirrors it for rendering. The four storage keys are written
/// one at a time, so a crash between writes can leave them inconsistent.
#[derive(Clone)]
pub struct SessionContext {
    storage: Arc<dyn StorageAdapter>,
    state: Arc<RwLock<AuthState>>,
}

impl SessionContext {
    /// Load the persisted session from storage.
    ///
    /// A `user` record that is not valid JSON is removed and treated as absent.
    pub fn hydrate(storage: Arc<dyn StorageAdapter>) -> Self {
        let user = match storage.get(keys::USER) {
            Ok(Some(raw)) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    log::warn!("Stored user record is corrupted, clearing it: {}", e);
                    if let Err(e) = storage.remove(keys::USER) {
                        log::warn!("Failed to clear corrupted user record: {}", e);
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                log::warn!("Failed to read stored user record: {}", e);
                None
            }
        };

        let token = read_key(storage.as_ref(), keys::ACCESS_TOKEN);
        let state = AuthState::new(user, token);

        log::info!(
            "Session hydrated: authenticated={}, user={:?}",
            state.is_authenticated,
            state.user.as_ref().map(|u| u.username.as_str())
        );

        Self {
            storage,
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Record a successful login: user record, access token and username.
    pub fn set_credentials(&self, user: &User, access_token: &str) -> Result<()> {
        let user_json = serde_json::to_string(user).context("Failed to serialize user record")?;

        {
            let mut state = self.write_state();
            *state = AuthState::new(Some(user.clone()), Some(access_token.to_string()));
        }

        self.storage.set(keys::USER, &user_json)?;
        self.storage.set(keys::ACCESS_TOKEN, access_token)?;
        self.storage.set(keys::USERNAME, &user.username)?;
        Ok(())
    }

    /// The refresh token is kept apart from the main session record.
    pub fn set_refresh_token(&self, refresh_token: &str) -> Result<()> {
        self.storage.set(keys::REFRESH_TOKEN, refresh_token)
    }

    /// Replace the access token after a successful refresh.
    pub fn store_access_token(&self, access_token: &str) -> Result<()> {
        self.storage.set(keys::ACCESS_TOKEN, access_token)?;
        let mut state = self.write_state();
        let user = state.user.take();
        *state = AuthState::new(user, Some(access_token.to_string()));
        Ok(())
    }

    /// Current access token, read from storage at call time.
    pub fn access_token(&self) -> Option<String> {
        read_key(self.storage.as_ref(), keys::ACCESS_TOKEN)
    }

    pub fn refresh_token(&self) -> Option<String> {
        read_key(self.storage.as_ref(), keys::REFRESH_TOKEN)
    }

    /// Remove every session key and reset the in-memory state.
    pub fn teardown(&self) {
        for key in keys::ALL {
            if let Err(e) = self.storage.remove(key) {
                log::warn!("Failed to remove session key '{}': {}", key, e);
            }
        }
        *self.write_state() = AuthState::default();
        log::info!("Session cleared");
    }

    pub fn snapshot(&self) -> AuthState {
        self.read_state().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.read_state().user.clone()
    }

    pub fn current_user_id(&self) -> Option<UserId> {
        self.read_state().user.as_ref().map(|u| u.id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_state().is_authenticated
    }

    fn read_state(&self) -> RwLockReadGuard<'_, AuthState> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, AuthState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn read_key(storage: &dyn StorageAdapter, key: &str) -> Option<String> {
    match storage.get(key) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Failed to read storage key '{}': {}", key, e);
            None
        }
    }
}
