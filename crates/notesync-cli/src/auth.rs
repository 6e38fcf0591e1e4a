//! CLI Firebase session helpers with secure keychain persistence.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use notesync_core::auth::{AuthResult, FirebaseAuthClient, SessionPersistence};
pub use notesync_core::auth::{AuthError, AuthSession};
use notesync_core::config::FirebaseConfig;

use crate::error::CliError;

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "notesync-cli";

/// Firebase auth client whose session lives in the keychain entry of one
/// profile.
pub type ProfileAuthClient = FirebaseAuthClient<SessionStore>;

#[derive(Clone)]
pub struct SessionStore {
    username: String,
}

impl SessionStore {
    fn new(profile_name: &str) -> Self {
        Self {
            username: format!("firebase_session:{profile_name}"),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> AuthResult<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))
    }
}

impl SessionPersistence for SessionStore {
    #[cfg(not(test))]
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let entry = self.entry()?;
        match entry.get_password() {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard
            .get(&self.username)
            .map(|raw| serde_json::from_str(raw))
            .transpose()
            .map_err(AuthError::from)
    }

    #[cfg(not(test))]
    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        self.entry()?
            .set_password(&raw)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))
    }

    #[cfg(test)]
    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard.insert(self.username.clone(), raw);
        Ok(())
    }

    #[cfg(not(test))]
    fn clear_session(&self) -> AuthResult<()> {
        let entry = self.entry()?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn clear_session(&self) -> AuthResult<()> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard.remove(&self.username);
        Ok(())
    }
}

/// Build the auth client for `profile_name`, or explain what is missing.
pub fn auth_client_for_profile(
    profile_name: &str,
    firebase: &FirebaseConfig,
) -> Result<ProfileAuthClient, CliError> {
    firebase.validate()?;
    let api_key = firebase.api_key().ok_or_else(|| {
        CliError::Config(format!(
            "Profile '{profile_name}' has no Firebase API key. Run `notesync config init --api-key <KEY>` or set NOTESYNC_FIREBASE_API_KEY."
        ))
    })?;

    FirebaseAuthClient::new(
        api_key,
        firebase.auth_url(),
        firebase.token_url(),
        SessionStore::new(profile_name),
    )
    .map_err(|error| CliError::Auth(error.to_string()))
}

pub fn load_stored_session(profile_name: &str) -> AuthResult<Option<AuthSession>> {
    SessionStore::new(profile_name).load_session()
}

pub fn clear_stored_session(profile_name: &str) -> AuthResult<()> {
    SessionStore::new(profile_name).clear_session()
}

#[cfg(test)]
mod tests {
    use notesync_core::auth::Identity;

    use super::*;

    fn session(user_id: &str) -> AuthSession {
        AuthSession {
            id_token: "secret-id-token".to_string(),
            refresh_token: "secret-refresh-token".to_string(),
            expires_at: 4_102_444_800,
            identity: Identity::new(user_id),
        }
    }

    #[test]
    fn sessions_are_scoped_per_profile() {
        SessionStore::new("auth-test-work")
            .save_session(&session("work-user"))
            .unwrap();

        let work = load_stored_session("auth-test-work").unwrap().unwrap();
        assert_eq!(work.identity.user_id, "work-user");
        assert!(load_stored_session("auth-test-home").unwrap().is_none());

        clear_stored_session("auth-test-work").unwrap();
        assert!(load_stored_session("auth-test-work").unwrap().is_none());
    }

    #[test]
    fn clearing_a_missing_session_succeeds() {
        clear_stored_session("auth-test-never-saved").unwrap();
    }

    #[test]
    fn auth_client_requires_api_key() {
        let error = auth_client_for_profile("auth-test", &FirebaseConfig::default()).err().expect("expected auth client creation to fail");
        assert!(matches!(error, CliError::Config(_)));
        assert!(error.to_string().contains("auth-test"));
    }

    #[test]
    fn auth_client_rejects_invalid_endpoint() {
        let firebase = FirebaseConfig {
            api_key: Some("key".to_string()),
            auth_url: Some("localhost:9099".to_string()),
            ..FirebaseConfig::default()
        };
        assert!(auth_client_for_profile("auth-test", &firebase).is_err());
    }

    #[test]
    fn session_debug_redacts_tokens() {
        let rendered = format!("{:?}", session("user"));
        assert!(!rendered.contains("secret-id-token"));
        assert!(!rendered.contains("secret-refresh-token"));
    }
}
