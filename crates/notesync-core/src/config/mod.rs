//! Client configuration shared by every notesync front end.
//!
//! Holds the public Firebase project coordinates and the sync policy knobs.
//! Only safe-to-ship values belong here; user credentials never do.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::auth::{DEFAULT_AUTH_URL, DEFAULT_TOKEN_URL};
use crate::remote::{DEFAULT_FIRESTORE_URL, DEFAULT_NOTES_COLLECTION};
use crate::snapshot::{validate_slot_name, DEFAULT_SNAPSHOT_SLOT};
use crate::util::{is_http_url, normalize_text_option};
use crate::{Error, Result};

pub const DEFAULT_PLACEHOLDER_TEXT: &str = "New note";

const ENV_API_KEY: &str = "NOTESYNC_FIREBASE_API_KEY";
const ENV_PROJECT_ID: &str = "NOTESYNC_FIREBASE_PROJECT_ID";
const ENV_AUTH_URL: &str = "NOTESYNC_AUTH_URL";
const ENV_TOKEN_URL: &str = "NOTESYNC_TOKEN_URL";
const ENV_FIRESTORE_URL: &str = "NOTESYNC_FIRESTORE_URL";

/// Firebase project coordinates.
///
/// Endpoint overrides exist for the local emulator suite; unset values fall
/// back to the public Google endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FirebaseConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub auth_url: Option<String>,
    #[serde(default)]
    pub token_url: Option<String>,
    #[serde(default)]
    pub firestore_url: Option<String>,
}

impl FirebaseConfig {
    /// Values from `NOTESYNC_*` environment variables.
    pub fn from_env() -> Self {
        let var = |name: &str| normalize_text_option(std::env::var(name).ok());
        Self {
            api_key: var(ENV_API_KEY),
            project_id: var(ENV_PROJECT_ID),
            auth_url: var(ENV_AUTH_URL),
            token_url: var(ENV_TOKEN_URL),
            firestore_url: var(ENV_FIRESTORE_URL),
        }
    }

    /// Fill every unset field from `fallback`.
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        Self {
            api_key: normalize_text_option(self.api_key).or(fallback.api_key),
            project_id: normalize_text_option(self.project_id).or(fallback.project_id),
            auth_url: normalize_text_option(self.auth_url).or(fallback.auth_url),
            token_url: normalize_text_option(self.token_url).or(fallback.token_url),
            firestore_url: normalize_text_option(self.firestore_url).or(fallback.firestore_url),
        }
    }

    pub fn api_key(&self) -> Option<String> {
        normalize_text_option(self.api_key.clone())
    }

    pub fn project_id(&self) -> Option<String> {
        normalize_text_option(self.project_id.clone())
    }

    pub fn auth_url(&self) -> String {
        normalize_text_option(self.auth_url.clone())
            .unwrap_or_else(|| DEFAULT_AUTH_URL.to_string())
    }

    pub fn token_url(&self) -> String {
        normalize_text_option(self.token_url.clone())
            .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string())
    }

    pub fn firestore_url(&self) -> String {
        normalize_text_option(self.firestore_url.clone())
            .unwrap_or_else(|| DEFAULT_FIRESTORE_URL.to_string())
    }

    /// Both the API key and project id are present.
    pub fn is_complete(&self) -> bool {
        self.api_key().is_some() && self.project_id().is_some()
    }

    /// Names of required fields that are still unset.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.api_key().is_none() {
            missing.push("api_key");
        }
        if self.project_id().is_none() {
            missing.push("project_id");
        }
        missing
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("auth_url", &self.auth_url),
            ("token_url", &self.token_url),
            ("firestore_url", &self.firestore_url),
        ] {
            if let Some(url) = normalize_text_option(value.clone()) {
                if !is_http_url(&url) {
                    return Err(Error::InvalidInput(format!(
                        "{field} must include http:// or https://"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Sync policy knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct SyncSettings {
    /// Remote collection holding one document per note.
    pub collection: String,
    /// Local snapshot slot name.
    pub snapshot_slot: String,
    /// Text of freshly created notes.
    pub placeholder_text: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            collection: DEFAULT_NOTES_COLLECTION.to_string(),
            snapshot_slot: DEFAULT_SNAPSHOT_SLOT.to_string(),
            placeholder_text: DEFAULT_PLACEHOLDER_TEXT.to_string(),
        }
    }
}

impl SyncSettings {
    pub fn validate(&self) -> Result<()> {
        validate_slot_name(&self.snapshot_slot)?;
        if self.collection.trim().is_empty() || self.collection.contains('/') {
            return Err(Error::InvalidInput(format!(
                "collection '{}' must be a non-empty name without '/'",
                self.collection
            )));
        }
        Ok(())
    }
}

/// Full client configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default)]
    pub firebase: FirebaseConfig,
    #[serde(default)]
    pub sync: SyncSettings,
}

impl ClientConfig {
    /// Parse and validate a JSON config payload.
    pub fn from_json(payload: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(payload)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file; a missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_json(&raw),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(error.into()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.firebase.validate()?;
        self.sync.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_existing_deployments() {
        let config = ClientConfig::default();
        assert_eq!(config.sync.collection, "notes");
        assert_eq!(config.sync.snapshot_slot, "NOTES");
        assert_eq!(config.sync.placeholder_text, "New note");
        assert_eq!(
            config.firebase.auth_url(),
            "https://identitytoolkit.googleapis.com/v1"
        );
        assert_eq!(
            config.firebase.missing_fields(),
            vec!["api_key", "project_id"]
        );
    }

    #[test]
    fn from_json_fills_missing_sections() {
        let config = ClientConfig::from_json(
            r#"{ "firebase": { "api_key": "key", "project_id": "notes-app" } }"#,
        )
        .unwrap();
        assert!(config.firebase.is_complete());
        assert_eq!(config.sync, SyncSettings::default());
    }

    #[test]
    fn from_json_rejects_unknown_fields() {
        let error = ClientConfig::from_json(r#"{ "firebase": { "apiKey": "key" } }"#).unwrap_err();
        assert!(error.to_string().contains("unknown field"));
    }

    #[test]
    fn validate_rejects_bad_urls_and_slots() {
        let mut config = ClientConfig::default();
        config.firebase.firestore_url = Some("localhost:8080".to_string());
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.sync.snapshot_slot = "a/b".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn or_prefers_self_then_fallback() {
        let explicit = FirebaseConfig {
            api_key: Some(" explicit ".to_string()),
            project_id: Some("  ".to_string()),
            ..Default::default()
        };
        let fallback = FirebaseConfig {
            api_key: Some("fallback".to_string()),
            project_id: Some("project".to_string()),
            ..Default::default()
        };
        let merged = explicit.or(fallback);
        assert_eq!(merged.api_key.as_deref(), Some("explicit"));
        assert_eq!(merged.project_id.as_deref(), Some("project"));
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load_from_path(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, ClientConfig::default());
    }
}
