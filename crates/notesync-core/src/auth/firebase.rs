//! Firebase email/password auth over the Identity Toolkit REST API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tokio::sync::watch;

use super::{
    AuthError, AuthResult, AuthSession, Identity, IdentityProvider, SessionPersistence,
    TokenSource,
};
use crate::util::{compact_text, is_http_url, unix_timestamp_now};

pub const DEFAULT_AUTH_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";

#[derive(Clone)]
pub struct FirebaseAuthClient<S: SessionPersistence> {
    auth_url: String,
    token_url: String,
    api_key: String,
    client: Client,
    store: S,
    identity: Arc<watch::Sender<Option<Identity>>>,
}

impl<S: SessionPersistence> FirebaseAuthClient<S> {
    pub fn new(
        api_key: impl Into<String>,
        auth_url: impl AsRef<str>,
        token_url: impl AsRef<str>,
        store: S,
    ) -> AuthResult<Self> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "Firebase API key must not be empty",
            ));
        }

        let (identity, _) = watch::channel(None);
        Ok(Self {
            auth_url: normalize_endpoint(auth_url.as_ref())?,
            token_url: normalize_endpoint(token_url.as_ref())?,
            api_key,
            client: Client::builder().build()?,
            store,
            identity: Arc::new(identity),
        })
    }

    /// Reload a persisted session, refreshing it when expired.
    ///
    /// A session whose refresh fails is cleared and the user is treated as
    /// signed out.
    pub async fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        let Some(stored_session) = self.store.load_session()? else {
            self.publish(None);
            return Ok(None);
        };

        if !stored_session.is_expired() {
            self.publish(Some(stored_session.identity.clone()));
            return Ok(Some(stored_session));
        }

        match self.refresh_session(&stored_session).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(error) => {
                tracing::warn!("Failed to refresh persisted session: {}", error);
                self.store.clear_session()?;
                self.publish(None);
                Ok(None)
            }
        }
    }

    /// Exchange the refresh token for a new id token and persist the result.
    pub async fn refresh_session(&self, session: &AuthSession) -> AuthResult<AuthSession> {
        if session.refresh_token.trim().is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "Refresh token must not be empty",
            ));
        }

        let request = self
            .client
            .post(format!("{}/token", self.token_url))
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", session.refresh_token.as_str()),
            ]);
        let response: SecureTokenResponse = send_json(request).await?;
        let refreshed = response.into_session(&session.identity)?;

        self.store.save_session(&refreshed)?;
        self.publish(Some(refreshed.identity.clone()));
        Ok(refreshed)
    }

    async fn password_request(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> AuthResult<Identity> {
        validate_credentials(email, password)?;

        let payload = serde_json::json!({
            "email": email.trim(),
            "password": password,
            "returnSecureToken": true,
        });
        let request = self
            .client
            .post(format!("{}/accounts:{method}", self.auth_url))
            .query(&[("key", self.api_key.as_str())])
            .json(&payload);
        let response: PasswordAuthResponse = send_json(request).await?;
        let session = response.into_session()?;

        self.store.save_session(&session)?;
        self.publish(Some(session.identity.clone()));
        Ok(session.identity)
    }

    fn publish(&self, next: Option<Identity>) {
        self.identity.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

#[async_trait]
impl<S: SessionPersistence> IdentityProvider for FirebaseAuthClient<S> {
    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<Identity> {
        self.password_request("signUp", email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Identity> {
        self.password_request("signInWithPassword", email, password)
            .await
    }

    async fn sign_out(&self) -> AuthResult<()> {
        // Firebase id tokens are stateless; signing out only drops them locally.
        self.store.clear_session()?;
        self.publish(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }

    fn current(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }
}

#[async_trait]
impl<S: SessionPersistence> TokenSource for FirebaseAuthClient<S> {
    async fn bearer_token(&self) -> AuthResult<Option<String>> {
        let Some(session) = self.store.load_session()? else {
            return Ok(None);
        };
        if !session.is_expired() {
            return Ok(Some(session.id_token));
        }
        let refreshed = self.refresh_session(&session).await?;
        Ok(Some(refreshed.id_token))
    }
}

fn normalize_endpoint(url: &str) -> AuthResult<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(AuthError::InvalidConfiguration(
            "Firebase auth URL must not be empty",
        ));
    }
    if !is_http_url(trimmed) {
        return Err(AuthError::InvalidConfiguration(
            "Firebase auth URL must include http:// or https://",
        ));
    }
    Ok(trimmed.to_string())
}

fn validate_credentials(email: &str, password: &str) -> AuthResult<()> {
    if email.trim().is_empty() {
        return Err(AuthError::Api("Email is required".to_string()));
    }
    if password.is_empty() {
        return Err(AuthError::Api("Password is required".to_string()));
    }
    Ok(())
}

async fn send_json<T: serde::de::DeserializeOwned>(request: RequestBuilder) -> AuthResult<T> {
    let response = request.send().await?;
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Api(parse_api_error(status, &body)));
    }
    Ok(response.json::<T>().await?)
}

/// Firebase reports seconds-until-expiry as a decimal string.
fn expires_at_from(expires_in: &str) -> AuthResult<i64> {
    let seconds = expires_in.trim().parse::<i64>().map_err(|_| {
        AuthError::Api(format!("Invalid token lifetime '{}'", compact_text(expires_in)))
    })?;
    Ok(unix_timestamp_now().saturating_add(seconds))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordAuthResponse {
    local_id: String,
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

impl PasswordAuthResponse {
    fn into_session(self) -> AuthResult<AuthSession> {
        Ok(AuthSession {
            expires_at: expires_at_from(&self.expires_in)?,
            id_token: self.id_token,
            refresh_token: self.refresh_token,
            identity: Identity {
                user_id: self.local_id,
                email: self.email,
            },
        })
    }
}

#[derive(Debug, Deserialize)]
struct SecureTokenResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    user_id: String,
}

impl SecureTokenResponse {
    fn into_session(self, previous: &Identity) -> AuthResult<AuthSession> {
        if self.user_id != previous.user_id {
            return Err(AuthError::Api(
                "Refreshed token belongs to a different user".to_string(),
            ));
        }
        Ok(AuthSession {
            expires_at: expires_at_from(&self.expires_in)?,
            id_token: self.id_token,
            refresh_token: self.refresh_token,
            identity: previous.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct FirebaseErrorResponse {
    error: Option<FirebaseErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct FirebaseErrorDetail {
    message: Option<String>,
}

fn parse_api_error(status: u16, body: &str) -> String {
    if let Ok(FirebaseErrorResponse {
        error: Some(FirebaseErrorDetail {
            message: Some(code),
        }),
    }) = serde_json::from_str::<FirebaseErrorResponse>(body)
    {
        return describe_error_code(&code);
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("{trimmed} ({status})")
    }
}

/// Identity Toolkit errors are upper-case codes, optionally followed by
/// ` : detail`.
fn describe_error_code(raw: &str) -> String {
    let (code, detail) = raw
        .split_once(" : ")
        .map_or((raw.trim(), None), |(code, detail)| {
            (code.trim(), Some(detail.trim()))
        });

    let message = match code {
        "EMAIL_EXISTS" => "An account already exists for this email",
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            "Invalid email or password"
        }
        "INVALID_EMAIL" => "Email address is invalid",
        "USER_DISABLED" => "This account has been disabled",
        "WEAK_PASSWORD" => "Password is too weak",
        "MISSING_PASSWORD" => "Password is required",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "Too many attempts, try again later",
        "OPERATION_NOT_ALLOWED" | "PASSWORD_LOGIN_DISABLED" => {
            "Email/password sign-in is disabled for this project"
        }
        "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" | "USER_NOT_FOUND" => {
            "Session expired, sign in again"
        }
        _ => return raw.trim().to_string(),
    };

    match detail {
        Some(detail) if !detail.is_empty() => format!("{message}: {detail}"),
        _ => message.to_string(),
    }
}
