//! Signing credentials and their providers.
//!
//! The signer asks a [`CredentialsProvider`] for credentials once per
//! invocation. Providers may suspend (for example to refresh a session), so
//! the call is async and the signer races it against cancellation.

use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

/// Environment variable holding the access key id.
pub const ACCESS_KEY_ID_ENV: &str = "AWS_ACCESS_KEY_ID";
/// Environment variable holding the secret access key.
pub const SECRET_ACCESS_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";
/// Environment variable holding the optional session token.
pub const SESSION_TOKEN_ENV: &str = "AWS_SESSION_TOKEN";

/// A set of signing credentials.
///
/// `Debug` output redacts the secret key and session token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
    expiration: Option<DateTime<Utc>>,
}

impl Credentials {
    /// Creates long-lived credentials.
    #[must_use]
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
            expiration: None,
        }
    }

    /// Attaches a session token.
    #[must_use]
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Sets the expiration time.
    #[must_use]
    pub const fn with_expiration(mut self, expiration: DateTime<Utc>) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// Returns the access key id.
    #[must_use]
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Returns the secret access key.
    #[must_use]
    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    /// Returns the session token, if any.
    #[must_use]
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    /// Returns the expiration time, if any.
    #[must_use]
    pub const fn expiration(&self) -> Option<DateTime<Utc>> {
        self.expiration
    }

    /// Returns `true` if the credentials have expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration.is_some_and(|exp| exp <= now)
    }

    /// Returns `true` if the credentials have expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// A source of signing credentials.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    /// Returns credentials for the current invocation.
    async fn credentials(&self) -> ClientResult<Credentials>;
}

/// Always returns the same credentials.
#[derive(Debug, Clone)]
pub struct StaticCredentialsProvider {
    credentials: Credentials,
}

impl StaticCredentialsProvider {
    /// Creates a provider for fixed credentials.
    #[must_use]
    pub const fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl CredentialsProvider for StaticCredentialsProvider {
    async fn credentials(&self) -> ClientResult<Credentials> {
        if self.credentials.is_expired() {
            return Err(ClientError::signing("static credentials have expired"));
        }
        Ok(self.credentials.clone())
    }
}

/// Reads credentials from the process environment on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentCredentialsProvider;

impl EnvironmentCredentialsProvider {
    /// Creates the provider.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn from_lookup<F>(lookup: F) -> ClientResult<Credentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let access_key_id = read(ACCESS_KEY_ID_ENV)
            .ok_or_else(|| ClientError::signing(format!("{ACCESS_KEY_ID_ENV} is not set")))?;
        let secret_access_key = read(SECRET_ACCESS_KEY_ENV)
            .ok_or_else(|| ClientError::signing(format!("{SECRET_ACCESS_KEY_ENV} is not set")))?;

        let mut credentials = Credentials::new(access_key_id, secret_access_key);
        if let Some(token) = read(SESSION_TOKEN_ENV) {
            credentials = credentials.with_session_token(token);
        }
        Ok(credentials)
    }
}

#[async_trait]
impl CredentialsProvider for EnvironmentCredentialsProvider {
    async fn credentials(&self) -> ClientResult<Credentials> {
        let credentials = Self::from_lookup(|name| std::env::var(name).ok())?;
        tracing::trace!(
            access_key_id = %credentials.access_key_id(),
            "Loaded credentials from environment"
        );
        Ok(credentials)
    }
}
