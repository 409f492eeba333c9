use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{StorageError, Store};

mod gmusic;
mod prompt;

pub use gmusic::{GMusic, GMusicService};
#[cfg(test)]
pub use prompt::MockCredentialPrompt;
pub use prompt::{ConfiguredPrompt, CredentialPrompt, HeadlessPrompt, LoginCredentials, TerminalPrompt};

/// Store key under which streaming credentials are cached
pub const CREDENTIALS_KEY: &str = "gmusic.credentials";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Network(String),
    #[error("login rejected: {0}")]
    Rejected(String),
    #[error("no registered device found for this account")]
    NoDevice,
    #[error("unexpected response: {0}")]
    Response(String),
    #[error("can't read credentials: {0}")]
    Prompt(String),
    #[error("{0}")]
    Storage(#[from] StorageError),
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

/// Streaming session data persisted between runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub auth_token: String,
    pub device_id: String,
    pub android_id: String,
    pub obtained_at: DateTime<Utc>,
}

/// The streaming service as seen by the credential checker
#[async_trait]
pub trait StreamingService: Send + Sync {
    type Session: Send;

    /// Exchange an email/password pair for fresh credentials
    async fn login(&self, email: &str, password: &str) -> Result<Credentials, AuthError>;

    /// `Ok(false)` means the service rejected the credentials
    async fn validate(&self, credentials: &Credentials) -> Result<bool, AuthError>;

    fn session(&self, credentials: Credentials) -> Self::Session;
}

/// Restores the cached streaming session, logging in again when needed
pub struct CredentialChecker<S, P> {
    service: S,
    prompt: P,
}

impl<S, P> CredentialChecker<S, P>
where
    S: StreamingService,
    P: CredentialPrompt,
{
    pub fn new(service: S, prompt: P) -> Self {
        Self { service, prompt }
    }

    pub async fn check_creds<H: Store>(&self, store: &H) -> Result<S::Session, AuthError> {
        if let Some(cached) = store.get::<Credentials>(CREDENTIALS_KEY)? {
            log::info!("Validating saved credentials for {}", cached.email);
            if self.service.validate(&cached).await? {
                return Ok(self.service.session(cached));
            }
            log::warn!("Saved credentials for {} were rejected, clearing them", cached.email);
            store.remove(CREDENTIALS_KEY)?;
        } else {
            log::info!("No saved credentials found");
        }

        let login = self.prompt.credentials()?;
        log::info!("Logging in as {}", login.email);
        let credentials = self.service.login(&login.email, &login.password).await?;

        store.set(CREDENTIALS_KEY, &credentials)?;
        log::info!("Credentials saved for {}", credentials.email);

        Ok(self.service.session(credentials))
    }
}

#[async_trait]
impl<S, P, H> crate::boot::CredentialValidator<H> for CredentialChecker<S, P>
where
    S: StreamingService,
    P: CredentialPrompt,
    H: Store,
{
    type Session = S::Session;

    async fn check_creds(&self, store: &H) -> Result<S::Session, AuthError> {
        CredentialChecker::check_creds(self, store).await
    }
}
