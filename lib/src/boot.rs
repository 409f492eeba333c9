//! Startup sequence: storage, streaming credentials, Last.fm login, UI.
//!
//! Every stage runs only after the previous one succeeded. The first failure
//! is returned as a [`BootError`] naming the stage; once the store is open it
//! is closed exactly once on every path out of [`Boot::run`].

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::auth::AuthError;
use crate::config::JamConfig;
use crate::lastfm::{self, ScrobbleError, ScrobbleLogin};
use crate::storage::{Storage, StorageError, StorageGuard, Store};
use crate::ui::UiError;

/// Restores or creates the streaming session, caching it in the store
#[async_trait]
pub trait CredentialValidator<H: Store> {
    type Session: Send;

    async fn check_creds(&self, store: &H) -> Result<Self::Session, AuthError>;
}

/// Builds a scrobbling client from API credentials
pub trait ScrobbleConnector {
    type Client: ScrobbleLogin;

    fn connect(&self, api_key: &str, secret_key: &str) -> Self::Client;
}

/// Builds the interactive application from fully initialised collaborators
pub trait UiLauncher<St, Sc, H: Store> {
    type App: App;

    fn launch(&self, streaming: St, scrobbler: Sc, store: Arc<H>) -> Result<Self::App, UiError>;
}

/// The interactive application. `run` blocks until the user leaves.
pub trait App {
    fn run(self);
}

/// Connects real Last.fm clients
#[derive(Debug, Clone)]
pub struct LastFmConnector {
    api_url: String,
}

impl LastFmConnector {
    pub fn new(api_url: &str) -> Self {
        Self {
            api_url: api_url.to_string(),
        }
    }
}

impl ScrobbleConnector for LastFmConnector {
    type Client = lastfm::Client;

    fn connect(&self, api_key: &str, secret_key: &str) -> lastfm::Client {
        lastfm::Client::with_api_url(api_key, secret_key, &self.api_url)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    OpenStorage,
    ValidateCreds,
    ScrobbleLogin,
    LaunchUi,
    Run,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OpenStorage => "open storage",
            Self::ValidateCreds => "validate credentials",
            Self::ScrobbleLogin => "scrobble login",
            Self::LaunchUi => "launch UI",
            Self::Run => "run",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BootError {
    #[error("Can't open database: {0}")]
    Storage(StorageError),
    #[error("Can't connect to Google Music: {0}")]
    Credentials(AuthError),
    #[error("Can't login into LastFM: {0}")]
    Scrobble(ScrobbleError),
    #[error("Can't start UI: {0}")]
    Ui(UiError),
}

impl BootError {
    /// The stage that failed
    pub fn stage(&self) -> Stage {
        match self {
            Self::Storage(_) => Stage::OpenStorage,
            Self::Credentials(_) => Stage::ValidateCreds,
            Self::Scrobble(_) => Stage::ScrobbleLogin,
            Self::Ui(_) => Stage::LaunchUi,
        }
    }
}

/// The four collaborators, run in order by [`Boot::run`]
pub struct Boot<S, A, C, U> {
    storage: S,
    auth: A,
    scrobble: C,
    ui: U,
}

impl<S, A, C, U> Boot<S, A, C, U>
where
    S: Storage,
    A: CredentialValidator<S::Handle>,
    C: ScrobbleConnector,
    U: UiLauncher<A::Session, C::Client, S::Handle>,
{
    pub fn new(storage: S, auth: A, scrobble: C, ui: U) -> Self {
        Self {
            storage,
            auth,
            scrobble,
            ui,
        }
    }

    pub async fn run(&self, config: &JamConfig) -> Result<(), BootError> {
        log::debug!("Stage: {}", Stage::OpenStorage);
        let store = StorageGuard::new(self.storage.open().map_err(BootError::Storage)?);

        log::debug!("Stage: {}", Stage::ValidateCreds);
        let streaming = self
            .auth
            .check_creds(store.handle())
            .await
            .map_err(BootError::Credentials)?;

        log::debug!("Stage: {}", Stage::ScrobbleLogin);
        let mut scrobbler = self
            .scrobble
            .connect(&config.lastfm.api_key, &config.lastfm.secret_key);
        scrobbler
            .login(&config.lastfm.username, &config.lastfm.password)
            .await
            .map_err(BootError::Scrobble)?;

        log::debug!("Stage: {}", Stage::LaunchUi);
        let app = self
            .ui
            .launch(streaming, scrobbler, store.share())
            .map_err(BootError::Ui)?;

        log::debug!("Stage: {}", Stage::Run);
        app.run();
        log::info!("UI exited");

        Ok(())
    }
}
