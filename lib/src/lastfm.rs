use async_trait::async_trait;
use md5::{Digest, Md5};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::config::LastFmConfig;

#[derive(Debug, thiserror::Error)]
pub enum ScrobbleError {
    #[error("missing Last.fm credentials: {0}")]
    MissingCredentials(String),
    #[error("Last.fm error {code}: {message}")]
    Api { code: u32, message: String },
    #[error("{0}")]
    Network(String),
    #[error("unexpected response: {0}")]
    Response(String),
}

impl From<reqwest::Error> for ScrobbleError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

/// Authenticated Last.fm session
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Session {
    pub name: String,
    pub key: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MobileSessionResponse {
    Ok { session: Session },
    Error { error: u32, message: String },
}

/// Anything that can log a user in to the scrobbling service
#[async_trait]
pub trait ScrobbleLogin: Send {
    async fn login(&mut self, username: &str, password: &str) -> Result<(), ScrobbleError>;
}

/// Last.fm web service client
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    secret_key: String,
    session: Option<Session>,
}

impl Client {
    pub fn new(api_key: &str, secret_key: &str) -> Self {
        Self::with_api_url(api_key, secret_key, LastFmConfig::default().api_url())
    }

    pub fn with_api_url(api_key: &str, secret_key: &str, api_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            secret_key: secret_key.to_string(),
            session: None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Name of the logged in user, `None` while scrobbling is off
    pub fn username(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.name.as_str())
    }

    fn sign(&self, params: &BTreeMap<&str, &str>) -> String {
        let mut hasher = Md5::new();
        for (key, value) in params {
            hasher.update(key.as_bytes());
            hasher.update(value.as_bytes());
        }
        hasher.update(self.secret_key.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Names of the empty fields, in a fixed order
fn missing_fields(fields: [(&'static str, &str); 4]) -> Vec<&'static str> {
    fields
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| *name)
        .collect()
}

#[async_trait]
impl ScrobbleLogin for Client {
    async fn login(&mut self, username: &str, password: &str) -> Result<(), ScrobbleError> {
        let missing = missing_fields([
            ("api key", self.api_key.as_str()),
            ("secret key", self.secret_key.as_str()),
            ("username", username),
            ("password", password),
        ]);
        if missing.len() == 4 {
            log::info!("Last.fm is not configured, scrobbling disabled");
            return Ok(());
        }
        if !missing.is_empty() {
            return Err(ScrobbleError::MissingCredentials(missing.join(", ")));
        }

        let mut params = BTreeMap::new();
        params.insert("method", "auth.getMobileSession");
        params.insert("username", username);
        params.insert("password", password);
        params.insert("api_key", self.api_key.as_str());
        let api_sig = self.sign(&params);

        let mut form: Vec<(&str, &str)> = params.into_iter().collect();
        form.push(("api_sig", api_sig.as_str()));
        form.push(("format", "json"));

        let body = self
            .http
            .post(&self.api_url)
            .form(&form)
            .send()
            .await?
            .text()
            .await?;

        match serde_json::from_str::<MobileSessionResponse>(&body)
            .map_err(|e| ScrobbleError::Response(e.to_string()))?
        {
            MobileSessionResponse::Ok { session } => {
                log::info!("Logged in to Last.fm as {}", session.name);
                self.session = Some(session);
                Ok(())
            }
            MobileSessionResponse::Error { error, message } => {
                Err(ScrobbleError::Api { code: error, message })
            }
        }
    }
}
