//! Recording fakes for every boot collaborator
#![allow(dead_code)]

use async_trait::async_trait;
use jam::auth::AuthError;
use jam::boot::{App, CredentialValidator, ScrobbleConnector, UiLauncher};
use jam::lastfm::{ScrobbleError, ScrobbleLogin};
use jam::storage::{Storage, StorageError, Store};
use jam::ui::UiError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Ordered log of collaborator calls shared by all fakes
#[derive(Debug, Clone, Default)]
pub struct Calls(Arc<Mutex<Vec<String>>>);

impl Calls {
    pub fn push(&self, call: impl Into<String>) {
        self.0.lock().unwrap().push(call.into());
    }

    pub fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.all().iter().filter(|c| c.as_str() == call).count()
    }
}

pub struct FakeStorage {
    pub calls: Calls,
    pub fail: bool,
}

impl Storage for FakeStorage {
    type Handle = FakeStore;

    fn open(&self) -> Result<FakeStore, StorageError> {
        self.calls.push("open");
        if self.fail {
            return Err(StorageError::Io(std::io::Error::other("permission denied")));
        }
        Ok(FakeStore {
            calls: self.calls.clone(),
        })
    }
}

pub struct FakeStore {
    calls: Calls,
}

impl Store for FakeStore {
    fn get<T: DeserializeOwned>(&self, _key: &str) -> Result<Option<T>, StorageError> {
        Ok(None)
    }

    fn set<T: Serialize>(&self, _key: &str, _value: &T) -> Result<(), StorageError> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> Result<bool, StorageError> {
        Ok(false)
    }

    fn close(&self) -> Result<(), StorageError> {
        self.calls.push("close");
        Ok(())
    }
}

pub struct FakeAuth {
    pub calls: Calls,
    pub error: Option<&'static str>,
}

#[async_trait]
impl<H: Store> CredentialValidator<H> for FakeAuth {
    type Session = &'static str;

    async fn check_creds(&self, _store: &H) -> Result<&'static str, AuthError> {
        self.calls.push("check_creds");
        match self.error {
            Some(cause) => Err(AuthError::Network(cause.to_string())),
            None => Ok("streaming-session"),
        }
    }
}

pub struct FakeConnector {
    pub calls: Calls,
    pub fail_login: bool,
}

impl ScrobbleConnector for FakeConnector {
    type Client = FakeScrobbler;

    fn connect(&self, api_key: &str, secret_key: &str) -> FakeScrobbler {
        self.calls.push(format!("connect {api_key}/{secret_key}"));
        FakeScrobbler {
            calls: self.calls.clone(),
            fail: self.fail_login,
        }
    }
}

pub struct FakeScrobbler {
    calls: Calls,
    fail: bool,
}

#[async_trait]
impl ScrobbleLogin for FakeScrobbler {
    async fn login(&mut self, username: &str, password: &str) -> Result<(), ScrobbleError> {
        self.calls.push(format!("login {username}/{password}"));
        if self.fail {
            return Err(ScrobbleError::Api {
                code: 4,
                message: "Authentication Failed".to_string(),
            });
        }
        Ok(())
    }
}

pub struct FakeUi {
    pub calls: Calls,
    pub fail: bool,
}

impl<H: Store> UiLauncher<&'static str, FakeScrobbler, H> for FakeUi {
    type App = FakeApp<H>;

    fn launch(
        &self,
        streaming: &'static str,
        _scrobbler: FakeScrobbler,
        store: Arc<H>,
    ) -> Result<FakeApp<H>, UiError> {
        self.calls.push(format!("launch {streaming}"));
        if self.fail {
            return Err(UiError::Terminal(std::io::Error::other("not a terminal")));
        }
        Ok(FakeApp {
            calls: self.calls.clone(),
            store,
        })
    }
}

pub struct FakeApp<H: Store> {
    calls: Calls,
    store: Arc<H>,
}

impl<H: Store> App for FakeApp<H> {
    fn run(self) {
        // The store must still be usable while the UI runs
        let usable = self.store.get::<String>("anything").is_ok();
        self.calls.push(format!("run store_usable={usable}"));
    }
}
