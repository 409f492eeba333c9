use std::io::{self, BufRead, Write};

use super::AuthError;
use crate::config::StreamingConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

/// Source of an email/password pair when no usable session is cached
#[cfg_attr(test, mockall::automock)]
pub trait CredentialPrompt: Send + Sync {
    fn credentials(&self) -> Result<LoginCredentials, AuthError>;
}

/// Credentials supplied up front, no terminal interaction
#[derive(Debug, Clone)]
pub struct HeadlessPrompt {
    email: String,
    password: String,
}

impl HeadlessPrompt {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl CredentialPrompt for HeadlessPrompt {
    fn credentials(&self) -> Result<LoginCredentials, AuthError> {
        Ok(LoginCredentials {
            email: self.email.clone(),
            password: self.password.clone(),
        })
    }
}

/// Asks on the controlling terminal; the password is not echoed
#[derive(Debug, Clone, Default)]
pub struct TerminalPrompt;

impl CredentialPrompt for TerminalPrompt {
    fn credentials(&self) -> Result<LoginCredentials, AuthError> {
        let prompt_error = |e: io::Error| AuthError::Prompt(e.to_string());

        print!("Email: ");
        io::stdout().flush().map_err(prompt_error)?;
        let mut email = String::new();
        io::stdin()
            .lock()
            .read_line(&mut email)
            .map_err(prompt_error)?;
        let email = email.trim().to_string();
        if email.is_empty() {
            return Err(AuthError::Prompt("email is empty".to_string()));
        }

        let password = rpassword::prompt_password("Password: ").map_err(prompt_error)?;

        Ok(LoginCredentials { email, password })
    }
}

/// Headless when the configuration carries both email and password
#[derive(Debug, Clone)]
pub enum ConfiguredPrompt {
    Headless(HeadlessPrompt),
    Terminal(TerminalPrompt),
}

impl ConfiguredPrompt {
    pub fn from_config(config: &StreamingConfig) -> Self {
        match (&config.email, &config.password) {
            (Some(email), Some(password)) if !email.is_empty() => {
                Self::Headless(HeadlessPrompt::new(email, password))
            }
            _ => Self::Terminal(TerminalPrompt),
        }
    }
}

impl CredentialPrompt for ConfiguredPrompt {
    fn credentials(&self) -> Result<LoginCredentials, AuthError> {
        match self {
            Self::Headless(prompt) => prompt.credentials(),
            Self::Terminal(prompt) => prompt.credentials(),
        }
    }
}
