use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;

use super::{AuthError, Credentials, StreamingService};
use crate::config::StreamingConfig;

const SERVICE: &str = "sj";
const APP: &str = "com.google.android.music";
const CLIENT_SIG: &str = "38918a453d07199354f8b19af05ec6562ced5788";

/// Authenticated Google Music session handed to the UI
#[derive(Debug, Clone)]
pub struct GMusic {
    credentials: Credentials,
    http: reqwest::Client,
    api_url: String,
}

impl GMusic {
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn account(&self) -> &str {
        &self.credentials.email
    }

    pub fn device_id(&self) -> &str {
        &self.credentials.device_id
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }
}

#[derive(Debug, Deserialize)]
struct DeviceManagementInfo {
    #[serde(default)]
    data: Option<DeviceList>,
}

#[derive(Debug, Deserialize)]
struct DeviceList {
    #[serde(default)]
    items: Vec<Device>,
}

#[derive(Debug, Deserialize)]
struct Device {
    id: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Google Music login and session validation over HTTP
pub struct GMusicService {
    http: reqwest::Client,
    auth_url: String,
    api_url: String,
}

impl GMusicService {
    pub fn new(config: &StreamingConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            auth_url: config.auth_url.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_device_id(&self, auth_token: &str) -> Result<String, AuthError> {
        let response = self
            .http
            .get(format!("{}/devicemanagementinfo", self.api_url))
            .header("Authorization", format!("GoogleLogin auth={auth_token}"))
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(AuthError::Rejected(format!(
                    "device lookup returned {}",
                    response.status()
                )));
            }
            status if !status.is_success() => {
                return Err(AuthError::Response(format!(
                    "device lookup returned {status}"
                )));
            }
            _ => {}
        }

        let info: DeviceManagementInfo = response.json().await?;
        pick_device_id(info)
    }
}

#[async_trait]
impl StreamingService for GMusicService {
    type Session = GMusic;

    async fn login(&self, email: &str, password: &str) -> Result<Credentials, AuthError> {
        let android_id = new_android_id();
        let form = [
            ("accountType", "HOSTED_OR_GOOGLE"),
            ("Email", email),
            ("Passwd", password),
            ("has_permission", "1"),
            ("service", SERVICE),
            ("source", "android"),
            ("androidId", android_id.as_str()),
            ("app", APP),
            ("client_sig", CLIENT_SIG),
            ("device_country", "us"),
            ("operatorCountry", "us"),
            ("lang", "en"),
            ("sdk_version", "17"),
        ];

        // Failures come back as a non-2xx status with an `Error=` body, so read the body either way
        let body = self
            .http
            .post(&self.auth_url)
            .form(&form)
            .send()
            .await?
            .text()
            .await?;

        let auth_token = parse_login_response(&body)?;
        let device_id = self.fetch_device_id(&auth_token).await?;
        log::debug!("Logged in as {email} using device {device_id}");

        Ok(Credentials {
            email: email.to_string(),
            auth_token,
            device_id,
            android_id,
            obtained_at: Utc::now(),
        })
    }

    async fn validate(&self, credentials: &Credentials) -> Result<bool, AuthError> {
        match self.fetch_device_id(&credentials.auth_token).await {
            Ok(_) => Ok(true),
            Err(AuthError::Rejected(reason)) => {
                log::debug!("Credentials rejected: {reason}");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn session(&self, credentials: Credentials) -> GMusic {
        GMusic {
            credentials,
            http: self.http.clone(),
            api_url: self.api_url.clone(),
        }
    }
}

fn new_android_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..16].to_string()
}

/// Pull the `Auth` token out of a `Key=Value` per line login response
fn parse_login_response(body: &str) -> Result<String, AuthError> {
    let fields: HashMap<&str, &str> = body
        .lines()
        .filter_map(|line| line.split_once('='))
        .collect();

    if let Some(token) = fields.get("Auth") {
        return Ok((*token).to_string());
    }
    match fields.get("Error") {
        Some(error) => Err(AuthError::Rejected((*error).to_string())),
        None => Err(AuthError::Response(
            "login response carried no Auth token".to_string(),
        )),
    }
}

fn pick_device_id(info: DeviceManagementInfo) -> Result<String, AuthError> {
    let devices = info.data.map(|data| data.items).unwrap_or_default();
    let device = devices
        .iter()
        .find(|device| device.kind == "ANDROID")
        .or_else(|| devices.iter().find(|device| device.kind == "IOS"))
        .ok_or(AuthError::NoDevice)?;

    Ok(device.id.trim_start_matches("0x").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_auth_token() {
        let body = "SID=abc\nLSID=def\nAuth=token-123\n";
        assert_eq!(parse_login_response(body).unwrap(), "token-123");
    }

    #[test]
    fn reports_login_error() {
        let err = parse_login_response("Error=BadAuthentication\n").unwrap_err();
        assert!(matches!(err, AuthError::Rejected(ref reason) if reason == "BadAuthentication"));

        let err = parse_login_response("<html>oops</html>").unwrap_err();
        assert!(matches!(err, AuthError::Response(_)));
    }

    #[test]
    fn prefers_android_device() {
        let info: DeviceManagementInfo = serde_json::from_str(
            r#"{"data": {"items": [
                {"id": "ios:1234", "type": "IOS"},
                {"id": "0x00ab12cd", "type": "ANDROID"}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(pick_device_id(info).unwrap(), "00ab12cd");
    }

    #[test]
    fn falls_back_to_ios_device() {
        let info: DeviceManagementInfo = serde_json::from_str(
            r#"{"data": {"items": [{"id": "ios:1234", "type": "IOS"}]}}"#,
        )
        .unwrap();
        assert_eq!(pick_device_id(info).unwrap(), "ios:1234");
    }

    #[test]
    fn no_device_is_an_error() {
        let info: DeviceManagementInfo = serde_json::from_str(r#"{"kind": "x"}"#).unwrap();
        assert!(matches!(pick_device_id(info), Err(AuthError::NoDevice)));
    }

    #[test]
    fn android_id_is_sixteen_hex_chars() {
        let id = new_android_id();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
