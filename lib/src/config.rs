use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "jam";

const DEFAULT_AUTH_URL: &str = "https://android.clients.google.com/auth";
const DEFAULT_STREAMING_API_URL: &str = "https://mclients.googleapis.com/sj/v2.5";
const DEFAULT_LASTFM_API_URL: &str = "https://ws.audioscrobbler.com/2.0/";

/// Everything the boot sequence needs, merged once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JamConfig {
    /// Verbose diagnostics for the collaborators
    pub debug: bool,
    pub storage: StorageConfig,
    pub streaming: StreamingConfig,
    pub lastfm: LastFmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// Path to the credential database
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamingConfig {
    /// Account email used for headless login
    pub email: Option<String>,
    /// Account password used for headless login
    pub password: Option<String>,
    /// Login endpoint
    pub auth_url: String,
    /// Base URL of the music API
    pub api_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LastFmConfig {
    pub api_key: String,
    pub secret_key: String,
    pub username: String,
    pub password: String,
    /// Base URL of the Last.fm web service (defaults to <https://ws.audioscrobbler.com/2.0/>)
    pub api_url: Option<String>,
}

impl StorageConfig {
    /// Default database path using the XDG data directory.
    /// Falls back to the current directory if no data directory is available.
    pub fn get_default_path() -> String {
        if let Some(data_dir) = dirs::data_dir() {
            data_dir
                .join(APP_NAME)
                .join("jam.db")
                .to_string_lossy()
                .to_string()
        } else {
            "jam.db".to_string()
        }
    }

    /// Where `-debug` log output goes, next to the database
    pub fn get_debug_log_path(&self) -> PathBuf {
        match Path::new(&self.path).parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.join("debug.log"),
            _ => PathBuf::from("debug.log"),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: Self::get_default_path(),
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            email: None,
            password: None,
            auth_url: DEFAULT_AUTH_URL.to_string(),
            api_url: DEFAULT_STREAMING_API_URL.to_string(),
        }
    }
}

impl Default for JamConfig {
    fn default() -> Self {
        Self {
            debug: false,
            storage: StorageConfig::default(),
            streaming: StreamingConfig::default(),
            lastfm: LastFmConfig::default(),
        }
    }
}

impl LastFmConfig {
    /// Get the Last.fm API URL with fallback to default
    #[must_use]
    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_LASTFM_API_URL)
    }
}

impl JamConfig {
    /// Get default configuration file paths in order of preference
    #[must_use]
    pub fn get_default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("jam.toml"),
            PathBuf::from("config/jam.toml"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(APP_NAME).join("config.toml"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".jam.toml"));
        }

        paths
    }

    /// Load configuration from defaults, the first config file found and
    /// `JAM_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_file::<&str>(None)
    }

    /// Load configuration with a specific config file.
    /// An explicit file that does not exist is an error.
    pub fn load_with_file<P: AsRef<Path>>(config_file: Option<P>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(file_path) = config_file {
            builder = builder.add_source(File::from(file_path.as_ref()).required(true));
        } else if let Some(found) = Self::get_default_config_paths()
            .into_iter()
            .find(|path| path.exists())
        {
            log::debug!("Using configuration file {}", found.display());
            builder = builder.add_source(File::from(found));
        }

        // JAM_LASTFM__API_KEY -> lastfm.api_key
        builder = builder.add_source(
            Environment::with_prefix("JAM")
                .prefix_separator("_")
                .separator("__"),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_log_sits_next_to_database() {
        let storage = StorageConfig {
            path: "/tmp/jam-test/jam.db".to_string(),
        };
        assert_eq!(
            storage.get_debug_log_path(),
            PathBuf::from("/tmp/jam-test/debug.log")
        );

        let bare = StorageConfig {
            path: "jam.db".to_string(),
        };
        assert_eq!(bare.get_debug_log_path(), PathBuf::from("debug.log"));
    }

    #[test]
    fn lastfm_api_url_falls_back_to_default() {
        let mut lastfm = LastFmConfig::default();
        assert_eq!(lastfm.api_url(), DEFAULT_LASTFM_API_URL);

        lastfm.api_url = Some("http://localhost:9000/".to_string());
        assert_eq!(lastfm.api_url(), "http://localhost:9000/");
    }
}
