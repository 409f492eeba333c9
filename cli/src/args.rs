use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use config::ConfigError;
use jam::config::JamConfig;
use std::ffi::OsString;

/// Long flags that take a value in the following argument
const VALUE_FLAGS: [&str; 5] = [
    "lastfm-api-key",
    "lastfm-secret-key",
    "lastfm-username",
    "lastfm-password",
    "config",
];

#[derive(Parser, Debug, Default)]
#[command(name = "jam")]
#[command(before_help = concat!("Jam - ", env!("CARGO_PKG_VERSION")))]
#[command(disable_version_flag = true)]
pub struct Args {
    /// print version and exit
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new(),
        action = ArgAction::Set
    )]
    pub version: bool,

    /// debug
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new(),
        action = ArgAction::Set
    )]
    pub debug: bool,

    /// LastFM API key
    #[arg(long, allow_hyphen_values = true)]
    pub lastfm_api_key: Option<String>,

    /// LastFM secret key
    #[arg(long, allow_hyphen_values = true)]
    pub lastfm_secret_key: Option<String>,

    /// LastFM username
    #[arg(long, allow_hyphen_values = true)]
    pub lastfm_username: Option<String>,

    /// LastFM password
    #[arg(long, allow_hyphen_values = true)]
    pub lastfm_password: Option<String>,

    /// Configuration file path
    #[arg(long)]
    pub config: Option<String>,

    /// Flag parsing stops at the first positional argument; the rest is ignored
    #[arg(hide = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    pub rest: Vec<String>,
}

/// Accept Go-style `-flag` spellings by rewriting them to `--flag`.
///
/// Values following a value-taking flag are left alone, and so is everything
/// from the first positional argument or `--` on.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut normalized = Vec::new();
    let mut passthrough = false;
    let mut expects_value = false;

    for (index, arg) in args.into_iter().enumerate() {
        let arg = arg.into();
        if index == 0 || passthrough || expects_value {
            expects_value = false;
            normalized.push(arg);
            continue;
        }

        let Some(text) = arg.to_str() else {
            normalized.push(arg);
            continue;
        };

        if text == "--" {
            passthrough = true;
            normalized.push(arg);
            continue;
        }

        let flag = text.trim_start_matches('-');
        let dashes = text.len() - flag.len();
        if dashes == 0 {
            passthrough = true;
            normalized.push(arg);
            continue;
        }
        if flag.is_empty() {
            normalized.push(arg);
            continue;
        }

        expects_value = !flag.contains('=') && VALUE_FLAGS.contains(&flag);
        if dashes == 1 && flag.len() > 1 {
            normalized.push(OsString::from(format!("--{flag}")));
        } else {
            normalized.push(arg);
        }
    }

    normalized
}

/// Load configuration from the optional config file, then apply flag overrides
pub fn load_config_from_args(args: &Args) -> Result<JamConfig, ConfigError> {
    let config = if let Some(config_path) = &args.config {
        JamConfig::load_with_file(Some(config_path))?
    } else {
        JamConfig::load()?
    };

    Ok(merge_args_into_config(config, args))
}

/// Flags win over every other configuration source
pub fn merge_args_into_config(mut config: JamConfig, args: &Args) -> JamConfig {
    if args.debug {
        config.debug = true;
    }
    if let Some(api_key) = &args.lastfm_api_key {
        config.lastfm.api_key = api_key.clone();
    }
    if let Some(secret_key) = &args.lastfm_secret_key {
        config.lastfm.secret_key = secret_key.clone();
    }
    if let Some(username) = &args.lastfm_username {
        config.lastfm.username = username.clone();
    }
    if let Some(password) = &args.lastfm_password {
        config.lastfm.password = password.clone();
    }

    config
}
