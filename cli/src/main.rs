mod args;

use args::{load_config_from_args, normalize_args, Args};
use clap::Parser;
use jam::auth::{ConfiguredPrompt, CredentialChecker, GMusicService};
use jam::boot::{Boot, CredentialValidator, LastFmConnector, ScrobbleConnector, UiLauncher};
use jam::config::JamConfig;
use jam::storage::{DatabaseOpener, Storage};
use jam::ui::TuiLauncher;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::process::ExitCode;

const EXIT_SUCCESS: u8 = 0;
const EXIT_FAILURE: u8 = 1;

/// `-debug` sends everything to a file so the UI stays readable
fn init_logging(config: &JamConfig) {
    let default_filter = if config.debug { "debug" } else { "warn" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));

    if config.debug {
        let path = config.storage.get_debug_log_path();
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("Can't open debug log {}: {e}", path.display()),
        }
    }

    builder.init();
}

/// Everything after flag parsing. `wire` is only called once the
/// configuration is loaded; the returned value is the process exit status.
async fn run<S, A, C, U, F>(args: &Args, wire: F, out: &mut dyn Write, err: &mut dyn Write) -> u8
where
    S: Storage,
    A: CredentialValidator<S::Handle>,
    C: ScrobbleConnector,
    U: UiLauncher<A::Session, C::Client, S::Handle>,
    F: FnOnce(&JamConfig) -> Boot<S, A, C, U>,
{
    if args.version {
        let _ = writeln!(out, "{}", jam::VERSION);
        return EXIT_SUCCESS;
    }

    let config = match load_config_from_args(args) {
        Ok(config) => config,
        Err(e) => {
            let _ = writeln!(err, "Can't load configuration: {e}");
            return EXIT_FAILURE;
        }
    };

    let boot = wire(&config);
    match boot.run(&config).await {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            log::error!("{} failed: {e}", e.stage());
            let _ = writeln!(err, "{e}");
            EXIT_FAILURE
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse_from(normalize_args(std::env::args_os()));

    let status = run(
        &args,
        |config| {
            init_logging(config);
            log::info!("Starting jam {}", jam::VERSION);
            Boot::new(
                DatabaseOpener::new(&config.storage.path),
                CredentialChecker::new(
                    GMusicService::new(&config.streaming),
                    ConfiguredPrompt::from_config(&config.streaming),
                ),
                LastFmConnector::new(config.lastfm.api_url()),
                TuiLauncher,
            )
        },
        &mut io::stdout(),
        &mut io::stderr(),
    )
    .await;

    ExitCode::from(status)
}
