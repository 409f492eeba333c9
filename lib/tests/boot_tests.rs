mod common;

use common::{Calls, FakeAuth, FakeConnector, FakeStorage, FakeUi};
use jam::boot::{Boot, BootError, Stage};
use jam::config::JamConfig;
use jam::storage::{DatabaseOpener, MemoryStorage, Storage, StorageError};

#[derive(Default)]
struct Failures {
    storage: bool,
    auth: Option<&'static str>,
    scrobble: bool,
    ui: bool,
}

fn boot(calls: &Calls, failures: Failures) -> Boot<FakeStorage, FakeAuth, FakeConnector, FakeUi> {
    Boot::new(
        FakeStorage {
            calls: calls.clone(),
            fail: failures.storage,
        },
        FakeAuth {
            calls: calls.clone(),
            error: failures.auth,
        },
        FakeConnector {
            calls: calls.clone(),
            fail_login: failures.scrobble,
        },
        FakeUi {
            calls: calls.clone(),
            fail: failures.ui,
        },
    )
}

fn config() -> JamConfig {
    let mut config = JamConfig::default();
    config.lastfm.api_key = "api".to_string();
    config.lastfm.secret_key = "secret".to_string();
    config.lastfm.username = "budkin".to_string();
    config.lastfm.password = "hunter2".to_string();
    config
}

#[test_log::test(tokio::test)]
async fn runs_every_stage_in_order_and_closes_storage_last() {
    let calls = Calls::default();
    boot(&calls, Failures::default()).run(&config()).await.unwrap();

    assert_eq!(
        calls.all(),
        vec![
            "open",
            "check_creds",
            "connect api/secret",
            "login budkin/hunter2",
            "launch streaming-session",
            "run store_usable=true",
            "close",
        ]
    );
}

#[test_log::test(tokio::test)]
async fn storage_failure_stops_before_anything_else() {
    let calls = Calls::default();
    let failures = Failures {
        storage: true,
        ..Failures::default()
    };

    let err = boot(&calls, failures).run(&config()).await.unwrap_err();

    assert_eq!(err.to_string(), "Can't open database: IO error: permission denied");
    assert_eq!(err.stage(), Stage::OpenStorage);
    assert_eq!(calls.all(), vec!["open"]);
    assert_eq!(calls.count("close"), 0);
}

#[test_log::test(tokio::test)]
async fn credential_failure_reports_cause_and_releases_storage() {
    let calls = Calls::default();
    let failures = Failures {
        auth: Some("network unreachable"),
        ..Failures::default()
    };

    let err = boot(&calls, failures).run(&config()).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Can't connect to Google Music: network unreachable"
    );
    assert_eq!(err.stage(), Stage::ValidateCreds);
    assert_eq!(calls.all(), vec!["open", "check_creds", "close"]);
}

#[test_log::test(tokio::test)]
async fn scrobble_failure_releases_storage_and_skips_ui() {
    let calls = Calls::default();
    let failures = Failures {
        scrobble: true,
        ..Failures::default()
    };

    let err = boot(&calls, failures).run(&config()).await.unwrap_err();

    assert!(matches!(err, BootError::Scrobble(_)));
    assert_eq!(
        err.to_string(),
        "Can't login into LastFM: Last.fm error 4: Authentication Failed"
    );
    assert_eq!(
        calls.all(),
        vec![
            "open",
            "check_creds",
            "connect api/secret",
            "login budkin/hunter2",
            "close",
        ]
    );
}

#[test_log::test(tokio::test)]
async fn ui_failure_releases_storage_once() {
    let calls = Calls::default();
    let failures = Failures {
        ui: true,
        ..Failures::default()
    };

    let err = boot(&calls, failures).run(&config()).await.unwrap_err();

    assert_eq!(err.to_string(), "Can't start UI: terminal error: not a terminal");
    assert_eq!(err.stage(), Stage::LaunchUi);
    assert_eq!(calls.count("close"), 1);
    assert!(!calls.all().iter().any(|c| c.starts_with("run")));
    assert_eq!(calls.all().last().map(String::as_str), Some("close"));
}

#[test_log::test(tokio::test)]
async fn second_memory_opener_is_refused() {
    let storage = MemoryStorage::new();
    let _first = storage.open().unwrap();

    let calls = Calls::default();
    let boot = Boot::new(
        storage.clone(),
        FakeAuth {
            calls: calls.clone(),
            error: None,
        },
        FakeConnector {
            calls: calls.clone(),
            fail_login: false,
        },
        FakeUi {
            calls: calls.clone(),
            fail: false,
        },
    );

    let err = boot.run(&config()).await.unwrap_err();
    assert!(matches!(err, BootError::Storage(StorageError::Locked(_))));
    assert!(calls.all().is_empty());
}

#[test_log::test(tokio::test)]
async fn concurrent_database_boot_fails_with_exclusivity_error() {
    let dir = tempfile::tempdir().unwrap();
    let opener = DatabaseOpener::new(dir.path().join("jam.db"));
    let _running = opener.open().unwrap();

    let calls = Calls::default();
    let boot = Boot::new(
        opener.clone(),
        FakeAuth {
            calls: calls.clone(),
            error: None,
        },
        FakeConnector {
            calls: calls.clone(),
            fail_login: false,
        },
        FakeUi {
            calls: calls.clone(),
            fail: false,
        },
    );

    let err = boot.run(&config()).await.unwrap_err();
    assert!(matches!(err, BootError::Storage(StorageError::Locked(_))));
    assert!(err.to_string().starts_with("Can't open database: database "));
    assert!(calls.all().is_empty());
}

#[test_log::test(tokio::test)]
async fn storage_is_reusable_after_a_completed_boot() {
    let storage = MemoryStorage::new();
    let calls = Calls::default();
    let boot = Boot::new(
        storage.clone(),
        FakeAuth {
            calls: calls.clone(),
            error: None,
        },
        FakeConnector {
            calls: calls.clone(),
            fail_login: false,
        },
        FakeUi {
            calls: calls.clone(),
            fail: false,
        },
    );

    boot.run(&config()).await.unwrap();
    boot.run(&config()).await.unwrap();

    assert_eq!(calls.count("run store_usable=true"), 2);
    assert!(storage.open().is_ok());
}
