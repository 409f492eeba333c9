use jam::config::JamConfig;

// Kept in its own test binary: these tests change the process environment,
// each through its own variables.
#[test]
fn test_environment_overrides_defaults() {
    std::env::set_var("JAM_LASTFM__API_KEY", "env-key");
    std::env::set_var("JAM_LASTFM__SECRET_KEY", "env-secret");
    std::env::set_var("JAM_DEBUG", "true");

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("jam.toml");
    std::fs::write(&file, "[lastfm]\napi_key = \"file-key\"\n").unwrap();

    let config = JamConfig::load_with_file(Some(&file)).unwrap();
    assert_eq!(config.lastfm.api_key, "env-key");
    assert_eq!(config.lastfm.secret_key, "env-secret");
    assert!(config.debug);
}

#[test]
fn test_numeric_looking_credentials_keep_their_digits() {
    std::env::set_var("JAM_LASTFM__PASSWORD", "007");
    std::env::set_var("JAM_LASTFM__USERNAME", "0123456789");

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("jam.toml");
    std::fs::write(&file, "").unwrap();

    let config = JamConfig::load_with_file(Some(&file)).unwrap();
    assert_eq!(config.lastfm.password, "007");
    assert_eq!(config.lastfm.username, "0123456789");
}
