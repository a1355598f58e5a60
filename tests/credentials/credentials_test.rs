//! Coverage for credential loading, permission checks, and token resolution.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use telemon::credentials::{load_credentials, load_optional_credentials, Credentials};

fn write_env(dir: &tempfile::TempDir, contents: &str, mode: u32) -> PathBuf {
    let path = dir.path().join(".env");
    fs::write(&path, contents).expect("should write env file");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).expect("should chmod");
    }
    #[cfg(not(unix))]
    let _ = mode;
    path
}

#[test]
fn loads_env_credentials() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = write_env(&dir, "TELEMON_TELEGRAM_TOKEN=test-token\n", 0o600);

    let credentials = load_credentials(&path).expect("credentials should load");

    assert_eq!(credentials.get("TELEMON_TELEGRAM_TOKEN"), Some("test-token"));
}

#[cfg(unix)]
#[test]
fn rejects_world_readable_env_file() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = write_env(&dir, "TELEMON_TELEGRAM_TOKEN=test-token\n", 0o644);

    let err = load_credentials(&path).expect_err("0644 should be rejected");
    assert!(err.to_string().contains("must be 0600"));
}

#[test]
fn missing_named_file_is_an_error() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("absent.env");

    assert!(load_optional_credentials(Some(path.as_path())).is_err());
    assert!(load_optional_credentials(None).is_ok());
}

#[test]
fn file_value_wins_over_environment() {
    let mut vars = BTreeMap::new();
    vars.insert("TOKEN".to_owned(), "from-file".to_owned());
    let credentials = Credentials::from_map(vars);

    let token = credentials
        .resolve_with("TOKEN", |_| Some("from-env".to_owned()))
        .expect("should resolve");
    assert_eq!(token, "from-file");
}

#[test]
fn environment_fills_in_missing_or_blank_values() {
    let mut vars = BTreeMap::new();
    vars.insert("TOKEN".to_owned(), "   ".to_owned());
    let credentials = Credentials::from_map(vars);

    let token = credentials
        .resolve_with("TOKEN", |key| (key == "TOKEN").then(|| "from-env".to_owned()))
        .expect("should resolve");
    assert_eq!(token, "from-env");

    let missing = Credentials::default().resolve_with("TOKEN", |_| None);
    assert!(missing.is_err());
}

#[test]
fn debug_output_redacts_values() {
    let mut vars = BTreeMap::new();
    vars.insert("TOKEN".to_owned(), "super-secret".to_owned());
    let rendered = format!("{:?}", Credentials::from_map(vars));

    assert!(rendered.contains("TOKEN"));
    assert!(!rendered.contains("super-secret"));
}
