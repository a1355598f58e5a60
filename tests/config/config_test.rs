//! Coverage for config parsing, defaults, and validation.

use std::path::PathBuf;

use telemon::config::{
    config_path_with, load_config, Config, CONFIG_PATH_ENV, MAX_ALERT_COOLDOWN_MINS,
};

const FULL: &str = r#"
[poll]
interval_secs = 30
timeout_secs = 4

[currency]
code = "EUR"
symbol = "€"

[telegram]
bot_token_env = "MY_BOT_TOKEN"
notify_chat = "@rig_alerts"
allowed_users = ["alice", "@bob"]
alert_cooldown_mins = 15

[[rigs]]
name = "rig1"
host = "10.0.0.11"
port = 3333
password = "hunter2"
dual = true
coin_name = "Ethereum"
coin_tag = "ETH"

[rigs.thresholds]
hash_rate = 25000
alt_hash_rate = 500
temperature = 80
fan_speed = 50

[[rigs]]
name = "rig2"
host = "10.0.0.12"
port = 3333
coin_name = "Ethereum"
coin_tag = "ETH"

[rigs.thresholds]
hash_rate = 25000
temperature = 80
fan_speed = 50
"#;

const MINIMAL: &str = r#"
[telegram]
notify_chat = "-1001234567890"

[[rigs]]
name = "rig1"
host = "10.0.0.11"
port = 3333
coin_name = "Ethereum"
coin_tag = "ETH"

[rigs.thresholds]
hash_rate = 25000
temperature = 80
fan_speed = 50
"#;

fn rig_block(name: &str, port: u16) -> String {
    format!(
        r#"
[[rigs]]
name = "{name}"
host = "10.0.0.11"
port = {port}
coin_name = "Ethereum"
coin_tag = "ETH"

[rigs.thresholds]
hash_rate = 25000
temperature = 80
fan_speed = 50
"#
    )
}

fn with_rigs(rigs: &[String]) -> String {
    format!("[telegram]\nnotify_chat = \"@rig_alerts\"\n{}", rigs.concat())
}

fn assert_rejected(toml: &str, needle: &str) {
    let err = Config::from_toml(toml).expect_err("config should be rejected");
    let message = format!("{err:#}");
    assert!(message.contains(needle), "expected {needle:?} in {message:?}");
}

#[test]
fn parses_full_config() {
    let config = Config::from_toml(FULL).expect("full config should parse");

    assert_eq!(config.poll.interval_secs, 30);
    assert_eq!(config.poll.timeout_secs, 4);
    assert_eq!(config.currency.code, "EUR");
    assert_eq!(config.currency.symbol, "€");
    assert_eq!(config.telegram.bot_token_env, "MY_BOT_TOKEN");
    assert_eq!(config.telegram.allowed_users, vec!["alice", "@bob"]);
    assert_eq!(config.telegram.alert_cooldown_mins, 15);

    let names: Vec<&str> = config.rigs.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["rig1", "rig2"]);
    assert!(config.rigs[0].dual);
    assert_eq!(config.rigs[0].password.as_deref(), Some("hunter2"));
    assert_eq!(config.rigs[0].thresholds.alt_hash_rate, 500);
    assert!(!config.rigs[1].dual);
    assert_eq!(config.rigs[1].thresholds.alt_hash_rate, 0);
}

#[test]
fn minimal_config_gets_defaults() {
    let config = Config::from_toml(MINIMAL).expect("minimal config should parse");

    assert_eq!(config.poll.interval_secs, 60);
    assert_eq!(config.poll.timeout_secs, 10);
    assert_eq!(config.currency.code, "USD");
    assert_eq!(config.currency.symbol, "$");
    assert_eq!(config.telegram.bot_token_env, "TELEMON_TELEGRAM_TOKEN");
    assert!(config.telegram.allowed_users.is_empty());
    assert_eq!(config.telegram.alert_cooldown_mins, 0);
}

#[test]
fn rig_password_is_redacted_in_debug() {
    let config = Config::from_toml(FULL).expect("full config should parse");
    let rendered = format!("{:?}", config.rigs[0]);
    assert!(!rendered.contains("hunter2"));
}

#[test]
fn rejects_empty_rig_list() {
    assert_rejected(&with_rigs(&[]), "at least one");
}

#[test]
fn rejects_duplicate_names() {
    assert_rejected(
        &with_rigs(&[rig_block("rig1", 3333), rig_block("rig1", 3334)]),
        "duplicate rig name",
    );
}

#[test]
fn rejects_reserved_and_malformed_names() {
    assert_rejected(&with_rigs(&[rig_block("syswide", 3333)]), "reserved");
    assert_rejected(&with_rigs(&[rig_block("rig one", 3333)]), "whitespace");
    assert_rejected(&with_rigs(&[rig_block("rig:1", 3333)]), "whitespace or ':'");
    assert_rejected(&with_rigs(&[rig_block("", 3333)]), "must not be empty");
    assert_rejected(&with_rigs(&[rig_block(&"r".repeat(49), 3333)]), "at most");
}

#[test]
fn rejects_zero_port() {
    assert_rejected(&with_rigs(&[rig_block("rig1", 0)]), "port must be non-zero");
}

#[test]
fn rejects_short_interval() {
    let toml = format!("[poll]\ninterval_secs = 2\n{}", with_rigs(&[rig_block("rig1", 3333)]));
    assert_rejected(&toml, "interval_secs");
}

#[test]
fn rejects_blank_notify_chat() {
    let toml = format!("[telegram]\nnotify_chat = \" \"\n{}", rig_block("rig1", 3333));
    assert_rejected(&toml, "notify_chat");
}

#[test]
fn alert_cooldown_is_capped_at_one_week() {
    let with_cooldown = |mins: u64| {
        format!(
            "[telegram]\nnotify_chat = \"@rig_alerts\"\nalert_cooldown_mins = {mins}\n{}",
            rig_block("rig1", 3333)
        )
    };

    let config = Config::from_toml(&with_cooldown(MAX_ALERT_COOLDOWN_MINS))
        .expect("one week cooldown should be accepted");
    assert_eq!(config.telegram.alert_cooldown_mins, 10_080);

    assert_rejected(&with_cooldown(MAX_ALERT_COOLDOWN_MINS + 1), "alert_cooldown_mins");
    assert_rejected(&with_cooldown(u64::from(u32::MAX) * 100_000), "alert_cooldown_mins");
}

#[test]
fn load_config_reads_file() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("telemon.toml");
    std::fs::write(&path, MINIMAL).expect("should write config");

    let config = load_config(&path).expect("should load");
    assert_eq!(config.rigs.len(), 1);
}

#[test]
fn load_config_names_missing_file() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("missing.toml");

    let err = load_config(&path).expect_err("missing file should fail");
    assert!(format!("{err:#}").contains("missing.toml"));
}

#[test]
fn config_path_uses_env_var() {
    let path = config_path_with(None, |key| match key {
        CONFIG_PATH_ENV => Some("/custom/telemon.toml".to_owned()),
        _ => None,
    });
    assert_eq!(path, PathBuf::from("/custom/telemon.toml"));
}
