//! Tests for configuration layering.

use std::collections::HashMap;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use mailgate::config::{
    dotenv_lookup, GateConfig, CONFIG_ENV, CONFIRM_EDITS_ENV, REJECT_MESSAGE_ENV,
};
use mailgate::decision::{DecisionKind, DEFAULT_REJECT_MESSAGE};
use mailgate::error::MailgateError;
use mailgate::tools::builtin::all_tools;
use mailgate::tools::Outbox;

const FILE: &str = r#"
reject_message = "From the file."
confirm_edits = false
checkpoint_dir = "/var/lib/mailgate"

[interrupt_on.send_email]
allowed_decisions = ["approve", "reject"]
"#;

fn write_config(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, FILE).unwrap();
    path
}

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn file_values_load() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir);

    let config = GateConfig::resolve_with(Some(path.as_path()), env(&[])).unwrap();

    assert_eq!(config.reject_message.as_deref(), Some("From the file."));
    assert_eq!(config.checkpoint_dir(), PathBuf::from("/var/lib/mailgate"));
    assert!(!config.interrupt_on.allows("send_email", DecisionKind::Edit));
}

#[test]
fn environment_beats_file_and_setters_beat_environment() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir);

    let config = GateConfig::resolve_with(
        Some(path.as_path()),
        env(&[(REJECT_MESSAGE_ENV, "From the env."), (CONFIRM_EDITS_ENV, "true")]),
    )
    .unwrap();
    assert_eq!(config.reject_message.as_deref(), Some("From the env."));
    assert!(config.confirm_edits);

    let config = config.with_reject_message("From code.").with_confirm_edits(false);
    assert_eq!(config.reject_message.as_deref(), Some("From code."));
    assert!(!config.confirm_edits);
}

#[test]
fn config_path_can_come_from_environment() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir);
    let path = path.to_string_lossy().into_owned();

    let config = GateConfig::resolve_with(None, env(&[(CONFIG_ENV, path.as_str())])).unwrap();

    assert_eq!(config.reject_message.as_deref(), Some("From the file."));
}

#[test]
fn malformed_file_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "confirm_edits = \"sometimes\"").unwrap();

    let err = GateConfig::resolve_with(Some(path.as_path()), env(&[])).unwrap_err();

    assert!(matches!(err, MailgateError::Configuration(_)));
    assert!(err.to_string().contains("config.toml"), "{err}");
}

#[test]
fn blank_reject_message_falls_back_to_default() {
    let protocol = GateConfig::new()
        .with_reject_message("   ")
        .protocol(all_tools(&Outbox::new()));

    assert_eq!(protocol.reject_message(), DEFAULT_REJECT_MESSAGE);
}

#[test]
fn configured_policy_reaches_protocol_and_runtime() {
    let dir = TempDir::new().unwrap();
    let config = GateConfig::resolve_with(Some(write_config(&dir).as_path()), env(&[]))
        .unwrap()
        .with_checkpoint_dir(dir.path());
    let tools = all_tools(&Outbox::new());

    let protocol = config.protocol(tools.clone());
    let planner = std::sync::Arc::new(mailgate::runtime::DirectivePlanner::new());
    let runtime = config.runtime(tools, planner);

    assert!(!protocol.policy().allows("send_email", DecisionKind::Edit));
    assert_eq!(runtime.policy(), protocol.policy());
}

#[test]
fn dotenv_file_feeds_the_environment_layer() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir);
    let dotenv = dir.path().join(".env");
    std::fs::write(
        &dotenv,
        "MAILGATE_REJECT_MESSAGE=\"From .env.\"\nMAILGATE_CONFIRM_EDITS=yes\n",
    )
    .unwrap();

    let config =
        GateConfig::resolve_with(Some(config_path.as_path()), dotenv_lookup(Some(&dotenv)))
            .unwrap();

    assert_eq!(config.reject_message.as_deref(), Some("From .env."));
    assert!(config.confirm_edits);
}

#[test]
fn process_environment_beats_dotenv_file() {
    let dir = TempDir::new().unwrap();
    let dotenv = dir.path().join(".env");
    std::fs::write(&dotenv, "PATH=/from/dotenv\n").unwrap();

    let lookup = dotenv_lookup(Some(&dotenv));

    let expected = std::env::var("PATH").unwrap_or_else(|_| "/from/dotenv".into());
    assert_eq!(lookup("PATH"), Some(expected));
}

#[test]
fn missing_dotenv_file_is_ignored() {
    let dir = TempDir::new().unwrap();

    let lookup = dotenv_lookup(Some(&dir.path().join("absent.env")));

    assert_eq!(lookup("MAILGATE_TEST_SURELY_UNSET"), None);
}
