//! Configuration system (layered: code > env > config file).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::decision::{DecisionProtocol, InterruptPolicy};
use crate::error::{MailgateError, Result};
use crate::runtime::{FileCheckpointer, LocalRuntime, Planner};
use crate::tools::ToolRegistry;

pub const CONFIG_ENV: &str = "MAILGATE_CONFIG";
pub const REJECT_MESSAGE_ENV: &str = "MAILGATE_REJECT_MESSAGE";
pub const CONFIRM_EDITS_ENV: &str = "MAILGATE_CONFIRM_EDITS";
pub const CHECKPOINT_DIR_ENV: &str = "MAILGATE_CHECKPOINT_DIR";

/// Settings for the approval gate.
///
/// Resolution order, lowest to highest:
/// 1. `config.toml` (`--config`, `MAILGATE_CONFIG`, or `~/.mailgate/config.toml`)
/// 2. `MAILGATE_*` environment variables (a `.env` file is loaded first)
/// 3. The `with_*` setters
///
/// ```toml
/// reject_message = "Not now."
/// confirm_edits = true
///
/// [interrupt_on.send_email]
/// allowed_decisions = ["approve", "reject"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GateConfig {
    /// Reason sent with a rejection when the human gives none.
    pub reject_message: Option<String>,
    /// Re-suspend edited calls for another approval.
    pub confirm_edits: bool,
    pub checkpoint_dir: Option<PathBuf>,
    /// Guarded tools. Empty means every registered tool is guarded.
    pub interrupt_on: InterruptPolicy,
}

impl GateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            MailgateError::Configuration(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_toml(&raw)
            .map_err(|err| MailgateError::Configuration(format!("{}: {err}", path.display())))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|err| MailgateError::Configuration(err.to_string()))
    }

    /// Resolve the full stack: file, then environment.
    ///
    /// An explicit `path` (or `MAILGATE_CONFIG`) must exist; the default
    /// location is optional.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        Self::resolve_with(path, dotenv_lookup(None))
    }

    /// [`GateConfig::resolve`] over an arbitrary variable lookup.
    pub fn resolve_with(
        path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| lookup(CONFIG_ENV).filter(|v| !v.trim().is_empty()).map(PathBuf::from));
        let base = match explicit {
            Some(path) => Self::load(path)?,
            None => {
                let path = default_config_path();
                if path.is_file() {
                    Self::load(path)?
                } else {
                    Self::default()
                }
            }
        };
        base.overlay_env(lookup)
    }

    /// Apply `MAILGATE_*` values on top of `self`. Empty values are ignored.
    pub fn overlay_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(message) = var(REJECT_MESSAGE_ENV) {
            self.reject_message = Some(message);
        }
        if let Some(flag) = var(CONFIRM_EDITS_ENV) {
            self.confirm_edits = parse_flag(CONFIRM_EDITS_ENV, &flag)?;
        }
        if let Some(dir) = var(CHECKPOINT_DIR_ENV) {
            self.checkpoint_dir = Some(PathBuf::from(dir));
        }
        Ok(self)
    }

    pub fn with_reject_message(mut self, message: impl Into<String>) -> Self {
        self.reject_message = Some(message.into());
        self
    }

    pub fn with_confirm_edits(mut self, confirm_edits: bool) -> Self {
        self.confirm_edits = confirm_edits;
        self
    }

    pub fn with_checkpoint_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.checkpoint_dir = Some(dir.into());
        self
    }

    pub fn with_interrupt_policy(mut self, policy: InterruptPolicy) -> Self {
        self.interrupt_on = policy;
        self
    }

    pub fn checkpoint_dir(&self) -> PathBuf {
        self.checkpoint_dir
            .clone()
            .unwrap_or_else(crate::runtime::checkpoint::default_checkpoint_dir)
    }

    /// The configured policy, or one guarding every tool in `tools`.
    pub fn policy_for(&self, tools: &ToolRegistry) -> InterruptPolicy {
        if !self.interrupt_on.is_empty() {
            return self.interrupt_on.clone();
        }
        tools
            .names()
            .into_iter()
            .fold(InterruptPolicy::new(), |policy, name| policy.guard(name))
    }

    pub fn protocol(&self, tools: ToolRegistry) -> DecisionProtocol {
        let policy = self.policy_for(&tools);
        let protocol = DecisionProtocol::new(tools).with_policy(policy);
        match &self.reject_message {
            Some(message) => protocol.with_reject_message(message.clone()),
            None => protocol,
        }
    }

    /// A [`LocalRuntime`] checkpointing to [`GateConfig::checkpoint_dir`].
    pub fn runtime(&self, tools: ToolRegistry, planner: Arc<dyn Planner>) -> LocalRuntime {
        let policy = self.policy_for(&tools);
        LocalRuntime::new(tools, planner)
            .with_policy(policy)
            .with_checkpointer(Arc::new(FileCheckpointer::new(self.checkpoint_dir())))
            .with_confirm_edits(self.confirm_edits)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(MailgateError::Configuration(format!(
            "{key} must be a boolean, got `{other}`"
        ))),
    }
}

/// Process environment backed by a `.env` file.
///
/// `dotenv` names the file; `None` looks for `.env` in the working directory
/// and its parents. Variables already set in the process win, and the
/// process environment itself is never modified.
pub fn dotenv_lookup(dotenv: Option<&Path>) -> impl Fn(&str) -> Option<String> {
    // load .env if present, ignore error
    let entries = match dotenv {
        Some(path) => dotenvy::from_path_iter(path),
        None => dotenvy::dotenv_iter(),
    };
    let file: HashMap<String, String> = entries
        .map(|entries| entries.filter_map(|entry| entry.ok()).collect())
        .unwrap_or_default();
    move |key: &str| std::env::var(key).ok().or_else(|| file.get(key).cloned())
}

/// `~/.mailgate`, or `.mailgate` without a home directory.
pub fn default_mailgate_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".mailgate"))
        .unwrap_or_else(|| PathBuf::from(".mailgate"))
}

pub fn default_config_path() -> PathBuf {
    default_mailgate_dir().join("config.toml")
}
