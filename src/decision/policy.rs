//! Which tool calls pause for a human, and which answers are allowed.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use super::types::DecisionKind;

/// Per-tool interrupt settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterruptRule {
    #[serde(default = "all_decisions")]
    pub allowed_decisions: BTreeSet<DecisionKind>,
}

impl Default for InterruptRule {
    fn default() -> Self {
        Self {
            allowed_decisions: all_decisions(),
        }
    }
}

fn all_decisions() -> BTreeSet<DecisionKind> {
    DecisionKind::iter().collect()
}

/// Tool name to interrupt rule. Tools without a rule run without approval.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterruptPolicy {
    rules: BTreeMap<String, InterruptRule>,
}

impl InterruptPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Guard `tool`, accepting every decision kind.
    pub fn guard(self, tool: impl Into<String>) -> Self {
        self.guard_with(tool, DecisionKind::iter())
    }

    /// Guard `tool`, accepting only `allowed` decision kinds.
    pub fn guard_with(
        mut self,
        tool: impl Into<String>,
        allowed: impl IntoIterator<Item = DecisionKind>,
    ) -> Self {
        self.rules.insert(
            tool.into(),
            InterruptRule {
                allowed_decisions: allowed.into_iter().collect(),
            },
        );
        self
    }

    /// Whether a call to `tool` must wait for a human decision.
    pub fn requires_approval(&self, tool: &str) -> bool {
        self.rules.contains_key(tool)
    }

    /// Whether `kind` may resolve a pending call to `tool`.
    ///
    /// Unguarded tools accept every kind; they never suspend, so a decision
    /// for them can only come from a caller replaying an old request.
    pub fn allows(&self, tool: &str, kind: DecisionKind) -> bool {
        self.rules
            .get(tool)
            .map(|rule| rule.allowed_decisions.contains(&kind))
            .unwrap_or(true)
    }

    /// Allowed kinds for `tool`, in display order.
    pub fn allowed(&self, tool: &str) -> Vec<DecisionKind> {
        match self.rules.get(tool) {
            Some(rule) => rule.allowed_decisions.iter().copied().collect(),
            None => DecisionKind::iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
