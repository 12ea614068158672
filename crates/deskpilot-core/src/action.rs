//! Actions chosen by the app agent and their execution

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::capture::AppWindow;
use crate::error::Result;

/// One UI action, e.g. `click_input` on a control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub function: String,
    /// Control label or name the action targets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default)]
    pub args: Value,
}

impl Action {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            target: None,
            args: Value::Null,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_args(mut self, args: Value) -> Self {
        self.args = args;
        self
    }

    /// An empty function name means "no action this step"
    pub fn is_noop(&self) -> bool {
        self.function.trim().is_empty()
    }

    /// Whether executing this action ends the round
    pub fn is_terminal(&self, terminal_actions: &[String]) -> bool {
        terminal_actions
            .iter()
            .any(|name| name.eq_ignore_ascii_case(self.function.trim()))
    }
}

/// What happened when an action ran
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub success: bool,
    /// Text result reported back to the agents
    pub results: String,
}

impl ActionOutcome {
    pub fn success(results: impl Into<String>) -> Self {
        Self {
            success: true,
            results: results.into(),
        }
    }

    pub fn failure(results: impl Into<String>) -> Self {
        Self {
            success: false,
            results: results.into(),
        }
    }

    pub fn skipped() -> Self {
        Self::success("")
    }
}

/// Runs actions against an application window
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, window: &AppWindow, action: &Action) -> Result<ActionOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_action() {
        let terminal = vec!["finish".to_string()];
        assert!(Action::new("Finish").is_terminal(&terminal));
        assert!(!Action::new("click_input").is_terminal(&terminal));
    }

    #[test]
    fn test_noop_action() {
        assert!(Action::new("  ").is_noop());
        assert!(!Action::new("type_keys").is_noop());
    }

    #[test]
    fn test_action_serialization() {
        let action = Action::new("type_keys")
            .with_target("Edit")
            .with_args(serde_json::json!({ "text": "hello" }));
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["function"], "type_keys");
        assert_eq!(value["target"], "Edit");
        assert_eq!(value["args"]["text"], "hello");
    }
}
