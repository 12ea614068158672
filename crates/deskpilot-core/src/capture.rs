//! UI state capture
//!
//! A [`StateCapture`] handle takes one snapshot of the desktop per phase and
//! reports what changed since its previous snapshot. Each round gets a fresh
//! handle from the session's [`CaptureFactory`], so diffs never leak across
//! rounds.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Result;

/// A top-level application window the host agent can choose from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppWindow {
    /// Platform window handle
    pub handle: u64,
    pub title: String,
    /// Executable name, e.g. "notepad.exe"
    pub process_name: String,
    /// Short label shown to the decision service, e.g. "1"
    pub label: String,
}

impl AppWindow {
    pub fn new(
        handle: u64,
        title: impl Into<String>,
        process_name: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            handle,
            title: title.into(),
            process_name: process_name.into(),
            label: label.into(),
        }
    }

    /// Process name without extension, used as the application root name
    pub fn root_name(&self) -> &str {
        self.process_name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&self.process_name)
    }

    /// Whether a decision's application choice refers to this window
    pub fn matches(&self, choice: &str) -> bool {
        let choice = choice.trim();
        !choice.is_empty()
            && (self.label.eq_ignore_ascii_case(choice)
                || self.title.eq_ignore_ascii_case(choice)
                || self.process_name.eq_ignore_ascii_case(choice)
                || self.root_name().eq_ignore_ascii_case(choice))
    }
}

/// Result of one capture
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiCapture {
    /// Current UI state (controls, focused element, ...)
    pub snapshot: Value,
    /// Difference from the previous capture of the same handle
    pub diff: Value,
    /// Windows visible on the desktop
    pub windows: Vec<AppWindow>,
    /// Screenshot written for this capture, if any
    pub screenshot: Option<PathBuf>,
}

/// Produces UI snapshots; called once per phase invocation
#[async_trait]
pub trait StateCapture: Send {
    /// Capture the desktop, or the given window when one is resolved
    async fn capture(&mut self, window: Option<&AppWindow>) -> Result<UiCapture>;
}

/// Builds a fresh capture handle for each round
pub type CaptureFactory = Arc<dyn Fn() -> Box<dyn StateCapture> + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_matching() {
        let window = AppWindow::new(42, "Untitled - Notepad", "notepad.exe", "3");
        assert!(window.matches("notepad"));
        assert!(window.matches("Notepad.exe"));
        assert!(window.matches("3"));
        assert!(window.matches("untitled - notepad"));
        assert!(!window.matches("word"));
        assert!(!window.matches("  "));
        assert_eq!(window.root_name(), "notepad");
    }
}
