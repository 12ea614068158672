//! Desktop description files and the dry-run executor
//!
//! Without a UI automation backend the CLI reads the desktop from a JSON
//! file, re-read on every capture so it can be edited while a session runs:
//!
//! ```json
//! {
//!   "windows": [
//!     { "handle": 1, "title": "Untitled - Notepad", "process_name": "notepad.exe", "label": "1" }
//!   ],
//!   "controls": { "1": [ { "label": "Edit", "type": "Edit" } ] }
//! }
//! ```

use async_trait::async_trait;
use deskpilot_core::{Action, ActionExecutor, ActionOutcome, AppWindow, Error, Result, StateCapture, UiCapture};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DesktopFile {
    #[serde(default)]
    pub windows: Vec<AppWindow>,
    /// Controls keyed by window label
    #[serde(default)]
    pub controls: BTreeMap<String, Value>,
}

impl DesktopFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Capture(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Capture(format!("Invalid desktop file {}: {}", path.display(), e)))
    }
}

/// Capture backed by a desktop description file
pub struct JsonDesktopCapture {
    path: PathBuf,
    previous: Option<Value>,
}

impl JsonDesktopCapture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            previous: None,
        }
    }
}

#[async_trait]
impl StateCapture for JsonDesktopCapture {
    async fn capture(&mut self, window: Option<&AppWindow>) -> Result<UiCapture> {
        let desktop = DesktopFile::load(&self.path)?;
        let snapshot = match window {
            Some(window) => json!({
                "window": window.title,
                "controls": desktop.controls.get(&window.label).cloned().unwrap_or(Value::Null),
            }),
            None => json!({
                "windows": desktop.windows.iter().map(|w| w.title.as_str()).collect::<Vec<_>>(),
            }),
        };

        let diff = state_diff(self.previous.as_ref(), &snapshot);
        self.previous = Some(snapshot.clone());

        Ok(UiCapture {
            snapshot,
            diff,
            windows: desktop.windows,
            screenshot: None,
        })
    }
}

/// Top-level entries that changed since the previous snapshot
fn state_diff(previous: Option<&Value>, current: &Value) -> Value {
    match (previous, current) {
        (Some(Value::Object(before)), Value::Object(after)) => {
            let changed: Map<String, Value> = after
                .iter()
                .filter(|(key, value)| before.get(*key) != Some(*value))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            Value::Object(changed)
        }
        _ => current.clone(),
    }
}

/// Executor that only reports what it would do
pub struct DryRunExecutor;

#[async_trait]
impl ActionExecutor for DryRunExecutor {
    async fn execute(&self, window: &AppWindow, action: &Action) -> Result<ActionOutcome> {
        let target = action.target.as_deref().unwrap_or("-");
        info!("Dry run: {} on {} in {}", action.function, target, window.title);
        Ok(ActionOutcome::success(format!(
            "[dry run] {} on '{}' in {}",
            action.function, target, window.title
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_desktop(dir: &TempDir, content: &Value) -> PathBuf {
        let path = dir.path().join("desktop.json");
        std::fs::write(&path, content.to_string()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_capture_reads_windows_and_controls() {
        let dir = TempDir::new().unwrap();
        let path = write_desktop(
            &dir,
            &json!({
                "windows": [
                    { "handle": 1, "title": "Untitled - Notepad", "process_name": "notepad.exe", "label": "1" }
                ],
                "controls": { "1": [ { "label": "Edit" } ] }
            }),
        );
        let mut capture = JsonDesktopCapture::new(&path);

        let desktop = capture.capture(None).await.unwrap();
        assert_eq!(desktop.windows.len(), 1);
        assert_eq!(desktop.snapshot["windows"][0], "Untitled - Notepad");

        let window = desktop.windows[0].clone();
        let focused = capture.capture(Some(&window)).await.unwrap();
        assert_eq!(focused.snapshot["controls"][0]["label"], "Edit");

        let again = capture.capture(Some(&window)).await.unwrap();
        assert_eq!(again.diff, json!({}));
    }

    #[tokio::test]
    async fn test_missing_file_is_capture_error() {
        let dir = TempDir::new().unwrap();
        let mut capture = JsonDesktopCapture::new(dir.path().join("missing.json"));
        assert!(matches!(capture.capture(None).await, Err(Error::Capture(_))));
    }

    #[test]
    fn test_state_diff() {
        let before = json!({ "window": "a", "controls": [1] });
        let after = json!({ "window": "a", "controls": [1, 2] });
        assert_eq!(state_diff(Some(&before), &after), json!({ "controls": [1, 2] }));
        assert_eq!(state_diff(None, &after), after);
    }
}
