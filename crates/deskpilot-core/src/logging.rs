//! Per-task request/response logs
//!
//! Every session writes two append-only files under `<log_root>/<task>/`:
//! `request.log` with what each agent was asked and `response.log` with what
//! it decided and what happened. Each line is one JSON object. The response
//! log is what experience summarisation reads back later.
//!
//! Example: `logs/open_notepad/response.log`

use parking_lot::Mutex;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::Result;

pub const RESPONSE_LOG: &str = "response.log";
pub const REQUEST_LOG: &str = "request.log";

/// One append-only JSON-lines file
pub struct LogSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl LogSink {
    /// Open (or create) the file in append mode
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single line
    pub fn write<T: Serialize>(&self, record: &T) -> Result<()> {
        let line = serde_json::to_string(record)?;
        let mut writer = self.writer.lock();
        writeln!(writer, "{}", line)?;
        Ok(())
    }

    pub fn flush(&self) -> Result<()> {
        self.writer.lock().flush()?;
        Ok(())
    }
}

impl Drop for LogSink {
    fn drop(&mut self) {
        if let Err(e) = self.writer.get_mut().flush() {
            warn!("Failed to flush log {}: {}", self.path.display(), e);
        }
    }
}

#[derive(Serialize)]
struct RequestEntry<'a, T: Serialize> {
    timestamp: String,
    step: usize,
    round: usize,
    agent: &'a str,
    request: &'a T,
}

/// Request and response logs of one session
pub struct SessionLogs {
    dir: PathBuf,
    response: LogSink,
    request: LogSink,
}

impl SessionLogs {
    /// Create the task directory and open both logs
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let response = LogSink::open(dir.join(RESPONSE_LOG))?;
        let request = LogSink::open(dir.join(REQUEST_LOG))?;
        debug!("Opened session logs in {}", dir.display());
        Ok(Self {
            dir,
            response,
            request,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn response(&self) -> &LogSink {
        &self.response
    }

    pub fn request(&self) -> &LogSink {
        &self.request
    }

    /// Log what an agent was asked at a given step
    pub fn log_request<T: Serialize>(&self, step: usize, round: usize, agent: &str, request: &T) {
        let entry = RequestEntry {
            timestamp: chrono::Utc::now().to_rfc3339(),
            step,
            round,
            agent,
            request,
        };
        if let Err(e) = self.request.write(&entry) {
            warn!("Failed to write request log: {}", e);
        }
    }

    /// Log what an agent decided and what came of it
    pub fn log_response(&self, record: &impl Serialize) {
        if let Err(e) = self.response.write(record) {
            warn!("Failed to write response log: {}", e);
        }
    }

    pub fn flush(&self) -> Result<()> {
        self.response.flush()?;
        self.request.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    #[test]
    fn test_logs_are_json_lines() {
        let dir = TempDir::new().unwrap();
        let logs = SessionLogs::create(dir.path().join("task")).unwrap();

        logs.log_request(0, 0, "host", &json!({ "request": "open notepad" }));
        logs.log_response(&json!({ "step": 0, "agent": "host" }));
        logs.log_response(&json!({ "step": 1, "agent": "app" }));
        logs.flush().unwrap();

        let response = std::fs::read_to_string(dir.path().join("task").join(RESPONSE_LOG)).unwrap();
        assert!(response.ends_with('\n'));
        let lines: Vec<Value> = response
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["agent"], "app");

        let request = std::fs::read_to_string(dir.path().join("task").join(REQUEST_LOG)).unwrap();
        assert!(request.contains("open notepad"));
    }

    #[test]
    fn test_logs_append_across_sessions() {
        let dir = TempDir::new().unwrap();
        {
            let logs = SessionLogs::create(dir.path()).unwrap();
            logs.log_response(&json!({ "step": 0 }));
        }
        {
            let logs = SessionLogs::create(dir.path()).unwrap();
            logs.log_response(&json!({ "step": 1 }));
        }
        let response = std::fs::read_to_string(dir.path().join(RESPONSE_LOG)).unwrap();
        assert_eq!(response.lines().count(), 2);
    }
}
