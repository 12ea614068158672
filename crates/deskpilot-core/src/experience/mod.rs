//! Experience: turning finished sessions into reusable knowledge
//!
//! After a session completes, its response log is read back, condensed into
//! [`ExperienceSummary`] records by an [`ExperienceSummarizer`], and merged
//! into two stores under the experience directory:
//! - `experience.yaml`: flat file keyed by summary key ([`yaml_store`])
//! - `experience_db/`: searchable term-vector index ([`vector_index`])
//!
//! App agents can later query the index to bias their decisions with past
//! experience.

pub mod vector_index;
pub mod yaml_store;

pub use vector_index::ExperienceIndex;
pub use yaml_store::ExperienceFile;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

use crate::action::Action;
use crate::cost::Cost;
use crate::error::{Error, Result};
use crate::logging::RESPONSE_LOG;
use crate::status::Status;

pub const EXPERIENCE_FILE: &str = "experience.yaml";
pub const EXPERIENCE_DB: &str = "experience_db";

/// One line of a session's response log
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogRecord {
    pub task: String,
    /// Session that wrote the record; empty in logs written before ids
    pub session: String,
    pub step: usize,
    pub round: usize,
    pub round_step: usize,
    pub agent: String,
    pub request: String,
    pub application: String,
    pub observation: String,
    pub thought: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    pub plan: Vec<String>,
    pub comment: String,
    pub results: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    pub cost: Cost,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Condensed record of how one request was carried out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceSummary {
    /// Identity used to merge into existing stores
    pub key: String,
    pub task: String,
    pub request: String,
    pub application: String,
    pub steps: Vec<String>,
    pub outcome: String,
}

impl ExperienceSummary {
    /// Text indexed for retrieval
    pub fn document(&self) -> String {
        format!(
            "{}\n{}\n{}",
            self.request,
            self.application,
            self.steps.join("\n")
        )
    }

    /// Compact form handed to agents as an example
    pub fn as_example(&self) -> String {
        format!(
            "Request: {}\nApplication: {}\nSteps:\n{}\nOutcome: {}",
            self.request,
            self.application,
            self.steps
                .iter()
                .enumerate()
                .map(|(i, s)| format!("{}. {}", i + 1, s))
                .collect::<Vec<_>>()
                .join("\n"),
            self.outcome
        )
    }
}

/// Read every record from a task's response log, skipping malformed lines
pub fn read_logs(log_dir: &Path) -> Result<Vec<LogRecord>> {
    let path = log_dir.join(RESPONSE_LOG);
    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Experience(format!("Failed to read {}: {}", path.display(), e)))?;

    let mut records = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<LogRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping log line {} of {}: {}", line_no + 1, path.display(), e),
        }
    }
    Ok(records)
}

/// Summarises logged interactions into experience
#[async_trait]
pub trait ExperienceSummarizer: Send + Sync {
    /// Load the records of a task log directory
    fn read_logs(&self, log_dir: &Path) -> Result<Vec<LogRecord>> {
        read_logs(log_dir)
    }

    /// Summaries plus the cost of producing them
    async fn get_summary_list(&self, records: &[LogRecord]) -> Result<(Vec<ExperienceSummary>, Cost)>;
}

/// Summariser without a model: one summary per finished round
///
/// A task's log holds every session run under that task name, so rounds are
/// grouped per session. Rounds that never executed an action, or that ended
/// in anything other than `Finish`, are skipped.
#[derive(Debug, Default)]
pub struct RecordSummarizer;

#[async_trait]
impl ExperienceSummarizer for RecordSummarizer {
    async fn get_summary_list(&self, records: &[LogRecord]) -> Result<(Vec<ExperienceSummary>, Cost)> {
        let mut rounds: BTreeMap<(String, String, usize), Vec<&LogRecord>> = BTreeMap::new();
        for record in records.iter().filter(|r| r.action.is_some()) {
            rounds
                .entry((record.task.clone(), record.session.clone(), record.round))
                .or_default()
                .push(record);
        }

        let summaries = rounds
            .into_iter()
            .filter_map(|((task, session, round), steps)| {
                let last = steps.last()?;
                if last.status != Some(Status::Finish) {
                    return None;
                }
                Some(ExperienceSummary {
                    key: summary_key(&task, &session, round),
                    task,
                    request: last.request.clone(),
                    application: last.application.clone(),
                    steps: steps.iter().filter_map(|r| describe_step(r)).collect(),
                    outcome: if last.comment.is_empty() {
                        last.results.clone()
                    } else {
                        last.comment.clone()
                    },
                })
            })
            .collect();

        Ok((summaries, Cost::ZERO))
    }
}

/// `task-round`, with the session id in between when the log has one
fn summary_key(task: &str, session: &str, round: usize) -> String {
    if session.is_empty() {
        format!("{}-{}", task, round)
    } else {
        format!("{}-{}-{}", task, session, round)
    }
}

fn describe_step(record: &LogRecord) -> Option<String> {
    let action = record.action.as_ref()?;
    if action.is_noop() {
        return None;
    }
    let target = action
        .target
        .as_deref()
        .map(|t| format!(" on '{}'", t))
        .unwrap_or_default();
    let args = if action.args.is_null() {
        String::new()
    } else {
        format!(" {}", action.args)
    };
    Some(format!("{}{}{}", action.function, target, args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(round: usize, step: usize, function: &str, status: Status) -> LogRecord {
        LogRecord {
            task: "demo".into(),
            step,
            round,
            agent: "app".into(),
            request: "type hello".into(),
            application: "notepad".into(),
            action: Some(Action::new(function).with_target("Edit")),
            results: "ok".into(),
            status: Some(status),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_record_summarizer_keeps_finished_rounds() {
        let records = vec![
            LogRecord {
                agent: "host".into(),
                status: Some(Status::Continue),
                ..Default::default()
            },
            record(0, 1, "click_input", Status::Continue),
            record(0, 2, "type_keys", Status::Finish),
            record(1, 3, "click_input", Status::NeedsNewRound),
        ];

        let (summaries, cost) = RecordSummarizer.get_summary_list(&records).await.unwrap();
        assert_eq!(cost, Cost::ZERO);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].key, "demo-0");
        assert_eq!(summaries[0].steps, vec!["click_input on 'Edit'", "type_keys on 'Edit'"]);
        assert!(summaries[0].as_example().contains("1. click_input"));
    }

    #[tokio::test]
    async fn test_record_summarizer_separates_sessions() {
        let mut first = record(0, 1, "type_keys", Status::Finish);
        first.session = "a1".into();
        first.request = "Type hello".into();
        let mut second = record(0, 1, "save", Status::Finish);
        second.session = "b2".into();
        second.request = "Save the file".into();

        let (summaries, _) = RecordSummarizer.get_summary_list(&[first, second]).await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].key, "demo-a1-0");
        assert_eq!(summaries[0].request, "Type hello");
        assert_eq!(summaries[0].steps, vec!["type_keys on 'Edit'"]);
        assert_eq!(summaries[1].key, "demo-b2-0");
        assert_eq!(summaries[1].steps, vec!["save on 'Edit'"]);
    }

    #[test]
    fn test_read_logs_skips_bad_lines() {
        let dir = tempfile::TempDir::new().unwrap();
        let good = serde_json::to_string(&record(0, 1, "type_keys", Status::Finish)).unwrap();
        let content = format!("{}\nnot json\n\n{}\n", good, json!({ "step": 2, "agent": "host" }));
        std::fs::write(dir.path().join(RESPONSE_LOG), content).unwrap();

        let records = read_logs(dir.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].agent, "host");
        assert!(records[1].action.is_none());
    }

    #[test]
    fn test_read_logs_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(read_logs(dir.path()), Err(Error::Experience(_))));
    }
}
