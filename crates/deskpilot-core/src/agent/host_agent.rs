//! Host agent - chooses the application a request runs in
//!
//! One host agent lives for the whole session. It keeps the requests of
//! finished rounds and the global action memory fed by every app agent step.

use serde::{Deserialize, Serialize};

use super::{Agent, Memory, MemoryItem};

/// Application choice returned by the host brain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostDecision {
    pub observation: String,
    pub thought: String,
    /// Window label, title or process name; `None` when nothing fits
    pub application: Option<String>,
    /// Step-by-step plan for the app agent
    #[serde(default)]
    pub plan: Vec<String>,
    #[serde(default)]
    pub comment: String,
}

impl HostDecision {
    pub fn select(application: impl Into<String>) -> Self {
        Self {
            application: Some(application.into()),
            ..Default::default()
        }
    }

    pub fn with_plan(mut self, plan: Vec<String>) -> Self {
        self.plan = plan;
        self
    }

    /// A decision that names no application
    pub fn none(comment: impl Into<String>) -> Self {
        Self {
            comment: comment.into(),
            ..Default::default()
        }
    }
}

pub struct HostAgent {
    name: String,
    request_memory: Vec<String>,
    global_action_memory: Memory,
    /// Plan produced by the latest application selection
    plan: Vec<String>,
}

impl HostAgent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            request_memory: Vec::new(),
            global_action_memory: Memory::new(),
            plan: Vec::new(),
        }
    }

    /// Remember a request whose round has finished
    pub fn add_request_memory(&mut self, request: impl Into<String>) {
        self.request_memory.push(request.into());
    }

    pub fn request_history(&self) -> &[String] {
        &self.request_memory
    }

    pub fn add_global_action(&mut self, item: MemoryItem) {
        self.global_action_memory.add(item);
    }

    pub fn global_action_memory(&self) -> &Memory {
        &self.global_action_memory
    }

    pub fn set_plan(&mut self, plan: Vec<String>) {
        self.plan = plan;
    }

    pub fn plan(&self) -> &[String] {
        &self.plan
    }
}

impl Agent for HostAgent {
    fn id(&self) -> &str {
        "host"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Selects the application window that best fits the user's request."
    }

    fn memory(&self) -> &Memory {
        &self.global_action_memory
    }
}
