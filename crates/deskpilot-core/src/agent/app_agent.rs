//! App agent - executes a request inside one application, one action per step
//!
//! In follower mode the agent is handed the host plan as step-by-step
//! instructions and is expected to follow them in order instead of planning
//! on its own.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::Action;
use crate::capture::{AppWindow, UiCapture};

use super::{Agent, AgentSignal, DecisionRequest, Memory, MemoryItem};

/// Action choice returned by the app brain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppDecision {
    #[serde(default)]
    pub observation: String,
    #[serde(default)]
    pub thought: String,
    pub action: Action,
    /// Remaining plan after this action
    #[serde(default)]
    pub plan: Vec<String>,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub signal: AgentSignal,
}

impl AppDecision {
    pub fn act(action: Action) -> Self {
        Self {
            observation: String::new(),
            thought: String::new(),
            action,
            plan: Vec::new(),
            comment: String::new(),
            signal: AgentSignal::Continue,
        }
    }

    pub fn with_signal(mut self, signal: AgentSignal) -> Self {
        self.signal = signal;
        self
    }

    pub fn with_thought(mut self, thought: impl Into<String>) -> Self {
        self.thought = thought.into();
        self
    }
}

pub struct AppAgent {
    name: String,
    window: AppWindow,
    follower: bool,
    app_info: Option<String>,
    memory: Memory,
    /// Plan returned with the latest decision
    plan: Vec<String>,
    visual_mode: bool,
}

impl AppAgent {
    pub fn new(window: AppWindow, visual_mode: bool) -> Self {
        Self {
            name: format!("AppAgent/{}", window.root_name()),
            window,
            follower: false,
            app_info: None,
            memory: Memory::new(),
            plan: Vec::new(),
            visual_mode,
        }
    }

    /// An agent that follows the host plan step by step
    pub fn follower(window: AppWindow, visual_mode: bool, app_info: Option<String>) -> Self {
        let name = format!("FollowerAgent/{}", window.root_name());
        Self {
            name,
            follower: true,
            app_info,
            ..Self::new(window, visual_mode)
        }
    }

    pub fn window(&self) -> &AppWindow {
        &self.window
    }

    pub fn process_name(&self) -> &str {
        &self.window.process_name
    }

    pub fn app_root_name(&self) -> &str {
        self.window.root_name()
    }

    pub fn is_follower(&self) -> bool {
        self.follower
    }

    pub fn add_memory(&mut self, item: MemoryItem) {
        self.memory.add(item);
    }

    pub fn set_plan(&mut self, plan: Vec<String>) {
        self.plan = plan;
    }

    pub fn plan(&self) -> &[String] {
        &self.plan
    }

    /// Build the request for the next action
    ///
    /// The host plan drives the first step; afterwards a follower keeps it
    /// while a regular agent continues from its own latest plan.
    pub fn build_request(
        &self,
        request: &str,
        capture: &UiCapture,
        request_history: &[String],
        host_plan: &[String],
        examples: Vec<String>,
    ) -> DecisionRequest {
        let plan = if self.follower || self.memory.is_empty() {
            host_plan.to_vec()
        } else {
            self.plan.clone()
        };

        DecisionRequest {
            request: request.to_string(),
            current_state: capture.snapshot.clone(),
            state_diff: capture.diff.clone(),
            request_history: request_history.to_vec(),
            action_history: self.memory.to_values(),
            plan,
            control_info: Value::Null,
            images: if self.visual_mode {
                capture.screenshot.iter().cloned().collect()
            } else {
                Vec::new()
            },
            include_last_screenshot: self.visual_mode && !self.memory.is_empty(),
            examples,
            app_info: self.app_info.clone(),
        }
    }
}

impl Agent for AppAgent {
    fn id(&self) -> &str {
        if self.follower { "follower" } else { "app" }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Executes the request inside the selected application, one action per step."
    }

    fn memory(&self) -> &Memory {
        &self.memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::Cost;
    use crate::status::Status;
    use std::path::PathBuf;

    fn notepad() -> AppWindow {
        AppWindow::new(7, "Untitled - Notepad", "notepad.exe", "1")
    }

    fn item(step: usize) -> MemoryItem {
        MemoryItem {
            step,
            round: 0,
            round_step: step,
            agent: "app".into(),
            application: "notepad".into(),
            request: "type hello".into(),
            thought: String::new(),
            action: Action::new("type_keys"),
            comment: String::new(),
            results: "ok".into(),
            status: Status::Continue,
            cost: Cost::ZERO,
        }
    }

    #[test]
    fn test_follower_keeps_plan() {
        let mut agent = AppAgent::follower(notepad(), false, Some("Notepad basics".into()));
        agent.add_memory(item(0));
        let plan = vec!["type hello".to_string()];
        let request = agent.build_request("type hello", &UiCapture::default(), &[], &plan, Vec::new());
        assert_eq!(request.plan, plan);
        assert_eq!(request.app_info.as_deref(), Some("Notepad basics"));
        assert_eq!(agent.id(), "follower");
    }

    #[test]
    fn test_app_agent_drops_plan_after_first_step() {
        let mut agent = AppAgent::new(notepad(), true);
        let plan = vec!["type hello".to_string()];
        let first = agent.build_request("r", &UiCapture::default(), &[], &plan, Vec::new());
        assert_eq!(first.plan, plan);
        assert!(!first.include_last_screenshot);

        agent.add_memory(item(0));
        let capture = UiCapture {
            screenshot: Some(PathBuf::from("shot.png")),
            ..Default::default()
        };
        let second = agent.build_request("r", &capture, &[], &plan, Vec::new());
        assert!(second.plan.is_empty());

        agent.set_plan(vec!["press enter".to_string()]);
        let third = agent.build_request("r", &capture, &[], &plan, Vec::new());
        assert_eq!(third.plan, vec!["press enter".to_string()]);
        assert_eq!(second.action_history.len(), 1);
        assert_eq!(second.images, vec![PathBuf::from("shot.png")]);
        assert!(second.include_last_screenshot);
    }
}
