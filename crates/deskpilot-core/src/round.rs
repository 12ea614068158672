//! One round: a single user request carried out in a single application
//!
//! A round starts in `AppSelection`. The host agent picks a window, an
//! [`AppAgent`] is created for it and the round moves to `Continue`. Each
//! action phase then runs exactly one action until the app agent reports
//! completion, gives up, fails, or the session runs out of steps.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::action::{Action, ActionExecutor, ActionOutcome};
use crate::agent::{Agent, AgentSignal, AppAgent, AppDecision, Brains, DecisionRequest, HostAgent, MemoryItem};
use crate::capture::{AppWindow, StateCapture, UiCapture};
use crate::config::Config;
use crate::cost::Cost;
use crate::error::{Error, Result};
use crate::experience::{ExperienceIndex, LogRecord, EXPERIENCE_DB};
use crate::logging::SessionLogs;
use crate::status::Status;

pub struct Round {
    task: String,
    session_id: String,
    index: usize,
    /// Session step before the phase currently running
    global_step: usize,
    logs: Arc<SessionLogs>,
    capture: Box<dyn StateCapture>,
    request: String,
    status: Status,
    config: Arc<Config>,
    application_window: Option<AppWindow>,
    app_agent: Option<AppAgent>,
    /// Past experiences handed to the app agent
    examples: Vec<String>,
    step_count: usize,
    cost: Cost,
}

impl Round {
    pub fn new(
        task: impl Into<String>,
        logs: Arc<SessionLogs>,
        capture: Box<dyn StateCapture>,
        request: impl Into<String>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            task: task.into(),
            session_id: String::new(),
            index: 0,
            global_step: 0,
            logs,
            capture,
            request: request.into(),
            status: Status::AppSelection,
            config,
            application_window: None,
            app_agent: None,
            examples: Vec::new(),
            step_count: 0,
            cost: Cost::ZERO,
        }
    }

    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub fn set_global_step(&mut self, step: usize) {
        self.global_step = step;
    }

    /// Session id written into every response record
    pub fn set_session_id(&mut self, session_id: impl Into<String>) {
        self.session_id = session_id.into();
    }

    /// Let the host agent choose the application for this round
    ///
    /// Requires `AppSelection`. A capture or brain failure is returned with
    /// the round still in `AppSelection`, so the phase can be run again.
    pub async fn process_application_selection(
        &mut self,
        host: &mut HostAgent,
        brains: &Brains,
    ) -> Result<Cost> {
        if self.status != Status::AppSelection {
            return Err(Error::Session(format!(
                "Round {} cannot select an application while {}",
                self.index, self.status
            )));
        }

        self.select_application(host, brains).await.inspect_err(|e| {
            warn!("Application selection failed in round {}: {}", self.index, e);
        })
    }

    async fn select_application(&mut self, host: &mut HostAgent, brains: &Brains) -> Result<Cost> {
        let capture = self.capture.capture(None).await?;

        let request = DecisionRequest {
            request: self.request.clone(),
            current_state: capture.snapshot.clone(),
            state_diff: capture.diff.clone(),
            request_history: host.request_history().to_vec(),
            action_history: host.global_action_memory().to_values(),
            plan: host.plan().to_vec(),
            control_info: serde_json::to_value(&capture.windows)?,
            images: screenshot_of(&capture, self.config.host_agent.visual_mode),
            ..Default::default()
        };
        self.logs.log_request(self.global_step, self.index, host.id(), &request);

        let decision = brains.host.decide(&request).await?;
        let cost = decision.cost;
        let choice = decision.content;
        self.cost += cost;
        host.set_plan(choice.plan.clone());

        let window = match choice.application.as_deref() {
            Some(name) => resolve_window(&capture.windows, name),
            None => {
                info!("Host agent chose no application: {}", choice.comment);
                None
            }
        };

        match window {
            Some(window) => {
                info!("Round {} runs in {} ({})", self.index, window.title, window.process_name);
                let visual_mode = self.config.app_agent.visual_mode;
                let agent = if self.config.app_agent.follower_mode {
                    let app_info = (!choice.comment.is_empty()).then(|| choice.comment.clone());
                    AppAgent::follower(window.clone(), visual_mode, app_info)
                } else {
                    AppAgent::new(window.clone(), visual_mode)
                };
                self.app_agent = Some(agent);
                self.application_window = Some(window);
                self.examples = self.retrieve_examples();
                self.status = Status::Continue;
            }
            None => self.status = Status::NeedsNewRound,
        }

        self.logs.log_response(&LogRecord {
            task: self.task.clone(),
            session: self.session_id.clone(),
            step: self.global_step,
            round: self.index,
            round_step: self.step_count,
            agent: host.name().to_string(),
            request: self.request.clone(),
            application: self
                .application_window
                .as_ref()
                .map(|w| w.root_name().to_string())
                .unwrap_or_default(),
            observation: choice.observation,
            thought: choice.thought,
            plan: choice.plan,
            comment: choice.comment,
            status: Some(self.status),
            cost,
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        });
        self.step_count += 1;

        Ok(cost)
    }

    /// Let the app agent take one action
    ///
    /// Requires `Continue`. Collaborator failures are returned with the
    /// round still in `Continue` so the step can be retried. Once the
    /// session is at the step limit the round ends as `MaxStepReached`
    /// without asking the agent; no step is counted for that call.
    pub async fn process_action_selection(
        &mut self,
        host: &mut HostAgent,
        brains: &Brains,
        executor: &dyn ActionExecutor,
    ) -> Result<Cost> {
        if self.status != Status::Continue {
            return Err(Error::Session(format!(
                "Round {} cannot act while {}",
                self.index, self.status
            )));
        }
        let (Some(window), Some(agent)) = (self.application_window.clone(), self.app_agent.as_mut())
        else {
            return Err(Error::Session(format!(
                "Round {} has no application to act in",
                self.index
            )));
        };

        let max_step = self.config.general.max_step;
        if self.global_step >= max_step {
            info!("Round {} stopped at the step limit ({})", self.index, max_step);
            self.status = Status::MaxStepReached;
            return Ok(Cost::ZERO);
        }

        let capture = self.capture.capture(Some(&window)).await?;
        let request = agent.build_request(
            &self.request,
            &capture,
            host.request_history(),
            host.plan(),
            self.examples.clone(),
        );
        self.logs.log_request(self.global_step, self.index, agent.id(), &request);

        let decision = brains.app.decide(&request).await?;
        let cost = decision.cost;
        let AppDecision {
            observation,
            thought,
            action,
            plan,
            comment,
            signal,
        } = decision.content;

        let terminal_actions = &self.config.app_agent.terminal_actions;
        let outcome = if action.is_noop() || action.is_terminal(terminal_actions) {
            ActionOutcome::skipped()
        } else {
            executor.execute(&window, &action).await?
        };
        if !outcome.success {
            warn!("Action {} failed: {}", action.function, outcome.results);
        }

        let step_limit_hit = self.global_step + 1 >= max_step;
        let status = completion_status(signal, &action, terminal_actions, step_limit_hit);
        debug!(
            "Round {} step {}: {} -> {}",
            self.index, self.step_count, action.function, status
        );

        let item = MemoryItem {
            step: self.global_step,
            round: self.index,
            round_step: self.step_count,
            agent: agent.name().to_string(),
            application: window.root_name().to_string(),
            request: self.request.clone(),
            thought: thought.clone(),
            action: action.clone(),
            comment: comment.clone(),
            results: outcome.results.clone(),
            status,
            cost,
        };
        agent.set_plan(plan.clone());
        agent.add_memory(item.clone());
        host.add_global_action(item);

        self.logs.log_response(&LogRecord {
            task: self.task.clone(),
            session: self.session_id.clone(),
            step: self.global_step,
            round: self.index,
            round_step: self.step_count,
            agent: agent.name().to_string(),
            request: self.request.clone(),
            application: window.root_name().to_string(),
            observation,
            thought,
            action: Some(action),
            plan,
            comment,
            results: outcome.results,
            status: Some(status),
            cost,
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
        });

        self.cost += cost;
        self.step_count += 1;
        self.status = status;
        Ok(cost)
    }

    fn retrieve_examples(&self) -> Vec<String> {
        let top_k = self.config.app_agent.experience_top_k;
        if top_k == 0 {
            return Vec::new();
        }
        let db = self.config.experience.saved_path.join(EXPERIENCE_DB);
        if !ExperienceIndex::exists(&db) {
            return Vec::new();
        }
        match ExperienceIndex::load(&db) {
            Ok(index) => {
                let examples: Vec<String> = index
                    .search(&self.request, top_k)
                    .into_iter()
                    .map(|hit| hit.summary.as_example())
                    .collect();
                debug!("Retrieved {} experience examples", examples.len());
                examples
            }
            Err(e) => {
                warn!("Failed to load experience index {}: {}", db.display(), e);
                Vec::new()
            }
        }
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn global_step(&self) -> usize {
        self.global_step
    }

    pub fn request(&self) -> &str {
        &self.request
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn application_window(&self) -> Option<&AppWindow> {
        self.application_window.as_ref()
    }

    pub fn app_agent(&self) -> Option<&AppAgent> {
        self.app_agent.as_ref()
    }

    pub fn examples(&self) -> &[String] {
        &self.examples
    }

    /// Phases completed in this round
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }
}

fn screenshot_of(capture: &UiCapture, visual_mode: bool) -> Vec<std::path::PathBuf> {
    if visual_mode {
        capture.screenshot.iter().cloned().collect()
    } else {
        Vec::new()
    }
}

/// The single window a choice refers to; none when missing or ambiguous
fn resolve_window(windows: &[AppWindow], choice: &str) -> Option<AppWindow> {
    let matches: Vec<&AppWindow> = windows.iter().filter(|w| w.matches(choice)).collect();
    match matches.as_slice() {
        [window] => Some((*window).clone()),
        [] => {
            warn!("No open window matches '{}'", choice);
            None
        }
        _ => {
            warn!("'{}' matches {} windows", choice, matches.len());
            None
        }
    }
}

fn completion_status(
    signal: AgentSignal,
    action: &Action,
    terminal_actions: &[String],
    step_limit_hit: bool,
) -> Status {
    match signal {
        AgentSignal::Finish => Status::Finish,
        AgentSignal::Abandon => Status::NeedsNewRound,
        AgentSignal::Fail => Status::Error,
        AgentSignal::Continue if action.is_terminal(terminal_actions) => Status::Finish,
        AgentSignal::Continue if step_limit_hit => Status::MaxStepReached,
        AgentSignal::Continue => Status::Continue,
    }
}
