//! Session - the run of one task across any number of rounds
//!
//! The session owns the host agent, the log files and the list of rounds.
//! Each call to [`Session::handle`] looks up the behaviour for the current
//! [`Status`] and runs exactly one unit of work: a phase of the current
//! round, or the start of the next round.
//!
//! Step and cost are only touched when a phase completes. A collaborator
//! failure (capture, decision, execution, input) is returned from `handle`
//! with the session status, step and cost left as they were, so the same
//! call can be retried.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::action::ActionExecutor;
use crate::agent::{Brains, HostAgent};
use crate::capture::{AppWindow, CaptureFactory};
use crate::config::Config;
use crate::cost::Cost;
use crate::error::{Error, Result};
use crate::experience::{ExperienceFile, ExperienceIndex, ExperienceSummarizer, EXPERIENCE_DB, EXPERIENCE_FILE};
use crate::interactor::{is_stop_request, Interactor, Notice};
use crate::logging::SessionLogs;
use crate::round::Round;
use crate::state::{StateMapper, Tick};
use crate::status::Status;

/// Collaborators a session works with
pub struct SessionDeps {
    pub brains: Brains,
    pub executor: Arc<dyn ActionExecutor>,
    pub capture_factory: CaptureFactory,
    pub interactor: Box<dyn Interactor>,
    pub summarizer: Arc<dyn ExperienceSummarizer>,
}

pub struct Session {
    id: String,
    task: String,
    config: Arc<Config>,
    status: Status,
    round_num: usize,
    step: usize,
    cost: Cost,
    rounds: Vec<Round>,
    request: String,
    application_window: Option<AppWindow>,
    application: String,
    app_root: String,
    host: HostAgent,
    logs: Arc<SessionLogs>,
    mapper: StateMapper,
    brains: Brains,
    executor: Arc<dyn ActionExecutor>,
    capture_factory: CaptureFactory,
    interactor: Box<dyn Interactor>,
    summarizer: Arc<dyn ExperienceSummarizer>,
}

impl Session {
    /// Open the task logs, ask for the first request and create round 0
    ///
    /// A log directory that cannot be created is a configuration error.
    /// Answering the first prompt with the stop request completes the
    /// session without any round.
    pub fn new(task: impl Into<String>, config: Arc<Config>, deps: SessionDeps) -> Result<Self> {
        let task = task.into();
        let log_dir = config.task_log_dir(&task);
        let logs = SessionLogs::create(&log_dir).map_err(|e| {
            Error::Config(format!("Cannot open logs in {}: {}", log_dir.display(), e))
        })?;

        let SessionDeps {
            brains,
            executor,
            capture_factory,
            mut interactor,
            summarizer,
        } = deps;
        let request = interactor.first_request()?;

        let mut session = Self {
            id: uuid::Uuid::new_v4().to_string(),
            task,
            host: HostAgent::new(config.host_agent.name.clone()),
            config,
            status: Status::AppSelection,
            round_num: 0,
            step: 0,
            cost: Cost::ZERO,
            rounds: Vec::new(),
            request: String::new(),
            application_window: None,
            application: String::new(),
            app_root: String::new(),
            logs: Arc::new(logs),
            mapper: StateMapper::standard(),
            brains,
            executor,
            capture_factory,
            interactor,
            summarizer,
        };
        info!("Starting session {} for task {}", session.id, session.task);

        if is_stop_request(&request) {
            session.status = Status::Complete;
        } else {
            session.push_round(request);
        }
        Ok(session)
    }

    /// Replace the status-to-behaviour table
    pub fn with_mapper(mut self, mapper: StateMapper) -> Self {
        self.mapper = mapper;
        self
    }

    /// Run the behaviour of the current status once
    pub async fn handle(&mut self) -> Result<Tick> {
        let state = self.mapper.resolve(self.status)?;
        debug!("Session {} step {}: {}", self.task, self.step, state.name());
        state.handle(self).await
    }

    /// Drive the session until it stops, then save experience and report cost
    pub async fn run(&mut self) -> Result<Status> {
        while self.handle().await? == Tick::Running {}

        let saved = self.save_experience().await;

        self.report_cost();
        if let Err(e) = self.logs.flush() {
            warn!("Failed to flush session logs: {}", e);
        }
        saved?;
        Ok(self.status)
    }

    async fn save_experience(&mut self) -> Result<()> {
        if self.status != Status::Complete || self.rounds.is_empty() {
            return Ok(());
        }
        let save = self.config.experience.auto_save || self.interactor.confirm_experience_save()?;
        if save {
            let saved = self.persist_experience().await?;
            self.interactor
                .notify(&format!("Saved {} experience entries", saved), Notice::Info);
        }
        Ok(())
    }

    /// Close the current round and ask for the next request
    pub fn start_new_round(&mut self) -> Result<()> {
        let request = self.interactor.new_request()?;

        if let Some(round) = self.rounds.last() {
            self.host.add_request_memory(round.request());
        }
        self.round_num += 1;

        if is_stop_request(&request) {
            info!("Session {} complete after {} rounds", self.task, self.rounds.len());
            self.status = Status::Complete;
        } else {
            self.push_round(request);
            self.status = Status::AppSelection;
        }
        Ok(())
    }

    fn push_round(&mut self, request: String) {
        let mut round = Round::new(
            self.task.clone(),
            self.logs.clone(),
            (self.capture_factory)(),
            request.clone(),
            self.config.clone(),
        );
        round.set_session_id(&self.id);
        round.set_index(self.round_num);
        round.set_global_step(self.step);
        debug!("Round {}: {}", self.round_num, request);
        self.rounds.push(round);
        self.request = request;
    }

    /// Application selection in the current round
    pub async fn run_context_selection_phase(&mut self) -> Result<()> {
        let step = self.step;
        let round = self
            .rounds
            .last_mut()
            .ok_or_else(|| Error::Session("No round to select an application for".to_string()))?;
        round.set_global_step(step);

        let cost = round.process_application_selection(&mut self.host, &self.brains).await?;

        self.status = round.status();
        self.application_window = round.application_window().cloned();
        match &self.application_window {
            Some(window) => {
                self.application = window.process_name.clone();
                self.app_root = window.root_name().to_string();
            }
            None => {
                self.application.clear();
                self.app_root.clear();
                self.interactor.notify(
                    "No suitable application was found for this request.",
                    Notice::Warning,
                );
            }
        }
        self.step += 1;
        self.add_cost(cost);
        Ok(())
    }

    /// One action in the current round
    pub async fn run_action_phase(&mut self) -> Result<()> {
        let step = self.step;
        let round = self
            .rounds
            .last_mut()
            .ok_or_else(|| Error::Session("No round to act in".to_string()))?;
        round.set_global_step(step);
        let steps_before = round.step_count();

        let cost = round
            .process_action_selection(&mut self.host, &self.brains, self.executor.as_ref())
            .await?;

        self.status = round.status();
        if round.step_count() > steps_before {
            self.step += 1;
            self.add_cost(cost);
        }
        Ok(())
    }

    fn add_cost(&mut self, delta: Cost) {
        let was_known = self.cost.is_known();
        self.cost += delta;
        if was_known && !self.cost.is_known() {
            warn!(
                "Cost of session {} became unknown at step {}; cost will not be reported",
                self.task, self.step
            );
        }
    }

    /// Summarise the task logs and merge them into the experience stores
    ///
    /// Only valid once the session is `Complete`. Returns the number of
    /// summaries written.
    pub async fn persist_experience(&mut self) -> Result<usize> {
        if self.status != Status::Complete {
            return Err(Error::Session(format!(
                "Experience can only be saved from a complete session, not {}",
                self.status
            )));
        }
        self.logs.flush()?;

        let records = self.summarizer.read_logs(self.logs.dir())?;
        let (summaries, cost) = self.summarizer.get_summary_list(&records).await?;

        let dir = &self.config.experience.saved_path;
        std::fs::create_dir_all(dir)?;
        ExperienceFile::create_or_update(&summaries, &dir.join(EXPERIENCE_FILE))?;
        ExperienceIndex::create_or_update(&summaries, &dir.join(EXPERIENCE_DB))?;

        info!("Saved {} experiences to {}", summaries.len(), dir.display());
        self.add_cost(cost);
        Ok(summaries.len())
    }

    /// Cost as "$x.yy", if it is known
    pub fn formatted_cost(&self) -> Option<String> {
        self.cost.is_known().then(|| self.cost.to_string())
    }

    /// Show the total cost; silent when the cost is unknown
    pub fn report_cost(&mut self) {
        if let Some(cost) = self.formatted_cost() {
            info!("Session {} cost {}", self.task, cost);
            self.interactor
                .notify(&format!("Request total cost is {}", cost), Notice::Cost);
        }
    }

    /// Pass a message on to the user
    pub fn notify(&mut self, message: &str, notice: Notice) {
        self.interactor.notify(message, notice);
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_session_terminal()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn round_num(&self) -> usize {
        self.round_num
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    /// The last round, once one exists
    pub fn current_round(&self) -> Option<&Round> {
        self.rounds.last()
    }

    pub fn request(&self) -> &str {
        &self.request
    }

    /// Results of the latest action, or empty
    pub fn results(&self) -> &str {
        self.host
            .global_action_memory()
            .last()
            .map(|item| item.results.as_str())
            .unwrap_or("")
    }

    pub fn application_window(&self) -> Option<&AppWindow> {
        self.application_window.as_ref()
    }

    /// Process name of the selected application
    pub fn application(&self) -> &str {
        &self.application
    }

    pub fn app_root(&self) -> &str {
        &self.app_root
    }

    pub fn host(&self) -> &HostAgent {
        &self.host
    }

    pub fn log_dir(&self) -> &Path {
        self.logs.dir()
    }
}
