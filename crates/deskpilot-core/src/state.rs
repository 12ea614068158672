//! State behaviours driving a session
//!
//! Each [`Status`] maps to one [`State`] whose `handle` performs exactly one
//! unit of work on the session: run the application selection phase, run an
//! action phase, start a new round, or report that the session is done. The
//! session itself never branches on its status; it asks the [`StateMapper`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::interactor::Notice;
use crate::session::Session;
use crate::status::Status;

/// Whether the control loop should keep calling `handle`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Running,
    Done,
}

/// Behaviour run for one status
#[async_trait]
pub trait State: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(&self, session: &mut Session) -> Result<Tick>;
}

/// Ask the host agent which application to use
pub struct AppSelectionState;

#[async_trait]
impl State for AppSelectionState {
    fn name(&self) -> &str {
        "app_selection"
    }

    async fn handle(&self, session: &mut Session) -> Result<Tick> {
        session.run_context_selection_phase().await?;
        Ok(Tick::Running)
    }
}

/// Let the app agent take its next action
pub struct ContinueState;

#[async_trait]
impl State for ContinueState {
    fn name(&self) -> &str {
        "continue"
    }

    async fn handle(&self, session: &mut Session) -> Result<Tick> {
        session.run_action_phase().await?;
        Ok(Tick::Running)
    }
}

/// The round completed its request; ask for the next one
pub struct FinishState;

#[async_trait]
impl State for FinishState {
    fn name(&self) -> &str {
        "finish"
    }

    async fn handle(&self, session: &mut Session) -> Result<Tick> {
        info!("Round {} finished", session.round_num());
        session.start_new_round()?;
        Ok(Tick::Running)
    }
}

/// The round gave up; ask the user for a new request
pub struct NeedsNewRoundState;

#[async_trait]
impl State for NeedsNewRoundState {
    fn name(&self) -> &str {
        "needs_new_round"
    }

    async fn handle(&self, session: &mut Session) -> Result<Tick> {
        info!("Round {} needs a new request", session.round_num());
        session.start_new_round()?;
        Ok(Tick::Running)
    }
}

pub struct CompleteState;

#[async_trait]
impl State for CompleteState {
    fn name(&self) -> &str {
        "complete"
    }

    async fn handle(&self, session: &mut Session) -> Result<Tick> {
        debug!("Session {} complete", session.task());
        Ok(Tick::Done)
    }
}

pub struct ErrorState;

#[async_trait]
impl State for ErrorState {
    fn name(&self) -> &str {
        "error"
    }

    async fn handle(&self, session: &mut Session) -> Result<Tick> {
        warn!("Session {} stopped on error at step {}", session.task(), session.step());
        session.notify("The agent could not complete the request.", Notice::Warning);
        Ok(Tick::Done)
    }
}

pub struct MaxStepState;

#[async_trait]
impl State for MaxStepState {
    fn name(&self) -> &str {
        "max_step"
    }

    async fn handle(&self, session: &mut Session) -> Result<Tick> {
        warn!("Session {} reached the step limit ({})", session.task(), session.step());
        session.notify("The maximum number of steps has been reached.", Notice::Warning);
        Ok(Tick::Done)
    }
}

/// Table from status to behaviour
#[derive(Clone, Default)]
pub struct StateMapper {
    states: HashMap<Status, Arc<dyn State>>,
}

impl StateMapper {
    /// An empty table; every lookup fails until states are registered
    pub fn new() -> Self {
        Self::default()
    }

    /// The table with a behaviour for every status
    pub fn standard() -> Self {
        Self::new()
            .with_state(Status::AppSelection, Arc::new(AppSelectionState))
            .with_state(Status::Continue, Arc::new(ContinueState))
            .with_state(Status::Finish, Arc::new(FinishState))
            .with_state(Status::NeedsNewRound, Arc::new(NeedsNewRoundState))
            .with_state(Status::Complete, Arc::new(CompleteState))
            .with_state(Status::Error, Arc::new(ErrorState))
            .with_state(Status::MaxStepReached, Arc::new(MaxStepState))
    }

    /// Register or replace the behaviour for a status
    pub fn with_state(mut self, status: Status, state: Arc<dyn State>) -> Self {
        self.states.insert(status, state);
        self
    }

    pub fn resolve(&self, status: Status) -> Result<Arc<dyn State>> {
        self.states
            .get(&status)
            .cloned()
            .ok_or_else(|| Error::UnknownStatus(status.to_string()))
    }

    /// Resolve a status given by name, e.g. "CONTINUE"
    pub fn resolve_name(&self, name: &str) -> Result<Arc<dyn State>> {
        self.resolve(name.parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_covers_every_status() {
        let mapper = StateMapper::standard();
        for status in Status::ALL {
            assert!(mapper.resolve(status).is_ok(), "no state for {}", status);
        }
        assert_eq!(mapper.resolve(Status::Continue).unwrap().name(), "continue");
        assert_eq!(mapper.resolve_name("max_step_reached").unwrap().name(), "max_step");
    }

    #[test]
    fn test_unknown_name_fails() {
        let err = StateMapper::standard().resolve_name("PAUSED").err().unwrap();
        assert!(matches!(err, Error::UnknownStatus(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_missing_registration_fails() {
        let mapper = StateMapper::new().with_state(Status::Complete, Arc::new(CompleteState));
        assert!(mapper.resolve(Status::Complete).is_ok());
        assert!(matches!(
            mapper.resolve(Status::Continue),
            Err(Error::UnknownStatus(ref s)) if s == "CONTINUE"
        ));
    }
}
