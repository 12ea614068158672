//! Deskpilot Core - session rounds for multi-agent desktop automation
//!
//! This crate provides the core of the Deskpilot workflow:
//! - A session state machine driven by a status-to-behaviour table
//! - Rounds handing off from the host agent (application selection) to an
//!   app agent (one action per step)
//! - Step and cost accounting with an explicit unknown cost
//! - JSON-lines request/response logs per task
//! - Experience summaries saved to YAML and a searchable index
//!
//! Decision making, UI capture and action execution are supplied by the
//! caller through the [`Brain`], [`StateCapture`] and [`ActionExecutor`]
//! traits.

pub mod action;
pub mod agent;
pub mod capture;
pub mod config;
pub mod cost;
pub mod error;
pub mod experience;
pub mod interactor;
pub mod logging;
pub mod round;
pub mod session;
pub mod state;
pub mod status;

pub use action::{Action, ActionExecutor, ActionOutcome};
pub use agent::{
    Agent, AgentSignal, AppAgent, AppDecision, Brain, Brains, Decision, DecisionRequest, HostAgent,
    HostDecision, Memory, MemoryItem,
};
pub use capture::{AppWindow, CaptureFactory, StateCapture, UiCapture};
pub use config::{Config, ConfigManager};
pub use cost::Cost;
pub use error::{Error, Result};
pub use interactor::{is_stop_request, Interactor, Notice};
pub use logging::SessionLogs;
pub use round::Round;
pub use session::{Session, SessionDeps};
pub use state::{State, StateMapper, Tick};
pub use status::Status;

// Experience exports
pub use experience::{
    ExperienceFile, ExperienceIndex, ExperienceSummarizer, ExperienceSummary, LogRecord,
    RecordSummarizer,
};
