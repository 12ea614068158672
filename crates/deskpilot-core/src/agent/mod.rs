//! Agent system for Deskpilot
//!
//! Agents turn the current request and UI state into a structured decision.
//! The [`HostAgent`] picks which application a request should run in; the
//! [`AppAgent`] then chooses one action at a time inside that application.
//! The reasoning itself is delegated to a [`Brain`], an external decision
//! service that only has to honour the request/decision shapes defined here.

pub mod app_agent;
pub mod host_agent;
pub mod memory;

pub use app_agent::{AppAgent, AppDecision};
pub use host_agent::{HostAgent, HostDecision};
pub use memory::{Memory, MemoryItem};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cost::Cost;
use crate::error::Result;

/// Core trait for all agents
pub trait Agent: Send + Sync {
    /// Unique identifier for this agent
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Description of agent's capabilities
    fn description(&self) -> &str;

    /// Steps this agent has recorded
    fn memory(&self) -> &Memory;
}

/// Everything a decision service is given for one decision
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub request: String,
    pub current_state: Value,
    pub state_diff: Value,
    /// Requests finished in earlier rounds
    pub request_history: Vec<String>,
    pub action_history: Vec<Value>,
    pub plan: Vec<String>,
    /// Controls or windows the decision may refer to
    pub control_info: Value,
    pub images: Vec<PathBuf>,
    pub include_last_screenshot: bool,
    /// Retrieved past experiences
    pub examples: Vec<String>,
    /// Extra instructions about the application (follower mode)
    pub app_info: Option<String>,
}

/// A decision plus what it cost to make
#[derive(Debug, Clone)]
pub struct Decision<D> {
    pub content: D,
    pub cost: Cost,
}

impl<D> Decision<D> {
    pub fn new(content: D, cost: Cost) -> Self {
        Self { content, cost }
    }

    /// A decision that reported no cost
    pub fn free(content: D) -> Self {
        Self::new(content, Cost::ZERO)
    }
}

/// How the agent judges the request after its decision
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentSignal {
    /// More steps are needed
    #[default]
    Continue,
    /// The request is fulfilled
    Finish,
    /// The request cannot be completed in this application
    Abandon,
    /// Unrecoverable failure
    Fail,
}

/// External decision procedure producing decisions of shape `D`
#[async_trait]
pub trait Brain<D>: Send + Sync {
    async fn decide(&self, request: &DecisionRequest) -> Result<Decision<D>>;
}

/// Decision services shared by every round of a session
#[derive(Clone)]
pub struct Brains {
    pub host: Arc<dyn Brain<HostDecision>>,
    pub app: Arc<dyn Brain<AppDecision>>,
}
