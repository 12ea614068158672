//! Step memory kept by agents

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::Action;
use crate::cost::Cost;
use crate::status::Status;

/// Record of one executed step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MemoryItem {
    pub step: usize,
    pub round: usize,
    pub round_step: usize,
    pub agent: String,
    pub application: String,
    pub request: String,
    pub thought: String,
    pub action: Action,
    pub comment: String,
    pub results: String,
    pub status: Status,
    pub cost: Cost,
}

impl MemoryItem {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Ordered, append-only list of steps
#[derive(Debug, Clone, Default)]
pub struct Memory {
    items: Vec<MemoryItem>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: MemoryItem) {
        self.items.push(item);
    }

    pub fn content(&self) -> &[MemoryItem] {
        &self.items
    }

    pub fn last(&self) -> Option<&MemoryItem> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Steps as JSON values, the shape decision requests carry
    pub fn to_values(&self) -> Vec<Value> {
        self.items.iter().map(MemoryItem::to_value).collect()
    }
}
