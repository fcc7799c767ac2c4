use serde::{Deserialize, Serialize};

/// A learned planner example: a goal paired with the action list a client
/// confirmed achieves it. Injected into the Planner's few-shot slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Example {
    pub goal: String,
    pub actions: Vec<String>,
}
