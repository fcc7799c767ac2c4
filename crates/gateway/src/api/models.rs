//! Request and response bodies. Every body carries an `api_version` field
//! defaulting to `"v1"`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use nv_a11y::Platform;
use nv_agents::RetrievedValue;
use nv_domain::tool::ToolCall;
use nv_domain::usage::TokenUsage;

pub fn v1() -> String {
    "v1".into()
}

fn default_true() -> bool {
    true
}

// ── Sessions ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    #[serde(default = "v1")]
    pub api_version: String,
    pub provider: String,
    #[serde(default)]
    pub name: Option<String>,
    pub platform: Platform,
    pub tools: Vec<Value>,
    #[serde(default = "default_true")]
    pub planner: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub api_version: String,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub api_version: String,
    pub total: TokenUsage,
    pub cache: TokenUsage,
}

// ── Planning / acting ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    #[serde(default = "v1")]
    pub api_version: String,
    pub goal: String,
    pub accessibility_tree: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub api_version: String,
    pub explanation: String,
    pub steps: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct StepRequest {
    #[serde(default = "v1")]
    pub api_version: String,
    pub goal: String,
    pub step: String,
    pub accessibility_tree: String,
}

#[derive(Debug, Serialize)]
pub struct StepResponse {
    pub api_version: String,
    pub explanation: String,
    pub actions: Vec<ToolCall>,
}

// ── Retrieval ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatementRequest {
    #[serde(default = "v1")]
    pub api_version: String,
    pub statement: String,
    pub accessibility_tree: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Base64-encoded PNG.
    #[serde(default)]
    pub screenshot: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatementResponse {
    pub api_version: String,
    pub result: RetrievedValue,
    pub explanation: String,
}

// ── Areas / elements ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AreaRequest {
    #[serde(default = "v1")]
    pub api_version: String,
    pub description: String,
    pub accessibility_tree: String,
}

#[derive(Debug, Serialize)]
pub struct AreaResponse {
    pub api_version: String,
    /// Raw driver id of the area root.
    pub id: Value,
    pub explanation: String,
}

#[derive(Debug, Deserialize)]
pub struct FindRequest {
    #[serde(default = "v1")]
    pub api_version: String,
    pub description: String,
    pub accessibility_tree: String,
}

#[derive(Debug, Serialize)]
pub struct FoundElement {
    /// Raw driver id.
    pub id: Value,
    pub explanation: String,
}

#[derive(Debug, Serialize)]
pub struct FindResponse {
    pub api_version: String,
    pub elements: Vec<FoundElement>,
}

// ── Changes ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChangeState {
    pub accessibility_tree: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangesRequest {
    #[serde(default = "v1")]
    pub api_version: String,
    pub before: ChangeState,
    pub after: ChangeState,
}

#[derive(Debug, Serialize)]
pub struct ChangesResponse {
    pub api_version: String,
    pub result: String,
}

// ── Examples / caches ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AddExampleRequest {
    #[serde(default = "v1")]
    pub api_version: String,
    pub goal: String,
    pub actions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub api_version: String,
    pub success: bool,
    pub message: String,
}

impl StatusResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            api_version: v1(),
            success: true,
            message: message.into(),
        }
    }
}
