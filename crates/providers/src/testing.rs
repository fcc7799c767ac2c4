//! Deterministic provider for tests: returns canned responses in order and
//! counts calls.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use nv_domain::error::Result;
use nv_domain::usage::TokenUsage;

use crate::traits::{ChatProvider, ChatRequest, LlmResponse};

pub struct MockProvider {
    responses: Mutex<VecDeque<LlmResponse>>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue a response; responses are served in push order. When the
    /// queue is empty a plain "ok" response with small usage is returned.
    pub fn push(&self, response: LlmResponse) {
        self.responses.lock().push_back(response);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    async fn chat(&self, _req: &ChatRequest) -> Result<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.responses.lock().pop_front().unwrap_or(LlmResponse {
            content: "ok".into(),
            usage: TokenUsage::new(10, 5),
            ..Default::default()
        }))
    }

    fn id(&self) -> &str {
        "mock"
    }
}
