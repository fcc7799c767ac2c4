//! The cached LLM handle shared by every agent in a session.

use std::sync::Arc;

use nv_domain::error::Result;
use nv_domain::model::Model;

use crate::cache::{fingerprint, ResponseCache};
use crate::factory;
use crate::retry;
use crate::traits::{ChatProvider, ChatRequest, LlmResponse};

/// One model binding: adapter + cache. All agents inside a session share a
/// single handle, so every call participates in the same cache and token
/// accounting.
pub struct Llm {
    model: Model,
    provider: Arc<dyn ChatProvider>,
    cache: Arc<ResponseCache>,
}

impl Llm {
    /// Build the provider adapter for `model` and bind it to `cache`.
    /// API keys are resolved eagerly here.
    pub fn new(model: Model, cache: Arc<ResponseCache>) -> Result<Self> {
        let provider = factory::build_provider(&model)?;
        Ok(Self {
            model,
            provider,
            cache,
        })
    }

    /// Bind an explicit provider implementation (tests, embedders).
    pub fn with_provider(
        model: Model,
        provider: Arc<dyn ChatProvider>,
        cache: Arc<ResponseCache>,
    ) -> Self {
        Self {
            model,
            provider,
            cache,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Single entry point for all agent calls: cache lookup, then a
    /// retrying provider call, then store.
    pub async fn invoke(&self, req: &ChatRequest) -> Result<LlmResponse> {
        let key = fingerprint(&self.model, req);
        if let Some(hit) = self.cache.lookup(&key) {
            tracing::debug!(model = %self.model.label(), "response served from cache");
            return Ok(hit);
        }

        let response = retry::with_retry(|| self.provider.chat(req)).await?;
        self.cache.store(key, &response);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nv_domain::chat::Message;
    use nv_domain::model::Provider;
    use nv_domain::usage::TokenUsage;

    use crate::testing::MockProvider;

    fn handle(mock: Arc<MockProvider>) -> Llm {
        Llm::with_provider(
            Model::new(Provider::Anthropic, None),
            mock,
            Arc::new(ResponseCache::in_memory()),
        )
    }

    #[tokio::test]
    async fn identical_requests_hit_the_cache() {
        let mock = Arc::new(MockProvider::new());
        mock.push(LlmResponse {
            content: "answer".into(),
            usage: TokenUsage::new(50, 10),
            ..Default::default()
        });
        let llm = handle(mock.clone());

        let req = ChatRequest {
            messages: vec![Message::user("question")],
            ..Default::default()
        };

        let first = llm.invoke(&req).await.unwrap();
        assert_eq!(first.usage.total_tokens, 60);

        let second = llm.invoke(&req).await.unwrap();
        assert_eq!(second.content, "answer");
        // The hit substitutes for a call: no provider invocation, zero
        // usage on the response, the saved tokens in the cache tally.
        assert!(second.usage.is_zero());
        assert_eq!(mock.call_count(), 1);
        assert_eq!(llm.cache().usage(), TokenUsage::new(50, 10));
    }

    #[tokio::test]
    async fn different_requests_miss() {
        let mock = Arc::new(MockProvider::new());
        let llm = handle(mock.clone());

        let first = ChatRequest {
            messages: vec![Message::user("one")],
            ..Default::default()
        };
        let second = ChatRequest {
            messages: vec![Message::user("two")],
            ..Default::default()
        };
        llm.invoke(&first).await.unwrap();
        llm.invoke(&second).await.unwrap();
        assert_eq!(mock.call_count(), 2);
    }
}
