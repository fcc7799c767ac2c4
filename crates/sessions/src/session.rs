//! A client session: one model binding, one cache, one instance of each
//! agent, and the mutable per-session state (examples, counters).

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use nv_a11y::{AccessibilityTree, Platform};
use nv_agents::{
    ActorAgent, AreaAgent, ChangesAnalyzerAgent, LocatorAgent, PlannerAgent, RetrieverAgent,
};
use nv_domain::error::Result;
use nv_domain::example::Example;
use nv_domain::model::Model;
use nv_domain::tool::ToolDefinition;
use nv_domain::usage::TokenUsage;
use nv_providers::{ChatProvider, Llm, ResponseCache};

/// Everything needed to construct a session.
pub struct SessionConfig {
    pub model: Model,
    pub platform: Platform,
    pub tools: Vec<ToolDefinition>,
    /// When false the Planner is bypassed and the goal passes through as a
    /// single step.
    pub planner: bool,
    /// Directory for the cache backing file; `None` keeps it in memory.
    pub cache_dir: Option<PathBuf>,
    pub prompt_dir: Option<PathBuf>,
    /// Explicit provider implementation (tests, embedders). `None` builds
    /// the adapter for `model` from the environment.
    pub provider: Option<Arc<dyn ChatProvider>>,
}

/// Token statistics for one session (or an aggregate over sessions).
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SessionStats {
    /// Combined usage of all agents.
    pub total: TokenUsage,
    /// Tokens saved by cache hits.
    pub cache: TokenUsage,
}

impl SessionStats {
    pub fn add(&mut self, other: &SessionStats) {
        self.total.add(&other.total);
        self.cache.add(&other.cache);
    }
}

pub struct Session {
    id: String,
    model: Model,
    platform: Platform,
    planner_enabled: bool,
    cache: Arc<ResponseCache>,

    pub planner: PlannerAgent,
    pub actor: ActorAgent,
    pub retriever: RetrieverAgent,
    pub area: AreaAgent,
    pub locator: LocatorAgent,
    pub changes_analyzer: ChangesAnalyzerAgent,

    examples: Mutex<Vec<Example>>,
    /// Serializes multi-step pipelines within the session. Requests for
    /// different sessions never contend on it.
    pipeline: tokio::sync::Mutex<()>,
}

impl Session {
    pub fn new(id: String, config: SessionConfig) -> Result<Self> {
        let cache = Arc::new(match &config.cache_dir {
            Some(dir) => ResponseCache::with_backing_file(dir.join(format!("{id}.json"))),
            None => ResponseCache::in_memory(),
        });

        // All agents share one handle, so every call goes through the same
        // cache and the same provider binding.
        let llm = Arc::new(match config.provider {
            Some(provider) => Llm::with_provider(config.model.clone(), provider, cache.clone()),
            None => Llm::new(config.model.clone(), cache.clone())?,
        });

        let prompt_dir = config.prompt_dir.as_deref();
        let planner = PlannerAgent::new(llm.clone(), &config.tools, prompt_dir);
        let actor = ActorAgent::new(llm.clone(), config.tools, prompt_dir);
        let retriever = RetrieverAgent::new(llm.clone(), prompt_dir);
        let area = AreaAgent::new(llm.clone(), prompt_dir);
        let locator = LocatorAgent::new(llm.clone(), prompt_dir);
        let changes_analyzer = ChangesAnalyzerAgent::new(llm.clone(), prompt_dir);

        tracing::info!(
            session_id = %id,
            model = %config.model.label(),
            platform = %config.platform,
            "created session"
        );

        Ok(Self {
            id,
            model: config.model,
            platform: config.platform,
            planner_enabled: config.planner,
            cache,
            planner,
            actor,
            retriever,
            area,
            locator,
            changes_analyzer,
            examples: Mutex::new(Vec::new()),
            pipeline: tokio::sync::Mutex::new(()),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn planner_enabled(&self) -> bool {
        self.planner_enabled
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Parse a raw platform tree dump into a request-scoped processed tree.
    pub fn process_tree(&self, raw: &str) -> Result<AccessibilityTree> {
        let tree = AccessibilityTree::parse(self.platform, raw)?;
        tracing::debug!(session_id = %self.id, elements = tree.len(), "processed tree");
        Ok(tree)
    }

    /// Exclusive access for the duration of one request pipeline.
    pub async fn lock_pipeline(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.pipeline.lock().await
    }

    pub fn add_example(&self, example: Example) {
        self.examples.lock().push(example);
    }

    pub fn clear_examples(&self) {
        self.examples.lock().clear();
    }

    pub fn examples(&self) -> Vec<Example> {
        self.examples.lock().clone()
    }

    pub fn stats(&self) -> SessionStats {
        let mut total = TokenUsage::default();
        total.add(&self.planner.usage());
        total.add(&self.actor.usage());
        total.add(&self.retriever.usage());
        total.add(&self.area.usage());
        total.add(&self.locator.usage());
        total.add(&self.changes_analyzer.usage());
        SessionStats {
            total,
            cache: self.cache.usage(),
        }
    }
}
