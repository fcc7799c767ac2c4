//! Per-session response cache.
//!
//! Deterministic lookup keyed by a stable hash of the full request
//! fingerprint. A hit substitutes for a model call: the stored response is
//! returned with its usage zeroed, and the tokens the call *would* have
//! spent roll into the cache's own tally instead of the agent totals.
//!
//! Entries live in two generations: entries loaded from (or already flushed
//! to) the backing file, and uncommitted entries added since. `save()`
//! commits and flushes; `discard()` drops the uncommitted generation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use nv_domain::error::Result;
use nv_domain::model::Model;
use nv_domain::usage::TokenUsage;

use crate::traits::{ChatRequest, LlmResponse};

/// Stable cache key for a request against a specific model.
pub fn fingerprint(model: &Model, req: &ChatRequest) -> String {
    let mut hasher = Sha256::new();
    hasher.update(model.label().as_bytes());
    hasher.update([0]);
    // ChatRequest serialization covers messages, tool schemas and the
    // structured-output schema, so any change produces a new key.
    if let Ok(body) = serde_json::to_vec(req) {
        hasher.update(&body);
    }
    hex::encode(hasher.finalize())
}

pub struct ResponseCache {
    /// Backing file; `None` keeps the cache purely in memory.
    path: Option<PathBuf>,
    committed: Mutex<HashMap<String, LlmResponse>>,
    pending: Mutex<HashMap<String, LlmResponse>>,
    usage: Mutex<TokenUsage>,
}

impl ResponseCache {
    /// In-memory cache with no backing store.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            committed: Mutex::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
            usage: Mutex::new(TokenUsage::default()),
        }
    }

    /// Cache backed by a JSON file. Existing entries are loaded as the
    /// committed generation; an unreadable file starts the cache empty.
    pub fn with_backing_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let committed = load_entries(&path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "could not load cache backing file");
            HashMap::new()
        });
        Self {
            path: Some(path),
            committed: Mutex::new(committed),
            pending: Mutex::new(HashMap::new()),
            usage: Mutex::new(TokenUsage::default()),
        }
    }

    /// Look up a response. On a hit the recorded token counts are added to
    /// the cache tally and the returned copy carries zero usage, so agent
    /// totals do not move.
    pub fn lookup(&self, key: &str) -> Option<LlmResponse> {
        let found = self
            .pending
            .lock()
            .get(key)
            .cloned()
            .or_else(|| self.committed.lock().get(key).cloned())?;
        self.usage.lock().add(&found.usage);
        Some(LlmResponse {
            usage: TokenUsage::default(),
            ..found
        })
    }

    /// Record a fresh response in the uncommitted generation.
    pub fn store(&self, key: String, response: &LlmResponse) {
        self.pending.lock().insert(key, response.clone());
    }

    /// Tokens saved by cache hits so far.
    pub fn usage(&self) -> TokenUsage {
        *self.usage.lock()
    }

    /// Commit uncommitted entries and flush everything to the backing
    /// file, when one is configured.
    pub fn save(&self) -> Result<()> {
        let mut committed = self.committed.lock();
        for (key, response) in self.pending.lock().drain() {
            committed.insert(key, response);
        }
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let body = serde_json::to_vec_pretty(&*committed)?;
            std::fs::write(path, body)?;
        }
        Ok(())
    }

    /// Drop uncommitted entries.
    pub fn discard(&self) {
        self.pending.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.committed.lock().len() + self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn load_entries(path: &Path) -> Result<HashMap<String, LlmResponse>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let body = std::fs::read(path)?;
    Ok(serde_json::from_slice(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nv_domain::model::Provider;

    fn request(text: &str) -> ChatRequest {
        ChatRequest {
            messages: vec![nv_domain::chat::Message::user(text)],
            ..Default::default()
        }
    }

    fn response(input: u64, output: u64) -> LlmResponse {
        LlmResponse {
            content: "hello".into(),
            usage: TokenUsage::new(input, output),
            ..Default::default()
        }
    }

    #[test]
    fn fingerprint_is_stable_and_request_sensitive() {
        let model = Model::new(Provider::Anthropic, None);
        let a = fingerprint(&model, &request("one"));
        assert_eq!(a, fingerprint(&model, &request("one")));
        assert_ne!(a, fingerprint(&model, &request("two")));
        let other_model = Model::new(Provider::Openai, None);
        assert_ne!(a, fingerprint(&other_model, &request("one")));
    }

    #[test]
    fn hit_zeroes_usage_and_rolls_into_cache_tally() {
        let cache = ResponseCache::in_memory();
        cache.store("k".into(), &response(100, 20));

        let hit = cache.lookup("k").unwrap();
        assert!(hit.usage.is_zero());
        assert_eq!(hit.content, "hello");
        assert_eq!(cache.usage(), TokenUsage::new(100, 20));

        cache.lookup("k").unwrap();
        assert_eq!(cache.usage().total_tokens, 240);
    }

    #[test]
    fn miss_returns_none_without_counting() {
        let cache = ResponseCache::in_memory();
        assert!(cache.lookup("missing").is_none());
        assert!(cache.usage().is_zero());
    }

    #[test]
    fn discard_drops_only_uncommitted_entries() {
        let cache = ResponseCache::in_memory();
        cache.store("a".into(), &response(1, 1));
        cache.save().unwrap();
        cache.store("b".into(), &response(2, 2));

        cache.discard();
        assert!(cache.lookup("a").is_some());
        assert!(cache.lookup("b").is_none());
    }

    #[test]
    fn save_flushes_to_backing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let cache = ResponseCache::with_backing_file(&path);
        cache.store("k".into(), &response(10, 4));
        cache.save().unwrap();

        let reloaded = ResponseCache::with_backing_file(&path);
        let hit = reloaded.lookup("k").unwrap();
        assert_eq!(hit.content, "hello");
        assert_eq!(reloaded.usage(), TokenUsage::new(10, 4));
    }
}
