//! Shared agent plumbing: usage accounting and separator handling for
//! unstructured-mode output.

use std::sync::OnceLock;

use parking_lot::Mutex;
use regex::Regex;

use nv_domain::usage::TokenUsage;
use nv_providers::LlmResponse;

/// Token separating list items in unstructured-mode model output.
pub const LIST_SEPARATOR: &str = "<SEP>";

/// Sentinel value meaning "not present in context".
pub const NOOP: &str = "NOOP";

/// Per-agent running token totals plus response bookkeeping.
pub struct AgentCore {
    name: &'static str,
    usage: Mutex<TokenUsage>,
}

impl AgentCore {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            usage: Mutex::new(TokenUsage::default()),
        }
    }

    /// Fold a response into the running totals. Cache hits carry zero
    /// usage, so they leave the totals untouched.
    pub fn record(&self, response: &LlmResponse) {
        if let Some(reasoning) = &response.reasoning {
            tracing::debug!(agent = self.name, reasoning, "model reasoning");
        }
        tracing::debug!(
            agent = self.name,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "model call complete"
        );
        self.usage.lock().add(&response.usage);
    }

    pub fn usage(&self) -> TokenUsage {
        *self.usage.lock()
    }
}

fn near_miss_separator() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // "<SEP" followed by anything: models occasionally garble the closing
    // brace. A well-formed "<SEP>" maps to itself.
    PATTERN.get_or_init(|| Regex::new(r"<SEP.").unwrap())
}

/// Clean up separator artifacts in an unstructured-mode value: stray
/// leading/trailing separators and near-miss separators.
pub fn normalize_separators(value: &str) -> String {
    let trimmed = value.trim();
    let trimmed = trimmed.strip_prefix(LIST_SEPARATOR).unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix(LIST_SEPARATOR).unwrap_or(trimmed).trim();
    near_miss_separator()
        .replace_all(trimmed, LIST_SEPARATOR)
        .into_owned()
}

/// Split a normalized value on the separator token, dropping empty items.
pub fn split_separated(value: &str) -> Vec<String> {
    value
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_accumulates_across_calls() {
        let core = AgentCore::new("test");
        core.record(&LlmResponse {
            usage: TokenUsage::new(10, 2),
            ..Default::default()
        });
        core.record(&LlmResponse {
            usage: TokenUsage::new(5, 1),
            ..Default::default()
        });
        assert_eq!(core.usage(), TokenUsage::new(15, 3));
    }

    #[test]
    fn strips_stray_leading_and_trailing_separators() {
        assert_eq!(normalize_separators("<SEP>a<SEP>b<SEP>"), "a<SEP>b");
    }

    #[test]
    fn repairs_near_miss_separators() {
        assert_eq!(normalize_separators("a<SEP]b"), "a<SEP>b");
        assert_eq!(normalize_separators("a<SEP>b"), "a<SEP>b");
    }

    #[test]
    fn split_drops_empty_items() {
        assert_eq!(split_separated("a<SEP><SEP> b "), vec!["a", "b"]);
        assert!(split_separated("").is_empty());
    }
}
