//! Prompt loading.
//!
//! Each agent has a system and a user template, keyed by provider with an
//! `openai` fallback: a static table maps `(agent kind, provider)` to a
//! prompt directory. Defaults are embedded at compile time; a directory
//! named by `NAVIUM_PROMPT_DIR` overrides them file by file.

use std::path::Path;

use nv_domain::model::Provider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    Planner,
    Actor,
    Retriever,
    Area,
    Locator,
    ChangesAnalyzer,
}

impl AgentKind {
    pub fn dir_name(&self) -> &'static str {
        match self {
            AgentKind::Planner => "planner",
            AgentKind::Actor => "actor",
            AgentKind::Retriever => "retriever",
            AgentKind::Area => "area",
            AgentKind::Locator => "locator",
            AgentKind::ChangesAnalyzer => "changes_analyzer",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PromptSet {
    pub system: String,
    pub user: String,
}

/// Prompt directory for a provider. Azure shares the OpenAI prompts; the
/// Bedrock-hosted families share the prompts of the model vendor.
fn provider_dir(provider: Provider) -> &'static str {
    match provider {
        Provider::Anthropic | Provider::AwsAnthropic => "anthropic",
        Provider::Google => "google",
        Provider::Deepseek => "deepseek",
        Provider::AwsMeta => "meta",
        Provider::Mistralai => "mistralai",
        Provider::Ollama => "ollama",
        Provider::Xai => "xai",
        Provider::Openai | Provider::AzureOpenai => "openai",
    }
}

/// Compiled-in prompt table. Agent/provider pairs without a dedicated
/// directory fall back to the `openai` set.
fn embedded(kind: AgentKind, dir: &str) -> Option<PromptSet> {
    macro_rules! set {
        ($path:literal) => {
            Some(PromptSet {
                system: include_str!(concat!("../../../prompts/", $path, "/system.md")).to_string(),
                user: include_str!(concat!("../../../prompts/", $path, "/user.md")).to_string(),
            })
        };
    }
    match (kind, dir) {
        (AgentKind::Planner, "anthropic") => set!("planner/anthropic"),
        (AgentKind::Planner, "openai") => set!("planner/openai"),
        (AgentKind::Actor, "openai") => set!("actor/openai"),
        (AgentKind::Retriever, "openai") => set!("retriever/openai"),
        (AgentKind::Area, "openai") => set!("area/openai"),
        (AgentKind::Locator, "openai") => set!("locator/openai"),
        (AgentKind::ChangesAnalyzer, "openai") => set!("changes_analyzer/openai"),
        _ => None,
    }
}

fn from_dir(base: &Path, kind: AgentKind, dir: &str) -> Option<PromptSet> {
    let agent_dir = base.join(kind.dir_name()).join(dir);
    let system = std::fs::read_to_string(agent_dir.join("system.md")).ok()?;
    let user = std::fs::read_to_string(agent_dir.join("user.md")).ok()?;
    Some(PromptSet { system, user })
}

/// Load the prompt set for an agent. Resolution order: override directory
/// with the provider dir, override directory with `openai`, embedded
/// provider dir, embedded `openai`.
pub fn load(kind: AgentKind, provider: Provider, override_dir: Option<&Path>) -> PromptSet {
    let dir = provider_dir(provider);
    if let Some(base) = override_dir {
        if let Some(set) = from_dir(base, kind, dir).or_else(|| from_dir(base, kind, "openai")) {
            return set;
        }
        tracing::warn!(
            agent = kind.dir_name(),
            dir = %base.display(),
            "prompt override directory has no prompts for this agent, using embedded"
        );
    }
    embedded(kind, dir)
        .or_else(|| embedded(kind, "openai"))
        .unwrap_or_else(|| unreachable!("embedded openai prompts exist for every agent"))
}

/// Replace `{name}` placeholders in a template.
pub fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planner_has_provider_specific_prompts() {
        let anthropic = load(AgentKind::Planner, Provider::Anthropic, None);
        let openai = load(AgentKind::Planner, Provider::Openai, None);
        assert_ne!(anthropic.system, openai.system);
        // AWS-hosted Anthropic shares the Anthropic prompts.
        let aws = load(AgentKind::Planner, Provider::AwsAnthropic, None);
        assert_eq!(aws.system, anthropic.system);
    }

    #[test]
    fn unknown_provider_dirs_fall_back_to_openai() {
        let openai = load(AgentKind::Actor, Provider::Openai, None);
        let mistral = load(AgentKind::Actor, Provider::Mistralai, None);
        assert_eq!(openai.system, mistral.system);
    }

    #[test]
    fn override_directory_wins() {
        let dir = tempfile::tempdir().unwrap();
        let agent_dir = dir.path().join("actor/openai");
        std::fs::create_dir_all(&agent_dir).unwrap();
        std::fs::write(agent_dir.join("system.md"), "custom system").unwrap();
        std::fs::write(agent_dir.join("user.md"), "custom user {goal}").unwrap();

        let set = load(AgentKind::Actor, Provider::Openai, Some(dir.path()));
        assert_eq!(set.system, "custom system");

        // Missing agents in the override dir still resolve to embedded.
        let planner = load(AgentKind::Planner, Provider::Openai, Some(dir.path()));
        assert!(planner.system.contains("planner"));
    }

    #[test]
    fn fill_replaces_placeholders() {
        assert_eq!(
            fill("do {goal} on {url}", &[("goal", "login"), ("url", "x.com")]),
            "do login on x.com"
        );
    }
}
