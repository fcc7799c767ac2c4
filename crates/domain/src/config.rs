//! Server configuration, resolved once at startup from the environment and
//! passed down explicitly.

use std::path::PathBuf;

use crate::error::Result;
use crate::model::Model;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    pub port: u16,
    /// Process-wide default model; sessions may override per instance.
    pub model: Model,
    /// Directory for response-cache backing files. `None` keeps caches
    /// purely in memory.
    pub cache_dir: Option<PathBuf>,
    /// Directory overriding the embedded agent prompts.
    pub prompt_dir: Option<PathBuf>,
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var(var).ok().filter(|v| !v.is_empty()).map(PathBuf::from)
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("NAVIUM_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = std::env::var("NAVIUM_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8013);

        Ok(Self {
            host,
            port,
            model: Model::from_env()?,
            cache_dir: env_path("NAVIUM_CACHE_DIR"),
            prompt_dir: env_path("NAVIUM_PROMPT_DIR"),
        })
    }
}
