use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub provider: Option<String>,
    pub model: Option<String>,
    pub batch_size: Option<usize>,
    pub timeout_sec: Option<u64>,
    pub max_concurrency: Option<usize>,
    pub collection_path: Option<String>,
    pub output_path: Option<String>,
    pub reports_dir: Option<String>,

    // Per-backend settings
    pub openai: Option<OpenAIConfig>,
    pub ollama: Option<OllamaConfig>,
    pub discogs: Option<DiscogsConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct OpenAIConfig {
    pub base_url: Option<String>,
    /// Only used by legacy completion models.
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct OllamaConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct DiscogsConfig {
    pub base_url: Option<String>,
    pub timeout_sec: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
