mod args;
mod file_config;

pub use args::ProviderArgs;
pub use file_config::{DiscogsConfig, FileConfig, OllamaConfig, OpenAIConfig};

use crate::collection::DEFAULT_DISCOGS_URL;
use crate::enrichment::{EnrichmentPipeline, EnrichmentRequester, ResponseAdapter, ResponseShape};
use crate::llm::{
    CompletionOptions, LlmProvider, OllamaProvider, OpenAILegacyProvider, OpenAIProvider,
};
use clap::ValueEnum;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_BATCH_SIZE: usize = 20;
pub const DEFAULT_TIMEOUT_SEC: u64 = 120;
pub const DEFAULT_COLLECTION_PATH: &str = "./temp/collection.json";
pub const DEFAULT_OUTPUT_PATH: &str = "./temp/openAIEnrichments.json";
pub const DEFAULT_REPORTS_DIR: &str = "./model_test_reports";

/// Environment variable names.
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const MODEL_VAR: &str = "MODEL";
pub const DISCOGS_TOKEN_VAR: &str = "TOKEN";
pub const DISCOGS_USERNAME_VAR: &str = "USERNAME";

/// Configuration problems detected before any network activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not set. {hint}")]
    MissingEnv { var: &'static str, hint: &'static str },

    #[error("Invalid value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Completion backend, which also decides the response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ProviderKind {
    /// OpenAI chat completions
    #[default]
    #[value(name = "openai")]
    OpenAI,
    /// OpenAI legacy completions, one prompt per record
    #[value(name = "openai-legacy")]
    OpenAILegacy,
    /// Local Ollama server
    Ollama,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::OpenAILegacy => "openai-legacy",
            ProviderKind::Ollama => "ollama",
        }
    }

    pub fn response_shape(&self) -> ResponseShape {
        match self {
            ProviderKind::OpenAILegacy => ResponseShape::PerChoice,
            ProviderKind::OpenAI | ProviderKind::Ollama => ResponseShape::RecordsEnvelope,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "gpt-4o",
            ProviderKind::OpenAILegacy => "gpt-3.5-turbo-instruct",
            ProviderKind::Ollama => "llama3.1:8b",
        }
    }

    /// Batch size used by the model comparison tool.
    pub fn comparison_batch_size(&self) -> usize {
        match self {
            ProviderKind::Ollama => 5,
            ProviderKind::OpenAI | ProviderKind::OpenAILegacy => 15,
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderKind::Ollama)
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub provider: ProviderKind,
    pub model: Option<String>,
    pub batch_size: usize,
    pub timeout_sec: u64,
    pub max_concurrency: Option<usize>,
    pub collection_path: PathBuf,
    pub output_path: PathBuf,
    pub reports_dir: PathBuf,
    pub openai_base_url: Option<String>,
    pub ollama_base_url: Option<String>,
    pub show_progress: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: None,
            batch_size: DEFAULT_BATCH_SIZE,
            timeout_sec: DEFAULT_TIMEOUT_SEC,
            max_concurrency: None,
            collection_path: PathBuf::from(DEFAULT_COLLECTION_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            reports_dir: PathBuf::from(DEFAULT_REPORTS_DIR),
            openai_base_url: None,
            ollama_base_url: None,
            show_progress: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub batch_size: NonZeroUsize,
    pub timeout: Duration,
    pub max_concurrency: Option<NonZeroUsize>,
    pub collection_path: PathBuf,
    pub output_path: PathBuf,
    pub reports_dir: PathBuf,
    pub openai_base_url: String,
    pub ollama_base_url: String,
    pub openai_api_key: Option<String>,
    pub legacy_max_tokens: Option<u32>,
    pub show_progress: bool,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments, optional TOML file config and
    /// the environment. TOML values override CLI values where present; the
    /// environment supplies secrets and the `MODEL` fallback.
    pub fn resolve<F>(
        cli: &CliConfig,
        file_config: Option<FileConfig>,
        env: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = file_config.unwrap_or_default();

        let provider = match file.provider.as_deref() {
            Some(s) => parse_provider(s).ok_or_else(|| ConfigError::Invalid {
                field: "provider",
                message: format!("unknown provider '{}'", s),
            })?,
            None => cli.provider,
        };

        let model = file
            .model
            .or_else(|| cli.model.clone())
            .or_else(|| env(MODEL_VAR))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| provider.default_model().to_string());

        let batch_size = file.batch_size.unwrap_or(cli.batch_size);
        let batch_size = NonZeroUsize::new(batch_size).ok_or_else(|| ConfigError::Invalid {
            field: "batch_size",
            message: "must be greater than zero".to_string(),
        })?;

        let timeout_sec = file.timeout_sec.unwrap_or(cli.timeout_sec);
        if timeout_sec == 0 {
            return Err(ConfigError::Invalid {
                field: "timeout_sec",
                message: "must be greater than zero".to_string(),
            });
        }

        let max_concurrency = match file.max_concurrency.or(cli.max_concurrency) {
            Some(n) => Some(NonZeroUsize::new(n).ok_or_else(|| ConfigError::Invalid {
                field: "max_concurrency",
                message: "must be greater than zero when set".to_string(),
            })?),
            None => None,
        };

        let collection_path = file
            .collection_path
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.collection_path.clone());
        let output_path = file
            .output_path
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.output_path.clone());
        let reports_dir = file
            .reports_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.reports_dir.clone());

        let openai_file = file.openai.unwrap_or_default();
        let openai_base_url = openai_file
            .base_url
            .or_else(|| cli.openai_base_url.clone())
            .unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string());
        let ollama_base_url = file
            .ollama
            .and_then(|o| o.base_url)
            .or_else(|| cli.ollama_base_url.clone())
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

        let openai_api_key = env(OPENAI_API_KEY_VAR).filter(|k| !k.trim().is_empty());
        if provider.requires_api_key() && openai_api_key.is_none() {
            return Err(ConfigError::MissingEnv {
                var: OPENAI_API_KEY_VAR,
                hint: "You need an OpenAI API key set as an OPENAI_API_KEY env var.",
            });
        }

        Ok(Self {
            provider,
            model,
            batch_size,
            timeout: Duration::from_secs(timeout_sec),
            max_concurrency,
            collection_path,
            output_path,
            reports_dir,
            openai_base_url,
            ollama_base_url,
            openai_api_key,
            legacy_max_tokens: openai_file.max_tokens,
            show_progress: cli.show_progress,
        })
    }

    /// Build the single provider shared by every request of a run.
    pub fn build_provider(&self) -> Arc<dyn LlmProvider> {
        match self.provider {
            ProviderKind::OpenAI => Arc::new(OpenAIProvider::new(
                &self.openai_base_url,
                &self.model,
                self.openai_api_key.clone(),
            )),
            ProviderKind::OpenAILegacy => Arc::new(OpenAILegacyProvider::new(
                &self.openai_base_url,
                &self.model,
                self.openai_api_key.clone(),
            )),
            ProviderKind::Ollama => Arc::new(OllamaProvider::new(&self.ollama_base_url, &self.model)),
        }
    }

    pub fn adapter(&self) -> Arc<dyn ResponseAdapter> {
        Arc::from(self.provider.response_shape().adapter())
    }

    pub fn completion_options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: 0.0,
            max_tokens: match self.provider {
                ProviderKind::OpenAILegacy => self.legacy_max_tokens,
                _ => None,
            },
            timeout: self.timeout,
            json_output: true,
        }
    }

    /// Wire provider, adapter and options into a ready pipeline.
    pub fn build_pipeline(&self) -> EnrichmentPipeline {
        let requester =
            EnrichmentRequester::new(self.build_provider(), self.adapter(), self.completion_options())
                .with_max_concurrency(self.max_concurrency)
                .with_progress(self.show_progress);
        EnrichmentPipeline::new(requester, self.batch_size)
    }
}

/// Discogs credentials and endpoint for the collection fetch.
#[derive(Debug, Clone)]
pub struct DiscogsSettings {
    pub base_url: String,
    pub username: String,
    pub token: String,
    pub timeout_sec: u64,
}

impl DiscogsSettings {
    pub fn resolve<F>(
        base_url: Option<String>,
        file_config: Option<&DiscogsConfig>,
        env: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = file_config.cloned().unwrap_or_default();

        let token = env(DISCOGS_TOKEN_VAR)
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingEnv {
                var: DISCOGS_TOKEN_VAR,
                hint: "You need a Discogs personal access token exported as a TOKEN env var.",
            })?;
        let username = env(DISCOGS_USERNAME_VAR)
            .filter(|u| !u.trim().is_empty())
            .ok_or(ConfigError::MissingEnv {
                var: DISCOGS_USERNAME_VAR,
                hint: "You need a Discogs username exported as a USERNAME env var.",
            })?;

        Ok(Self {
            base_url: file
                .base_url
                .or(base_url)
                .unwrap_or_else(|| DEFAULT_DISCOGS_URL.to_string()),
            username,
            token,
            timeout_sec: file.timeout_sec.unwrap_or(DEFAULT_TIMEOUT_SEC),
        })
    }
}

/// Parses a provider name. Uses clap's ValueEnum trait for parsing.
fn parse_provider(s: &str) -> Option<ProviderKind> {
    ProviderKind::from_str(s, true).ok()
}

/// Load the TOML config file if one was given.
pub fn load_file_config(path: Option<&Path>) -> anyhow::Result<Option<FileConfig>> {
    path.map(FileConfig::load).transpose()
}

/// Read a variable from the process environment.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
