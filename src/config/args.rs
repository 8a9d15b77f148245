use super::{
    CliConfig, ProviderKind, DEFAULT_BATCH_SIZE, DEFAULT_COLLECTION_PATH, DEFAULT_OUTPUT_PATH,
    DEFAULT_REPORTS_DIR, DEFAULT_TIMEOUT_SEC,
};
use clap::Args;
use std::path::PathBuf;

/// Flags shared by the binaries that talk to an LLM provider.
#[derive(Args, Debug, Clone)]
pub struct ProviderArgs {
    /// Completion backend to use.
    #[clap(long, value_enum, default_value_t = ProviderKind::OpenAI)]
    pub provider: ProviderKind,

    /// Model name. Falls back to the MODEL env var, then a per-provider default.
    #[clap(long)]
    pub model: Option<String>,

    /// Number of descriptions sent in one request.
    #[clap(long)]
    pub batch_size: Option<usize>,

    /// Timeout in seconds for each completion request.
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_SEC)]
    pub timeout_sec: u64,

    /// Maximum number of requests in flight. Unset sends every batch at once.
    #[clap(long)]
    pub max_concurrency: Option<usize>,

    /// Base URL of the OpenAI API.
    #[clap(long)]
    pub openai_base_url: Option<String>,

    /// Base URL of the Ollama server.
    #[clap(long)]
    pub ollama_base_url: Option<String>,

    /// Path to the collection JSON document.
    #[clap(long, default_value = DEFAULT_COLLECTION_PATH)]
    pub collection_path: PathBuf,

    /// Path to a TOML config file. Values there override command line flags.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Hide the progress bar.
    #[clap(long)]
    pub no_progress: bool,
}

impl ProviderArgs {
    pub fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            provider: self.provider,
            model: self.model.clone(),
            batch_size: self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
            timeout_sec: self.timeout_sec,
            max_concurrency: self.max_concurrency,
            collection_path: self.collection_path.clone(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            reports_dir: PathBuf::from(DEFAULT_REPORTS_DIR),
            openai_base_url: self.openai_base_url.clone(),
            ollama_base_url: self.ollama_base_url.clone(),
            show_progress: !self.no_progress,
        }
    }
}
