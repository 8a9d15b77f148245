use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vinyl_color_enricher::collection::DiscogsClient;
use vinyl_color_enricher::config::{
    load_file_config, process_env, DiscogsSettings, DEFAULT_COLLECTION_PATH,
};
use vinyl_color_enricher::persistence::persist_json;

#[derive(Parser, Debug)]
#[clap(about = "Download a Discogs collection to a local JSON document")]
struct CliArgs {
    /// Fetch every page of the collection instead of only the first one.
    #[clap(long = "skipPagePrompt")]
    skip_page_prompt: bool,

    /// Where to write the collection.
    #[clap(long, default_value = DEFAULT_COLLECTION_PATH)]
    collection_path: PathBuf,

    /// Base URL of the Discogs API.
    #[clap(long)]
    discogs_base_url: Option<String>,

    /// Path to a TOML config file.
    #[clap(long)]
    config: Option<PathBuf>,
}

async fn run(cli_args: CliArgs) -> Result<()> {
    let file_config = load_file_config(cli_args.config.as_deref())?;
    let discogs_file = file_config.as_ref().and_then(|f| f.discogs.as_ref());
    let collection_path = file_config
        .as_ref()
        .and_then(|f| f.collection_path.as_ref())
        .map(PathBuf::from)
        .unwrap_or(cli_args.collection_path);

    let settings = DiscogsSettings::resolve(cli_args.discogs_base_url, discogs_file, process_env)
        .context("Invalid configuration")?;

    let client = DiscogsClient::new(
        &settings.base_url,
        &settings.username,
        &settings.token,
        settings.timeout_sec,
    )?;

    info!("Fetching first page from the Discogs API...");
    let fetched = client
        .fetch_collection(cli_args.skip_page_prompt)
        .await
        .context("Failed to fetch collection")?;

    if fetched.fetched_pages < fetched.total_pages {
        warn!(
            total_pages = fetched.total_pages,
            "Only the first page was fetched; pass --skipPagePrompt to fetch all pages"
        );
    }

    persist_json(&fetched.releases, &collection_path).await?;
    info!(
        releases = fetched.releases.len(),
        path = %collection_path.display(),
        "Wrote collection"
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .init();

    if let Err(e) = run(cli_args).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
