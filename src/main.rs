use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vinyl_color_enricher::collection::{extract_descriptions, CollectionRecord};
use vinyl_color_enricher::config::{
    load_file_config, process_env, AppConfig, ProviderArgs, DEFAULT_OUTPUT_PATH,
};
use vinyl_color_enricher::enrichment::AggregateRequestError;
use vinyl_color_enricher::persistence::{load_json, persist_json};

#[derive(Parser, Debug)]
#[clap(about = "Enrich a saved Discogs collection with machine-readable vinyl colors")]
struct CliArgs {
    #[clap(flatten)]
    provider: ProviderArgs,

    /// Where to write the enrichment records.
    #[clap(long, default_value = DEFAULT_OUTPUT_PATH)]
    output_path: PathBuf,
}

async fn run(cli_args: CliArgs) -> Result<()> {
    let file_config = load_file_config(cli_args.provider.config.as_deref())?;
    let mut cli_config = cli_args.provider.to_cli_config();
    cli_config.output_path = cli_args.output_path;

    let config = AppConfig::resolve(&cli_config, file_config, process_env)
        .context("Invalid configuration")?;
    info!(
        provider = %config.provider,
        model = %config.model,
        batch_size = config.batch_size.get(),
        "Configuration resolved"
    );

    let collection: Vec<CollectionRecord> = load_json(&config.collection_path)
        .await
        .context("Failed to load collection")?;
    let descriptions = extract_descriptions(&collection);
    info!(
        releases = collection.len(),
        with_descriptions = descriptions.len(),
        "Extracted vinyl descriptions"
    );

    let pipeline = config.build_pipeline();
    let records = match pipeline.enrich(&descriptions).await {
        Ok(records) => records,
        Err(e) => {
            log_failures(&e);
            return Err(e).context("Enrichment aborted, nothing was written");
        }
    };

    persist_json(&records, &config.output_path).await?;
    info!(
        records = records.len(),
        path = %config.output_path.display(),
        "Enrichments written"
    );
    Ok(())
}

fn log_failures(e: &AggregateRequestError) {
    for failure in &e.failures {
        error!(
            batch = failure.batch_index,
            ids = ?failure.record_ids,
            "Enrichment request failed: {}",
            failure.error
        );
    }
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
