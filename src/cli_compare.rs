use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vinyl_color_enricher::collection::{extract_descriptions, CollectionRecord};
use vinyl_color_enricher::config::{
    load_file_config, process_env, AppConfig, ProviderArgs, ProviderKind, DEFAULT_OUTPUT_PATH,
    DEFAULT_REPORTS_DIR,
};
use vinyl_color_enricher::enrichment::EnrichmentRecord;
use vinyl_color_enricher::evaluation::{
    build_comparison, categorize, sample, sample_ids, summarize, EvaluationReport, ReportPaths,
};
use vinyl_color_enricher::persistence::{load_json, persist_json};

#[derive(Parser, Debug)]
#[clap(about = "Compare another model's enrichments against the baseline run")]
struct CliArgs {
    #[clap(flatten)]
    provider: ProviderArgs,

    /// Enrichments produced by the baseline model.
    #[clap(long, default_value = DEFAULT_OUTPUT_PATH)]
    baseline_path: PathBuf,

    /// Directory for the enrichment and report files.
    #[clap(long, default_value = DEFAULT_REPORTS_DIR)]
    reports_dir: PathBuf,
}

async fn run(cli_args: CliArgs) -> Result<()> {
    let file_config = load_file_config(cli_args.provider.config.as_deref())?;
    let mut cli_config = cli_args.provider.to_cli_config();
    cli_config.batch_size = cli_args
        .provider
        .batch_size
        .unwrap_or_else(|| cli_args.provider.provider.comparison_batch_size());
    cli_config.reports_dir = cli_args.reports_dir;

    let config = AppConfig::resolve(&cli_config, file_config, process_env)
        .context("Invalid configuration")?;
    info!(provider = %config.provider, model = %config.model, "=== Testing model ===");

    let baseline: Vec<EnrichmentRecord> = load_json(&cli_args.baseline_path)
        .await
        .context("Failed to load baseline enrichments")?;
    let collection: Vec<CollectionRecord> = load_json(&config.collection_path)
        .await
        .context("Failed to load collection")?;

    let (enriched, not_enriched) = categorize(&baseline);
    info!(
        enriched = enriched.len(),
        not_enriched = not_enriched.len(),
        "Categorized baseline"
    );

    let sampled = sample(&baseline);
    let descriptions = extract_descriptions(&collection).retain_ids(&sample_ids(&sampled));
    info!(
        sample_size = sampled.len(),
        with_descriptions = descriptions.len(),
        "Sampled baseline records"
    );

    if config.provider == ProviderKind::Ollama {
        config
            .build_provider()
            .health_check()
            .await
            .with_context(|| format!("Ollama is not reachable at {}", config.ollama_base_url))?;
    }

    let pipeline = config.build_pipeline();
    let start = Instant::now();
    // Local models fail more often; keep what they did answer.
    let results = if config.provider == ProviderKind::Ollama {
        let (records, failures) = pipeline.enrich_partial(&descriptions).await;
        if !failures.is_empty() {
            warn!(failed_batches = failures.len(), "Some batches were skipped");
        }
        records
    } else {
        pipeline
            .enrich(&descriptions)
            .await
            .context("Candidate enrichment failed")?
    };
    let elapsed = start.elapsed();
    info!(
        results = results.len(),
        seconds = elapsed.as_secs_f64(),
        "Candidate enrichment completed"
    );

    let comparison = build_comparison(&sampled, &results);
    let summary = summarize(&comparison);
    let report = EvaluationReport::new(
        config.provider.as_str(),
        &config.model,
        elapsed,
        summary,
        comparison,
    );

    let paths = ReportPaths::new(&config.reports_dir, config.provider.as_str(), &config.model);
    persist_json(&results, &paths.enrichments).await?;
    persist_json(&report, &paths.report).await?;

    println!("\n=== COMPARISON SUMMARY ===\n");
    for line in report.console_summary() {
        println!("{}", line);
    }
    println!("\n=== FILES SAVED ===\n");
    println!("- {} (raw {} results)", paths.enrichments.display(), config.model);
    println!("- {} (full report with stats and comparison)", paths.report.display());
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
